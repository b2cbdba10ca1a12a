// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::process::Stdio;

use async_trait::async_trait;
use tokio::io::AsyncWriteExt;
use tokio::process::Command;
use tracing::{debug, trace, warn};

use crate::client::{ResourceClient, ResourceRef};
use crate::error::{K8sError, K8sResult};

/// Default cluster CLI.
pub const DEFAULT_CLI_BIN: &str = "oc";

/// Resource client implementation using the `oc` (or `kubectl`) CLI.
#[derive(Debug, Clone)]
pub struct CommandResourceClient {
	bin: String,
}

impl CommandResourceClient {
	pub fn new(bin: impl Into<String>) -> Self {
		Self { bin: bin.into() }
	}

	pub fn bin(&self) -> &str {
		&self.bin
	}

	/// Runs the CLI and returns stdout on success.
	async fn run(&self, args: &[String], stdin: Option<&[u8]>) -> K8sResult<String> {
		let mut cmd = Command::new(&self.bin);
		cmd.args(args)
			.stdin(if stdin.is_some() {
				Stdio::piped()
			} else {
				Stdio::null()
			})
			.stdout(Stdio::piped())
			.stderr(Stdio::piped());

		trace!(cmd = %format!("{} {}", self.bin, args.join(" ")), "running cluster command");

		let mut child = cmd.spawn().map_err(|e| self.spawn_error(e))?;
		if let (Some(input), Some(mut pipe)) = (stdin, child.stdin.take()) {
			pipe.write_all(input).await?;
			pipe.shutdown().await?;
		}
		let output = child.wait_with_output().await?;

		if output.status.success() {
			return Ok(String::from_utf8_lossy(&output.stdout).trim().to_string());
		}

		let stderr = String::from_utf8_lossy(&output.stderr).trim().to_string();
		debug!(code = ?output.status.code(), stderr = %stderr, "cluster command failed");
		Err(K8sError::CommandFailed {
			cmd: self.bin.clone(),
			args: args.to_vec(),
			stderr,
		})
	}

	fn spawn_error(&self, e: std::io::Error) -> K8sError {
		if e.kind() == std::io::ErrorKind::NotFound {
			warn!(bin = %self.bin, "cluster CLI not found in PATH");
			K8sError::BinaryNotFound {
				bin: self.bin.clone(),
			}
		} else {
			K8sError::Io(e)
		}
	}
}

impl Default for CommandResourceClient {
	fn default() -> Self {
		Self::new(DEFAULT_CLI_BIN)
	}
}

/// Builds `get <kind> <name> [-n <ns>] -o json`.
fn get_args(resource: &ResourceRef) -> Vec<String> {
	let mut args = vec!["get".to_string(), resource.kind.clone(), resource.name.clone()];
	push_namespace(&mut args, resource);
	args.extend(["-o".to_string(), "json".to_string()]);
	args
}

fn delete_args(resource: &ResourceRef) -> Vec<String> {
	let mut args = vec![
		"delete".to_string(),
		resource.kind.clone(),
		resource.name.clone(),
	];
	push_namespace(&mut args, resource);
	args.extend(["--ignore-not-found".to_string(), "--wait=true".to_string()]);
	args
}

fn push_namespace(args: &mut Vec<String>, resource: &ResourceRef) {
	if let Some(ns) = &resource.namespace {
		args.extend(["-n".to_string(), ns.clone()]);
	}
}

fn is_not_found(stderr: &str) -> bool {
	stderr.contains("NotFound") || stderr.contains("not found")
}

#[async_trait]
impl ResourceClient for CommandResourceClient {
	async fn get_json(&self, resource: &ResourceRef) -> K8sResult<String> {
		match self.run(&get_args(resource), None).await {
			Err(K8sError::CommandFailed { stderr, .. }) if is_not_found(&stderr) => {
				Err(K8sError::NotFound {
					resource: resource.to_string(),
				})
			}
			other => other,
		}
	}

	async fn apply_json(&self, manifest: &serde_json::Value) -> K8sResult<()> {
		let body = serde_json::to_vec(manifest).map_err(|source| K8sError::InvalidJson {
			resource: "manifest".to_string(),
			source,
		})?;
		let args = ["apply".to_string(), "-f".to_string(), "-".to_string()];
		let out = self.run(&args, Some(&body)).await?;
		debug!(output = %out, "applied manifest");
		Ok(())
	}

	async fn delete(&self, resource: &ResourceRef) -> K8sResult<()> {
		self.run(&delete_args(resource), None).await?;
		debug!(resource = %resource, "deleted resource");
		Ok(())
	}
}
