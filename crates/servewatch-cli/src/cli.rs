// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::path::PathBuf;

use clap::{Args as ClapArgs, Parser, Subcommand};
use servewatch_config::CliOverrides;

/// servewatch - readiness checks for model serving deployments
#[derive(Parser, Debug)]
#[command(name = "servewatch", version, about, long_about = None)]
pub struct Args {
	/// Path to a configuration file (replaces the user config file)
	#[arg(short, long, env = "SERVEWATCH_CONFIG")]
	pub config: Option<PathBuf>,

	/// Log level, overridden by RUST_LOG
	#[arg(short, long, default_value = "info")]
	pub log_level: String,

	/// Output logs as JSON
	#[arg(long)]
	pub json_logs: bool,

	/// Cluster CLI binary (oc or kubectl)
	#[arg(long)]
	pub cli_bin: Option<String>,

	#[command(subcommand)]
	pub command: Command,
}

#[derive(Subcommand, Debug)]
pub enum Command {
	/// Wait until an InferenceService is loaded and ready
	WaitReady {
		/// InferenceService name
		name: String,
		#[arg(short, long)]
		namespace: Option<String>,
		/// Attempts before giving up
		#[arg(long)]
		max_attempts: Option<u32>,
		/// Delay between attempts in milliseconds
		#[arg(long)]
		interval_ms: Option<u64>,
	},
	/// Check the predictor tolerations of an InferenceService
	Tolerations {
		name: String,
		#[arg(short, long)]
		namespace: Option<String>,
		#[command(flatten)]
		expected: ExpectedToleration,
	},
	/// Send a smoke-test inference request to the external URL
	Infer {
		name: String,
		#[arg(short, long)]
		namespace: Option<String>,
	},
	/// Recreate a project and add an S3 data connection to it
	Provision {
		project: String,
		/// Bucket key from the `[buckets]` config table
		#[arg(long)]
		bucket: String,
		/// Name of the data connection secret
		#[arg(long, default_value = "aws-connection")]
		connection: String,
	},
	/// Validate every https:// link found under a manifest directory
	CheckLinks {
		dir: PathBuf,
		/// Skip URLs containing this substring (repeatable)
		#[arg(long = "exclude", value_name = "SUBSTR")]
		exclude: Vec<String>,
	},
}

#[derive(ClapArgs, Debug, Clone)]
pub struct ExpectedToleration {
	/// Require that no toleration is present
	#[arg(long, conflicts_with_all = ["key", "operator", "effect"])]
	pub none: bool,
	#[arg(long, required_unless_present = "none")]
	pub key: Option<String>,
	#[arg(long, required_unless_present = "none")]
	pub operator: Option<String>,
	#[arg(long, required_unless_present = "none")]
	pub effect: Option<String>,
}

impl Args {
	pub fn overrides(&self) -> CliOverrides {
		let mut overrides = CliOverrides {
			cli_bin: self.cli_bin.clone(),
			..Default::default()
		};
		match &self.command {
			Command::WaitReady {
				namespace,
				max_attempts,
				interval_ms,
				..
			} => {
				overrides.namespace = namespace.clone();
				overrides.max_attempts = *max_attempts;
				overrides.interval_ms = *interval_ms;
			}
			Command::Tolerations { namespace, .. } | Command::Infer { namespace, .. } => {
				overrides.namespace = namespace.clone();
			}
			Command::CheckLinks { exclude, .. } => {
				overrides.excluded_substrings = exclude.clone();
			}
			Command::Provision { .. } => {}
		}
		overrides
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use clap::CommandFactory;

	#[test]
	fn cli_definition_is_consistent() {
		Args::command().debug_assert();
	}

	#[test]
	fn wait_ready_flags_become_overrides() {
		let args = Args::parse_from([
			"servewatch",
			"wait-ready",
			"my-model",
			"-n",
			"models",
			"--max-attempts",
			"5",
			"--interval-ms",
			"10",
		]);
		let overrides = args.overrides();
		assert_eq!(overrides.namespace.as_deref(), Some("models"));
		assert_eq!(overrides.max_attempts, Some(5));
		assert_eq!(overrides.interval_ms, Some(10));
	}

	#[test]
	fn tolerations_require_key_or_none() {
		assert!(Args::try_parse_from(["servewatch", "tolerations", "m"]).is_err());
		assert!(Args::try_parse_from(["servewatch", "tolerations", "m", "--none"]).is_ok());
		assert!(Args::try_parse_from([
			"servewatch",
			"tolerations",
			"m",
			"--none",
			"--key",
			"k"
		])
		.is_err());
		assert!(Args::try_parse_from([
			"servewatch",
			"tolerations",
			"m",
			"--key",
			"nvidia.com/gpu",
			"--operator",
			"Exists",
			"--effect",
			"NoSchedule"
		])
		.is_ok());
	}

	#[test]
	fn excludes_are_repeatable() {
		let args = Args::parse_from([
			"servewatch",
			"check-links",
			"manifests",
			"--exclude",
			"localhost",
			"--exclude",
			"example.com",
		]);
		assert_eq!(
			args.overrides().excluded_substrings,
			vec!["localhost".to_string(), "example.com".to_string()]
		);
	}
}
