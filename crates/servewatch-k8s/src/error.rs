// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use servewatch_poll::PollError;
use thiserror::Error;

use crate::types::InferenceServiceState;

/// Result type alias for cluster operations.
pub type K8sResult<T> = Result<T, K8sError>;

/// Errors that can occur during cluster operations.
#[derive(Error, Debug)]
pub enum K8sError {
	#[error("{bin} not found in PATH")]
	BinaryNotFound { bin: String },

	#[error("{resource} not found")]
	NotFound { resource: String },

	#[error("Command failed: {cmd} {}: {stderr}", .args.join(" "))]
	CommandFailed {
		cmd: String,
		args: Vec<String>,
		stderr: String,
	},

	#[error("Invalid JSON for {resource}: {source}")]
	InvalidJson {
		resource: String,
		#[source]
		source: serde_json::Error,
	},

	#[error("{0}")]
	Validation(String),

	#[error(transparent)]
	Poll(#[from] PollError<InferenceServiceState>),

	#[error("HTTP error: {0}")]
	Http(#[from] reqwest::Error),

	#[error("I/O error: {0}")]
	Io(#[from] std::io::Error),
}

impl K8sError {
	pub fn validation(msg: impl Into<String>) -> Self {
		Self::Validation(msg.into())
	}

	pub fn is_not_found(&self) -> bool {
		matches!(self, K8sError::NotFound { .. })
	}
}
