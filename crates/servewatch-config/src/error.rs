// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration error types.

use std::path::PathBuf;

/// Errors that can occur while loading and validating configuration.
#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
	/// I/O error reading a config file
	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	/// TOML parsing error
	#[error("TOML parse error in {path}: {source}")]
	TomlParse {
		path: PathBuf,
		#[source]
		source: toml::de::Error,
	},

	/// A `SERVEWATCH_*` variable could not be parsed
	#[error("Environment variable {var}: {message}")]
	Env { var: String, message: String },

	#[error("Invalid value for {field}: {message}")]
	InvalidValue { field: String, message: String },

	/// A named S3 bucket is referenced but not configured
	#[error("Bucket '{0}' not found in configuration")]
	BucketNotFound(String),

	#[error("Could not determine home directory")]
	HomeDirNotFound,
}

impl ConfigError {
	pub fn invalid_value(field: impl Into<String>, message: impl Into<String>) -> Self {
		Self::InvalidValue {
			field: field.into(),
			message: message.into(),
		}
	}

	pub fn env(var: impl Into<String>, message: impl Into<String>) -> Self {
		Self::Env {
			var: var.into(),
			message: message.into(),
		}
	}
}
