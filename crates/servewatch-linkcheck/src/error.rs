// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Error types for link checking.

use std::path::PathBuf;

use thiserror::Error;

/// Failures that stop a link check before any URL is probed.
///
/// Per-URL problems (timeouts, 4xx, rate limiting) are never errors; they are
/// recorded in the [`LinkReport`](crate::LinkReport).
#[derive(Debug, Error)]
pub enum LinkCheckError {
	#[error("Manifest directory not found: {0}")]
	MissingDirectory(PathBuf),

	#[error("Failed to walk {path}: {source}")]
	Walk {
		path: PathBuf,
		#[source]
		source: walkdir::Error,
	},

	#[error("I/O error reading {path}: {source}")]
	Io {
		path: PathBuf,
		#[source]
		source: std::io::Error,
	},

	#[error("Failed to build HTTP client: {0}")]
	Client(#[from] reqwest::Error),
}
