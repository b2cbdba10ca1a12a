// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration for servewatch.
//!
//! This crate provides:
//! - XDG Base Directory compliant path resolution
//! - Layered configuration: defaults, TOML files, `SERVEWATCH_*` environment
//!   variables and CLI overrides
//! - Validation of the merged result
//! - [`SecretString`] for bucket credentials

pub mod error;
pub mod layer;
pub mod paths;
pub mod registry;
pub mod runtime;
pub mod secret;
pub mod sources;

use std::path::Path;

pub use error::ConfigError;
pub use layer::ConfigLayer;
pub use paths::PathsConfig;
pub use registry::ConfigRegistry;
pub use runtime::{
	BucketConfig, BucketSettings, ClusterConfig, LinkSettings, PollSettings, ServewatchConfig,
};
pub use secret::{Secret, SecretString, REDACTED};
pub use sources::{CliOverrides, ConfigSource, Precedence};

/// Load configuration from every source with default precedence.
///
/// With `config_file` set, that file replaces the user config file and must
/// exist.
pub fn load_config(
	config_file: Option<&Path>,
	cli: CliOverrides,
) -> Result<ServewatchConfig, ConfigError> {
	let paths = paths::resolve_xdg_paths()?;
	let mut registry = ConfigRegistry::new();

	registry.register(Box::new(sources::DefaultsSource));
	registry.register(Box::new(sources::FileSource::system(&paths)));
	match config_file {
		Some(path) => registry.register(Box::new(sources::FileSource::explicit(path))),
		None => registry.register(Box::new(sources::FileSource::user(&paths))),
	}
	registry.register(Box::new(sources::EnvSource::process()));
	registry.register(Box::new(sources::CliSource::new(cli)));

	registry.load()
}
