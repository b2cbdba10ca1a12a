// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! XDG Base Directory compliant path resolution.

use std::path::PathBuf;

use crate::ConfigError;

const APP_DIR: &str = "servewatch";
const CONFIG_FILE: &str = "config.toml";

/// Resolved config file locations.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PathsConfig {
	/// User config file: ~/.config/servewatch/config.toml
	pub user_config_file: PathBuf,
	/// System config file: /etc/servewatch/config.toml
	pub system_config_file: PathBuf,
}

/// Resolve config paths, honouring `XDG_CONFIG_HOME` when set.
pub fn resolve_xdg_paths() -> Result<PathsConfig, ConfigError> {
	let config_home = match std::env::var_os("XDG_CONFIG_HOME") {
		Some(dir) if !dir.is_empty() => PathBuf::from(dir),
		_ => dirs::home_dir()
			.ok_or(ConfigError::HomeDirNotFound)?
			.join(".config"),
	};

	tracing::debug!(config_home = %config_home.display(), "resolved XDG config home");

	Ok(PathsConfig {
		user_config_file: config_home.join(APP_DIR).join(CONFIG_FILE),
		system_config_file: PathBuf::from("/etc").join(APP_DIR).join(CONFIG_FILE),
	})
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_config_lives_under_servewatch() {
		let paths = resolve_xdg_paths().unwrap();
		assert!(paths
			.user_config_file
			.to_string_lossy()
			.ends_with("servewatch/config.toml"));
	}

	#[test]
	fn system_config_is_etc() {
		let paths = resolve_xdg_paths().unwrap();
		assert_eq!(
			paths.system_config_file,
			PathBuf::from("/etc/servewatch/config.toml")
		);
	}
}
