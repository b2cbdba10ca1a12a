// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Configuration sources, each producing one [`ConfigLayer`].

use std::collections::HashMap;
use std::path::PathBuf;
use std::str::FromStr;

use crate::layer::{BucketLayer, ConfigLayer};
use crate::paths::PathsConfig;
use crate::runtime::{
	DEFAULT_CLI_BIN, DEFAULT_INTERVAL_MS, DEFAULT_MAX_ATTEMPTS, DEFAULT_MAX_RETRIES,
	DEFAULT_REQUEST_TIMEOUT_SECS, DEFAULT_RETRY_BACKOFF_MS,
};
use crate::ConfigError;

pub const ENV_PREFIX: &str = "SERVEWATCH_";

/// Order in which layers are applied; higher wins.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub enum Precedence {
	Defaults,
	SystemFile,
	UserFile,
	Environment,
	Cli,
}

pub trait ConfigSource: Send + Sync {
	fn name(&self) -> &str;
	fn precedence(&self) -> Precedence;
	fn load(&self) -> Result<ConfigLayer, ConfigError>;
}

/// Built-in defaults.
pub struct DefaultsSource;

impl ConfigSource for DefaultsSource {
	fn name(&self) -> &str {
		"defaults"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Defaults
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let mut layer = ConfigLayer::default();
		layer.cluster.cli_bin = Some(DEFAULT_CLI_BIN.to_string());
		layer.poll.max_attempts = Some(DEFAULT_MAX_ATTEMPTS);
		layer.poll.interval_ms = Some(DEFAULT_INTERVAL_MS);
		layer.links.acceptable_status = Some(crate::runtime::DEFAULT_ACCEPTABLE_STATUS.to_vec());
		layer.links.max_retries = Some(DEFAULT_MAX_RETRIES);
		layer.links.retry_backoff_ms = Some(DEFAULT_RETRY_BACKOFF_MS);
		layer.links.request_timeout_secs = Some(DEFAULT_REQUEST_TIMEOUT_SECS);
		layer.links.excluded_substrings = Some(Vec::new());
		Ok(layer)
	}
}

/// A TOML config file. Optional files that do not exist yield an empty layer.
pub struct FileSource {
	path: PathBuf,
	precedence: Precedence,
	required: bool,
}

impl FileSource {
	pub fn system(paths: &PathsConfig) -> Self {
		Self {
			path: paths.system_config_file.clone(),
			precedence: Precedence::SystemFile,
			required: false,
		}
	}

	pub fn user(paths: &PathsConfig) -> Self {
		Self {
			path: paths.user_config_file.clone(),
			precedence: Precedence::UserFile,
			required: false,
		}
	}

	/// A file named on the command line; it must exist.
	pub fn explicit(path: impl Into<PathBuf>) -> Self {
		Self {
			path: path.into(),
			precedence: Precedence::UserFile,
			required: true,
		}
	}
}

impl ConfigSource for FileSource {
	fn name(&self) -> &str {
		"file"
	}

	fn precedence(&self) -> Precedence {
		self.precedence
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let content = match std::fs::read_to_string(&self.path) {
			Ok(content) => content,
			Err(e) if e.kind() == std::io::ErrorKind::NotFound && !self.required => {
				tracing::trace!(path = %self.path.display(), "config file absent, skipping");
				return Ok(ConfigLayer::default());
			}
			Err(source) => {
				return Err(ConfigError::Io {
					path: self.path.clone(),
					source,
				})
			}
		};

		tracing::debug!(path = %self.path.display(), "loading config file");
		toml::from_str(&content).map_err(|source| ConfigError::TomlParse {
			path: self.path.clone(),
			source,
		})
	}
}

/// `SERVEWATCH_*` environment variables.
///
/// Lists are comma separated. Buckets are read from
/// `SERVEWATCH_BUCKET_<KEY>_{NAME,REGION,ENDPOINT}`.
pub struct EnvSource {
	vars: Option<HashMap<String, String>>,
}

impl EnvSource {
	/// Reads the process environment at load time.
	pub fn process() -> Self {
		Self { vars: None }
	}

	/// Reads from a fixed set of variables instead of the process environment.
	pub fn from_vars<I, K, V>(vars: I) -> Self
	where
		I: IntoIterator<Item = (K, V)>,
		K: Into<String>,
		V: Into<String>,
	{
		Self {
			vars: Some(vars.into_iter().map(|(k, v)| (k.into(), v.into())).collect()),
		}
	}

	fn snapshot(&self) -> HashMap<String, String> {
		match &self.vars {
			Some(vars) => vars.clone(),
			None => std::env::vars()
				.filter(|(k, _)| k.starts_with(ENV_PREFIX))
				.collect(),
		}
	}
}

fn parse_var<T: FromStr>(
	vars: &HashMap<String, String>,
	suffix: &str,
) -> Result<Option<T>, ConfigError>
where
	T::Err: std::fmt::Display,
{
	let var = format!("{ENV_PREFIX}{suffix}");
	match vars.get(&var) {
		None => Ok(None),
		Some(raw) => raw
			.trim()
			.parse()
			.map(Some)
			.map_err(|e| ConfigError::env(var, format!("{e}"))),
	}
}

fn parse_list<T: FromStr>(
	vars: &HashMap<String, String>,
	suffix: &str,
) -> Result<Option<Vec<T>>, ConfigError>
where
	T::Err: std::fmt::Display,
{
	let var = format!("{ENV_PREFIX}{suffix}");
	let Some(raw) = vars.get(&var) else {
		return Ok(None);
	};
	raw.split(',')
		.map(str::trim)
		.filter(|item| !item.is_empty())
		.map(|item| item.parse().map_err(|e| ConfigError::env(&var, format!("{item}: {e}"))))
		.collect::<Result<Vec<_>, _>>()
		.map(Some)
}

impl ConfigSource for EnvSource {
	fn name(&self) -> &str {
		"environment"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Environment
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let vars = self.snapshot();
		let mut layer = ConfigLayer::default();

		layer.cluster.cli_bin = parse_var(&vars, "CLI_BIN")?;
		layer.cluster.namespace = parse_var(&vars, "NAMESPACE")?;
		layer.poll.max_attempts = parse_var(&vars, "POLL_MAX_ATTEMPTS")?;
		layer.poll.interval_ms = parse_var(&vars, "POLL_INTERVAL_MS")?;
		layer.links.acceptable_status = parse_list(&vars, "LINKS_ACCEPTABLE_STATUS")?;
		layer.links.max_retries = parse_var(&vars, "LINKS_MAX_RETRIES")?;
		layer.links.retry_backoff_ms = parse_var(&vars, "LINKS_RETRY_BACKOFF_MS")?;
		layer.links.request_timeout_secs = parse_var(&vars, "LINKS_REQUEST_TIMEOUT_SECS")?;
		layer.links.excluded_substrings = parse_list(&vars, "LINKS_EXCLUDED_SUBSTRINGS")?;
		layer.buckets.access_key_id =
			parse_var::<String>(&vars, "AWS_ACCESS_KEY_ID")?.map(Into::into);
		layer.buckets.secret_access_key =
			parse_var::<String>(&vars, "AWS_SECRET_ACCESS_KEY")?.map(Into::into);

		let bucket_prefix = format!("{ENV_PREFIX}BUCKET_");
		for (var, value) in &vars {
			let Some(rest) = var.strip_prefix(&bucket_prefix) else {
				continue;
			};
			let Some((key, field)) = rest.rsplit_once('_') else {
				continue;
			};
			if key.is_empty() {
				continue;
			}
			let entry: &mut BucketLayer = layer.buckets.entries.entry(key.to_string()).or_default();
			match field {
				"NAME" => entry.name = Some(value.clone()),
				"REGION" => entry.region = Some(value.clone()),
				"ENDPOINT" => entry.endpoint = Some(value.clone()),
				_ => {
					return Err(ConfigError::env(
						var,
						"expected suffix _NAME, _REGION or _ENDPOINT",
					))
				}
			}
		}

		Ok(layer)
	}
}

/// Overrides taken from command-line flags.
#[derive(Debug, Clone, Default)]
pub struct CliOverrides {
	pub cli_bin: Option<String>,
	pub namespace: Option<String>,
	pub max_attempts: Option<u32>,
	pub interval_ms: Option<u64>,
	pub excluded_substrings: Vec<String>,
}

pub struct CliSource {
	overrides: CliOverrides,
}

impl CliSource {
	pub fn new(overrides: CliOverrides) -> Self {
		Self { overrides }
	}
}

impl ConfigSource for CliSource {
	fn name(&self) -> &str {
		"cli"
	}

	fn precedence(&self) -> Precedence {
		Precedence::Cli
	}

	fn load(&self) -> Result<ConfigLayer, ConfigError> {
		let cli = &self.overrides;
		let mut layer = ConfigLayer::default();
		layer.cluster.cli_bin = cli.cli_bin.clone();
		layer.cluster.namespace = cli.namespace.clone();
		layer.poll.max_attempts = cli.max_attempts;
		layer.poll.interval_ms = cli.interval_ms;
		if !cli.excluded_substrings.is_empty() {
			layer.links.excluded_substrings = Some(cli.excluded_substrings.clone());
		}
		Ok(layer)
	}
}
