// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Fully resolved configuration.

use std::collections::{BTreeMap, BTreeSet};
use std::time::Duration;

use crate::layer::{BucketLayer, ConfigLayer};
use crate::secret::SecretString;
use crate::ConfigError;

pub const DEFAULT_CLI_BIN: &str = "oc";
pub const DEFAULT_MAX_ATTEMPTS: u32 = 96;
pub const DEFAULT_INTERVAL_MS: u64 = 5_000;
pub const DEFAULT_ACCEPTABLE_STATUS: [i32; 9] = [200, 201, 202, 204, 301, 302, 307, 308, 429];
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF_MS: u64 = 3_000;
pub const DEFAULT_REQUEST_TIMEOUT_SECS: u64 = 30;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ServewatchConfig {
	pub cluster: ClusterConfig,
	pub poll: PollSettings,
	pub links: LinkSettings,
	pub buckets: BucketSettings,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ClusterConfig {
	pub cli_bin: String,
	pub namespace: Option<String>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollSettings {
	pub max_attempts: u32,
	pub interval: Duration,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkSettings {
	pub acceptable_status: BTreeSet<i32>,
	pub max_retries: u32,
	pub retry_backoff: Duration,
	pub request_timeout: Duration,
	pub excluded_substrings: Vec<String>,
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct BucketConfig {
	pub name: String,
	pub region: String,
	pub endpoint: String,
}

#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct BucketSettings {
	pub access_key_id: Option<SecretString>,
	pub secret_access_key: Option<SecretString>,
	pub buckets: BTreeMap<String, BucketConfig>,
}

impl BucketSettings {
	pub fn get(&self, key: &str) -> Result<&BucketConfig, ConfigError> {
		self
			.buckets
			.get(key)
			.ok_or_else(|| ConfigError::BucketNotFound(key.to_string()))
	}

	/// Both credential halves, or an error naming the missing one.
	pub fn credentials(&self) -> Result<(&SecretString, &SecretString), ConfigError> {
		let access = self
			.access_key_id
			.as_ref()
			.ok_or_else(|| ConfigError::invalid_value("buckets.access_key_id", "not set"))?;
		let secret = self
			.secret_access_key
			.as_ref()
			.ok_or_else(|| ConfigError::invalid_value("buckets.secret_access_key", "not set"))?;
		Ok((access, secret))
	}
}

fn required<T>(value: Option<T>, field: &str) -> Result<T, ConfigError> {
	value.ok_or_else(|| ConfigError::invalid_value(field, "no value from any source"))
}

fn resolve_bucket(key: &str, layer: BucketLayer) -> Result<BucketConfig, ConfigError> {
	let field = |name: &str| format!("buckets.{key}.{name}");
	Ok(BucketConfig {
		name: required(layer.name, &field("name"))?,
		region: required(layer.region, &field("region"))?,
		endpoint: required(layer.endpoint, &field("endpoint"))?,
	})
}

impl ServewatchConfig {
	/// Resolve a merged layer, validating every field.
	pub fn from_layer(layer: ConfigLayer) -> Result<Self, ConfigError> {
		let cli_bin = required(layer.cluster.cli_bin, "cluster.cli_bin")?;
		if cli_bin.trim().is_empty() {
			return Err(ConfigError::invalid_value("cluster.cli_bin", "must not be empty"));
		}

		let max_attempts = required(layer.poll.max_attempts, "poll.max_attempts")?;
		if max_attempts == 0 {
			return Err(ConfigError::invalid_value("poll.max_attempts", "must be at least 1"));
		}
		let interval_ms = required(layer.poll.interval_ms, "poll.interval_ms")?;
		if interval_ms == 0 {
			return Err(ConfigError::invalid_value("poll.interval_ms", "must be at least 1"));
		}

		let acceptable_status: BTreeSet<i32> =
			required(layer.links.acceptable_status, "links.acceptable_status")?
				.into_iter()
				.collect();
		if acceptable_status.is_empty() {
			return Err(ConfigError::invalid_value(
				"links.acceptable_status",
				"must list at least one status",
			));
		}
		if let Some(bad) = acceptable_status.iter().find(|s| !(100..=599).contains(*s)) {
			return Err(ConfigError::invalid_value(
				"links.acceptable_status",
				format!("{bad} is not an HTTP status"),
			));
		}

		let buckets = layer
			.buckets
			.entries
			.into_iter()
			.map(|(key, bucket)| resolve_bucket(&key, bucket).map(|b| (key, b)))
			.collect::<Result<BTreeMap<_, _>, _>>()?;

		Ok(Self {
			cluster: ClusterConfig {
				cli_bin,
				namespace: layer.cluster.namespace.filter(|ns| !ns.is_empty()),
			},
			poll: PollSettings {
				max_attempts,
				interval: Duration::from_millis(interval_ms),
			},
			links: LinkSettings {
				acceptable_status,
				max_retries: required(layer.links.max_retries, "links.max_retries")?,
				retry_backoff: Duration::from_millis(required(
					layer.links.retry_backoff_ms,
					"links.retry_backoff_ms",
				)?),
				request_timeout: Duration::from_secs(required(
					layer.links.request_timeout_secs,
					"links.request_timeout_secs",
				)?),
				excluded_substrings: layer.links.excluded_substrings.unwrap_or_default(),
			},
			buckets: BucketSettings {
				access_key_id: layer.buckets.access_key_id,
				secret_access_key: layer.buckets.secret_access_key,
				buckets,
			},
		})
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::sources::{ConfigSource, DefaultsSource};

	fn defaults() -> ConfigLayer {
		DefaultsSource.load().unwrap()
	}

	#[test]
	fn defaults_resolve() {
		let config = ServewatchConfig::from_layer(defaults()).unwrap();
		assert_eq!(config.cluster.cli_bin, "oc");
		assert_eq!(config.poll.max_attempts, 96);
		assert_eq!(config.poll.interval, Duration::from_secs(5));
		assert_eq!(config.links.max_retries, 3);
		assert_eq!(config.links.retry_backoff, Duration::from_secs(3));
		assert!(config.links.acceptable_status.contains(&429));
		assert!(config.buckets.buckets.is_empty());
	}

	#[test]
	fn zero_attempts_is_rejected() {
		let mut layer = defaults();
		layer.poll.max_attempts = Some(0);
		let err = ServewatchConfig::from_layer(layer).unwrap_err();
		assert!(err.to_string().contains("poll.max_attempts"));
	}

	#[test]
	fn empty_acceptable_set_is_rejected() {
		let mut layer = defaults();
		layer.links.acceptable_status = Some(vec![]);
		assert!(ServewatchConfig::from_layer(layer).is_err());
	}

	#[test]
	fn negative_status_is_not_acceptable() {
		let mut layer = defaults();
		layer.links.acceptable_status = Some(vec![200, -1]);
		assert!(ServewatchConfig::from_layer(layer).is_err());
	}

	#[test]
	fn incomplete_bucket_names_missing_field() {
		let mut layer = defaults();
		layer.buckets.entries.insert(
			"B".to_string(),
			BucketLayer {
				name: Some("bucket".to_string()),
				region: None,
				endpoint: Some("https://s3".to_string()),
			},
		);
		let err = ServewatchConfig::from_layer(layer).unwrap_err();
		assert!(err.to_string().contains("buckets.B.region"));
	}

	#[test]
	fn missing_bucket_and_credentials_are_errors() {
		let config = ServewatchConfig::from_layer(defaults()).unwrap();
		assert!(matches!(
			config.buckets.get("NOPE"),
			Err(ConfigError::BucketNotFound(_))
		));
		assert!(config.buckets.credentials().is_err());
	}
}
