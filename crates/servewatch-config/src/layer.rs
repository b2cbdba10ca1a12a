// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Partial configuration produced by a single source.
//!
//! Every field is optional. Layers are merged in precedence order and a set
//! field in a later layer replaces the earlier value.

use std::collections::BTreeMap;

use serde::Deserialize;

use crate::secret::SecretString;

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ConfigLayer {
	pub cluster: ClusterLayer,
	pub poll: PollLayer,
	pub links: LinksLayer,
	pub buckets: BucketsLayer,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct ClusterLayer {
	pub cli_bin: Option<String>,
	pub namespace: Option<String>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct PollLayer {
	pub max_attempts: Option<u32>,
	pub interval_ms: Option<u64>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct LinksLayer {
	pub acceptable_status: Option<Vec<i32>>,
	pub max_retries: Option<u32>,
	pub retry_backoff_ms: Option<u64>,
	pub request_timeout_secs: Option<u64>,
	pub excluded_substrings: Option<Vec<String>>,
}

/// `[buckets]` holds the shared credentials; each `[buckets.<KEY>]` sub-table
/// names one bucket.
#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default)]
pub struct BucketsLayer {
	pub access_key_id: Option<SecretString>,
	pub secret_access_key: Option<SecretString>,
	#[serde(flatten)]
	pub entries: BTreeMap<String, BucketLayer>,
}

#[derive(Debug, Clone, Default, PartialEq, Eq, Deserialize)]
#[serde(default, deny_unknown_fields)]
pub struct BucketLayer {
	pub name: Option<String>,
	pub region: Option<String>,
	pub endpoint: Option<String>,
}

fn overlay<T>(base: &mut Option<T>, other: Option<T>) {
	if other.is_some() {
		*base = other;
	}
}

impl ConfigLayer {
	/// Merge `other` on top of `self`.
	pub fn merge(&mut self, other: ConfigLayer) {
		overlay(&mut self.cluster.cli_bin, other.cluster.cli_bin);
		overlay(&mut self.cluster.namespace, other.cluster.namespace);

		overlay(&mut self.poll.max_attempts, other.poll.max_attempts);
		overlay(&mut self.poll.interval_ms, other.poll.interval_ms);

		overlay(&mut self.links.acceptable_status, other.links.acceptable_status);
		overlay(&mut self.links.max_retries, other.links.max_retries);
		overlay(&mut self.links.retry_backoff_ms, other.links.retry_backoff_ms);
		overlay(
			&mut self.links.request_timeout_secs,
			other.links.request_timeout_secs,
		);
		overlay(
			&mut self.links.excluded_substrings,
			other.links.excluded_substrings,
		);

		overlay(&mut self.buckets.access_key_id, other.buckets.access_key_id);
		overlay(
			&mut self.buckets.secret_access_key,
			other.buckets.secret_access_key,
		);
		for (key, bucket) in other.buckets.entries {
			let entry = self.buckets.entries.entry(key).or_default();
			overlay(&mut entry.name, bucket.name);
			overlay(&mut entry.region, bucket.region);
			overlay(&mut entry.endpoint, bucket.endpoint);
		}
	}
}
