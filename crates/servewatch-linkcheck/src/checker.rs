// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Batch URL validation with rate-limit retry.

use std::collections::{BTreeSet, HashMap, HashSet};
use std::fmt;
use std::time::Duration;

use futures::future::join_all;
use tracing::{info, instrument, warn};

use crate::probe::{UrlCheck, UrlProber};

/// Statuses treated as a working link.
pub const DEFAULT_ACCEPTABLE_STATUS: [i32; 9] = [200, 201, 202, 204, 301, 302, 307, 308, 429];
pub const DEFAULT_MAX_RETRIES: u32 = 3;
pub const DEFAULT_RETRY_BACKOFF: Duration = Duration::from_secs(3);

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkCheckConfig {
	pub acceptable_status: BTreeSet<i32>,
	/// Extra rounds for URLs answering 429.
	pub max_retries: u32,
	pub retry_backoff: Duration,
}

impl Default for LinkCheckConfig {
	fn default() -> Self {
		Self {
			acceptable_status: DEFAULT_ACCEPTABLE_STATUS.into_iter().collect(),
			max_retries: DEFAULT_MAX_RETRIES,
			retry_backoff: DEFAULT_RETRY_BACKOFF,
		}
	}
}

/// Checks a batch of URLs concurrently.
///
/// Each round probes every pending URL at once and waits for all of them.
/// URLs answering 429 are probed again as a batch after a fixed backoff, at
/// most `max_retries` times. Any other failure is final.
pub struct LinkChecker<P> {
	prober: P,
	config: LinkCheckConfig,
}

impl<P: UrlProber> LinkChecker<P> {
	pub fn new(prober: P, config: LinkCheckConfig) -> Self {
		Self { prober, config }
	}

	pub fn config(&self) -> &LinkCheckConfig {
		&self.config
	}

	#[instrument(skip_all, fields(urls = urls.len(), max_retries = self.config.max_retries))]
	pub async fn check(&self, urls: &[String]) -> LinkReport {
		let mut seen: HashSet<&str> = HashSet::with_capacity(urls.len());
		let order: Vec<String> = urls
			.iter()
			.filter(|url| seen.insert(url.as_str()))
			.cloned()
			.collect();
		let mut latest: HashMap<String, UrlCheck> = HashMap::with_capacity(order.len());

		let mut pending = order.clone();
		let mut retries = 0u32;
		let mut rounds = 0u32;

		while !pending.is_empty() {
			rounds += 1;
			let results = join_all(pending.iter().map(|url| self.prober.probe(url))).await;

			let rate_limited: Vec<String> = results
				.iter()
				.filter(|check| check.is_rate_limited())
				.map(|check| check.url.clone())
				.collect();
			for check in results {
				latest.insert(check.url.clone(), check);
			}

			if rate_limited.is_empty() || retries >= self.config.max_retries {
				break;
			}

			retries += 1;
			warn!(
				count = rate_limited.len(),
				retry = retries,
				max_retries = self.config.max_retries,
				backoff_ms = self.config.retry_backoff.as_millis() as u64,
				"rate limited (429), waiting before retry"
			);
			tokio::time::sleep(self.config.retry_backoff).await;
			pending = rate_limited;
		}

		let results: Vec<UrlCheck> = order
			.into_iter()
			.filter_map(|url| latest.remove(&url))
			.collect();

		let report = LinkReport {
			results,
			acceptable_status: self.config.acceptable_status.clone(),
			rounds,
			retries,
		};
		info!(
			checked = report.results.len(),
			failed = report.failures().count(),
			rounds,
			"link check finished"
		);
		report
	}
}

/// Final status of every checked URL, in input order.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LinkReport {
	pub results: Vec<UrlCheck>,
	pub acceptable_status: BTreeSet<i32>,
	/// Probe rounds performed, including the first.
	pub rounds: u32,
	pub retries: u32,
}

impl LinkReport {
	pub fn is_acceptable(&self, check: &UrlCheck) -> bool {
		self.acceptable_status.contains(&check.status)
	}

	pub fn failures(&self) -> impl Iterator<Item = &UrlCheck> {
		self.results.iter().filter(|check| !self.is_acceptable(check))
	}

	pub fn all_passed(&self) -> bool {
		self.failures().next().is_none()
	}

	/// One human-readable line for `check`, tagged with its failure category.
	pub fn describe(&self, check: &UrlCheck) -> String {
		if self.is_acceptable(check) {
			return format!("✅ {} - Status: {}", check.url, check.status);
		}

		let mut line = match check.failure() {
			Some(failure) => format!("{failure} ❌ {} - Error Code: {}", check.url, check.status),
			None => format!(
				"❌ {} - Status: {} (Expected one of: {})",
				check.url,
				check.status,
				self.acceptable_list()
			),
		};
		if let Some(error) = &check.error {
			line.push_str(&format!(" (Details: {error})"));
		}
		line
	}

	fn acceptable_list(&self) -> String {
		self.acceptable_status
			.iter()
			.map(i32::to_string)
			.collect::<Vec<_>>()
			.join(", ")
	}
}

impl fmt::Display for LinkReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		let mut first = true;
		for check in &self.results {
			if !first {
				writeln!(f)?;
			}
			first = false;
			write!(f, "{}", self.describe(check))?;
		}
		Ok(())
	}
}
