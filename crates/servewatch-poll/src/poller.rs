// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The bounded polling loop.

use std::future::Future;
use std::sync::Arc;
use std::time::Duration;

use tracing::{instrument, trace};

use crate::condition::{ObservedResource, ReadinessCheck};
use crate::error::{FetchError, PollError, PollTimeoutError};
use crate::observer::{PollObserver, TracingObserver};
use crate::report::AttemptReport;

/// 8 minutes at the default interval.
pub const DEFAULT_MAX_ATTEMPTS: u32 = 96;
pub const DEFAULT_INTERVAL: Duration = Duration::from_millis(5000);

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct PollConfig {
	pub max_attempts: u32,
	pub interval: Duration,
}

impl PollConfig {
	pub fn new(max_attempts: u32, interval: Duration) -> Self {
		Self {
			max_attempts,
			interval,
		}
	}

	/// Upper bound on the total time spent sleeping.
	pub fn budget(&self) -> Duration {
		self.interval.saturating_mul(self.max_attempts)
	}
}

impl Default for PollConfig {
	fn default() -> Self {
		Self::new(DEFAULT_MAX_ATTEMPTS, DEFAULT_INTERVAL)
	}
}

/// Result of evaluating a single fetch.
#[derive(Debug)]
pub enum PollOutcome<S> {
	Success {
		state: S,
		report: AttemptReport,
	},
	Pending {
		state: Option<S>,
		report: AttemptReport,
	},
	Failure {
		reason: FetchError,
	},
}

impl<S: ObservedResource> PollOutcome<S> {
	/// Classifies one fetch result. `Ok(None)` means the resource does not
	/// exist yet and is always pending.
	pub fn assess(
		check: &ReadinessCheck<S>,
		attempt: u32,
		fetched: Result<Option<S>, FetchError>,
	) -> Self {
		let state = match fetched {
			Ok(state) => state,
			Err(reason) => return PollOutcome::Failure { reason },
		};

		let report = check.evaluate(attempt, state.as_ref());
		match state {
			Some(state) if report.passed() => PollOutcome::Success { state, report },
			state => PollOutcome::Pending { state, report },
		}
	}
}

/// Repeatedly fetches a resource until a [`ReadinessCheck`] holds or the
/// attempt budget is exhausted.
///
/// Attempts run strictly in sequence on the calling task and the poller only
/// sleeps between attempts, so the total wait never exceeds
/// [`PollConfig::budget`].
#[derive(Clone)]
pub struct ConditionPoller {
	config: PollConfig,
	observer: Arc<dyn PollObserver>,
}

impl ConditionPoller {
	pub fn new(config: PollConfig) -> Self {
		Self {
			config,
			observer: Arc::new(TracingObserver),
		}
	}

	pub fn with_observer(mut self, observer: Arc<dyn PollObserver>) -> Self {
		self.observer = observer;
		self
	}

	pub fn config(&self) -> &PollConfig {
		&self.config
	}

	/// Polls `fetch` until `check` passes.
	///
	/// A fetch error ends the poll on the spot. `Ok(None)` from `fetch` counts
	/// as an attempt where nothing was found.
	#[instrument(skip_all, fields(resource = %check.description, max_attempts = self.config.max_attempts))]
	pub async fn poll<S, F, Fut>(
		&self,
		check: &ReadinessCheck<S>,
		mut fetch: F,
	) -> Result<S, PollError<S>>
	where
		S: ObservedResource,
		F: FnMut() -> Fut,
		Fut: Future<Output = Result<Option<S>, FetchError>>,
	{
		let mut attempts: u32 = 0;
		let mut last_state: Option<S> = None;

		loop {
			let fetched = fetch().await;
			attempts += 1;

			match PollOutcome::assess(check, attempts, fetched) {
				PollOutcome::Success { state, report } => {
					self.observer.on_attempt(&report);
					self.observer.on_success(&report);
					return Ok(state);
				}
				PollOutcome::Failure { reason } => {
					self.observer.on_fetch_error(attempts, &reason);
					return Err(PollError::Fetch {
						source: reason,
						attempt: attempts,
						last_state,
					});
				}
				PollOutcome::Pending { state, report } => {
					self.observer.on_attempt(&report);
					if state.is_some() {
						last_state = state;
					}

					if attempts >= self.config.max_attempts {
						self.observer.on_timeout(&report);
						return Err(PollError::Timeout(Box::new(PollTimeoutError {
							attempts,
							budget: self.config.budget(),
							report,
							last_state,
						})));
					}
				}
			}

			trace!(
				attempt = attempts,
				interval_ms = self.config.interval.as_millis() as u64,
				"waiting before next attempt"
			);
			tokio::time::sleep(self.config.interval).await;
		}
	}
}

impl Default for ConditionPoller {
	fn default() -> Self {
		Self::new(PollConfig::default())
	}
}

#[cfg(test)]
mod tests {
	use std::sync::atomic::{AtomicU32, Ordering};
	use std::sync::Mutex;

	use super::*;
	use crate::condition::{ConditionSpec, Gate, ResourceCondition};
	use crate::report::NOT_FOUND;

	#[derive(Debug, Clone, PartialEq)]
	struct Model {
		active: Option<String>,
		conditions: Vec<ResourceCondition>,
	}

	impl ObservedResource for Model {
		fn conditions(&self) -> &[ResourceCondition] {
			&self.conditions
		}
	}

	fn check() -> ReadinessCheck<Model> {
		ReadinessCheck::new("inferenceService/demo")
			.with_gate(Gate::new("Active Model State", "Loaded", |m: &Model| {
				m.active.clone()
			}))
			.with_condition(ConditionSpec::status_equals(
				"LatestDeploymentReady",
				"True",
				"Latest Deployment Ready",
			))
			.with_condition(ConditionSpec::status_equals("Ready", "True", "Service Ready"))
	}

	fn ready() -> Model {
		Model {
			active: Some("Loaded".to_string()),
			conditions: vec![
				ResourceCondition::new("Ready", "True"),
				ResourceCondition::new("LatestDeploymentReady", "True"),
			],
		}
	}

	fn empty() -> Model {
		Model {
			active: None,
			conditions: vec![],
		}
	}

	#[derive(Default)]
	struct Recorder {
		attempts: Mutex<Vec<u32>>,
		timeouts: AtomicU32,
	}

	impl PollObserver for Recorder {
		fn on_attempt(&self, report: &AttemptReport) {
			self.attempts.lock().unwrap().push(report.attempt);
		}

		fn on_timeout(&self, _report: &AttemptReport) {
			self.timeouts.fetch_add(1, Ordering::SeqCst);
		}
	}

	#[test]
	fn budget_is_attempts_times_interval() {
		let config = PollConfig::default();
		assert_eq!(config.budget(), Duration::from_secs(480));
	}

	#[test]
	fn assess_without_state_is_pending() {
		let outcome = PollOutcome::assess(&check(), 1, Ok(None));
		match outcome {
			PollOutcome::Pending { state, report } => {
				assert!(state.is_none());
				assert!(report.conditions.iter().all(|c| c.observed_status() == NOT_FOUND));
			}
			other => panic!("expected pending, got {other:?}"),
		}
	}

	#[tokio::test(start_paused = true)]
	async fn succeeds_on_first_attempt_without_sleeping() {
		let poller = ConditionPoller::new(PollConfig::default());
		let start = tokio::time::Instant::now();
		let calls = AtomicU32::new(0);

		let state = poller
			.poll(&check(), || {
				calls.fetch_add(1, Ordering::SeqCst);
				async { Ok(Some(ready())) }
			})
			.await
			.unwrap();

		assert_eq!(state, ready());
		assert_eq!(calls.load(Ordering::SeqCst), 1);
		assert_eq!(start.elapsed(), Duration::ZERO);
	}

	#[tokio::test(start_paused = true)]
	async fn becomes_ready_after_pending_attempts() {
		let recorder = Arc::new(Recorder::default());
		let poller = ConditionPoller::new(PollConfig::new(10, Duration::from_secs(5)))
			.with_observer(recorder.clone());
		let calls = AtomicU32::new(0);

		let result = poller
			.poll(&check(), || {
				let n = calls.fetch_add(1, Ordering::SeqCst);
				async move {
					Ok(match n {
						0 => None,
						1 => Some(empty()),
						_ => Some(ready()),
					})
				}
			})
			.await;

		assert!(result.is_ok());
		assert_eq!(*recorder.attempts.lock().unwrap(), vec![1, 2, 3]);
	}

	#[tokio::test(start_paused = true)]
	async fn fetch_error_is_not_retried() {
		let poller = ConditionPoller::new(PollConfig::new(10, Duration::from_secs(5)));
		let calls = AtomicU32::new(0);

		let err = poller
			.poll(&check(), || {
				let n = calls.fetch_add(1, Ordering::SeqCst);
				async move {
					if n == 0 {
						Ok(Some(empty()))
					} else {
						Err(FetchError::Malformed {
							resource: "inferenceService/demo".to_string(),
							message: "expected value at line 1 column 1".to_string(),
						})
					}
				}
			})
			.await
			.unwrap_err();

		assert_eq!(calls.load(Ordering::SeqCst), 2);
		assert!(!err.is_timeout());
		assert_eq!(err.attempts(), 2);
		assert_eq!(err.last_state(), Some(&empty()));
		assert!(err.to_string().contains("Failed to parse"));
	}

	#[tokio::test(start_paused = true)]
	async fn times_out_after_exactly_max_attempts() {
		let recorder = Arc::new(Recorder::default());
		let config = PollConfig::new(4, Duration::from_secs(5));
		let poller = ConditionPoller::new(config).with_observer(recorder.clone());
		let start = tokio::time::Instant::now();

		let err = poller
			.poll(&check(), || async { Ok(Some(empty())) })
			.await
			.unwrap_err();

		assert!(err.is_timeout());
		assert_eq!(err.attempts(), 4);
		assert_eq!(recorder.attempts.lock().unwrap().len(), 4);
		assert_eq!(recorder.timeouts.load(Ordering::SeqCst), 1);
		assert!(start.elapsed() <= config.budget());
		assert_eq!(start.elapsed(), Duration::from_secs(15));
	}
}
