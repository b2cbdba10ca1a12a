// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Progress reporting hooks for the poller.
//!
//! Observers only see what happened; they cannot change the outcome of a poll.

use tracing::{debug, error, info, warn};

use crate::error::FetchError;
use crate::report::AttemptReport;

pub trait PollObserver: Send + Sync {
	/// Called once per completed attempt, before any sleep.
	fn on_attempt(&self, report: &AttemptReport);

	fn on_success(&self, _report: &AttemptReport) {}

	fn on_timeout(&self, _report: &AttemptReport) {}

	fn on_fetch_error(&self, _attempt: u32, _error: &FetchError) {}
}

/// Emits structured `tracing` events for every attempt.
#[derive(Debug, Clone, Copy, Default)]
pub struct TracingObserver;

impl PollObserver for TracingObserver {
	fn on_attempt(&self, report: &AttemptReport) {
		info!(
			resource = %report.resource,
			attempt = report.attempt,
			found = report.resource_found,
			gate = report.gate.as_ref().map(|g| g.observed.as_str()).unwrap_or("-"),
			total_conditions = report.observed_conditions.len(),
			"checking resource state"
		);

		if let Some(gate) = &report.gate {
			debug!(
				check = %gate.name,
				observed = %gate.observed,
				expected = %gate.expected,
				passed = gate.passed,
				"gate check"
			);
		}

		for check in &report.conditions {
			debug!(
				check = %check.name,
				kind = %check.kind,
				expected = %check.expected_status,
				found = check.found,
				status = %check.observed_status(),
				reason = check.reason.as_deref().unwrap_or_default(),
				passed = check.passed,
				"condition check"
			);
		}
	}

	fn on_success(&self, report: &AttemptReport) {
		info!(
			resource = %report.resource,
			attempts = report.attempt,
			"resource meets all conditions"
		);
	}

	fn on_timeout(&self, report: &AttemptReport) {
		error!(
			resource = %report.resource,
			attempts = report.attempt,
			failing = report.failing().count(),
			"resource did not meet all conditions"
		);
	}

	fn on_fetch_error(&self, attempt: u32, error: &FetchError) {
		warn!(attempt, error = %error, "fetch failed, giving up");
	}
}

/// Discards every event.
#[derive(Debug, Clone, Copy, Default)]
pub struct NoopObserver;

impl PollObserver for NoopObserver {
	fn on_attempt(&self, _report: &AttemptReport) {}
}
