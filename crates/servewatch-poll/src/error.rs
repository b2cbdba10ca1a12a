// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::fmt;
use std::time::Duration;

use thiserror::Error;

use crate::report::AttemptReport;

/// Errors raised by a fetch. These end the poll immediately and are never
/// retried.
#[derive(Error, Debug, Clone, PartialEq, Eq)]
pub enum FetchError {
	#[error("Failed to parse {resource} payload: {message}")]
	Malformed { resource: String, message: String },

	#[error("Failed to fetch {resource}: {message}")]
	Unavailable { resource: String, message: String },
}

/// The attempt budget ran out before the resource became ready.
#[derive(Debug)]
pub struct PollTimeoutError<S> {
	pub attempts: u32,
	pub budget: Duration,
	/// Report of the final attempt.
	pub report: AttemptReport,
	/// Most recent snapshot that was actually fetched.
	pub last_state: Option<S>,
}

impl<S> fmt::Display for PollTimeoutError<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		writeln!(
			f,
			"{} did not meet all conditions within {}s ({} attempts)",
			self.report.resource,
			self.budget.as_secs(),
			self.attempts
		)?;
		write!(f, "{}", self.report)
	}
}

impl<S: fmt::Debug> std::error::Error for PollTimeoutError<S> {}

/// Terminal failure of [`ConditionPoller::poll`](crate::ConditionPoller::poll).
#[derive(Debug)]
pub enum PollError<S> {
	Fetch {
		source: FetchError,
		attempt: u32,
		last_state: Option<S>,
	},
	Timeout(Box<PollTimeoutError<S>>),
}

impl<S> PollError<S> {
	pub fn is_timeout(&self) -> bool {
		matches!(self, PollError::Timeout(_))
	}

	/// Number of fetches performed before giving up.
	pub fn attempts(&self) -> u32 {
		match self {
			PollError::Fetch { attempt, .. } => *attempt,
			PollError::Timeout(timeout) => timeout.attempts,
		}
	}

	pub fn report(&self) -> Option<&AttemptReport> {
		match self {
			PollError::Fetch { .. } => None,
			PollError::Timeout(timeout) => Some(&timeout.report),
		}
	}

	pub fn last_state(&self) -> Option<&S> {
		match self {
			PollError::Fetch { last_state, .. } => last_state.as_ref(),
			PollError::Timeout(timeout) => timeout.last_state.as_ref(),
		}
	}
}

impl<S> fmt::Display for PollError<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		match self {
			PollError::Fetch {
				source, attempt, ..
			} => write!(f, "Attempt {attempt}: {source}"),
			PollError::Timeout(timeout) => fmt::Display::fmt(timeout, f),
		}
	}
}

impl<S: fmt::Debug> std::error::Error for PollError<S> {
	fn source(&self) -> Option<&(dyn std::error::Error + 'static)> {
		match self {
			PollError::Fetch { source, .. } => Some(source),
			PollError::Timeout(_) => None,
		}
	}
}
