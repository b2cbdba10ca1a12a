// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Per-attempt evaluation reports.

use std::fmt;

use serde::Serialize;

use crate::condition::ResourceCondition;

/// Status shown for a condition that is absent from the resource.
pub const NOT_FOUND: &str = "not found";

#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct GateReport {
	pub name: String,
	pub expected: String,
	pub observed: String,
	pub passed: bool,
}

/// Outcome of one [`ConditionSpec`](crate::ConditionSpec) against one snapshot.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct ConditionReport {
	pub name: String,
	pub kind: String,
	pub expected_status: String,
	pub found: bool,
	pub status: Option<String>,
	pub reason: Option<String>,
	pub message: Option<String>,
	pub passed: bool,
}

impl ConditionReport {
	pub fn observed_status(&self) -> &str {
		match &self.status {
			Some(status) if self.found => status,
			_ => NOT_FOUND,
		}
	}

	/// Human-readable reason for the pass/fail verdict.
	pub fn explanation(&self) -> String {
		if !self.found {
			return format!("condition {} {NOT_FOUND}", self.kind);
		}
		let status = self.observed_status();
		let mut text = if self.passed {
			format!("status {status} matches {}", self.expected_status)
		} else {
			format!("status {status}, expected {}", self.expected_status)
		};
		if let Some(reason) = self.reason.as_deref().filter(|r| !r.is_empty()) {
			text.push_str(&format!(" (reason: {reason})"));
		}
		text
	}
}

/// Everything observed during a single poll attempt.
#[derive(Clone, Debug, PartialEq, Eq, Serialize)]
pub struct AttemptReport {
	pub attempt: u32,
	pub resource: String,
	pub resource_found: bool,
	pub gate: Option<GateReport>,
	pub conditions: Vec<ConditionReport>,
	pub observed_conditions: Vec<ResourceCondition>,
}

impl AttemptReport {
	/// True when the resource exists, the gate holds and every condition passes.
	pub fn passed(&self) -> bool {
		self.resource_found
			&& self.gate.as_ref().map_or(true, |gate| gate.passed)
			&& self.conditions.iter().all(|c| c.passed)
	}

	pub fn failing(&self) -> impl Iterator<Item = &ConditionReport> {
		self.conditions.iter().filter(|c| !c.passed)
	}

	pub fn condition(&self, kind: &str) -> Option<&ConditionReport> {
		self.conditions.iter().find(|c| c.kind == kind)
	}
}

fn mark(passed: bool) -> &'static str {
	if passed {
		"✅"
	} else {
		"❌"
	}
}

impl fmt::Display for AttemptReport {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		if let Some(gate) = &self.gate {
			writeln!(f, "{}: {} {}", gate.name, gate.observed, mark(gate.passed))?;
		}
		writeln!(f, "Condition Checks:")?;
		for check in &self.conditions {
			writeln!(
				f,
				"  {}: {} (Status: {}) {}",
				check.name,
				mark(check.passed),
				check.observed_status(),
				check.explanation()
			)?;
		}
		write!(f, "Full Condition Details:")?;
		if self.observed_conditions.is_empty() {
			write!(f, "\n  (none)")?;
		}
		for condition in &self.observed_conditions {
			write!(
				f,
				"\n  Type: {}, Status: {}, Reason: {}, Message: {}",
				condition.kind,
				condition.status,
				condition.reason.as_deref().unwrap_or_default(),
				condition.message.as_deref().unwrap_or_default()
			)?;
		}
		Ok(())
	}
}
