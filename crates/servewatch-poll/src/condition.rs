// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Conditions, condition checks and the readiness gate.

use std::fmt;
use std::sync::Arc;

use serde::{Deserialize, Serialize};

use crate::report::{AttemptReport, ConditionReport, GateReport};

/// Value reported for a gate whose field is absent or empty.
pub const EMPTY_VALUE: &str = "EMPTY";

/// A status condition as published on a Kubernetes-style resource.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ResourceCondition {
	#[serde(rename = "type")]
	pub kind: String,
	#[serde(default)]
	pub status: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub reason: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub message: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub last_transition_time: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub severity: Option<String>,
}

impl ResourceCondition {
	pub fn new(kind: impl Into<String>, status: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			status: status.into(),
			..Default::default()
		}
	}

	pub fn with_reason(mut self, reason: impl Into<String>) -> Self {
		self.reason = Some(reason.into());
		self
	}

	pub fn with_message(mut self, message: impl Into<String>) -> Self {
		self.message = Some(message.into());
		self
	}
}

/// A fetched snapshot that exposes its status conditions.
pub trait ObservedResource {
	fn conditions(&self) -> &[ResourceCondition];
}

type ConditionPredicate = Arc<dyn Fn(&ResourceCondition) -> bool + Send + Sync>;
type GateExtractor<S> = Arc<dyn Fn(&S) -> Option<String> + Send + Sync>;

/// A named predicate over the condition of a given `type`.
///
/// The condition is looked up by [`ConditionSpec::kind`]; when it is absent
/// the check fails without raising an error.
#[derive(Clone)]
pub struct ConditionSpec {
	pub kind: String,
	pub expected_status: String,
	pub name: String,
	predicate: ConditionPredicate,
}

impl ConditionSpec {
	pub fn new<F>(
		kind: impl Into<String>,
		expected_status: impl Into<String>,
		name: impl Into<String>,
		predicate: F,
	) -> Self
	where
		F: Fn(&ResourceCondition) -> bool + Send + Sync + 'static,
	{
		Self {
			kind: kind.into(),
			expected_status: expected_status.into(),
			name: name.into(),
			predicate: Arc::new(predicate),
		}
	}

	/// Passes when the condition of `kind` reports exactly `expected_status`.
	pub fn status_equals(
		kind: impl Into<String>,
		expected_status: impl Into<String>,
		name: impl Into<String>,
	) -> Self {
		let kind = kind.into();
		let expected_status = expected_status.into();
		let (want_kind, want_status) = (kind.clone(), expected_status.clone());
		Self::new(kind, expected_status, name, move |condition| {
			condition.kind == want_kind && condition.status == want_status
		})
	}

	pub fn find<'a>(&self, conditions: &'a [ResourceCondition]) -> Option<&'a ResourceCondition> {
		conditions.iter().find(|condition| condition.kind == self.kind)
	}

	pub fn evaluate(&self, conditions: &[ResourceCondition]) -> ConditionReport {
		let found = self.find(conditions);
		ConditionReport {
			name: self.name.clone(),
			kind: self.kind.clone(),
			expected_status: self.expected_status.clone(),
			found: found.is_some(),
			status: found.map(|c| c.status.clone()),
			reason: found.and_then(|c| c.reason.clone()),
			message: found.and_then(|c| c.message.clone()),
			passed: found.is_some_and(|c| (self.predicate)(c)),
		}
	}
}

impl fmt::Debug for ConditionSpec {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ConditionSpec")
			.field("kind", &self.kind)
			.field("expected_status", &self.expected_status)
			.field("name", &self.name)
			.finish_non_exhaustive()
	}
}

/// A non-condition check that must hold alongside the condition list, such as
/// "the active model state equals `Loaded`".
pub struct Gate<S> {
	pub name: String,
	pub expected: String,
	extract: GateExtractor<S>,
}

impl<S> Gate<S> {
	pub fn new<F>(name: impl Into<String>, expected: impl Into<String>, extract: F) -> Self
	where
		F: Fn(&S) -> Option<String> + Send + Sync + 'static,
	{
		Self {
			name: name.into(),
			expected: expected.into(),
			extract: Arc::new(extract),
		}
	}

	/// The observed value, or [`EMPTY_VALUE`] when absent, empty or not fetched.
	pub fn observe(&self, state: Option<&S>) -> String {
		state
			.and_then(|s| (self.extract)(s))
			.filter(|value| !value.is_empty())
			.unwrap_or_else(|| EMPTY_VALUE.to_string())
	}

	pub fn evaluate(&self, state: Option<&S>) -> GateReport {
		let observed = self.observe(state);
		GateReport {
			name: self.name.clone(),
			passed: observed == self.expected,
			expected: self.expected.clone(),
			observed,
		}
	}
}

impl<S> Clone for Gate<S> {
	fn clone(&self) -> Self {
		Self {
			name: self.name.clone(),
			expected: self.expected.clone(),
			extract: Arc::clone(&self.extract),
		}
	}
}

impl<S> fmt::Debug for Gate<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("Gate")
			.field("name", &self.name)
			.field("expected", &self.expected)
			.finish_non_exhaustive()
	}
}

/// Everything that must hold for a resource to count as ready.
pub struct ReadinessCheck<S> {
	pub description: String,
	pub gate: Option<Gate<S>>,
	pub conditions: Vec<ConditionSpec>,
}

impl<S> ReadinessCheck<S> {
	pub fn new(description: impl Into<String>) -> Self {
		Self {
			description: description.into(),
			gate: None,
			conditions: Vec::new(),
		}
	}

	pub fn with_gate(mut self, gate: Gate<S>) -> Self {
		self.gate = Some(gate);
		self
	}

	pub fn with_condition(mut self, condition: ConditionSpec) -> Self {
		self.conditions.push(condition);
		self
	}
}

impl<S: ObservedResource> ReadinessCheck<S> {
	/// Evaluates the gate and every condition against one fetched snapshot.
	///
	/// `None` stands for a resource that does not exist yet: the gate reads as
	/// [`EMPTY_VALUE`] and every condition is reported as not found.
	pub fn evaluate(&self, attempt: u32, state: Option<&S>) -> AttemptReport {
		let observed: &[ResourceCondition] = state.map(|s| s.conditions()).unwrap_or_default();

		AttemptReport {
			attempt,
			resource: self.description.clone(),
			resource_found: state.is_some(),
			gate: self.gate.as_ref().map(|gate| gate.evaluate(state)),
			conditions: self
				.conditions
				.iter()
				.map(|spec| spec.evaluate(observed))
				.collect(),
			observed_conditions: observed.to_vec(),
		}
	}
}

impl<S> Clone for ReadinessCheck<S> {
	fn clone(&self) -> Self {
		Self {
			description: self.description.clone(),
			gate: self.gate.clone(),
			conditions: self.conditions.clone(),
		}
	}
}

impl<S> fmt::Debug for ReadinessCheck<S> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.debug_struct("ReadinessCheck")
			.field("description", &self.description)
			.field("gate", &self.gate)
			.field("conditions", &self.conditions)
			.finish()
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	struct Phase {
		phase: Option<String>,
		conditions: Vec<ResourceCondition>,
	}

	impl ObservedResource for Phase {
		fn conditions(&self) -> &[ResourceCondition] {
			&self.conditions
		}
	}

	fn phase_gate() -> Gate<Phase> {
		Gate::new("Phase", "Running", |p: &Phase| p.phase.clone())
	}

	#[test]
	fn status_equals_requires_matching_status() {
		let spec = ConditionSpec::status_equals("Ready", "True", "Service Ready");
		let conditions = [ResourceCondition::new("Ready", "False").with_reason("Pending")];
		let report = spec.evaluate(&conditions);
		assert!(report.found);
		assert!(!report.passed);
		assert_eq!(report.status.as_deref(), Some("False"));
		assert_eq!(report.reason.as_deref(), Some("Pending"));
	}

	#[test]
	fn absent_condition_fails_without_error() {
		let spec = ConditionSpec::status_equals("Ready", "True", "Service Ready");
		let report = spec.evaluate(&[ResourceCondition::new("Other", "True")]);
		assert!(!report.found);
		assert!(!report.passed);
		assert_eq!(report.status, None);
	}

	#[test]
	fn custom_predicate_sees_found_condition() {
		let spec = ConditionSpec::new("Ready", "True", "lenient", |c| {
			c.status.eq_ignore_ascii_case("true")
		});
		assert!(spec.evaluate(&[ResourceCondition::new("Ready", "TRUE")]).passed);
	}

	#[test]
	fn gate_reports_empty_for_missing_value() {
		let gate = phase_gate();
		let state = Phase {
			phase: Some(String::new()),
			conditions: vec![],
		};
		assert_eq!(gate.observe(Some(&state)), EMPTY_VALUE);
		assert_eq!(gate.observe(None), EMPTY_VALUE);
		assert!(!gate.evaluate(None).passed);
	}

	#[test]
	fn evaluate_without_state_marks_everything_not_found() {
		let check = ReadinessCheck::new("pod/web")
			.with_gate(phase_gate())
			.with_condition(ConditionSpec::status_equals("Ready", "True", "Ready"));

		let report = check.evaluate(3, None);
		assert_eq!(report.attempt, 3);
		assert!(!report.resource_found);
		assert!(!report.passed());
		assert!(report.conditions.iter().all(|c| !c.found));
	}

	#[test]
	fn evaluate_passes_when_gate_and_conditions_hold() {
		let check = ReadinessCheck::new("pod/web")
			.with_gate(phase_gate())
			.with_condition(ConditionSpec::status_equals("Ready", "True", "Ready"));
		let state = Phase {
			phase: Some("Running".to_string()),
			conditions: vec![ResourceCondition::new("Ready", "True")],
		};

		assert!(check.evaluate(1, Some(&state)).passed());
	}

	#[test]
	fn condition_deserializes_from_kubernetes_shape() {
		let condition: ResourceCondition = serde_json::from_value(serde_json::json!({
			"type": "Ready",
			"status": "True",
			"lastTransitionTime": "2025-01-01T00:00:00Z",
			"severity": "Info"
		}))
		.unwrap();
		assert_eq!(condition.kind, "Ready");
		assert_eq!(condition.last_transition_time.as_deref(), Some("2025-01-01T00:00:00Z"));
		assert_eq!(condition.severity.as_deref(), Some("Info"));
		assert_eq!(condition.reason, None);
	}
}
