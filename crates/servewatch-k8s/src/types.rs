// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! The subset of the KServe `InferenceService` document that servewatch reads.

use std::fmt;

use serde::{Deserialize, Serialize};
use servewatch_poll::{ObservedResource, ResourceCondition};

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceState {
	#[serde(default)]
	pub metadata: ObjectMeta,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub spec: Option<InferenceServiceSpec>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub status: Option<InferenceServiceStatus>,
}

impl InferenceServiceState {
	/// `status.modelStatus.states.activeModelState`, if published.
	pub fn active_model_state(&self) -> Option<&str> {
		self.status
			.as_ref()?
			.model_status
			.as_ref()?
			.states
			.as_ref()?
			.active_model_state
			.as_deref()
	}

	/// `status.url`, ignoring empty strings.
	pub fn url(&self) -> Option<&str> {
		self.status
			.as_ref()?
			.url
			.as_deref()
			.filter(|url| !url.is_empty())
	}

	/// `spec.predictor.tolerations`, empty when absent.
	pub fn tolerations(&self) -> &[Toleration] {
		self.spec
			.as_ref()
			.and_then(|spec| spec.predictor.as_ref())
			.map(|predictor| predictor.tolerations.as_slice())
			.unwrap_or_default()
	}
}

impl ObservedResource for InferenceServiceState {
	fn conditions(&self) -> &[ResourceCondition] {
		self.status
			.as_ref()
			.map(|status| status.conditions.as_slice())
			.unwrap_or_default()
	}
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ObjectMeta {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub name: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub namespace: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct InferenceServiceSpec {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub predictor: Option<PredictorSpec>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct PredictorSpec {
	#[serde(default)]
	pub tolerations: Vec<Toleration>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct InferenceServiceStatus {
	#[serde(default)]
	pub conditions: Vec<ResourceCondition>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub model_status: Option<ModelStatus>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub url: Option<String>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
pub struct ModelStatus {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub states: Option<ModelStates>,
}

#[derive(Clone, Debug, Default, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ModelStates {
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub active_model_state: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub target_model_state: Option<String>,
}

/// A pod scheduling toleration.
#[derive(Clone, Debug, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Toleration {
	#[serde(default)]
	pub key: String,
	#[serde(default)]
	pub operator: String,
	#[serde(default)]
	pub effect: String,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub value: Option<String>,
	#[serde(default, skip_serializing_if = "Option::is_none")]
	pub toleration_seconds: Option<i64>,
}

impl Toleration {
	pub fn new(
		key: impl Into<String>,
		operator: impl Into<String>,
		effect: impl Into<String>,
	) -> Self {
		Self {
			key: key.into(),
			operator: operator.into(),
			effect: effect.into(),
			..Default::default()
		}
	}

	/// Matches on key, operator and effect; value and seconds are ignored.
	pub fn matches(&self, other: &Toleration) -> bool {
		self.key == other.key && self.operator == other.operator && self.effect == other.effect
	}
}

impl fmt::Display for Toleration {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(
			f,
			"{{key: {}, operator: {}, effect: {}}}",
			self.key, self.operator, self.effect
		)
	}
}
