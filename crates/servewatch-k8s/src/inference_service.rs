// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! InferenceService readiness, scheduling and smoke-test workflows.

use reqwest::Client;
use serde::Serialize;
use servewatch_poll::{ConditionPoller, ConditionSpec, FetchError, Gate, ReadinessCheck};
use tracing::{debug, info, instrument};

use crate::client::{ResourceClient, ResourceRef};
use crate::error::{K8sError, K8sResult};
use crate::types::{InferenceServiceState, Toleration};

/// Value of `activeModelState` once the model artifact is served.
pub const MODEL_LOADED: &str = "Loaded";

/// Input tensor name of the OpenVINO smoke-test model.
pub const TEST_INPUT_NAME: &str = "Func/StatefulPartitionedCall/input/_0:0";
const TEST_INPUT_LEN: usize = 30;

/// Gate on `activeModelState == Loaded` plus `LatestDeploymentReady` and
/// `Ready` both `True`.
pub fn inference_service_readiness(name: &str) -> ReadinessCheck<InferenceServiceState> {
	ReadinessCheck::new(format!("InferenceService {name}"))
		.with_gate(Gate::new(
			"Active Model State",
			MODEL_LOADED,
			|state: &InferenceServiceState| state.active_model_state().map(str::to_string),
		))
		.with_condition(ConditionSpec::status_equals(
			"LatestDeploymentReady",
			"True",
			"Latest Deployment Ready",
		))
		.with_condition(ConditionSpec::status_equals("Ready", "True", "Service Ready"))
}

async fn fetch_state<C: ResourceClient + ?Sized>(
	client: &C,
	resource: &ResourceRef,
) -> Result<Option<InferenceServiceState>, FetchError> {
	match client.get_json(resource).await {
		Ok(body) => serde_json::from_str(&body)
			.map(Some)
			.map_err(|e| FetchError::Malformed {
				resource: resource.to_string(),
				message: e.to_string(),
			}),
		Err(e) if e.is_not_found() => Ok(None),
		Err(e) => Err(FetchError::Unavailable {
			resource: resource.to_string(),
			message: e.to_string(),
		}),
	}
}

/// Waits until the InferenceService has loaded its model and reports ready.
///
/// A resource that does not exist yet counts as a pending attempt; an
/// unparseable document fails immediately.
#[instrument(skip(client, poller), fields(max_attempts = poller.config().max_attempts))]
pub async fn wait_for_inference_service_ready<C: ResourceClient + ?Sized>(
	client: &C,
	poller: &ConditionPoller,
	name: &str,
	namespace: Option<&str>,
) -> K8sResult<InferenceServiceState> {
	let resource = ResourceRef::inference_service(name).in_namespace(namespace);
	let check = inference_service_readiness(name);

	let resource = &resource;
	let state = poller
		.poll(&check, move || fetch_state(client, resource))
		.await?;

	info!(name, "InferenceService is loaded and ready");
	Ok(state)
}

async fn get_state<C: ResourceClient + ?Sized>(
	client: &C,
	resource: &ResourceRef,
) -> K8sResult<InferenceServiceState> {
	let body = client.get_json(resource).await?;
	serde_json::from_str(&body).map_err(|source| K8sError::InvalidJson {
		resource: resource.to_string(),
		source,
	})
}

/// Checks the predictor tolerations of an InferenceService.
///
/// With `Some(expected)` a toleration matching its key, operator and effect
/// must exist. With `None` the predictor must carry no tolerations at all.
#[instrument(skip(client, expected))]
pub async fn validate_tolerations<C: ResourceClient + ?Sized>(
	client: &C,
	namespace: &str,
	name: &str,
	expected: Option<&Toleration>,
) -> K8sResult<Vec<Toleration>> {
	let resource = ResourceRef::inference_service(name).in_namespace(Some(namespace));
	let state = match get_state(client, &resource).await {
		Err(e) if e.is_not_found() => {
			return Err(K8sError::validation(format!(
				"InferenceService \"{name}\" not found in namespace \"{namespace}\"."
			)))
		}
		other => other?,
	};

	let tolerations = state.tolerations().to_vec();
	debug!(count = tolerations.len(), tolerations = ?tolerations, "found tolerations");

	match expected {
		Some(expected) => {
			if !tolerations.iter().any(|t| t.matches(expected)) {
				return Err(K8sError::validation(format!(
					"Expected toleration {expected} not found in InferenceService \"{name}\".\nFound tolerations: {}",
					render_tolerations(&tolerations)
				)));
			}
			info!(name, toleration = %expected, "verified expected toleration exists");
		}
		None => {
			if !tolerations.is_empty() {
				return Err(K8sError::validation(format!(
					"Unexpected tolerations found in InferenceService \"{name}\":\n{}",
					render_tolerations(&tolerations)
				)));
			}
			info!(name, "no tolerations found, as expected");
		}
	}

	Ok(tolerations)
}

fn render_tolerations(tolerations: &[Toleration]) -> String {
	let items: Vec<String> = tolerations.iter().map(ToString::to_string).collect();
	format!("[{}]", items.join(", "))
}

/// Reads `status.url` of an InferenceService.
#[instrument(skip(client))]
pub async fn external_url<C: ResourceClient + ?Sized>(
	client: &C,
	name: &str,
	namespace: Option<&str>,
) -> K8sResult<String> {
	let resource = ResourceRef::inference_service(name).in_namespace(namespace);
	let state = get_state(client, &resource).await?;
	state
		.url()
		.map(str::to_string)
		.ok_or_else(|| K8sError::validation("External URL not found in InferenceService"))
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceInput {
	pub name: String,
	pub shape: Vec<usize>,
	pub datatype: String,
	pub data: Vec<f32>,
}

/// KServe v2 inference request body.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct InferenceRequest {
	pub inputs: Vec<InferenceInput>,
}

impl InferenceRequest {
	/// One FP32 row of `1..=30`, matching the smoke-test model's input.
	pub fn smoke_test() -> Self {
		Self {
			inputs: vec![InferenceInput {
				name: TEST_INPUT_NAME.to_string(),
				shape: vec![1, TEST_INPUT_LEN],
				datatype: "FP32".to_string(),
				data: (1..=TEST_INPUT_LEN).map(|i| i as f32).collect(),
			}],
		}
	}
}

/// Response of a smoke-test inference call; any status is returned as-is.
#[derive(Debug, Clone)]
pub struct InferenceProbe {
	pub url: String,
	pub status: u16,
	pub body: String,
}

pub fn infer_url(base_url: &str, model: &str) -> String {
	format!("{}/v2/models/{model}/infer", base_url.trim_end_matches('/'))
}

/// POSTs the smoke-test request to `{base_url}/v2/models/{model}/infer`.
#[instrument(skip(http))]
pub async fn send_test_inference(
	http: &Client,
	base_url: &str,
	model: &str,
) -> K8sResult<InferenceProbe> {
	let url = infer_url(base_url, model);
	let request = InferenceRequest::smoke_test();
	debug!(url = %url, method = "POST", "sending inference request");

	let response = http.post(&url).json(&request).send().await?;
	let status = response.status().as_u16();
	let body = response.text().await?;
	info!(url = %url, status, "inference response received");
	debug!(body = %body, "inference response body");

	Ok(InferenceProbe { url, status, body })
}

/// Resolves the external URL of `model` and sends the smoke-test request.
pub async fn test_external_inference<C: ResourceClient + ?Sized>(
	client: &C,
	http: &Client,
	model: &str,
	namespace: Option<&str>,
) -> K8sResult<InferenceProbe> {
	let base_url = external_url(client, model, namespace).await?;
	send_test_inference(http, &base_url, model).await
}
