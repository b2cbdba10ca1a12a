// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

use std::collections::VecDeque;
use std::fmt;
use std::sync::{Arc, Mutex};

use async_trait::async_trait;

use crate::error::{K8sError, K8sResult};

/// Identifies one namespaced (or cluster-scoped) resource.
#[derive(Clone, Debug, PartialEq, Eq)]
pub struct ResourceRef {
	pub kind: String,
	pub name: String,
	pub namespace: Option<String>,
}

impl ResourceRef {
	pub fn new(kind: impl Into<String>, name: impl Into<String>) -> Self {
		Self {
			kind: kind.into(),
			name: name.into(),
			namespace: None,
		}
	}

	pub fn inference_service(name: impl Into<String>) -> Self {
		Self::new("inferenceService", name)
	}

	pub fn in_namespace(mut self, namespace: Option<impl Into<String>>) -> Self {
		self.namespace = namespace.map(Into::into);
		self
	}
}

impl fmt::Display for ResourceRef {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		write!(f, "{}/{}", self.kind, self.name)?;
		if let Some(ns) = &self.namespace {
			write!(f, " in namespace {ns}")?;
		}
		Ok(())
	}
}

/// Trait abstracting cluster access for testability.
#[async_trait]
pub trait ResourceClient: Send + Sync {
	/// Fetch the raw JSON document of a resource.
	///
	/// Returns [`K8sError::NotFound`] when the cluster reports the resource
	/// does not exist.
	async fn get_json(&self, resource: &ResourceRef) -> K8sResult<String>;

	/// Create or update the given manifest.
	async fn apply_json(&self, manifest: &serde_json::Value) -> K8sResult<()>;

	/// Delete a resource, succeeding if it is already gone.
	async fn delete(&self, resource: &ResourceRef) -> K8sResult<()>;
}

/// A mock client returning queued responses in FIFO order.
///
/// Once the queue is drained, `get_json` falls back to the default document
/// (if one is set) or reports the resource as not found.
#[derive(Debug, Clone, Default)]
pub struct MockResourceClient {
	responses: Arc<Mutex<VecDeque<K8sResult<String>>>>,
	fallback: Arc<Mutex<Option<String>>>,
	applied: Arc<Mutex<Vec<serde_json::Value>>>,
	deleted: Arc<Mutex<Vec<ResourceRef>>>,
	gets: Arc<Mutex<u32>>,
}

impl MockResourceClient {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn push_json(&self, body: impl Into<String>) {
		self.responses.lock().unwrap().push_back(Ok(body.into()));
	}

	pub fn push_error(&self, error: K8sError) {
		self.responses.lock().unwrap().push_back(Err(error));
	}

	pub fn set_fallback_json(&self, body: impl Into<String>) {
		*self.fallback.lock().unwrap() = Some(body.into());
	}

	/// Manifests passed to `apply_json`, oldest first.
	pub fn applied(&self) -> Vec<serde_json::Value> {
		self.applied.lock().unwrap().clone()
	}

	pub fn deleted(&self) -> Vec<ResourceRef> {
		self.deleted.lock().unwrap().clone()
	}

	pub fn get_count(&self) -> u32 {
		*self.gets.lock().unwrap()
	}
}

#[async_trait]
impl ResourceClient for MockResourceClient {
	async fn get_json(&self, resource: &ResourceRef) -> K8sResult<String> {
		*self.gets.lock().unwrap() += 1;
		if let Some(response) = self.responses.lock().unwrap().pop_front() {
			return response;
		}
		match self.fallback.lock().unwrap().clone() {
			Some(body) => Ok(body),
			None => Err(K8sError::NotFound {
				resource: resource.to_string(),
			}),
		}
	}

	async fn apply_json(&self, manifest: &serde_json::Value) -> K8sResult<()> {
		self.applied.lock().unwrap().push(manifest.clone());
		Ok(())
	}

	async fn delete(&self, resource: &ResourceRef) -> K8sResult<()> {
		self.deleted.lock().unwrap().push(resource.clone());
		Ok(())
	}
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn resource_ref_display_includes_namespace() {
		let r = ResourceRef::inference_service("demo").in_namespace(Some("models"));
		assert_eq!(r.to_string(), "inferenceService/demo in namespace models");

		let r = ResourceRef::new("namespace", "models").in_namespace(None::<String>);
		assert_eq!(r.to_string(), "namespace/models");
	}

	#[tokio::test]
	async fn mock_returns_queue_then_fallback() {
		let client = MockResourceClient::new();
		let r = ResourceRef::inference_service("demo");
		client.push_json("{\"a\":1}");
		client.push_error(K8sError::validation("boom"));

		assert_eq!(client.get_json(&r).await.unwrap(), "{\"a\":1}");
		assert!(client.get_json(&r).await.is_err());
		assert!(client.get_json(&r).await.unwrap_err().is_not_found());

		client.set_fallback_json("{}");
		assert_eq!(client.get_json(&r).await.unwrap(), "{}");
		assert_eq!(client.get_count(), 4);
	}
}
