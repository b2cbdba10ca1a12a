// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Provisioning a clean project for model serving.
//!
//! A project here is a dashboard-visible namespace plus an S3 data connection
//! secret the serving runtime can pull model artifacts from.

use base64::engine::general_purpose::STANDARD;
use base64::Engine;
use serde_json::{json, Value};
use tracing::{info, instrument};

use crate::client::{ResourceClient, ResourceRef};
use crate::error::K8sResult;

/// S3 bucket holding model artifacts.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct S3Bucket {
	pub name: String,
	pub region: String,
	pub endpoint: String,
}

/// Credentials written into the data connection secret.
#[derive(Clone, PartialEq, Eq)]
pub struct S3Credentials {
	pub access_key_id: String,
	pub secret_access_key: String,
}

impl std::fmt::Debug for S3Credentials {
	fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
		f.debug_struct("S3Credentials")
			.field("access_key_id", &"[REDACTED]")
			.field("secret_access_key", &"[REDACTED]")
			.finish()
	}
}

fn encode(value: &str) -> String {
	STANDARD.encode(value.as_bytes())
}

/// Namespace manifest labelled so the dashboard lists it as a project.
pub fn project_manifest(project: &str) -> Value {
	json!({
		"apiVersion": "v1",
		"kind": "Namespace",
		"metadata": {
			"name": project,
			"labels": {
				"opendatahub.io/dashboard": "true",
				"modelmesh-enabled": "false"
			}
		}
	})
}

/// S3 data connection secret with base64-encoded connection fields.
pub fn data_connection_manifest(
	project: &str,
	connection_name: &str,
	bucket: &S3Bucket,
	credentials: &S3Credentials,
) -> Value {
	json!({
		"apiVersion": "v1",
		"kind": "Secret",
		"type": "Opaque",
		"metadata": {
			"name": connection_name,
			"namespace": project,
			"labels": {
				"opendatahub.io/dashboard": "true",
				"opendatahub.io/managed": "true"
			},
			"annotations": {
				"opendatahub.io/connection-type": "s3",
				"openshift.io/display-name": connection_name
			}
		},
		"data": {
			"AWS_ACCESS_KEY_ID": encode(&credentials.access_key_id),
			"AWS_DEFAULT_REGION": encode(&bucket.region),
			"AWS_S3_BUCKET": encode(&bucket.name),
			"AWS_S3_ENDPOINT": encode(&bucket.endpoint),
			"AWS_SECRET_ACCESS_KEY": encode(&credentials.secret_access_key)
		}
	})
}

/// Recreates `project` from scratch and adds an S3 data connection to it.
#[instrument(skip(client, bucket, credentials), fields(bucket = %bucket.name))]
pub async fn provision_project_for_model_serving<C: ResourceClient + ?Sized>(
	client: &C,
	project: &str,
	connection_name: &str,
	bucket: &S3Bucket,
	credentials: &S3Credentials,
) -> K8sResult<()> {
	client.delete(&ResourceRef::new("namespace", project)).await?;
	client.apply_json(&project_manifest(project)).await?;
	info!(project, "created clean project");

	client
		.apply_json(&data_connection_manifest(
			project,
			connection_name,
			bucket,
			credentials,
		))
		.await?;
	info!(project, connection = connection_name, "created data connection");
	Ok(())
}

#[cfg(test)]
mod tests {
	use super::*;
	use crate::client::MockResourceClient;

	fn bucket() -> S3Bucket {
		S3Bucket {
			name: "models-bucket".to_string(),
			region: "us-east-1".to_string(),
			endpoint: "https://s3.us-east-1.amazonaws.com/".to_string(),
		}
	}

	fn credentials() -> S3Credentials {
		S3Credentials {
			access_key_id: "AKIAEXAMPLE".to_string(),
			secret_access_key: "shh".to_string(),
		}
	}

	#[test]
	fn secret_fields_are_base64() {
		let manifest =
			data_connection_manifest("models", "aws-connection", &bucket(), &credentials());
		assert_eq!(manifest["metadata"]["namespace"], "models");
		assert_eq!(manifest["data"]["AWS_S3_BUCKET"], encode("models-bucket"));
		assert_eq!(manifest["data"]["AWS_DEFAULT_REGION"], "dXMtZWFzdC0x");
		assert_eq!(manifest["data"]["AWS_SECRET_ACCESS_KEY"], "c2ho");
		assert_eq!(
			manifest["metadata"]["annotations"]["opendatahub.io/connection-type"],
			"s3"
		);
	}

	#[test]
	fn credentials_debug_is_redacted() {
		let rendered = format!("{:?}", credentials());
		assert!(!rendered.contains("shh"));
		assert!(!rendered.contains("AKIAEXAMPLE"));
	}

	#[tokio::test]
	async fn provisioning_deletes_then_applies() {
		let client = MockResourceClient::new();
		let (bucket, credentials) = (bucket(), credentials());
		provision_project_for_model_serving(
			&client,
			"models",
			"aws-connection",
			&bucket,
			&credentials,
		)
		.await
		.unwrap();

		assert_eq!(client.deleted(), vec![ResourceRef::new("namespace", "models")]);
		let applied = client.applied();
		assert_eq!(applied.len(), 2);
		assert_eq!(applied[0]["kind"], "Namespace");
		assert_eq!(applied[0]["metadata"]["labels"]["opendatahub.io/dashboard"], "true");
		assert_eq!(applied[1]["kind"], "Secret");
	}
}
