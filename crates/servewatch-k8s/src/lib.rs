// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Cluster access and InferenceService workflows for servewatch.
//!
//! Cluster state is read by shelling out to `oc`/`kubectl` behind the
//! [`ResourceClient`] trait, so every workflow can run against
//! [`MockResourceClient`] in tests.

pub mod client;
pub mod command_client;
pub mod error;
pub mod inference_service;
pub mod provision;
pub mod types;

pub use client::{MockResourceClient, ResourceClient, ResourceRef};
pub use command_client::{CommandResourceClient, DEFAULT_CLI_BIN};
pub use error::{K8sError, K8sResult};
pub use inference_service::{
	external_url, inference_service_readiness, send_test_inference, test_external_inference,
	validate_tolerations, wait_for_inference_service_ready, InferenceProbe, InferenceRequest,
	MODEL_LOADED,
};
pub use provision::{provision_project_for_model_serving, S3Bucket, S3Credentials};
pub use types::{InferenceServiceState, Toleration};
