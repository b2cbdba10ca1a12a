// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Subcommand handlers.

use std::path::Path;
use std::process::ExitCode;

use anyhow::{Context, Result};
use servewatch_config::ServewatchConfig;
use servewatch_k8s::{
	provision_project_for_model_serving, test_external_inference, validate_tolerations,
	wait_for_inference_service_ready, CommandResourceClient, S3Bucket, S3Credentials, Toleration,
};
use servewatch_linkcheck::{
	extract_https_urls, filter_excluded, HttpUrlProber, LinkCheckConfig, LinkChecker,
};
use servewatch_poll::{ConditionPoller, PollConfig};
use tracing::{info, warn};

use crate::cli::{Command, ExpectedToleration};

pub async fn run(command: Command, config: ServewatchConfig) -> Result<ExitCode> {
	let client = CommandResourceClient::new(&config.cluster.cli_bin);
	let namespace = config.cluster.namespace.as_deref();

	match command {
		Command::WaitReady { name, .. } => {
			let poller = ConditionPoller::new(poll_config(&config));
			let state = wait_for_inference_service_ready(&client, &poller, &name, namespace)
				.await
				.with_context(|| format!("InferenceService {name} never became ready"))?;
			println!(
				"InferenceService {name} is ready (url: {})",
				state.url().unwrap_or("none")
			);
		}
		Command::Tolerations { name, expected, .. } => {
			let namespace =
				namespace.context("tolerations requires a namespace (-n or SERVEWATCH_NAMESPACE)")?;
			let expected = expected_toleration(&expected);
			let found = validate_tolerations(&client, namespace, &name, expected.as_ref()).await?;
			println!("{} toleration(s) on {name}: OK", found.len());
		}
		Command::Infer { name, .. } => {
			let http = servewatch_common_http::new_client().context("failed to build HTTP client")?;
			let probe = test_external_inference(&client, &http, &name, namespace).await?;
			println!("POST {} -> {}", probe.url, probe.status);
			println!("{}", probe.body);
			if !(200..300).contains(&probe.status) {
				warn!(status = probe.status, "inference request was not successful");
				return Ok(ExitCode::FAILURE);
			}
		}
		Command::Provision {
			project,
			bucket,
			connection,
		} => {
			let bucket_config = config.buckets.get(&bucket)?;
			let (access_key_id, secret_access_key) = config.buckets.credentials()?;
			let bucket = S3Bucket {
				name: bucket_config.name.clone(),
				region: bucket_config.region.clone(),
				endpoint: bucket_config.endpoint.clone(),
			};
			let credentials = S3Credentials {
				access_key_id: access_key_id.expose().clone(),
				secret_access_key: secret_access_key.expose().clone(),
			};
			provision_project_for_model_serving(
				&client,
				&project,
				&connection,
				&bucket,
				&credentials,
			)
			.await
				.with_context(|| format!("failed to provision project {project}"))?;
			println!("Project {project} provisioned with data connection {connection}");
		}
		Command::CheckLinks { dir, .. } => return check_links(&dir, &config).await,
	}

	Ok(ExitCode::SUCCESS)
}

fn poll_config(config: &ServewatchConfig) -> PollConfig {
	PollConfig::new(config.poll.max_attempts, config.poll.interval)
}

fn expected_toleration(expected: &ExpectedToleration) -> Option<Toleration> {
	if expected.none {
		return None;
	}
	Some(Toleration::new(
		expected.key.clone().unwrap_or_default(),
		expected.operator.clone().unwrap_or_default(),
		expected.effect.clone().unwrap_or_default(),
	))
}

async fn check_links(dir: &Path, config: &ServewatchConfig) -> Result<ExitCode> {
	let urls = extract_https_urls(dir)?;
	let total = urls.len();
	let urls = filter_excluded(urls, &config.links.excluded_substrings);
	info!(
		dir = %dir.display(),
		found = total,
		excluded = total - urls.len(),
		checking = urls.len(),
		"validating manifest links"
	);

	let prober = HttpUrlProber::new(config.links.request_timeout)?;
	let checker = LinkChecker::new(
		prober,
		LinkCheckConfig {
			acceptable_status: config.links.acceptable_status.clone(),
			max_retries: config.links.max_retries,
			retry_backoff: config.links.retry_backoff,
		},
	);
	let report = checker.check(&urls).await;

	println!("{report}");
	let failed = report.failures().count();
	if failed > 0 {
		println!("\n{failed} of {} links failed", report.results.len());
		return Ok(ExitCode::FAILURE);
	}
	println!("\nAll {} links passed", report.results.len());
	Ok(ExitCode::SUCCESS)
}
