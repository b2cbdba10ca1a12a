// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Outbound HTTP client identified by the servewatch User-Agent.

use reqwest::{Client, ClientBuilder};

/// Client used for inference smoke requests.
pub fn new_client() -> reqwest::Result<Client> {
	builder().build()
}

/// Builder with the servewatch User-Agent already set. The link prober
/// adds its own timeout and redirect policy on top.
pub fn builder() -> ClientBuilder {
	Client::builder().user_agent(user_agent())
}

/// `servewatch/{version} ({os}-{arch})`
pub fn user_agent() -> String {
	format!(
		"servewatch/{} ({}-{})",
		env!("CARGO_PKG_VERSION"),
		std::env::consts::OS,
		std::env::consts::ARCH
	)
}

#[cfg(test)]
mod tests {
	use super::*;

	#[test]
	fn user_agent_names_crate_and_platform() {
		let ua = user_agent();
		assert!(ua.starts_with(&format!("servewatch/{} (", env!("CARGO_PKG_VERSION"))));
		assert!(ua.contains(std::env::consts::ARCH));
		assert!(ua.ends_with(')'));
	}

	#[test]
	fn default_client_builds() {
		assert!(new_client().is_ok());
	}
}
