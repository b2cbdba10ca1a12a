// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Validation of external links found in deployment manifests.
//!
//! URLs are extracted from a manifest tree, filtered against an exclusion
//! list, then probed concurrently by a [`LinkChecker`]. Rate-limited URLs are
//! retried as a batch.

pub mod checker;
pub mod error;
pub mod extract;
pub mod probe;

pub use checker::{
	LinkCheckConfig, LinkChecker, LinkReport, DEFAULT_ACCEPTABLE_STATUS, DEFAULT_MAX_RETRIES,
	DEFAULT_RETRY_BACKOFF,
};
pub use error::LinkCheckError;
pub use extract::{extract_https_urls, extract_urls, filter_excluded, is_url_excluded};
pub use probe::{HttpUrlProber, ProbeFailure, UrlCheck, UrlProber, DEFAULT_REQUEST_TIMEOUT};
