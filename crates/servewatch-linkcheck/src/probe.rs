// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Probing a single URL.

use std::fmt;
use std::time::Duration;

use async_trait::async_trait;
use reqwest::{redirect, Client};
use tracing::{debug, trace};

use crate::error::LinkCheckError;

pub const TOO_MANY_REQUESTS: i32 = 429;
pub const DEFAULT_REQUEST_TIMEOUT: Duration = Duration::from_secs(30);
pub const DEFAULT_MAX_REDIRECTS: usize = 10;

/// Synthetic negative status codes for requests that produced no HTTP status.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ProbeFailure {
	Timeout,
	RedirectMax,
	RedirectInvalid,
	Aborted,
	NetworkError,
}

impl ProbeFailure {
	pub const ALL: [ProbeFailure; 5] = [
		ProbeFailure::Timeout,
		ProbeFailure::RedirectMax,
		ProbeFailure::RedirectInvalid,
		ProbeFailure::Aborted,
		ProbeFailure::NetworkError,
	];

	pub fn code(self) -> i32 {
		match self {
			ProbeFailure::Timeout => -1,
			ProbeFailure::RedirectMax => -2,
			ProbeFailure::RedirectInvalid => -3,
			ProbeFailure::Aborted => -4,
			ProbeFailure::NetworkError => -5,
		}
	}

	pub fn from_code(code: i32) -> Option<Self> {
		Self::ALL.into_iter().find(|failure| failure.code() == code)
	}

	pub fn label(self) -> &'static str {
		match self {
			ProbeFailure::Timeout => "TIMEOUT",
			ProbeFailure::RedirectMax => "REDIRECT_MAX",
			ProbeFailure::RedirectInvalid => "REDIRECT_INVALID",
			ProbeFailure::Aborted => "ABORTED",
			ProbeFailure::NetworkError => "NETWORK_ERROR",
		}
	}
}

impl fmt::Display for ProbeFailure {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(self.label())
	}
}

/// Result of probing one URL: an HTTP status or a [`ProbeFailure`] code.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct UrlCheck {
	pub url: String,
	pub status: i32,
	pub error: Option<String>,
}

impl UrlCheck {
	pub fn status(url: impl Into<String>, status: i32) -> Self {
		Self {
			url: url.into(),
			status,
			error: None,
		}
	}

	pub fn failed(url: impl Into<String>, failure: ProbeFailure, error: impl Into<String>) -> Self {
		Self {
			url: url.into(),
			status: failure.code(),
			error: Some(error.into()),
		}
	}

	pub fn is_rate_limited(&self) -> bool {
		self.status == TOO_MANY_REQUESTS
	}

	pub fn failure(&self) -> Option<ProbeFailure> {
		ProbeFailure::from_code(self.status)
	}
}

#[async_trait]
pub trait UrlProber: Send + Sync {
	/// Probes `url`. Never fails: problems are encoded in the returned status.
	async fn probe(&self, url: &str) -> UrlCheck;
}

/// Why a redirect was refused.
#[derive(Debug, thiserror::Error)]
enum RedirectRefusal {
	#[error("more than {0} redirects")]
	TooMany(usize),
	#[error("redirect to unsupported location {0}")]
	UnsupportedTarget(String),
}

fn redirect_policy(max: usize) -> redirect::Policy {
	redirect::Policy::custom(move |attempt| {
		if attempt.previous().len() > max {
			return attempt.error(RedirectRefusal::TooMany(max));
		}
		match attempt.url().scheme() {
			"http" | "https" => attempt.follow(),
			_ => {
				let target = attempt.url().to_string();
				attempt.error(RedirectRefusal::UnsupportedTarget(target))
			}
		}
	})
}

/// Probes URLs with a GET request, following up to
/// [`DEFAULT_MAX_REDIRECTS`] redirects and reading the whole body.
///
/// A 3xx that is still the final response means the redirect could not be
/// followed (missing or unparseable `Location`) and is reported as
/// [`ProbeFailure::RedirectInvalid`].
#[derive(Debug, Clone)]
pub struct HttpUrlProber {
	client: Client,
}

impl HttpUrlProber {
	pub fn new(timeout: Duration) -> Result<Self, LinkCheckError> {
		let client = servewatch_common_http::builder()
			.timeout(timeout)
			.redirect(redirect_policy(DEFAULT_MAX_REDIRECTS))
			.build()?;
		Ok(Self { client })
	}
}

fn refusal(error: &reqwest::Error) -> Option<&RedirectRefusal> {
	let mut source = std::error::Error::source(error);
	while let Some(err) = source {
		if let Some(refusal) = err.downcast_ref::<RedirectRefusal>() {
			return Some(refusal);
		}
		source = err.source();
	}
	None
}

/// Maps an error from `send()` onto the failure taxonomy.
fn classify_send(error: &reqwest::Error) -> ProbeFailure {
	if error.is_timeout() {
		ProbeFailure::Timeout
	} else if error.is_redirect() {
		match refusal(error) {
			Some(RedirectRefusal::TooMany(_)) => ProbeFailure::RedirectMax,
			_ => ProbeFailure::RedirectInvalid,
		}
	} else {
		ProbeFailure::NetworkError
	}
}

/// Maps an error while reading the body; the status line already arrived.
fn classify_body(error: &reqwest::Error) -> ProbeFailure {
	if error.is_timeout() {
		ProbeFailure::Timeout
	} else {
		ProbeFailure::Aborted
	}
}

/// The error with its source chain, outermost first.
fn detail(error: &reqwest::Error) -> String {
	let mut text = error.to_string();
	let mut source = std::error::Error::source(error);
	while let Some(err) = source {
		text.push_str(": ");
		text.push_str(&err.to_string());
		source = err.source();
	}
	text
}

#[async_trait]
impl UrlProber for HttpUrlProber {
	async fn probe(&self, url: &str) -> UrlCheck {
		trace!(url, "probing");
		let response = match self.client.get(url).send().await {
			Ok(response) => response,
			Err(e) => {
				let failure = classify_send(&e);
				debug!(url, failure = %failure, error = %e, "probe failed");
				return UrlCheck::failed(url, failure, detail(&e));
			}
		};

		let status = response.status();
		if status.is_redirection() {
			let location = response
				.headers()
				.get(reqwest::header::LOCATION)
				.map(|value| String::from_utf8_lossy(value.as_bytes()).into_owned());
			debug!(url, status = status.as_u16(), location = ?location, "redirect not followed");
			let reason = match location {
				Some(location) => format!("{status} with unusable Location {location:?}"),
				None => format!("{status} without a Location header"),
			};
			return UrlCheck::failed(url, ProbeFailure::RedirectInvalid, reason);
		}

		if let Err(e) = response.bytes().await {
			let failure = classify_body(&e);
			debug!(url, failure = %failure, error = %e, "body read failed");
			return UrlCheck::failed(url, failure, detail(&e));
		}

		let status = i32::from(status.as_u16());
		debug!(url, status, "probe completed");
		UrlCheck::status(url, status)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use wiremock::matchers::{method, path};
	use wiremock::{Mock, MockServer, ResponseTemplate};

	#[test]
	fn failure_codes_round_trip() {
		for failure in ProbeFailure::ALL {
			assert_eq!(ProbeFailure::from_code(failure.code()), Some(failure));
			assert!(failure.code() < 0);
		}
		assert_eq!(ProbeFailure::from_code(404), None);
		assert_eq!(ProbeFailure::NetworkError.to_string(), "NETWORK_ERROR");
	}

	#[test]
	fn rate_limit_detection() {
		assert!(UrlCheck::status("https://a", 429).is_rate_limited());
		assert!(!UrlCheck::status("https://a", 200).is_rate_limited());
		assert_eq!(
			UrlCheck::failed("https://a", ProbeFailure::Timeout, "slow").failure(),
			Some(ProbeFailure::Timeout)
		);
	}

	#[tokio::test]
	async fn reports_http_status() {
		let server = MockServer::start().await;
		Mock::given(method("GET"))
			.and(path("/ok"))
			.respond_with(ResponseTemplate::new(200))
			.mount(&server)
			.await;
		Mock::given(method("GET"))
			.and(path("/gone"))
			.respond_with(ResponseTemplate::new(404))
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		assert_eq!(prober.probe(&format!("{}/ok", server.uri())).await.status, 200);
		assert_eq!(prober.probe(&format!("{}/gone", server.uri())).await.status, 404);
	}

	#[tokio::test]
	async fn follows_redirects_to_final_status() {
		let server = MockServer::start().await;
		Mock::given(path("/old"))
			.respond_with(ResponseTemplate::new(301).insert_header("Location", "/new"))
			.mount(&server)
			.await;
		Mock::given(path("/new"))
			.respond_with(ResponseTemplate::new(204))
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		assert_eq!(prober.probe(&format!("{}/old", server.uri())).await.status, 204);
	}

	#[tokio::test]
	async fn redirect_loop_is_redirect_max() {
		let server = MockServer::start().await;
		Mock::given(path("/loop"))
			.respond_with(ResponseTemplate::new(302).insert_header("Location", "/loop"))
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		let check = prober.probe(&format!("{}/loop", server.uri())).await;
		assert_eq!(check.failure(), Some(ProbeFailure::RedirectMax));
		assert!(check.error.is_some());
	}

	/// Test: a redirect that cannot be followed is REDIRECT_INVALID, not a pass.
	///
	/// Why this test is important: 301 and 302 are acceptable statuses, so a
	/// redirect with a missing or broken target would otherwise be reported as a
	/// working link.
	#[tokio::test]
	async fn unfollowable_redirects_are_redirect_invalid() {
		let server = MockServer::start().await;
		Mock::given(path("/no-location"))
			.respond_with(ResponseTemplate::new(301))
			.mount(&server)
			.await;
		Mock::given(path("/bad-location"))
			.respond_with(ResponseTemplate::new(302).insert_header("Location", "http://[::1"))
			.mount(&server)
			.await;
		Mock::given(path("/ftp"))
			.respond_with(
				ResponseTemplate::new(302).insert_header("Location", "ftp://files.example.com/a"),
			)
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		for route in ["/no-location", "/bad-location", "/ftp"] {
			let check = prober.probe(&format!("{}{route}", server.uri())).await;
			assert_eq!(check.failure(), Some(ProbeFailure::RedirectInvalid), "{route}");
			assert!(check.error.is_some(), "{route}");
		}
	}

	#[tokio::test]
	async fn missing_location_fails_the_link_check() {
		let server = MockServer::start().await;
		Mock::given(path("/moved"))
			.respond_with(ResponseTemplate::new(301))
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		let checker = crate::LinkChecker::new(prober, crate::LinkCheckConfig::default());
		let report = checker.check(&[format!("{}/moved", server.uri())]).await;

		assert!(!report.all_passed());
		let line = report.to_string();
		assert!(line.starts_with("REDIRECT_INVALID ❌"), "{line}");
		assert!(line.contains("Error Code: -3"), "{line}");
	}

	/// Test: a body cut off before its declared length is ABORTED.
	///
	/// Why this test is important: the status line alone looks healthy, so
	/// only reading the body reveals that the server dropped the response.
	#[tokio::test]
	async fn truncated_body_is_aborted() {
		use tokio::io::{AsyncReadExt, AsyncWriteExt};

		let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
		let addr = listener.local_addr().unwrap();
		let server = tokio::spawn(async move {
			let (mut socket, _) = listener.accept().await.unwrap();
			let mut request = [0u8; 1024];
			let _ = socket.read(&mut request).await.unwrap();
			socket
				.write_all(b"HTTP/1.1 200 OK\r\nContent-Length: 100\r\n\r\nshort")
				.await
				.unwrap();
			socket.shutdown().await.unwrap();
		});

		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		let check = prober.probe(&format!("http://{addr}/")).await;
		server.await.unwrap();

		assert_eq!(check.failure(), Some(ProbeFailure::Aborted));
		assert_eq!(check.status, -4);
	}

	#[tokio::test]
	async fn slow_response_is_timeout() {
		let server = MockServer::start().await;
		Mock::given(path("/slow"))
			.respond_with(ResponseTemplate::new(200).set_delay(Duration::from_secs(3)))
			.mount(&server)
			.await;

		let prober = HttpUrlProber::new(Duration::from_millis(200)).unwrap();
		let check = prober.probe(&format!("{}/slow", server.uri())).await;
		assert_eq!(check.status, ProbeFailure::Timeout.code());
	}

	#[tokio::test]
	async fn refused_connection_is_network_error() {
		let prober = HttpUrlProber::new(Duration::from_secs(5)).unwrap();
		// Bind then drop a listener to get a port nothing is listening on.
		let port = {
			let listener = std::net::TcpListener::bind("127.0.0.1:0").unwrap();
			listener.local_addr().unwrap().port()
		};
		let check = prober.probe(&format!("http://127.0.0.1:{port}/")).await;
		assert_eq!(check.failure(), Some(ProbeFailure::NetworkError));
	}
}
