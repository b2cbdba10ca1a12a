// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Pulling HTTPS URLs out of a directory of manifests.

use std::collections::BTreeSet;
use std::path::Path;
use std::sync::LazyLock;

use regex::Regex;
use tracing::{debug, trace};
use walkdir::WalkDir;

use crate::error::LinkCheckError;

static HTTPS_URL: LazyLock<Regex> =
	LazyLock::new(|| Regex::new(r#"https://[^\s"'`<>()\[\]{}\\|^]+"#).unwrap());

/// Characters that end a sentence or a YAML/Markdown construct rather than a URL.
const TRAILING: &[char] = &['.', ',', ';', ':', '!', '?', '*'];

/// Extracts every distinct `https://` URL found in `text`, in order of first
/// appearance.
pub fn extract_urls(text: &str) -> Vec<String> {
	let mut seen = BTreeSet::new();
	HTTPS_URL
		.find_iter(text)
		.map(|m| m.as_str().trim_end_matches(TRAILING))
		.filter(|url| url.len() > "https://".len())
		.filter(|url| seen.insert(url.to_string()))
		.map(str::to_string)
		.collect()
}

/// Walks `dir` recursively and returns the sorted, de-duplicated set of
/// `https://` URLs found in its text files. Binary files are skipped.
pub fn extract_https_urls(dir: &Path) -> Result<Vec<String>, LinkCheckError> {
	if !dir.is_dir() {
		return Err(LinkCheckError::MissingDirectory(dir.to_path_buf()));
	}

	let mut urls = BTreeSet::new();
	let mut files = 0usize;
	for entry in WalkDir::new(dir).follow_links(false) {
		let entry = entry.map_err(|source| LinkCheckError::Walk {
			path: dir.to_path_buf(),
			source,
		})?;
		if !entry.file_type().is_file() {
			continue;
		}

		let bytes = std::fs::read(entry.path()).map_err(|source| LinkCheckError::Io {
			path: entry.path().to_path_buf(),
			source,
		})?;
		let Ok(text) = std::str::from_utf8(&bytes) else {
			trace!(path = %entry.path().display(), "skipping non-UTF-8 file");
			continue;
		};

		files += 1;
		urls.extend(extract_urls(text));
	}

	debug!(dir = %dir.display(), files, urls = urls.len(), "extracted manifest URLs");
	Ok(urls.into_iter().collect())
}

/// True when `url` contains any of the excluded substrings.
pub fn is_url_excluded(url: &str, excluded_substrings: &[String]) -> bool {
	excluded_substrings
		.iter()
		.any(|substring| !substring.is_empty() && url.contains(substring.as_str()))
}

/// Drops every excluded URL, keeping order.
pub fn filter_excluded(urls: Vec<String>, excluded_substrings: &[String]) -> Vec<String> {
	urls.into_iter()
		.filter(|url| !is_url_excluded(url, excluded_substrings))
		.collect()
}

#[cfg(test)]
mod tests {
	use super::*;
	use std::fs;
	use tempfile::TempDir;

	#[test]
	fn extracts_urls_from_yaml() {
		let yaml = r#"
spec:
  docs: "https://docs.example.com/serving/index.html"
  getStartedLink: https://example.com/start.
  description: See (https://example.com/a?b=c) for details, or https://example.com/x,
"#;
		assert_eq!(
			extract_urls(yaml),
			vec![
				"https://docs.example.com/serving/index.html",
				"https://example.com/start",
				"https://example.com/a?b=c",
				"https://example.com/x",
			]
		);
	}

	#[test]
	fn ignores_plain_http_and_bare_scheme() {
		assert!(extract_urls("http://insecure.example.com https:// ").is_empty());
	}

	#[test]
	fn duplicate_urls_are_reported_once() {
		let text = "https://a.example.com https://a.example.com";
		assert_eq!(extract_urls(text), vec!["https://a.example.com"]);
	}

	#[test]
	fn walks_nested_directories() {
		let temp = TempDir::new().unwrap();
		fs::create_dir_all(temp.path().join("base/overlays")).unwrap();
		fs::write(
			temp.path().join("base/quickstart.yaml"),
			"link: https://b.example.com/guide\n",
		)
		.unwrap();
		fs::write(
			temp.path().join("base/overlays/app.yaml"),
			"link: https://a.example.com\nagain: https://b.example.com/guide\n",
		)
		.unwrap();
		fs::write(temp.path().join("logo.png"), [0xff, 0xd8, 0xff, 0x00]).unwrap();

		let urls = extract_https_urls(temp.path()).unwrap();
		assert_eq!(urls, vec!["https://a.example.com", "https://b.example.com/guide"]);
	}

	#[test]
	fn missing_directory_is_an_error() {
		let temp = TempDir::new().unwrap();
		let err = extract_https_urls(&temp.path().join("nope")).unwrap_err();
		assert!(matches!(err, LinkCheckError::MissingDirectory(_)));
	}

	#[test]
	fn exclusion_is_substring_based() {
		let excluded = vec!["example.com".to_string(), "localhost".to_string()];
		assert!(is_url_excluded("https://api.example.com/v1", &excluded));
		assert!(!is_url_excluded("https://kserve.github.io/website", &excluded));
		assert!(!is_url_excluded("https://anything", &[String::new()]));

		let kept = filter_excluded(
			vec![
				"https://localhost:8443".to_string(),
				"https://kserve.github.io".to_string(),
			],
			&excluded,
		);
		assert_eq!(kept, vec!["https://kserve.github.io"]);
	}
}
