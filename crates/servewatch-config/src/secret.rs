// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Wrapper for credentials that must never reach a log line.

use std::fmt;

use serde::{Deserialize, Deserializer};
use zeroize::Zeroize;

pub const REDACTED: &str = "[REDACTED]";

/// A value that renders as [`REDACTED`] in `Debug` and `Display` and is
/// zeroed when dropped. Read it with [`Secret::expose`].
pub struct Secret<T: Zeroize> {
	inner: T,
}

pub type SecretString = Secret<String>;

impl<T: Zeroize> Secret<T> {
	pub fn new(inner: T) -> Self {
		Self { inner }
	}

	pub fn expose(&self) -> &T {
		&self.inner
	}
}

impl From<&str> for SecretString {
	fn from(value: &str) -> Self {
		Secret::new(value.to_string())
	}
}

impl From<String> for SecretString {
	fn from(value: String) -> Self {
		Secret::new(value)
	}
}

impl<T: Zeroize> Drop for Secret<T> {
	fn drop(&mut self) {
		self.inner.zeroize();
	}
}

impl<T: Zeroize + Clone> Clone for Secret<T> {
	fn clone(&self) -> Self {
		Self::new(self.inner.clone())
	}
}

impl<T: Zeroize + PartialEq> PartialEq for Secret<T> {
	fn eq(&self, other: &Self) -> bool {
		self.inner == other.inner
	}
}

impl<T: Zeroize + Eq> Eq for Secret<T> {}

impl<T: Zeroize> fmt::Debug for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<T: Zeroize> fmt::Display for Secret<T> {
	fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
		f.write_str(REDACTED)
	}
}

impl<'de, T: Zeroize + Deserialize<'de>> Deserialize<'de> for Secret<T> {
	fn deserialize<D: Deserializer<'de>>(deserializer: D) -> Result<Self, D::Error> {
		T::deserialize(deserializer).map(Secret::new)
	}
}

#[cfg(test)]
mod tests {
	use super::*;
	use proptest::prelude::*;

	#[test]
	fn expose_returns_inner_value() {
		let secret = SecretString::from("hunter2");
		assert_eq!(secret.expose(), "hunter2");
	}

	#[test]
	fn deserializes_transparently() {
		let secret: SecretString = serde_json::from_str("\"abc\"").unwrap();
		assert_eq!(secret.expose(), "abc");
	}

	proptest! {
		/// Test: no formatting path leaks the wrapped value.
		///
		/// Why this test is important: resolved configs are logged at debug
		/// level, and bucket credentials live inside them.
		#[test]
		fn formatting_never_leaks(value in "[a-zA-Z0-9]{8,32}") {
			let secret = SecretString::new(value.clone());
			let debug = format!("{secret:?}");
			let display = format!("{secret}");
			let nested = format!("{:?}", Some(&secret));
			prop_assert_eq!(debug.as_str(), REDACTED);
			prop_assert_eq!(display.as_str(), REDACTED);
			prop_assert!(!nested.contains(value.as_str()));
		}
	}
}
