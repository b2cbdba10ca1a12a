// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Merging registered sources into a resolved configuration.

use crate::layer::ConfigLayer;
use crate::runtime::ServewatchConfig;
use crate::sources::ConfigSource;
use crate::ConfigError;

#[derive(Default)]
pub struct ConfigRegistry {
	sources: Vec<Box<dyn ConfigSource>>,
}

impl ConfigRegistry {
	pub fn new() -> Self {
		Self::default()
	}

	pub fn register(&mut self, source: Box<dyn ConfigSource>) {
		self.sources.push(source);
	}

	/// Merge every source's layer in precedence order. Sources with equal
	/// precedence apply in registration order.
	pub fn merged_layer(&self) -> Result<ConfigLayer, ConfigError> {
		let mut ordered: Vec<&dyn ConfigSource> = self.sources.iter().map(|s| s.as_ref()).collect();
		ordered.sort_by_key(|source| source.precedence());

		let mut merged = ConfigLayer::default();
		for source in ordered {
			let layer = source.load()?;
			tracing::trace!(
				source = source.name(),
				precedence = ?source.precedence(),
				"merging config layer"
			);
			merged.merge(layer);
		}
		Ok(merged)
	}

	pub fn load(&self) -> Result<ServewatchConfig, ConfigError> {
		let config = ServewatchConfig::from_layer(self.merged_layer()?)?;
		tracing::debug!(?config, "resolved configuration");
		Ok(config)
	}
}
