// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! servewatch binary.

use std::process::ExitCode;

use anyhow::Context;
use clap::Parser;
use tracing_subscriber::{fmt, layer::SubscriberExt, util::SubscriberInitExt, EnvFilter};

mod cli;
mod commands;

use cli::Args;

fn init_tracing(level: &str, json: bool) {
	let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level));

	// Logs go to stderr so reports on stdout stay clean.
	if json {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().json().with_writer(std::io::stderr))
			.init();
	} else {
		tracing_subscriber::registry()
			.with(filter)
			.with(fmt::layer().with_writer(std::io::stderr))
			.init();
	}
}

async fn run(args: Args) -> anyhow::Result<ExitCode> {
	let config = servewatch_config::load_config(args.config.as_deref(), args.overrides())
		.context("failed to load configuration")?;
	commands::run(args.command, config).await
}

#[tokio::main]
async fn main() -> ExitCode {
	let args = Args::parse();
	init_tracing(&args.log_level, args.json_logs);

	match run(args).await {
		Ok(code) => code,
		Err(e) => {
			eprintln!("Error: {e:?}");
			ExitCode::FAILURE
		}
	}
}
