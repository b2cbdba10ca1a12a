// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Shared HTTP utilities for servewatch.
//!
//! Every outbound request (inference probes, manifest link checks) goes
//! through a client built here so the User-Agent is consistent.

mod client;

pub use client::{builder, new_client, user_agent};
