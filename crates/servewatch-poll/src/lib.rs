// Copyright (c) 2025 Geoffrey Huntley <ghuntley@ghuntley.com>. All rights reserved.
// SPDX-License-Identifier: Proprietary

//! Bounded condition polling for resources that converge to a ready state.
//!
//! This crate provides:
//! - [`ReadinessCheck`]: a gate plus a list of named [`ConditionSpec`]s
//! - [`ConditionPoller`]: fetch, evaluate, sleep, repeat within an attempt budget
//! - [`PollObserver`]: per-attempt progress hooks (structured `tracing` by default)

pub mod condition;
pub mod error;
pub mod observer;
pub mod poller;
pub mod report;

pub use condition::{
	ConditionSpec, Gate, ObservedResource, ReadinessCheck, ResourceCondition, EMPTY_VALUE,
};
pub use error::{FetchError, PollError, PollTimeoutError};
pub use observer::{NoopObserver, PollObserver, TracingObserver};
pub use poller::{ConditionPoller, PollConfig, PollOutcome, DEFAULT_INTERVAL, DEFAULT_MAX_ATTEMPTS};
pub use report::{AttemptReport, ConditionReport, GateReport, NOT_FOUND};
