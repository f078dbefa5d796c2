// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! Each message type implements the `Display` trait to provide consistent,
//! human-readable output.
//!
//! # Organization
//!
//! * `loader` - module fetch/compile events and last-modified refreshes
//! * `pool` - instance admission and release
//! * `engine` - facade lifecycle and per-request failures
//! * `cache` - asset cache loads
//!
//! # Usage Pattern
//!
//! ```rust
//! use infer_sandbox::observability::messages::pool::InstanceAdmitted;
//!
//! let msg = InstanceAdmitted {
//!     instance_id: 7,
//!     active: 1,
//!     max_concurrent: 2,
//! };
//!
//! tracing::debug!("{}", msg);
//! ```

pub mod cache;
pub mod engine;
pub mod loader;
pub mod pool;
