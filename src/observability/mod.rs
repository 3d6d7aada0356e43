// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Observability module for structured logging and tracing.
//!
//! Every diagnostic and operational log line goes through a message struct
//! that implements `Display`, so log text lives in one place instead of
//! being scattered through the code as string literals.
//!
//! # Usage
//!
//! ```rust
//! use local_converter::observability::messages::StructuredLog;
//! use local_converter::observability::messages::context::ContextSpawned;
//!
//! let msg = ContextSpawned {
//!     backend_id: "image",
//!     context_id: 1,
//!     worker_type: "image-converter",
//! };
//!
//! msg.log();
//! ```

pub mod messages;
