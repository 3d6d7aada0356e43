// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Centralized message types for structured logging.
//!
//! # Organization
//!
//! * `context` - isolated context lifecycle (spawn, reuse, fault, teardown)
//! * `conversion` - conversion requests as seen by the service
//! * `backend` - work done inside a backend

use tracing::Span;

pub mod backend;
pub mod context;
pub mod conversion;

/// A message that knows its own log level and structured fields.
pub trait StructuredLog {
    /// Emit the message as a tracing event.
    fn log(&self);

    /// Open a span carrying the message's fields.
    fn span(&self, _name: &str) -> Span {
        Span::current()
    }
}
