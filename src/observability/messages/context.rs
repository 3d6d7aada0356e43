// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for isolated context lifecycle events.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use tracing::Span;

/// A new isolated context was spawned for a backend.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ContextSpawned<'a> {
    pub backend_id: &'a str,
    pub context_id: u64,
    pub worker_type: &'a str,
}

impl Display for ContextSpawned<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Spawned isolated context #{} for backend '{}' ({})",
            self.context_id, self.backend_id, self.worker_type
        )
    }
}

impl StructuredLog for ContextSpawned<'_> {
    fn log(&self) {
        tracing::info!(
            backend_id = self.backend_id,
            context_id = self.context_id,
            worker_type = self.worker_type,
            "{}", self
        );
    }

    fn span(&self, name: &str) -> Span {
        tracing::info_span!(
            "isolated_context",
            span_name = name,
            backend_id = self.backend_id,
            context_id = self.context_id,
        )
    }
}

/// An existing context was reused for a request.
///
/// # Log Level
/// `debug!` - Routine event
pub struct ContextReused<'a> {
    pub backend_id: &'a str,
    pub context_id: u64,
}

impl Display for ContextReused<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Reusing isolated context #{} for backend '{}'",
            self.context_id, self.backend_id
        )
    }
}

impl StructuredLog for ContextReused<'_> {
    fn log(&self) {
        tracing::debug!(
            backend_id = self.backend_id,
            context_id = self.context_id,
            "{}", self
        );
    }
}

/// A context's backend panicked and the context stopped.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ContextFaulted<'a> {
    pub backend_id: &'a str,
    pub context_id: u64,
    pub reason: &'a str,
}

impl Display for ContextFaulted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Isolated context #{} for backend '{}' faulted: {}",
            self.context_id, self.backend_id, self.reason
        )
    }
}

impl StructuredLog for ContextFaulted<'_> {
    fn log(&self) {
        tracing::error!(
            backend_id = self.backend_id,
            context_id = self.context_id,
            reason = self.reason,
            "{}", self
        );
    }
}

/// A context's message loop ended.
///
/// # Log Level
/// `debug!` - Routine event
pub struct ContextStopped<'a> {
    pub backend_id: &'a str,
    pub context_id: u64,
}

impl Display for ContextStopped<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Isolated context #{} for backend '{}' stopped",
            self.context_id, self.backend_id
        )
    }
}

impl StructuredLog for ContextStopped<'_> {
    fn log(&self) {
        tracing::debug!(
            backend_id = self.backend_id,
            context_id = self.context_id,
            "{}", self
        );
    }
}

/// All active contexts were torn down.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ContextsTornDown {
    pub count: usize,
}

impl Display for ContextsTornDown {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Tore down {} isolated context(s)", self.count)
    }
}

impl StructuredLog for ContextsTornDown {
    fn log(&self) {
        tracing::info!(count = self.count, "{}", self);
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_display() {
        let spawned = ContextSpawned {
            backend_id: "image",
            context_id: 3,
            worker_type: "image-converter",
        };
        assert_eq!(
            spawned.to_string(),
            "Spawned isolated context #3 for backend 'image' (image-converter)"
        );

        let torn_down = ContextsTornDown { count: 2 };
        assert_eq!(torn_down.to_string(), "Tore down 2 isolated context(s)");
    }
}
