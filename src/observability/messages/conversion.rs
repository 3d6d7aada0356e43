// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for conversion requests handled by the service.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};
use std::time::Duration;

/// A caller asked for a conversion.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConversionRequested<'a> {
    pub file_name: &'a str,
    pub source_format: &'a str,
    pub target_format: &'a str,
    pub size: u64,
}

impl Display for ConversionRequested<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Converting '{}' from {} to {} ({} bytes)",
            self.file_name, self.source_format, self.target_format, self.size
        )
    }
}

impl StructuredLog for ConversionRequested<'_> {
    fn log(&self) {
        tracing::info!(
            file_name = self.file_name,
            source_format = self.source_format,
            target_format = self.target_format,
            size = self.size,
            "{}", self
        );
    }
}

/// A request was refused before reaching any context.
///
/// # Log Level
/// `warn!` - Caller error
pub struct ConversionRejected<'a> {
    pub file_name: &'a str,
    pub reason: &'a dyn std::error::Error,
}

impl Display for ConversionRejected<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Rejected conversion of '{}': {}", self.file_name, self.reason)
    }
}

impl StructuredLog for ConversionRejected<'_> {
    fn log(&self) {
        tracing::warn!(
            file_name = self.file_name,
            reason = %self.reason,
            "{}", self
        );
    }
}

/// A conversion finished with a result.
///
/// # Log Level
/// `info!` - Important operational event
pub struct ConversionCompleted<'a> {
    pub file_name: &'a str,
    pub target_format: &'a str,
    pub output_size: usize,
    pub duration: Duration,
}

impl Display for ConversionCompleted<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Converted '{}' to {}: output={} bytes, duration={:?}",
            self.file_name, self.target_format, self.output_size, self.duration
        )
    }
}

impl StructuredLog for ConversionCompleted<'_> {
    fn log(&self) {
        tracing::info!(
            file_name = self.file_name,
            target_format = self.target_format,
            output_size = self.output_size,
            duration_ms = self.duration.as_millis() as u64,
            "{}", self
        );
    }
}

/// A conversion reached a terminal error.
///
/// # Log Level
/// `error!` - Failure requiring attention
pub struct ConversionFailed<'a> {
    pub file_name: &'a str,
    pub error: &'a dyn std::error::Error,
}

impl Display for ConversionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(f, "Conversion of '{}' failed: {}", self.file_name, self.error)
    }
}

impl StructuredLog for ConversionFailed<'_> {
    fn log(&self) {
        tracing::error!(
            file_name = self.file_name,
            error = %self.error,
            "{}", self
        );
    }
}
