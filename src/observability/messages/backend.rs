// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Message types for work performed inside a backend.

use crate::observability::messages::StructuredLog;
use std::fmt::{Display, Formatter};

/// Source image decoded.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ImageDecoded<'a> {
    pub file_name: &'a str,
    pub width: u32,
    pub height: u32,
}

impl Display for ImageDecoded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Decoded '{}': {}x{} pixels",
            self.file_name, self.width, self.height
        )
    }
}

impl StructuredLog for ImageDecoded<'_> {
    fn log(&self) {
        tracing::debug!(
            file_name = self.file_name,
            width = self.width,
            height = self.height,
            "{}", self
        );
    }
}

/// Raster surface encoded to the target format.
///
/// # Log Level
/// `debug!` - Diagnostic detail
pub struct ImageEncoded<'a> {
    pub target_format: &'a str,
    pub output_size: usize,
}

impl Display for ImageEncoded<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Encoded surface as {}: {} bytes",
            self.target_format, self.output_size
        )
    }
}

impl StructuredLog for ImageEncoded<'_> {
    fn log(&self) {
        tracing::debug!(
            target_format = self.target_format,
            output_size = self.output_size,
            "{}", self
        );
    }
}

/// A backend reported a conversion error.
///
/// # Log Level
/// `warn!` - Reported back to the caller, no action needed here
pub struct BackendConversionFailed<'a> {
    pub backend_type: &'a str,
    pub kind: &'a str,
    pub message: &'a str,
}

impl Display for BackendConversionFailed<'_> {
    fn fmt(&self, f: &mut Formatter) -> std::fmt::Result {
        write!(
            f,
            "Backend '{}' failed with {}: {}",
            self.backend_type, self.kind, self.message
        )
    }
}

impl StructuredLog for BackendConversionFailed<'_> {
    fn log(&self) {
        tracing::warn!(
            backend_type = self.backend_type,
            kind = self.kind,
            detail = self.message,
            "{}", self
        );
    }
}
