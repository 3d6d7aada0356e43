// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// Generic follow-up shown to users after any conversion failure.
pub const REMEDIATION_HINT: &str = "There was an error during conversion. Please try again.";

/// Terminal failure of a `convert_file` call.
///
/// Every variant is reported exactly once: as the terminal `error` progress
/// event (when a callback was supplied) and as the returned `Err`.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ConversionError {
    /// No registered backend declares the requested pair.
    #[error("Conversion from {source_format} to {target_format} is not supported")]
    Unsupported {
        source_format: String,
        target_format: String,
    },

    /// The input exceeds the configured size limit.
    #[error("File is too large ({size} bytes). Maximum size is {max_mb}MB.")]
    FileTooLarge { size: u64, max_mb: u64 },

    /// The backend reported `CONVERSION_ERROR`.
    #[error("{message}")]
    Backend { message: String, name: String },

    /// The isolated context itself faulted or could not be reached.
    #[error("Worker error: {0}")]
    Transport(String),

    /// The context was torn down while this conversion was in flight.
    #[error("Conversion context for backend '{backend_id}' was terminated before the conversion finished")]
    ContextTerminated { backend_id: String },

    /// No async runtime was available to host a context.
    #[error("Conversion runtime unavailable: {0}")]
    Runtime(String),
}

impl ConversionError {
    pub fn remediation_hint(&self) -> &'static str {
        REMEDIATION_HINT
    }

    /// True for failures raised before any context was involved.
    #[cfg(test)]
    pub fn is_rejected_up_front(&self) -> bool {
        matches!(
            self,
            ConversionError::Unsupported { .. }
                | ConversionError::FileTooLarge { .. }
                | ConversionError::Runtime(_)
        )
    }
}
