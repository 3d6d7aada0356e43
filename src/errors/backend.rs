// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Errors raised by a conversion backend while it runs inside its context.
//!
//! Every variant is caught by the owning context and turned into a
//! `CONVERSION_ERROR` message; `name()` provides the error-kind label that
//! travels with it.

use thiserror::Error;

/// Failure of a single backend conversion.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum BackendError {
    /// The backend does not declare this source/target pair.
    #[error("Conversion from {source_format} to {target_format} is not supported")]
    UnsupportedConversion {
        source_format: String,
        target_format: String,
    },

    /// The payload could not be interpreted as the claimed format.
    #[error("{0}")]
    Decode(String),

    /// No raster surface could be acquired for drawing.
    #[error("{0}")]
    Surface(String),

    /// The target encoder is unavailable or rejected the surface.
    #[error("{0}")]
    Encode(String),

    /// Anything else that went wrong inside the backend.
    #[error("{0}")]
    Internal(String),
}

impl BackendError {
    /// Error-kind label carried in the `name` field of `CONVERSION_ERROR`.
    pub fn name(&self) -> &'static str {
        match self {
            BackendError::UnsupportedConversion { .. } => "UnsupportedConversionError",
            BackendError::Decode(_) => "DecodeError",
            BackendError::Surface(_) => "SurfaceError",
            BackendError::Encode(_) => "EncodeError",
            BackendError::Internal(_) => "InternalError",
        }
    }

    /// Prefix the message while keeping the error kind.
    ///
    /// Unsupported-pair errors are left untouched so their message stays
    /// identical to the one produced by the service.
    pub fn with_prefix(self, prefix: &str) -> Self {
        match self {
            BackendError::UnsupportedConversion { .. } => self,
            BackendError::Decode(m) => BackendError::Decode(format!("{prefix}: {m}")),
            BackendError::Surface(m) => BackendError::Surface(format!("{prefix}: {m}")),
            BackendError::Encode(m) => BackendError::Encode(format!("{prefix}: {m}")),
            BackendError::Internal(m) => BackendError::Internal(format!("{prefix}: {m}")),
        }
    }
}
