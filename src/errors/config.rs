// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use thiserror::Error;

/// A single problem found while validating a configuration.
#[derive(Error, Debug, Clone, PartialEq)]
pub enum ValidationError {
    /// A backend entry has an empty or whitespace-only id
    #[error("Backend at position {index} has an empty id")]
    EmptyBackendId { index: usize },

    /// Two backend entries share an id
    #[error("Duplicate backend ID: '{backend_id}'")]
    DuplicateBackendId { backend_id: String },

    /// A backend entry declares no source/target pairs at all
    #[error("Backend '{backend_id}' declares no conversions")]
    NoConversions { backend_id: String },

    /// A conversion rule names an empty format
    #[error("Backend '{backend_id}' declares an empty format name")]
    EmptyFormat { backend_id: String },

    #[error("event_buffer must be greater than zero")]
    ZeroEventBuffer,

    #[error("max_file_size_mb must be greater than zero")]
    ZeroFileSizeLimit,
}

/// Errors from loading a configuration file.
#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config: {0}")]
    Io(#[from] std::io::Error),

    #[error("Failed to parse config: {0}")]
    Parse(#[from] serde_yaml::Error),

    #[error(
        "Configuration validation failed:\n{}",
        .0.iter().map(ToString::to_string).collect::<Vec<_>>().join("\n")
    )]
    Invalid(Vec<ValidationError>),
}
