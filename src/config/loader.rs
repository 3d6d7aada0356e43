// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

use crate::config::consts::{DEFAULT_EVENT_BUFFER, DEFAULT_MAX_FILE_SIZE_MB};
use crate::errors::ConfigError;
use serde::Deserialize;
use std::fs;
use std::path::Path;

/// Main configuration for the conversion service.
///
/// Every field is optional. Without a `backends` section the built-in
/// registry is used.
///
/// # Example
/// ```yaml
/// max_file_size_mb: 50
/// event_buffer: 128
/// backends:
///   - id: image
///     entry_point: image
///     conversions:
///       - from: jpg
///         to: [png]
///       - from: png
///         to: [jpg, jpeg]
/// ```
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct Config {
    #[serde(default = "default_max_file_size_mb")]
    pub max_file_size_mb: u64,
    #[serde(default = "default_event_buffer")]
    pub event_buffer: usize,
    #[serde(default)]
    pub backends: Option<Vec<BackendConfig>>,
}

impl Default for Config {
    fn default() -> Self {
        Self {
            max_file_size_mb: DEFAULT_MAX_FILE_SIZE_MB,
            event_buffer: DEFAULT_EVENT_BUFFER,
            backends: None,
        }
    }
}

impl Config {
    /// Configured backends, or the built-in set when none are configured.
    pub fn effective_backends(&self) -> Vec<BackendConfig> {
        self.backends.clone().unwrap_or_else(builtin_backends)
    }
}

fn default_max_file_size_mb() -> u64 {
    DEFAULT_MAX_FILE_SIZE_MB
}

fn default_event_buffer() -> usize {
    DEFAULT_EVENT_BUFFER
}

/// One registry entry: an id, the entry point that builds its backend and
/// the pairs it advertises.
#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct BackendConfig {
    pub id: String,
    pub entry_point: EntryPointKind,
    #[serde(default)]
    pub conversions: Vec<ConversionRule>,
}

#[derive(Debug, Clone, PartialEq, Deserialize)]
pub struct ConversionRule {
    pub from: String,
    pub to: Vec<String>,
}

/// Backend implementations a registry entry can point at.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum EntryPointKind {
    Image,
}

fn rule(from: &str, to: &[&str]) -> ConversionRule {
    ConversionRule {
        from: from.to_string(),
        to: to.iter().map(|t| t.to_string()).collect(),
    }
}

/// The built-in registry, in resolution order.
///
/// Only `image` has a real implementation. `document`, `audio-video` and
/// `heic` advertise their pairs but reuse the image entry point until their
/// own backends exist.
pub fn builtin_backends() -> Vec<BackendConfig> {
    vec![
        BackendConfig {
            id: "image".to_string(),
            entry_point: EntryPointKind::Image,
            conversions: vec![rule("jpg", &["png"]), rule("jpeg", &["png"]), rule("png", &["jpg", "jpeg"])],
        },
        BackendConfig {
            id: "document".to_string(),
            entry_point: EntryPointKind::Image,
            conversions: vec![rule("pdf", &["docx", "jpg"]), rule("docx", &["pdf"])],
        },
        BackendConfig {
            id: "audio-video".to_string(),
            entry_point: EntryPointKind::Image,
            conversions: vec![rule("mp4", &["mp3", "gif"]), rule("mov", &["mp4"])],
        },
        BackendConfig {
            id: "heic".to_string(),
            entry_point: EntryPointKind::Image,
            conversions: vec![rule("heic", &["jpg"])],
        },
    ]
}

/// Load a config from a YAML file
pub fn load_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let content = fs::read_to_string(path)?;
    let cfg: Config = serde_yaml::from_str(&content)?;
    Ok(cfg)
}

/// Load a config and reject it if validation finds any problem.
pub fn load_and_validate_config<P: AsRef<Path>>(path: P) -> Result<Config, ConfigError> {
    let cfg = load_config(path)?;
    crate::config::validate_config(&cfg).map_err(ConfigError::Invalid)?;
    Ok(cfg)
}
