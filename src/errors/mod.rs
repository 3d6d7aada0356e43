// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

mod backend;
mod config;
mod conversion;

pub use backend::BackendError;
pub use config::{ConfigError, ValidationError};
pub use conversion::{ConversionError, REMEDIATION_HINT};
