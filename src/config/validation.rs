// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Configuration validation.
//!
//! Checks run in order and every problem is collected, so a single pass
//! reports everything wrong with a file:
//!
//! 1. **Limits**: `max_file_size_mb` and `event_buffer` must be non-zero
//! 2. **Identity**: backend ids must be non-empty and unique
//! 3. **Declarations**: each backend declares at least one pair, with no
//!    empty format names
//!
//! # Example
//! ```rust
//! use local_converter::config::{validate_config, Config};
//!
//! let config = Config::default();
//! assert!(validate_config(&config).is_ok());
//! ```

use std::collections::HashSet;

use crate::config::Config;
use crate::errors::ValidationError;

pub fn validate_config(config: &Config) -> Result<(), Vec<ValidationError>> {
    let mut errors = Vec::new();

    if config.max_file_size_mb == 0 {
        errors.push(ValidationError::ZeroFileSizeLimit);
    }
    if config.event_buffer == 0 {
        errors.push(ValidationError::ZeroEventBuffer);
    }

    let mut seen = HashSet::new();
    for (index, backend) in config.effective_backends().iter().enumerate() {
        let id = backend.id.trim();
        if id.is_empty() {
            errors.push(ValidationError::EmptyBackendId { index });
            continue;
        }
        if !seen.insert(id.to_string()) {
            errors.push(ValidationError::DuplicateBackendId {
                backend_id: id.to_string(),
            });
        }

        let declares_any = backend.conversions.iter().any(|rule| !rule.to.is_empty());
        if !declares_any {
            errors.push(ValidationError::NoConversions {
                backend_id: id.to_string(),
            });
        }

        let has_empty_format = backend.conversions.iter().any(|rule| {
            rule.from.trim().is_empty() || rule.to.iter().any(|t| t.trim().is_empty())
        });
        if has_empty_format {
            errors.push(ValidationError::EmptyFormat {
                backend_id: id.to_string(),
            });
        }
    }

    if errors.is_empty() {
        Ok(())
    } else {
        Err(errors)
    }
}
