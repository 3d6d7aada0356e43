// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod consts;
pub mod format_table;
mod loader;
mod registry;
mod validation;

pub use format_table::{normalize_format, FormatTable};
pub use loader::{
    builtin_backends, load_and_validate_config, load_config, BackendConfig, Config,
    ConversionRule, EntryPointKind,
};
pub use registry::{build_registry, entry_point_for, BackendDescriptor, BackendRegistry, EntryPoint};
pub use validation::validate_config;
