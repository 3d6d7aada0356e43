// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod conversion;


pub use conversion::{
    ConversionOptions, ConversionProgress, ConversionService, ConversionStatus, ProgressCallback,
};
