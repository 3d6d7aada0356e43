// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod backends;   // conversion backends
pub mod capability; // runtime capability probe
pub mod config;     // config + backend registry
pub mod context;    // isolated contexts and their protocol
pub mod errors;     // error handling
pub mod observability;
pub mod service;    // client-facing conversion service
pub mod traits;     // backend abstractions
