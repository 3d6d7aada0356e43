// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

pub mod factory;
pub mod isolated;
pub mod protocol;

pub use factory::ContextFactory;
pub use isolated::{ContextHandle, ContextState, IsolatedContext, PendingRequest};
pub use protocol::{download_name, format_from_file_name, Blob, InputFile};
