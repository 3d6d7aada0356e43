// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Conversion backend implementations.
//!
//! Each backend implements the [`ConversionBackend`](crate::traits::ConversionBackend)
//! trait and runs inside its own isolated context, one context per backend id.
//!
//! # Available Backends
//!
//! ## Image Backend
//! JPEG and PNG re-encoding through an off-screen [`raster::RasterSurface`]:
//! - **Declared pairs**: jpg→png, jpeg→png, png→jpg, png→jpeg
//! - **Quality**: fixed 0.9 factor for lossy targets, encoder defaults otherwise
//!
//! ## Stub Backends (Test-Only)
//! Scripted backends for exercising the context and service machinery
//! (only available in test builds):
//! - **ScriptedBackend**: emits fixed progress, then returns a fixed outcome
//! - **PanickingBackend**: panics mid-conversion to fault its context
//! - **GatedBackend**: blocks until released, for ordering and teardown tests

pub mod image;
pub mod raster;
#[cfg(test)]
pub mod stub;

pub use self::image::{ImageBackend, IMAGE_WORKER_TYPE};
pub use raster::{RasterSurface, SurfaceEncoding};
