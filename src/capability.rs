// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Probe for whether this process can host conversions.
//!
//! Conversions need a tokio runtime to spawn contexts on and working raster
//! codecs. Both are checked on every call.

use tokio::runtime::Handle;

use crate::backends::{RasterSurface, SurfaceEncoding};
use crate::config::consts::LOSSY_ENCODING_QUALITY;

pub const SUPPORTED_MESSAGE: &str =
    "Local conversion is supported in this environment! File conversion functionality will work properly.";
pub const UNSUPPORTED_MESSAGE: &str =
    "Local conversion is not supported in this environment. Run inside an async runtime with the image codecs available to use file conversion functionality.";

pub fn is_runtime_capable() -> bool {
    Handle::try_current().is_ok() && codecs_available()
}

pub fn status_message() -> &'static str {
    if is_runtime_capable() {
        SUPPORTED_MESSAGE
    } else {
        UNSUPPORTED_MESSAGE
    }
}

fn codecs_available() -> bool {
    [
        SurfaceEncoding::Png,
        SurfaceEncoding::Jpeg {
            quality: LOSSY_ENCODING_QUALITY,
        },
    ]
    .into_iter()
    .all(round_trips)
}

/// Encode a 1x1 surface and decode it back.
fn round_trips(encoding: SurfaceEncoding) -> bool {
    RasterSurface::acquire(1, 1)
        .and_then(|surface| surface.encode(encoding))
        .map(|bytes| image::load_from_memory(&bytes).is_ok())
        .unwrap_or(false)
}
