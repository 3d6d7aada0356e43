// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Image conversion backend.
//!
//! Converts between JPEG and PNG by decoding the payload, drawing it onto a
//! [`RasterSurface`] of the same pixel dimensions and re-encoding the surface.
//! Decode and encode run on the blocking pool so the owning context stays
//! responsive to teardown.

use std::io::Cursor;

use async_trait::async_trait;
use image::{DynamicImage, GenericImageView, ImageFormat, ImageReader};

use crate::backends::raster::{RasterSurface, SurfaceEncoding};
use crate::config::consts::{DECODED_PROGRESS, ENCODED_PROGRESS};
use crate::config::format_table::normalize_format;
use crate::config::FormatTable;
use crate::context::protocol::Blob;
use crate::errors::BackendError;
use crate::observability::messages::backend::{ImageDecoded, ImageEncoded};
use crate::observability::messages::StructuredLog;
use crate::traits::{BackendRequest, ConversionBackend, ProgressReporter};

/// Worker type reported by image contexts.
pub const IMAGE_WORKER_TYPE: &str = "image-converter";

const FAILURE_PREFIX: &str = "Image conversion failed";

pub struct ImageBackend {
    conversions: FormatTable,
}

impl ImageBackend {
    pub fn new() -> Self {
        Self {
            conversions: FormatTable::from_pairs(&[
                ("jpg", &["png"]),
                ("jpeg", &["png"]),
                ("png", &["jpg", "jpeg"]),
            ]),
        }
    }
}

impl Default for ImageBackend {
    fn default() -> Self {
        Self::new()
    }
}

#[async_trait]
impl ConversionBackend for ImageBackend {
    fn backend_type(&self) -> &'static str {
        IMAGE_WORKER_TYPE
    }

    fn supported_conversions(&self) -> &FormatTable {
        &self.conversions
    }

    async fn convert(
        &self,
        request: BackendRequest,
        progress: &ProgressReporter,
    ) -> Result<Blob, BackendError> {
        let source_format = request.file.extension();
        let target_format = normalize_format(&request.target_format);

        // The registry matched some backend for this pair, but this backend may
        // be standing in for another family.
        if !self.supports(&source_format, &target_format) {
            return Err(BackendError::UnsupportedConversion {
                source_format,
                target_format,
            });
        }

        let encoding = SurfaceEncoding::for_format(&target_format).ok_or_else(|| {
            BackendError::Encode(format!("{}: no encoder for {}", FAILURE_PREFIX, target_format))
        })?;
        let claimed = ImageFormat::from_extension(&source_format);
        let file_name = request.file.name;
        let bytes = request.file.bytes;

        let decoded = tokio::task::spawn_blocking(move || decode(&bytes, claimed))
            .await
            .map_err(|e| BackendError::Internal(e.to_string()))?
            .map_err(|e| e.with_prefix(FAILURE_PREFIX))?;

        let (width, height) = decoded.dimensions();
        ImageDecoded {
            file_name: &file_name,
            width,
            height,
        }
        .log();
        progress.report(DECODED_PROGRESS);

        let encoded = tokio::task::spawn_blocking(move || {
            let mut surface = RasterSurface::acquire(width, height)?;
            surface.draw(&decoded);
            surface.encode(encoding)
        })
        .await
        .map_err(|e| BackendError::Internal(e.to_string()))?
        .map_err(|e| e.with_prefix(FAILURE_PREFIX))?;

        ImageEncoded {
            target_format: &target_format,
            output_size: encoded.len(),
        }
        .log();
        progress.report(ENCODED_PROGRESS);

        Ok(Blob::new(encoded, encoding.content_type()))
    }
}

/// Decode by magic bytes first so mislabelled files still load, then fall back
/// to the format claimed by the file name.
fn decode(bytes: &[u8], claimed: Option<ImageFormat>) -> Result<DynamicImage, BackendError> {
    if bytes.is_empty() {
        return Err(BackendError::Decode("Failed to load image: input is empty".into()));
    }

    if let Ok(reader) = ImageReader::new(Cursor::new(bytes)).with_guessed_format() {
        if reader.format().is_some() {
            if let Ok(image) = reader.decode() {
                return Ok(image);
            }
        }
    }

    let result = match claimed {
        Some(format) => image::load_from_memory_with_format(bytes, format),
        None => image::load_from_memory(bytes),
    };
    result.map_err(|e| BackendError::Decode(format!("Failed to load image: {}", e)))
}
