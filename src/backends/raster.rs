// Copyright (c) 2025 Steve Wagner (ciroque@live.com)
// SPDX-License-Identifier: MIT

//! Off-screen raster surface used as the drawing primitive for image backends.
//!
//! A surface is an RGBA canvas sized to the source image. Sources are drawn at
//! the origin and the surface is then re-encoded to the target encoding.

use std::io::Cursor;

use image::codecs::jpeg::JpegEncoder;
use image::codecs::png::PngEncoder;
use image::{DynamicImage, ExtendedColorType, ImageEncoder, RgbaImage};

use crate::config::consts::{LOSSY_ENCODING_QUALITY, MAX_SURFACE_DIMENSION};
use crate::errors::BackendError;

/// Target encoding for a surface.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SurfaceEncoding {
    Png,
    Jpeg { quality: u8 },
}

impl SurfaceEncoding {
    /// Encoding for a (case-folded) target format name.
    ///
    /// Lossy targets use the fixed quality factor; PNG uses encoder defaults.
    pub fn for_format(format: &str) -> Option<Self> {
        match format {
            "png" => Some(SurfaceEncoding::Png),
            "jpg" | "jpeg" => Some(SurfaceEncoding::Jpeg {
                quality: LOSSY_ENCODING_QUALITY,
            }),
            _ => None,
        }
    }

    pub fn content_type(&self) -> &'static str {
        match self {
            SurfaceEncoding::Png => "image/png",
            SurfaceEncoding::Jpeg { .. } => "image/jpeg",
        }
    }
}

pub struct RasterSurface {
    canvas: RgbaImage,
}

impl RasterSurface {
    /// Acquire a transparent surface of the given pixel dimensions.
    pub fn acquire(width: u32, height: u32) -> Result<Self, BackendError> {
        if width == 0 || height == 0 {
            return Err(BackendError::Surface(format!(
                "Could not get canvas context for a {}x{} surface",
                width, height
            )));
        }
        if width > MAX_SURFACE_DIMENSION || height > MAX_SURFACE_DIMENSION {
            return Err(BackendError::Surface(format!(
                "Could not get canvas context: {}x{} exceeds the {}px surface limit",
                width, height, MAX_SURFACE_DIMENSION
            )));
        }

        Ok(Self {
            canvas: RgbaImage::new(width, height),
        })
    }

    #[cfg(test)]
    pub fn dimensions(&self) -> (u32, u32) {
        self.canvas.dimensions()
    }

    /// Draw `image` with its top-left corner at the origin.
    pub fn draw(&mut self, image: &DynamicImage) {
        image::imageops::replace(&mut self.canvas, &image.to_rgba8(), 0, 0);
    }

    pub fn encode(&self, encoding: SurfaceEncoding) -> Result<Vec<u8>, BackendError> {
        let (width, height) = self.canvas.dimensions();
        let mut buffer = Vec::new();

        match encoding {
            SurfaceEncoding::Jpeg { quality } => {
                // JPEG has no alpha channel
                let rgb = DynamicImage::ImageRgba8(self.canvas.clone()).to_rgb8();
                let mut encoder = JpegEncoder::new_with_quality(Cursor::new(&mut buffer), quality);
                encoder
                    .encode(rgb.as_raw(), width, height, ExtendedColorType::Rgb8)
                    .map_err(|e| BackendError::Encode(format!("failed to encode JPG: {}", e)))?;
            }
            SurfaceEncoding::Png => {
                let encoder = PngEncoder::new(Cursor::new(&mut buffer));
                encoder
                    .write_image(self.canvas.as_raw(), width, height, ExtendedColorType::Rgba8)
                    .map_err(|e| BackendError::Encode(format!("failed to encode PNG: {}", e)))?;
            }
        }

        Ok(buffer)
    }
}
