// SPDX-License-Identifier: GPL-3.0-only

//! Frame grab
//!
//! Copies the most recent preview frame into a still image without
//! interrupting the preview stream.

use super::encoding::encode_png;
use crate::backends::camera::CameraFrame;
use crate::errors::CaptureError;
use crate::filters::{FilterType, apply_filter};
use image::RgbaImage;
use std::sync::Arc;
use tracing::{debug, info};

/// A processed still, ready to show and save
#[derive(Clone)]
pub struct CapturedImage {
    /// Filtered pixels at native frame resolution
    pub image: Arc<RgbaImage>,
    /// PNG encoding of `image`
    pub png: Arc<[u8]>,
    /// Filter that was baked into the pixels
    pub filter: FilterType,
    pub captured_at: chrono::DateTime<chrono::Local>,
}

impl CapturedImage {
    pub fn width(&self) -> u32 {
        self.image.width()
    }

    pub fn height(&self) -> u32 {
        self.image.height()
    }
}

impl std::fmt::Debug for CapturedImage {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("CapturedImage")
            .field("width", &self.width())
            .field("height", &self.height())
            .field("png_bytes", &self.png.len())
            .field("filter", &self.filter)
            .field("captured_at", &self.captured_at)
            .finish()
    }
}

/// Photo capture handler
pub struct PhotoCapture;

impl PhotoCapture {
    /// Turn the current frame into a filtered, encoded still
    pub fn grab(frame: Option<&CameraFrame>, filter: FilterType) -> Result<CapturedImage, CaptureError> {
        let frame = frame.ok_or(CaptureError::MountMissing)?;
        if frame.width == 0 || frame.height == 0 {
            return Err(CaptureError::MountMissing);
        }

        let mut image = frame.to_rgba_image().ok_or_else(|| {
            CaptureError::InvalidFrame(format!(
                "{}x{} frame with stride {} has only {} bytes",
                frame.width,
                frame.height,
                frame.stride,
                frame.data.len()
            ))
        })?;
        debug!(width = frame.width, height = frame.height, ?filter, "Frame copied for capture");

        apply_filter(&mut image, filter, 1.0);
        let png = encode_png(&image)?;

        info!(
            width = image.width(),
            height = image.height(),
            size = png.len(),
            ?filter,
            "Photo captured"
        );

        Ok(CapturedImage {
            image: Arc::new(image),
            png: Arc::from(png),
            filter,
            captured_at: chrono::Local::now(),
        })
    }
}
