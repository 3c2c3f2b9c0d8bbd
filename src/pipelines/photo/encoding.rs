// SPDX-License-Identifier: GPL-3.0-only

//! PNG encoding of captured stills

use crate::errors::CaptureError;
use image::RgbaImage;
use tracing::debug;

/// Encode an image as PNG in memory
pub fn encode_png(image: &RgbaImage) -> Result<Vec<u8>, CaptureError> {
    let mut buffer = Vec::new();

    image
        .write_to(
            &mut std::io::Cursor::new(&mut buffer),
            image::ImageFormat::Png,
        )
        .map_err(|e| CaptureError::EncodingFailed(format!("PNG encoding failed: {}", e)))?;

    debug!(size = buffer.len(), "Encoding complete");
    Ok(buffer)
}
