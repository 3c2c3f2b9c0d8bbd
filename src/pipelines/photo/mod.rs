// SPDX-License-Identifier: GPL-3.0-only

//! Still photo capture
//!
//! 1. **Capture**: copy the latest preview frame at native resolution
//! 2. **Filter**: apply the filter selected at grab time
//! 3. **Encoding**: PNG, kept in memory until the user saves

pub mod capture;
pub mod encoding;

pub use capture::{CapturedImage, PhotoCapture};
pub use encoding::encode_png;

use crate::backends::camera::CameraFrame;
use crate::errors::CaptureError;
use crate::filters::FilterType;

/// Grab, filter and encode a frame off the async executor
///
/// `None` means no frame has arrived yet, which yields
/// [`CaptureError::MountMissing`].
pub async fn capture_photo(
    frame: Option<CameraFrame>,
    filter: FilterType,
) -> Result<CapturedImage, CaptureError> {
    tokio::task::spawn_blocking(move || PhotoCapture::grab(frame.as_ref(), filter))
        .await
        .map_err(|e| CaptureError::EncodingFailed(format!("Capture task error: {}", e)))?
}
