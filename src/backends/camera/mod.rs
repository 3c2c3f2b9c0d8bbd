// SPDX-License-Identifier: GPL-3.0-only

//! Camera backend abstraction
//!
//! ```text
//! ┌─────────────────────┐
//! │  Runtime (app)      │  ← owns at most one MediaStream
//! └──────────┬──────────┘
//!            │ acquire / release
//!            ▼
//! ┌─────────────────────┐
//! │ CameraBackend Trait │
//! └──────────┬──────────┘
//!            ▼
//!      ┌───────────┐
//!      │ GStreamer │  ← appsink delivering RGBA frames
//!      └───────────┘
//! ```

pub mod enumeration;
pub mod pipeline;
pub mod types;

pub use enumeration::enumerate_cameras;
pub use pipeline::GstCameraBackend;
pub use types::*;

use crate::errors::CameraError;
use tracing::{debug, info};

/// Something that can open a live video stream
///
/// `acquire` may block for a few seconds while the device starts, so
/// callers run it off the event loop.
pub trait CameraBackend: Send + Sync {
    /// Open the camera and start delivering frames
    fn acquire(&self) -> Result<MediaStream, CameraError>;
}

/// Handle that keeps the underlying capture running
pub trait StreamHandle: Send {
    /// Stop all underlying tracks and release the device
    fn stop(&mut self);
}

/// An active camera feed
///
/// Frames arrive on a bounded channel; the stream is released by
/// [`MediaStream::release`] or when dropped.
pub struct MediaStream {
    label: String,
    frames: FrameReceiver,
    handle: Option<Box<dyn StreamHandle>>,
}

impl MediaStream {
    pub fn new(label: impl Into<String>, frames: FrameReceiver, handle: Box<dyn StreamHandle>) -> Self {
        Self {
            label: label.into(),
            frames,
            handle: Some(handle),
        }
    }

    /// Human readable name of the source
    pub fn label(&self) -> &str {
        &self.label
    }

    /// Drain pending frames and return the newest one, if any arrived
    pub fn latest_frame(&mut self) -> Option<CameraFrame> {
        let mut latest = None;
        while let Ok(frame) = self.frames.try_recv() {
            latest = Some(frame);
        }
        latest
    }

    /// Stop the stream and release the device
    pub fn release(mut self) {
        self.stop();
    }

    fn stop(&mut self) {
        if let Some(mut handle) = self.handle.take() {
            info!(source = %self.label, "Releasing camera stream");
            handle.stop();
        }
    }
}

impl Drop for MediaStream {
    fn drop(&mut self) {
        if self.handle.is_some() {
            debug!(source = %self.label, "Media stream dropped while active");
            self.stop();
        }
    }
}

impl std::fmt::Debug for MediaStream {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("MediaStream")
            .field("label", &self.label)
            .field("active", &self.handle.is_some())
            .finish()
    }
}
