// SPDX-License-Identifier: GPL-3.0-only

//! Shared types for camera backends

use image::RgbaImage;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use std::time::Instant;

/// Where the preview stream comes from
///
/// Parsed from the `--camera` flag (`auto`, `test`, `pipewire`,
/// `pipewire:<target>`, `v4l2:<device>`) or stored in the config file.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum CameraSource {
    /// Let GStreamer pick the best video source
    #[default]
    Auto,
    /// PipeWire camera portal, optionally pinned to a node
    PipeWire { target: Option<String> },
    /// A V4L2 device node such as `/dev/video0`
    V4l2 { device: String },
    /// Synthetic test pattern (no hardware needed)
    Test,
}

impl CameraSource {
    /// GStreamer source element description for this source
    pub fn gst_source(&self) -> String {
        match self {
            CameraSource::Auto => "autovideosrc".to_string(),
            CameraSource::PipeWire { target: None } => "pipewiresrc".to_string(),
            CameraSource::PipeWire {
                target: Some(target),
            } => format!("pipewiresrc target-object={}", target),
            CameraSource::V4l2 { device } => format!("v4l2src device={}", device),
            CameraSource::Test => "videotestsrc is-live=true pattern=smpte".to_string(),
        }
    }
}

impl std::str::FromStr for CameraSource {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let (kind, arg) = match s.split_once(':') {
            Some((kind, arg)) => (kind, Some(arg)),
            None => (s, None),
        };
        match (kind.to_ascii_lowercase().as_str(), arg) {
            ("auto", None) => Ok(CameraSource::Auto),
            ("test", None) => Ok(CameraSource::Test),
            ("pipewire", None) => Ok(CameraSource::PipeWire { target: None }),
            ("pipewire", Some(target)) if !target.is_empty() => Ok(CameraSource::PipeWire {
                target: Some(target.to_string()),
            }),
            ("v4l2", Some(device)) if !device.is_empty() => Ok(CameraSource::V4l2 {
                device: device.to_string(),
            }),
            _ => Err(format!(
                "unknown camera source '{}' (expected auto, test, pipewire[:target] or v4l2:<device>)",
                s
            )),
        }
    }
}

impl std::fmt::Display for CameraSource {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            CameraSource::Auto => write!(f, "auto"),
            CameraSource::PipeWire { target: None } => write!(f, "pipewire"),
            CameraSource::PipeWire {
                target: Some(target),
            } => write!(f, "pipewire:{}", target),
            CameraSource::V4l2 { device } => write!(f, "v4l2:{}", device),
            CameraSource::Test => write!(f, "test"),
        }
    }
}

/// Represents a camera device found by the device monitor
#[derive(Debug, Clone)]
pub struct CameraDevice {
    pub name: String,
    /// Source that opens this device
    pub source: CameraSource,
}

/// A single RGBA frame from the camera
#[derive(Debug, Clone)]
pub struct CameraFrame {
    pub width: u32,
    pub height: u32,
    /// Row stride in bytes (may include padding)
    pub stride: u32,
    /// RGBA pixels, `stride * height` bytes
    pub data: Arc<[u8]>,
    /// Timestamp when frame was captured
    pub captured_at: Instant,
}

impl CameraFrame {
    /// Build a frame from tightly packed RGBA data
    pub fn from_rgba(width: u32, height: u32, data: Vec<u8>) -> Self {
        Self {
            width,
            height,
            stride: width * 4,
            data: Arc::from(data),
            captured_at: Instant::now(),
        }
    }

    /// RGB value at a pixel, clamped to the frame bounds
    pub fn pixel_rgb(&self, x: u32, y: u32) -> (u8, u8, u8) {
        if self.width == 0 || self.height == 0 {
            return (0, 0, 0);
        }
        let x = x.min(self.width - 1);
        let y = y.min(self.height - 1);
        let idx = (y * self.stride + x * 4) as usize;
        if idx + 2 < self.data.len() {
            (self.data[idx], self.data[idx + 1], self.data[idx + 2])
        } else {
            (0, 0, 0)
        }
    }

    /// Copy the frame into a tightly packed image at native resolution
    ///
    /// Returns `None` when the buffer is shorter than the frame geometry says.
    pub fn to_rgba_image(&self) -> Option<RgbaImage> {
        let row_bytes = (self.width * 4) as usize;
        let stride = self.stride as usize;
        if self.height == 0 || stride < row_bytes {
            return None;
        }
        let needed = stride * (self.height as usize - 1) + row_bytes;
        if self.data.len() < needed {
            return None;
        }

        let mut packed = Vec::with_capacity(row_bytes * self.height as usize);
        for row in self.data.chunks(stride).take(self.height as usize) {
            packed.extend_from_slice(&row[..row_bytes]);
        }
        RgbaImage::from_raw(self.width, self.height, packed)
    }
}

/// Frame receiver type for preview streams
pub type FrameReceiver = futures::channel::mpsc::Receiver<CameraFrame>;

/// Frame sender type for preview streams
pub type FrameSender = futures::channel::mpsc::Sender<CameraFrame>;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_parse_camera_sources() {
        assert_eq!("auto".parse::<CameraSource>(), Ok(CameraSource::Auto));
        assert_eq!("test".parse::<CameraSource>(), Ok(CameraSource::Test));
        assert_eq!(
            "pipewire".parse::<CameraSource>(),
            Ok(CameraSource::PipeWire { target: None })
        );
        assert_eq!(
            "v4l2:/dev/video2".parse::<CameraSource>(),
            Ok(CameraSource::V4l2 {
                device: "/dev/video2".into()
            })
        );
        assert!("v4l2".parse::<CameraSource>().is_err());
        assert!("webcam".parse::<CameraSource>().is_err());
    }

    #[test]
    fn test_source_display_parses_back() {
        let source = CameraSource::PipeWire {
            target: Some("42".into()),
        };
        assert_eq!(source.to_string().parse::<CameraSource>(), Ok(source));
    }

    #[test]
    fn test_gst_source_strings() {
        assert_eq!(
            CameraSource::V4l2 {
                device: "/dev/video0".into()
            }
            .gst_source(),
            "v4l2src device=/dev/video0"
        );
        assert!(CameraSource::Test.gst_source().starts_with("videotestsrc"));
    }

    #[test]
    fn test_to_rgba_image_strips_padding() {
        // 2x2 frame with 4 bytes of padding per row
        let mut data = Vec::new();
        data.extend_from_slice(&[1, 1, 1, 255, 2, 2, 2, 255, 0, 0, 0, 0]);
        data.extend_from_slice(&[3, 3, 3, 255, 4, 4, 4, 255, 0, 0, 0, 0]);
        let frame = CameraFrame {
            width: 2,
            height: 2,
            stride: 12,
            data: Arc::from(data),
            captured_at: Instant::now(),
        };

        let img = frame.to_rgba_image().unwrap();
        assert_eq!(img.dimensions(), (2, 2));
        assert_eq!(img.get_pixel(1, 1).0, [4, 4, 4, 255]);
        assert_eq!(frame.pixel_rgb(5, 5), (4, 4, 4));
    }

    #[test]
    fn test_to_rgba_image_rejects_short_buffer() {
        let frame = CameraFrame {
            width: 4,
            height: 4,
            stride: 16,
            data: Arc::from(vec![0u8; 10]),
            captured_at: Instant::now(),
        };
        assert!(frame.to_rgba_image().is_none());
    }
}
