// SPDX-License-Identifier: GPL-3.0-only

//! Camera discovery through the GStreamer device monitor

use super::types::{CameraDevice, CameraSource};
use crate::errors::CameraError;
use gstreamer::prelude::*;
use tracing::{debug, info};

/// List video sources known to GStreamer
pub fn enumerate_cameras() -> Result<Vec<CameraDevice>, CameraError> {
    gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

    let monitor = gstreamer::DeviceMonitor::new();
    let _filter_id = monitor.add_filter(Some("Video/Source"), None);
    monitor
        .start()
        .map_err(|e| CameraError::InitializationFailed(e.to_string()))?;
    let devices = monitor.devices();
    monitor.stop();

    let cameras: Vec<CameraDevice> = devices
        .iter()
        .map(|device| {
            let name = device.display_name().to_string();
            let properties = device.properties();
            let property = |key: &str| -> Option<String> {
                properties
                    .as_ref()
                    .and_then(|s| s.get::<String>(key).ok())
            };
            let source = source_for_device(
                property("device.api").as_deref(),
                property("api.v4l2.path")
                    .or_else(|| property("device.path"))
                    .as_deref(),
                property("object.serial").as_deref(),
            );
            debug!(name = %name, source = %source, "Found camera");
            CameraDevice { name, source }
        })
        .collect();

    info!(count = cameras.len(), "Camera enumeration complete");
    Ok(cameras)
}

/// Choose the source that reopens a monitored device
fn source_for_device(
    api: Option<&str>,
    device_path: Option<&str>,
    pipewire_serial: Option<&str>,
) -> CameraSource {
    match (api, device_path, pipewire_serial) {
        (Some("pipewire"), _, Some(serial)) => CameraSource::PipeWire {
            target: Some(serial.to_string()),
        },
        (Some("pipewire"), _, None) => CameraSource::PipeWire { target: None },
        (_, Some(path), _) => CameraSource::V4l2 {
            device: path.to_string(),
        },
        _ => CameraSource::Auto,
    }
}
