// SPDX-License-Identifier: GPL-3.0-only

//! GStreamer pipeline for camera capture
//!
//! Builds `<source> ! videoconvert ! video/x-raw,format=RGBA ! appsink` and
//! forwards every decoded frame to the runtime over a bounded channel. Old
//! frames are dropped when the consumer falls behind.

use super::types::*;
use super::{CameraBackend, MediaStream, StreamHandle};
use crate::constants::{pipeline, timing};
use crate::errors::CameraError;
use gstreamer::prelude::*;
use gstreamer_app::AppSink;
use gstreamer_video::VideoInfo;
use std::sync::Arc;
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::Instant;
use tracing::{debug, error, info, warn};

/// Camera backend that opens a [`CameraSource`] through GStreamer
#[derive(Debug, Clone)]
pub struct GstCameraBackend {
    source: CameraSource,
}

impl GstCameraBackend {
    pub fn new(source: CameraSource) -> Self {
        Self { source }
    }

    /// Concrete source to open, picking the first monitored camera for `auto`
    fn resolve_source(&self) -> Result<(CameraSource, String), CameraError> {
        if self.source != CameraSource::Auto {
            return Ok((self.source.clone(), self.source.to_string()));
        }
        match super::enumerate_cameras() {
            Ok(cameras) => cameras
                .into_iter()
                .next()
                .map(|camera| (camera.source, camera.name))
                .ok_or(CameraError::NoCameraFound),
            Err(e) => {
                warn!(error = %e, "Device monitor unavailable, falling back to autovideosrc");
                Ok((CameraSource::Auto, CameraSource::Auto.to_string()))
            }
        }
    }
}

impl CameraBackend for GstCameraBackend {
    fn acquire(&self) -> Result<MediaStream, CameraError> {
        let (source, label) = self.resolve_source()?;
        let (sender, receiver) = futures::channel::mpsc::channel(pipeline::FRAME_CHANNEL_CAPACITY);
        let stream = CameraPipeline::new(&source, sender)?;
        Ok(MediaStream::new(label, receiver, Box::new(stream)))
    }
}

/// Running GStreamer capture pipeline
pub struct CameraPipeline {
    pipeline: gstreamer::Pipeline,
    appsink: AppSink,
    stopped: bool,
}

/// Full launch description for a source
pub fn pipeline_description(source: &CameraSource) -> String {
    format!(
        "{} ! videoconvert ! video/x-raw,format={} ! appsink name=sink",
        source.gst_source(),
        pipeline::OUTPUT_FORMAT
    )
}

impl CameraPipeline {
    /// Create and start a pipeline for the given source
    pub fn new(source: &CameraSource, frame_sender: FrameSender) -> Result<Self, CameraError> {
        info!(source = %source, "Creating camera pipeline");

        gstreamer::init().map_err(|e| CameraError::InitializationFailed(e.to_string()))?;

        let description = pipeline_description(source);
        debug!(pipeline = %description, "Launching pipeline");

        let pipeline = gstreamer::parse::launch(&description)
            .map_err(|e| CameraError::InitializationFailed(e.to_string()))?
            .dynamic_cast::<gstreamer::Pipeline>()
            .map_err(|_| CameraError::InitializationFailed("Not a pipeline".to_string()))?;

        let appsink = pipeline
            .by_name("sink")
            .ok_or_else(|| CameraError::InitializationFailed("Failed to get appsink".to_string()))?
            .dynamic_cast::<AppSink>()
            .map_err(|_| CameraError::InitializationFailed("Failed to cast appsink".to_string()))?;

        appsink.set_property("emit-signals", true);
        appsink.set_property("sync", false);
        appsink.set_property("max-buffers", pipeline::MAX_BUFFERS);
        appsink.set_property("drop", true);
        appsink.set_property("enable-last-sample", false);

        let frame_counter = Arc::new(AtomicU64::new(0));
        appsink.set_callbacks(
            gstreamer_app::AppSinkCallbacks::builder()
                .new_sample(move |appsink| {
                    let frame_num = frame_counter.fetch_add(1, Ordering::Relaxed);
                    let frame = pull_frame(appsink, frame_num)?;

                    let mut sender = frame_sender.clone();
                    if let Err(e) = sender.try_send(frame) {
                        if e.is_disconnected() {
                            return Err(gstreamer::FlowError::Eos);
                        }
                        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
                            debug!(frame = frame_num, "Frame dropped (channel full)");
                        }
                    }
                    Ok(gstreamer::FlowSuccess::Ok)
                })
                .build(),
        );

        if let Err(e) = pipeline.set_state(gstreamer::State::Playing) {
            error!(error = %e, "Failed to set pipeline to PLAYING state");
            let reason = bus_error(&pipeline);
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(reason.unwrap_or_else(|| CameraError::InitializationFailed(e.to_string())));
        }

        let (result, state, pending) = pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::START_TIMEOUT_SECS,
        ));
        debug!(?result, ?state, ?pending, "Pipeline state");

        if result.is_err() {
            let reason = bus_error(&pipeline);
            let _ = pipeline.set_state(gstreamer::State::Null);
            return Err(reason.unwrap_or_else(|| {
                CameraError::InitializationFailed(format!("Pipeline failed to start ({:?})", state))
            }));
        }
        if state != gstreamer::State::Playing {
            warn!(?state, ?pending, "Pipeline is not in PLAYING state yet");
        }

        info!(source = %source, "Camera pipeline running");
        Ok(Self {
            pipeline,
            appsink,
            stopped: false,
        })
    }
}

impl StreamHandle for CameraPipeline {
    fn stop(&mut self) {
        if self.stopped {
            return;
        }
        self.stopped = true;

        // Clear callbacks first so the frame sender is dropped
        self.appsink
            .set_callbacks(gstreamer_app::AppSinkCallbacks::builder().build());

        if let Err(e) = self.pipeline.set_state(gstreamer::State::Null) {
            warn!(error = %e, "Failed to stop pipeline");
            return;
        }
        let (result, state, _) = self.pipeline.state(gstreamer::ClockTime::from_seconds(
            timing::STOP_TIMEOUT_SECS,
        ));
        match result {
            Ok(_) => info!(?state, "Camera pipeline stopped"),
            Err(e) => debug!(error = ?e, ?state, "Pipeline state change had issues"),
        }
    }
}

impl Drop for CameraPipeline {
    fn drop(&mut self) {
        self.stop();
    }
}

/// Pull one sample from the appsink and copy it into a [`CameraFrame`]
fn pull_frame(appsink: &AppSink, frame_num: u64) -> Result<CameraFrame, gstreamer::FlowError> {
    let captured_at = Instant::now();

    let sample = appsink.pull_sample().map_err(|e| {
        if frame_num % timing::FRAME_LOG_INTERVAL == 0 {
            error!(frame = frame_num, error = ?e, "Failed to pull sample");
        }
        gstreamer::FlowError::Eos
    })?;

    let buffer = sample.buffer().ok_or(gstreamer::FlowError::Error)?;
    if buffer.flags().contains(gstreamer::BufferFlags::CORRUPTED) {
        warn!(frame = frame_num, "Buffer marked as corrupted, skipping frame");
        return Err(gstreamer::FlowError::Error);
    }

    let caps = sample.caps().ok_or(gstreamer::FlowError::Error)?;
    let video_info = VideoInfo::from_caps(caps).map_err(|e| {
        error!(frame = frame_num, error = ?e, "Failed to get video info");
        gstreamer::FlowError::Error
    })?;

    let map = buffer.map_readable().map_err(|e| {
        error!(frame = frame_num, error = ?e, "Failed to map buffer");
        gstreamer::FlowError::Error
    })?;

    let stride = video_info.stride()[0] as u32;
    if frame_num % (timing::FRAME_LOG_INTERVAL * 2) == 0 {
        debug!(
            frame = frame_num,
            width = video_info.width(),
            height = video_info.height(),
            stride,
            "Frame received"
        );
    }

    Ok(CameraFrame {
        width: video_info.width(),
        height: video_info.height(),
        stride,
        data: Arc::from(map.as_slice()),
        captured_at,
    })
}

/// Translate the first error on the bus into a camera error
fn bus_error(pipeline: &gstreamer::Pipeline) -> Option<CameraError> {
    let bus = pipeline.bus()?;
    let msg = bus.timed_pop_filtered(
        gstreamer::ClockTime::from_mseconds(100),
        &[gstreamer::MessageType::Error],
    )?;

    match msg.view() {
        gstreamer::MessageView::Error(err) => {
            let error = err.error();
            error!(
                error = %error,
                debug = ?err.debug(),
                source = ?err.src().map(|s| s.name()),
                "GStreamer error during pipeline start"
            );
            Some(match error.kind::<gstreamer::ResourceError>() {
                Some(gstreamer::ResourceError::NotAuthorized) => CameraError::PermissionDenied,
                Some(gstreamer::ResourceError::NotFound) => CameraError::NoCameraFound,
                _ => CameraError::InitializationFailed(error.to_string()),
            })
        }
        _ => None,
    }
}
