// SPDX-License-Identifier: GPL-3.0-only

//! Application state management

use crate::environment::{EnvironmentReading, EnvironmentUpdate};
use crate::errors::{CameraError, CaptureError};
use crate::filters::FilterType;
use crate::pipelines::photo::CapturedImage;
use std::path::PathBuf;
use std::sync::Arc;
use std::time::Duration;

/// Which screen the booth shows
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Stage {
    /// Welcome message, shown once at startup
    #[default]
    Notification,
    /// Live preview with filters and the shutter
    Live,
    /// The captured still with save / take another
    Captured,
}

/// Label shown on top of the preview while the shutter counts down
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CountdownStep {
    One,
    Two,
    Three,
    Smile,
}

impl CountdownStep {
    /// Steps in display order
    pub const ALL: [CountdownStep; 4] = [
        CountdownStep::One,
        CountdownStep::Two,
        CountdownStep::Three,
        CountdownStep::Smile,
    ];

    pub fn label(&self) -> &'static str {
        match self {
            CountdownStep::One => "1",
            CountdownStep::Two => "2",
            CountdownStep::Three => "3",
            CountdownStep::Smile => "Smile!",
        }
    }
}

/// What the model knows about the camera stream
///
/// The stream itself lives in the runtime; the model only tracks whether
/// one is held so it can ask for it to be released.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub enum StreamState {
    #[default]
    Released,
    /// Acquisition requested, not answered yet
    Acquiring,
    /// Frames are flowing from the named source
    Active { label: String },
}

impl StreamState {
    pub fn is_released(&self) -> bool {
        matches!(self, StreamState::Released)
    }
}

/// Groups of timers that are cancelled together
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum TimerId {
    /// Welcome screen dismissal
    Notification,
    /// Countdown steps and the final grab
    Countdown,
}

/// Messages handled by [`AppModel::update`]
#[derive(Debug, Clone)]
pub enum Message {
    /// The welcome screen has been up long enough
    NotificationElapsed,
    /// Answer to [`Command::AcquireCamera`]; `Ok` carries the source label
    CameraReady(Result<String, CameraError>),
    /// Shutter button pressed
    Shutter,
    /// Countdown advanced to `step`
    CountdownTick { generation: u64, step: CountdownStep },
    /// Last countdown step has been shown for its full second
    CountdownFinished { generation: u64 },
    /// Answer to [`Command::GrabFrame`]
    FrameGrabbed(Result<CapturedImage, CaptureError>),
    /// Filter chosen in the filter bar
    SelectFilter(FilterType),
    /// Save the captured still
    Save,
    /// Answer to [`Command::SaveImage`]
    Saved(Result<PathBuf, String>),
    /// Discard the capture and go back to the live preview
    TakeAnother,
    /// Progress from the environment reporter
    Environment(EnvironmentUpdate),
    /// Leave the booth
    Quit,
}

/// Side effects requested by the model, executed by the runtime
#[derive(Debug, Clone)]
pub enum Command {
    /// Deliver `message` after `delay` unless the timer group is cancelled
    Schedule {
        id: TimerId,
        delay: Duration,
        message: Message,
    },
    /// Abort every pending timer of a group
    CancelTimer(TimerId),
    /// Abort every pending timer
    CancelAllTimers,
    /// Open the camera; answered with [`Message::CameraReady`]
    AcquireCamera,
    /// Stop the camera stream if one is held
    ReleaseCamera,
    /// Copy the latest frame with `filter`; answered with [`Message::FrameGrabbed`]
    GrabFrame { filter: FilterType },
    /// Write PNG bytes to the save directory; answered with [`Message::Saved`]
    SaveImage { png: Arc<[u8]>, file_name: String },
    /// Start the one-shot environment lookup
    FetchEnvironment,
    /// Stop the event loop
    Exit,
}

/// Startup options for the model
#[derive(Debug, Clone, Default)]
pub struct Flags {
    pub filter: FilterType,
    pub mirror_preview: bool,
}

/// The main application model
#[derive(Debug, Default)]
pub struct AppModel {
    /// Active screen
    pub stage: Stage,
    /// Camera stream as seen by the model
    pub stream: StreamState,
    /// Last camera failure, shown instead of the preview
    pub camera_error: Option<CameraError>,
    /// Selected filter, applied to the preview and the next capture
    pub filter: FilterType,
    /// Mirror preview horizontally (selfie mode)
    pub mirror_preview: bool,
    /// Countdown label while the shutter is counting down
    pub countdown: Option<CountdownStep>,
    /// Ties countdown messages to one shutter press
    pub(crate) countdown_generation: u64,
    /// A grab has been requested and not answered yet
    pub(crate) grab_pending: bool,
    /// The captured still, present only in [`Stage::Captured`]
    pub captured: Option<CapturedImage>,
    /// Temperature, AQI and lookup errors
    pub environment: EnvironmentReading,
    /// The environment lookup has been requested
    pub(crate) environment_requested: bool,
    /// One-line feedback (e.g. where a photo was saved)
    pub status: Option<String>,
    /// Quit has been processed
    pub exiting: bool,
}

impl AppModel {
    /// Build the model in the welcome stage together with its startup commands
    pub fn init(flags: Flags) -> (Self, Vec<Command>) {
        let mut model = AppModel {
            filter: flags.filter,
            mirror_preview: flags.mirror_preview,
            ..Default::default()
        };
        let commands = model.enter_notification();
        (model, commands)
    }

    /// The shutter does nothing while this is false
    pub fn shutter_enabled(&self) -> bool {
        self.stage == Stage::Live && self.countdown.is_none() && !self.grab_pending
    }

    /// Countdown label for the overlay
    pub fn countdown_label(&self) -> Option<&'static str> {
        self.countdown.as_ref().map(CountdownStep::label)
    }
}
