// SPDX-License-Identifier: GPL-3.0-only

//! Stage sequencing handlers
//!
//! Welcome → live preview → captured still, plus the camera lifecycle that
//! goes with it and the orderly exit.

use crate::app::state::{AppModel, Command, Message, Stage, StreamState, TimerId};
use crate::constants::timing;
use crate::errors::CameraError;
use tracing::{debug, info, warn};

impl AppModel {
    /// Enter the welcome stage and arm its dismissal timer
    pub(crate) fn enter_notification(&mut self) -> Vec<Command> {
        self.stage = Stage::Notification;
        let mut commands = vec![Command::Schedule {
            id: TimerId::Notification,
            delay: timing::NOTIFICATION_DELAY,
            message: Message::NotificationElapsed,
        }];
        if !self.environment_requested {
            self.environment_requested = true;
            commands.push(Command::FetchEnvironment);
        }
        commands
    }

    pub(crate) fn handle_notification_elapsed(&mut self) -> Vec<Command> {
        if self.stage != Stage::Notification {
            debug!(stage = ?self.stage, "Ignoring late welcome timer");
            return Vec::new();
        }
        info!("Welcome dismissed, starting live preview");
        self.stage = Stage::Live;
        self.request_camera()
    }

    pub(crate) fn handle_camera_ready(&mut self, result: Result<String, CameraError>) -> Vec<Command> {
        if self.stream != StreamState::Acquiring {
            debug!(stream = ?self.stream, "Ignoring unrequested camera answer");
            return Vec::new();
        }
        match result {
            Ok(label) => {
                info!(source = %label, "Camera stream active");
                self.stream = StreamState::Active { label };
                self.camera_error = None;
            }
            Err(e) => {
                warn!(error = %e, "Camera unavailable, preview stays empty");
                self.stream = StreamState::Released;
                self.camera_error = Some(e);
            }
        }
        Vec::new()
    }

    pub(crate) fn handle_take_another(&mut self) -> Vec<Command> {
        if self.stage != Stage::Captured {
            return Vec::new();
        }
        info!("Discarding capture, back to live preview");
        self.stage = Stage::Live;
        self.captured = None;
        self.countdown = None;
        self.status = None;

        let mut commands = vec![Command::CancelTimer(TimerId::Countdown)];
        commands.extend(self.release_camera());
        commands.extend(self.request_camera());
        commands
    }

    pub(crate) fn handle_quit(&mut self) -> Vec<Command> {
        info!("Quitting");
        self.exiting = true;
        self.countdown = None;

        let mut commands = vec![Command::CancelAllTimers];
        commands.extend(self.release_camera());
        commands.push(Command::Exit);
        commands
    }

    fn request_camera(&mut self) -> Vec<Command> {
        self.stream = StreamState::Acquiring;
        self.camera_error = None;
        vec![Command::AcquireCamera]
    }

    fn release_camera(&mut self) -> Vec<Command> {
        if self.stream.is_released() {
            return Vec::new();
        }
        self.stream = StreamState::Released;
        vec![Command::ReleaseCamera]
    }
}
