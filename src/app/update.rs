// SPDX-License-Identifier: GPL-3.0-only

//! Message update handling
//!
//! `update()` is a dispatcher; the handling code lives in `handlers`,
//! organized by functional domain.
//!
//! # Handler Modules
//!
//! - `handlers::sequencer`: welcome screen, camera lifecycle, take another, quit
//! - `handlers::capture`: shutter countdown, frame grab, save
//! - `handlers::filter`: filter selection
//! - `handlers::environment`: location, temperature and AQI updates

use crate::app::state::{AppModel, Command, Message};

impl AppModel {
    /// Main message handler - routes messages to the handler methods.
    ///
    /// Never blocks and never performs I/O; every side effect is returned
    /// as a [`Command`] for the runtime to execute.
    pub fn update(&mut self, message: Message) -> Vec<Command> {
        if self.exiting {
            return Vec::new();
        }

        match message {
            // ===== Stage sequencing =====
            Message::NotificationElapsed => self.handle_notification_elapsed(),
            Message::CameraReady(result) => self.handle_camera_ready(result),
            Message::TakeAnother => self.handle_take_another(),
            Message::Quit => self.handle_quit(),

            // ===== Capture =====
            Message::Shutter => self.handle_shutter(),
            Message::CountdownTick { generation, step } => {
                self.handle_countdown_tick(generation, step)
            }
            Message::CountdownFinished { generation } => {
                self.handle_countdown_finished(generation)
            }
            Message::FrameGrabbed(result) => self.handle_frame_grabbed(result),
            Message::Save => self.handle_save(),
            Message::Saved(result) => self.handle_saved(result),

            // ===== Filters =====
            Message::SelectFilter(filter) => self.handle_select_filter(filter),

            // ===== Environment =====
            Message::Environment(update) => self.handle_environment_update(update),
        }
    }
}
