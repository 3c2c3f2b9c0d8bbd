// SPDX-License-Identifier: GPL-3.0-only

//! Capture handlers
//!
//! Handles the shutter countdown, the frame grab and saving the still.

use crate::app::state::{AppModel, Command, CountdownStep, Message, Stage, TimerId};
use crate::constants::{SAVE_FILE_NAME, timing};
use crate::errors::CaptureError;
use crate::pipelines::photo::CapturedImage;
use std::path::PathBuf;
use tracing::{debug, info, warn};

impl AppModel {
    /// Start the countdown: "1" now, then one step per second, then the grab
    pub(crate) fn handle_shutter(&mut self) -> Vec<Command> {
        if !self.shutter_enabled() {
            debug!(
                stage = ?self.stage,
                countdown = ?self.countdown,
                grab_pending = self.grab_pending,
                "Shutter ignored"
            );
            return Vec::new();
        }

        self.countdown_generation += 1;
        let generation = self.countdown_generation;
        self.countdown = Some(CountdownStep::One);
        info!(generation, "Starting countdown");

        let mut commands: Vec<Command> = CountdownStep::ALL
            .iter()
            .enumerate()
            .skip(1)
            .map(|(i, step)| Command::Schedule {
                id: TimerId::Countdown,
                delay: timing::COUNTDOWN_STEP * i as u32,
                message: Message::CountdownTick {
                    generation,
                    step: *step,
                },
            })
            .collect();
        commands.push(Command::Schedule {
            id: TimerId::Countdown,
            delay: timing::COUNTDOWN_STEP * CountdownStep::ALL.len() as u32,
            message: Message::CountdownFinished { generation },
        });
        commands
    }

    pub(crate) fn handle_countdown_tick(&mut self, generation: u64, step: CountdownStep) -> Vec<Command> {
        if generation != self.countdown_generation || self.countdown.is_none() {
            debug!(generation, ?step, "Ignoring stale countdown tick");
            return Vec::new();
        }
        debug!(label = step.label(), "Countdown");
        self.countdown = Some(step);
        Vec::new()
    }

    /// Clear the countdown and grab with the filter selected right now
    pub(crate) fn handle_countdown_finished(&mut self, generation: u64) -> Vec<Command> {
        if generation != self.countdown_generation || self.countdown.is_none() {
            debug!(generation, "Ignoring stale countdown end");
            return Vec::new();
        }
        self.countdown = None;
        self.grab_pending = true;
        info!(filter = ?self.filter, "Countdown finished, grabbing frame");
        vec![Command::GrabFrame {
            filter: self.filter,
        }]
    }

    pub(crate) fn handle_frame_grabbed(
        &mut self,
        result: Result<CapturedImage, CaptureError>,
    ) -> Vec<Command> {
        if !self.grab_pending || self.stage != Stage::Live {
            debug!(stage = ?self.stage, "Discarding unrequested frame grab");
            return Vec::new();
        }
        self.grab_pending = false;

        match result {
            Ok(image) => {
                info!(
                    width = image.width(),
                    height = image.height(),
                    filter = ?image.filter,
                    "Showing captured photo"
                );
                self.captured = Some(image);
                self.stage = Stage::Captured;
                self.status = None;
            }
            Err(CaptureError::MountMissing) => {
                debug!("No video frame to grab, staying live");
            }
            Err(e) => {
                warn!(error = %e, "Frame grab failed");
                self.status = Some(format!("Capture failed: {}", e));
            }
        }
        Vec::new()
    }

    pub(crate) fn handle_save(&mut self) -> Vec<Command> {
        let Some(captured) = self.captured.as_ref().filter(|_| self.stage == Stage::Captured) else {
            return Vec::new();
        };
        info!(file = SAVE_FILE_NAME, "Saving photo");
        vec![Command::SaveImage {
            png: captured.png.clone(),
            file_name: SAVE_FILE_NAME.to_string(),
        }]
    }

    pub(crate) fn handle_saved(&mut self, result: Result<PathBuf, String>) -> Vec<Command> {
        self.status = Some(match result {
            Ok(path) => format!("Saved {}", path.display()),
            Err(e) => {
                warn!(error = %e, "Failed to save photo");
                format!("Save failed: {}", e)
            }
        });
        Vec::new()
    }
}

#[cfg(test)]
mod tests {
    use crate::app::handlers::test_support::{captured_model, live_model, scheduled};
    use crate::app::state::*;
    use crate::backends::camera::CameraFrame;
    use crate::errors::CaptureError;
    use crate::filters::FilterType;
    use crate::pipelines::photo::PhotoCapture;
    use std::path::PathBuf;
    use std::time::Duration;

    #[test]
    fn test_shutter_shows_one_and_schedules_steps() {
        let mut model = live_model();

        let commands = model.update(Message::Shutter);

        assert_eq!(model.countdown_label(), Some("1"));
        let timeline = scheduled(&commands);
        assert_eq!(timeline.len(), 4);
        let expected = [
            (1, Some(CountdownStep::Two)),
            (2, Some(CountdownStep::Three)),
            (3, Some(CountdownStep::Smile)),
            (4, None),
        ];
        for ((delay, message), (secs, step)) in timeline.iter().zip(expected) {
            assert_eq!(*delay, Duration::from_secs(secs));
            match (message, step) {
                (Message::CountdownTick { step: got, .. }, Some(want)) => assert_eq!(*got, want),
                (Message::CountdownFinished { .. }, None) => {}
                other => panic!("unexpected timeline entry {:?}", other),
            }
        }
    }

    #[test]
    fn test_countdown_labels_in_order() {
        let mut model = live_model();
        let commands = model.update(Message::Shutter);
        let mut labels = vec![model.countdown_label().unwrap()];

        for (_, message) in scheduled(&commands) {
            if matches!(message, Message::CountdownTick { .. }) {
                model.update(message);
                labels.push(model.countdown_label().unwrap());
            }
        }

        assert_eq!(labels, ["1", "2", "3", "Smile!"]);
    }

    #[test]
    fn test_shutter_ignored_during_countdown() {
        let mut model = live_model();
        model.update(Message::Shutter);
        let generation = model.countdown_generation;

        assert!(model.update(Message::Shutter).is_empty());
        assert_eq!(model.countdown_generation, generation);
        assert_eq!(model.countdown_label(), Some("1"));
    }

    #[test]
    fn test_shutter_ignored_outside_live() {
        let (mut model, _) = AppModel::init(Flags::default());
        assert!(model.update(Message::Shutter).is_empty());
        assert!(model.countdown.is_none());

        let mut model = captured_model();
        assert!(model.update(Message::Shutter).is_empty());
    }

    #[test]
    fn test_finish_grabs_with_filter_selected_at_that_moment() {
        let mut model = live_model();
        model.update(Message::Shutter);
        model.update(Message::SelectFilter(FilterType::Sepia));
        let generation = model.countdown_generation;

        let commands = model.update(Message::CountdownFinished { generation });

        assert!(model.countdown.is_none());
        assert!(matches!(
            commands.as_slice(),
            [Command::GrabFrame {
                filter: FilterType::Sepia
            }]
        ));
    }

    #[test]
    fn test_stale_countdown_messages_are_ignored() {
        let mut model = live_model();
        model.update(Message::Shutter);
        let stale = model.countdown_generation - 1;

        model.update(Message::CountdownTick {
            generation: stale,
            step: CountdownStep::Smile,
        });
        assert_eq!(model.countdown_label(), Some("1"));
        assert!(
            model
                .update(Message::CountdownFinished { generation: stale })
                .is_empty()
        );
    }

    #[test]
    fn test_shutter_disabled_until_grab_answers() {
        let mut model = live_model();
        model.update(Message::Shutter);
        let generation = model.countdown_generation;
        model.update(Message::CountdownFinished { generation });

        assert!(!model.shutter_enabled());
        assert!(model.update(Message::Shutter).is_empty());
    }

    #[test]
    fn test_missing_frame_stays_live() {
        let mut model = live_model();
        model.update(Message::Shutter);
        let generation = model.countdown_generation;
        model.update(Message::CountdownFinished { generation });

        model.update(Message::FrameGrabbed(Err(CaptureError::MountMissing)));

        assert_eq!(model.stage, Stage::Live);
        assert!(model.captured.is_none());
        assert!(model.status.is_none());
        assert!(model.shutter_enabled());
    }

    #[test]
    fn test_successful_grab_enters_captured() {
        let model = captured_model();
        assert!(model.captured.is_some());
        assert!(model.countdown.is_none());
    }

    #[test]
    fn test_unrequested_grab_is_discarded() {
        let mut model = live_model();
        let frame = CameraFrame::from_rgba(1, 1, vec![0, 0, 0, 255]);
        let image = PhotoCapture::grab(Some(&frame), FilterType::None).unwrap();

        model.update(Message::FrameGrabbed(Ok(image)));

        assert_eq!(model.stage, Stage::Live);
        assert!(model.captured.is_none());
    }

    #[test]
    fn test_save_requests_png_under_fixed_name() {
        let mut model = captured_model();
        let png = model.captured.as_ref().unwrap().png.clone();

        let commands = model.update(Message::Save);

        match commands.as_slice() {
            [Command::SaveImage { png: bytes, file_name }] => {
                assert_eq!(file_name, "smile-photo.png");
                assert_eq!(bytes, &png);
            }
            other => panic!("unexpected commands {:?}", other),
        }
        assert_eq!(model.stage, Stage::Captured);
    }

    #[test]
    fn test_save_outside_captured_is_ignored() {
        let mut model = live_model();
        assert!(model.update(Message::Save).is_empty());
    }

    #[test]
    fn test_saved_sets_status() {
        let mut model = captured_model();
        model.update(Message::Saved(Ok(PathBuf::from("/tmp/smile-photo.png"))));
        assert_eq!(model.status.as_deref(), Some("Saved /tmp/smile-photo.png"));

        model.update(Message::Saved(Err("disk full".into())));
        assert_eq!(model.status.as_deref(), Some("Save failed: disk full"));
    }
}
