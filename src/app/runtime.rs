// SPDX-License-Identifier: GPL-3.0-only

//! Command execution
//!
//! The runtime owns everything the model must not touch: the camera stream,
//! the pending timers, the environment task and the message channel. It
//! runs the [`Command`]s returned by [`AppModel::update`] and turns their
//! outcomes back into [`Message`]s.
//!
//! Camera acquisition runs on the blocking pool and is tagged with a
//! generation number. Releasing the camera bumps the generation, so a
//! stream that finishes opening after it was no longer wanted is released
//! immediately instead of leaking.

use crate::app::state::{AppModel, Command, Message};
use crate::app::timers::Scheduler;
use crate::backends::camera::{CameraBackend, CameraFrame, MediaStream};
use crate::environment::Reporter;
use crate::errors::CameraError;
use crate::pipelines::photo;
use crate::storage;
use std::ops::ControlFlow;
use std::path::PathBuf;
use std::sync::Arc;
use tokio::sync::mpsc::{UnboundedReceiver, UnboundedSender, unbounded_channel};
use tokio::task::JoinHandle;
use tracing::{debug, info, warn};

type Acquired = (u64, Result<MediaStream, CameraError>);

pub struct Runtime<B, R> {
    backend: Arc<B>,
    reporter: Option<R>,
    save_dir: PathBuf,
    scheduler: Scheduler,
    messages_tx: UnboundedSender<Message>,
    messages_rx: UnboundedReceiver<Message>,
    acquired_tx: UnboundedSender<Acquired>,
    acquired_rx: UnboundedReceiver<Acquired>,
    stream: Option<MediaStream>,
    stream_generation: u64,
    latest_frame: Option<CameraFrame>,
    environment_task: Option<JoinHandle<()>>,
}

impl<B, R> Runtime<B, R>
where
    B: CameraBackend + 'static,
    R: Reporter,
{
    pub fn new(backend: B, reporter: R, save_dir: PathBuf) -> Self {
        let (messages_tx, messages_rx) = unbounded_channel();
        let (acquired_tx, acquired_rx) = unbounded_channel();
        Self {
            backend: Arc::new(backend),
            reporter: Some(reporter),
            save_dir,
            scheduler: Scheduler::new(messages_tx.clone()),
            messages_tx,
            messages_rx,
            acquired_tx,
            acquired_rx,
            stream: None,
            stream_generation: 0,
            latest_frame: None,
            environment_task: None,
        }
    }

    /// Sender for messages from outside the runtime (keyboard input)
    pub fn sender(&self) -> UnboundedSender<Message> {
        self.messages_tx.clone()
    }

    /// True while a camera stream is held
    pub fn has_stream(&self) -> bool {
        self.stream.is_some()
    }

    /// Newest frame from the held stream
    pub fn current_frame(&mut self) -> Option<&CameraFrame> {
        if let Some(frame) = self.stream.as_mut().and_then(MediaStream::latest_frame) {
            self.latest_frame = Some(frame);
        }
        self.latest_frame.as_ref()
    }

    /// Wait for the next message for the model
    pub async fn next_message(&mut self) -> Option<Message> {
        loop {
            tokio::select! {
                message = self.messages_rx.recv() => return message,
                Some((generation, result)) = self.acquired_rx.recv() => {
                    if let Some(message) = self.on_acquired(generation, result) {
                        return Some(message);
                    }
                }
            }
        }
    }

    /// Feed a message to the model and run the resulting commands
    pub fn dispatch(&mut self, model: &mut AppModel, message: Message) -> ControlFlow<()> {
        let commands = model.update(message);
        self.execute(commands)
    }

    /// Run commands in order; `Break` once [`Command::Exit`] is reached
    pub fn execute(&mut self, commands: Vec<Command>) -> ControlFlow<()> {
        for command in commands {
            match command {
                Command::Schedule { id, delay, message } => {
                    self.scheduler.schedule(id, delay, message)
                }
                Command::CancelTimer(id) => self.scheduler.cancel(id),
                Command::CancelAllTimers => self.scheduler.cancel_all(),
                Command::AcquireCamera => self.acquire_camera(),
                Command::ReleaseCamera => self.release_camera(),
                Command::GrabFrame { filter } => {
                    let frame = self.current_frame().cloned();
                    let sender = self.messages_tx.clone();
                    tokio::spawn(async move {
                        let result = photo::capture_photo(frame, filter).await;
                        let _ = sender.send(Message::FrameGrabbed(result));
                    });
                }
                Command::SaveImage { png, file_name } => {
                    let dir = self.save_dir.clone();
                    let sender = self.messages_tx.clone();
                    tokio::spawn(async move {
                        let result = storage::save_photo(dir, file_name, png.to_vec())
                            .await
                            .map_err(|e| e.to_string());
                        let _ = sender.send(Message::Saved(result));
                    });
                }
                Command::FetchEnvironment => self.fetch_environment(),
                Command::Exit => {
                    self.shutdown();
                    return ControlFlow::Break(());
                }
            }
        }
        ControlFlow::Continue(())
    }

    /// Cancel timers, stop the environment lookup and release the camera
    pub fn shutdown(&mut self) {
        self.scheduler.cancel_all();
        if let Some(task) = self.environment_task.take() {
            task.abort();
        }
        self.release_camera();
    }

    fn acquire_camera(&mut self) {
        if self.stream.is_some() {
            warn!("Camera already held, releasing before re-acquiring");
            self.release_camera();
        }
        self.stream_generation += 1;
        let generation = self.stream_generation;
        let backend = self.backend.clone();
        let sender = self.acquired_tx.clone();
        debug!(generation, "Acquiring camera");

        tokio::task::spawn_blocking(move || {
            let result = backend.acquire();
            let _ = sender.send((generation, result));
        });
    }

    fn release_camera(&mut self) {
        // Invalidate any acquisition still in flight
        self.stream_generation += 1;
        self.latest_frame = None;
        if let Some(stream) = self.stream.take() {
            stream.release();
        }
    }

    fn on_acquired(&mut self, generation: u64, result: Result<MediaStream, CameraError>) -> Option<Message> {
        if generation != self.stream_generation {
            debug!(generation, current = self.stream_generation, "Discarding stale camera acquisition");
            if let Ok(stream) = result {
                stream.release();
            }
            return None;
        }

        Some(Message::CameraReady(match result {
            Ok(stream) => {
                let label = stream.label().to_string();
                info!(source = %label, "Camera acquired");
                self.stream = Some(stream);
                Ok(label)
            }
            Err(e) => Err(e),
        }))
    }

    fn fetch_environment(&mut self) {
        let Some(reporter) = self.reporter.take() else {
            debug!("Environment already fetched");
            return;
        };
        let messages = self.messages_tx.clone();

        self.environment_task = Some(tokio::spawn(async move {
            let (updates_tx, mut updates_rx) = unbounded_channel();
            let forward = async {
                while let Some(update) = updates_rx.recv().await {
                    if messages.send(Message::Environment(update)).is_err() {
                        break;
                    }
                }
            };
            tokio::join!(reporter.report(updates_tx), forward);
        }));
    }
}

impl<B, R> Drop for Runtime<B, R> {
    fn drop(&mut self) {
        if let Some(task) = self.environment_task.take() {
            task.abort();
        }
        if let Some(stream) = self.stream.take() {
            stream.release();
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::app::state::{Flags, Stage, StreamState};
    use crate::backends::camera::{FrameSender, StreamHandle};
    use crate::environment::EnvironmentUpdate;
    use crate::errors::GeolocationError;
    use crate::filters::FilterType;
    use std::sync::Mutex;
    use std::sync::atomic::{AtomicUsize, Ordering};
    use std::time::Duration;

    struct CountingHandle(Arc<AtomicUsize>);

    impl StreamHandle for CountingHandle {
        fn stop(&mut self) {
            self.0.fetch_add(1, Ordering::SeqCst);
        }
    }

    #[derive(Default)]
    struct FakeCamera {
        acquired: AtomicUsize,
        stopped: Arc<AtomicUsize>,
        senders: Mutex<Vec<FrameSender>>,
    }

    impl CameraBackend for Arc<FakeCamera> {
        fn acquire(&self) -> Result<MediaStream, CameraError> {
            self.acquired.fetch_add(1, Ordering::SeqCst);
            let (tx, rx) = futures::channel::mpsc::channel(4);
            self.senders.lock().unwrap().push(tx);
            Ok(MediaStream::new(
                "Fake Camera",
                rx,
                Box::new(CountingHandle(self.stopped.clone())),
            ))
        }
    }

    impl FakeCamera {
        fn push_frame(&self, value: u8) {
            let mut senders = self.senders.lock().unwrap();
            let sender = senders.last_mut().unwrap();
            sender
                .try_send(CameraFrame::from_rgba(2, 2, vec![value; 16]))
                .unwrap();
        }
    }

    struct NoLocation;

    impl Reporter for NoLocation {
        async fn report(self, updates: UnboundedSender<EnvironmentUpdate>) {
            let _ = updates.send(EnvironmentUpdate::Location(Err(GeolocationError::Unsupported)));
        }
    }

    fn setup() -> (Arc<FakeCamera>, Runtime<Arc<FakeCamera>, NoLocation>, AppModel) {
        let camera = Arc::new(FakeCamera::default());
        let mut runtime = Runtime::new(camera.clone(), NoLocation, std::env::temp_dir());
        let (model, commands) = AppModel::init(Flags {
            filter: FilterType::None,
            mirror_preview: true,
        });
        assert!(runtime.execute(commands).is_continue());
        (camera, runtime, model)
    }

    /// Pump messages until `done` holds for the model
    async fn run_until(
        runtime: &mut Runtime<Arc<FakeCamera>, NoLocation>,
        model: &mut AppModel,
        done: impl Fn(&AppModel) -> bool,
    ) {
        while !done(model) {
            let message = runtime.next_message().await.unwrap();
            assert!(runtime.dispatch(model, message).is_continue());
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_welcome_then_live_with_camera() {
        let (camera, mut runtime, mut model) = setup();
        let start = tokio::time::Instant::now();

        run_until(&mut runtime, &mut model, |m| {
            matches!(m.stream, StreamState::Active { .. })
        })
        .await;

        assert_eq!(model.stage, Stage::Live);
        assert!(start.elapsed() >= Duration::from_secs(3));
        assert_eq!(camera.acquired.load(Ordering::SeqCst), 1);
        assert!(runtime.has_stream());
    }

    #[tokio::test(start_paused = true)]
    async fn test_environment_arrives_once() {
        let (_camera, mut runtime, mut model) = setup();

        run_until(&mut runtime, &mut model, |m| {
            m.environment.location_error.is_some()
        })
        .await;

        assert_eq!(
            model.environment.status_message(),
            Some("Geolocation not supported.")
        );
    }

    #[tokio::test(start_paused = true)]
    async fn test_full_capture_cycle() {
        let (camera, mut runtime, mut model) = setup();
        run_until(&mut runtime, &mut model, |m| {
            matches!(m.stream, StreamState::Active { .. })
        })
        .await;
        camera.push_frame(200);

        let pressed = tokio::time::Instant::now();
        assert!(runtime.dispatch(&mut model, Message::Shutter).is_continue());
        run_until(&mut runtime, &mut model, |m| m.stage == Stage::Captured).await;

        assert!(pressed.elapsed() >= Duration::from_secs(4));
        let captured = model.captured.as_ref().unwrap();
        assert_eq!((captured.width(), captured.height()), (2, 2));
        assert_eq!(captured.image.get_pixel(0, 0).0, [200, 200, 200, 200]);

        // Take another: old stream stopped, a fresh one acquired
        assert!(runtime.dispatch(&mut model, Message::TakeAnother).is_continue());
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
        run_until(&mut runtime, &mut model, |m| {
            matches!(m.stream, StreamState::Active { .. })
        })
        .await;
        assert_eq!(camera.acquired.load(Ordering::SeqCst), 2);
        assert_eq!(model.stage, Stage::Live);
    }

    #[tokio::test(start_paused = true)]
    async fn test_grab_without_frame_stays_live() {
        let (_camera, mut runtime, mut model) = setup();
        run_until(&mut runtime, &mut model, |m| {
            matches!(m.stream, StreamState::Active { .. })
        })
        .await;

        assert!(runtime.dispatch(&mut model, Message::Shutter).is_continue());
        run_until(&mut runtime, &mut model, |m| m.shutter_enabled()).await;

        assert_eq!(model.stage, Stage::Live);
        assert!(model.captured.is_none());
    }

    #[tokio::test(start_paused = true)]
    async fn test_quit_during_countdown_stops_everything() {
        let (camera, mut runtime, mut model) = setup();
        run_until(&mut runtime, &mut model, |m| {
            matches!(m.stream, StreamState::Active { .. })
        })
        .await;
        assert!(runtime.dispatch(&mut model, Message::Shutter).is_continue());

        assert!(runtime.dispatch(&mut model, Message::Quit).is_break());
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
        assert!(!runtime.has_stream());

        // No countdown message survives the quit
        tokio::time::sleep(Duration::from_secs(10)).await;
        while let Ok(message) = runtime.messages_rx.try_recv() {
            assert!(
                !matches!(
                    message,
                    Message::CountdownTick { .. } | Message::CountdownFinished { .. }
                ),
                "timer fired after quit: {:?}",
                message
            );
        }
    }

    #[tokio::test(start_paused = true)]
    async fn test_stale_acquisition_is_released() {
        let (camera, mut runtime, _model) = setup();

        assert!(runtime.execute(vec![Command::AcquireCamera]).is_continue());
        assert!(runtime.execute(vec![Command::ReleaseCamera]).is_continue());
        // Let the blocking acquisition land
        let (generation, result) = runtime.acquired_rx.recv().await.unwrap();

        assert!(runtime.on_acquired(generation, result).is_none());
        assert!(!runtime.has_stream());
        assert_eq!(camera.stopped.load(Ordering::SeqCst), 1);
    }
}
