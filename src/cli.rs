// SPDX-License-Identifier: GPL-3.0-only

//! CLI commands for the photo booth
//!
//! This module provides command-line functionality for:
//! - Overriding configuration for one run
//! - Listing available cameras
//! - Printing one environment report
//! - Taking a photo without the terminal UI

use clap::Args;
use smile_camera::app::{AppModel, Flags, Message, Runtime, Stage};
use smile_camera::backends::camera::{CameraSource, GstCameraBackend, enumerate_cameras};
use smile_camera::backends::location::LocationProvider;
use smile_camera::config::Config;
use smile_camera::environment::SystemReporter;
use smile_camera::filters::FilterType;
use std::path::PathBuf;
use std::time::Duration;

/// How long the headless capture may take, welcome screen excluded
const PHOTO_TIMEOUT: Duration = Duration::from_secs(30);

/// Interval at which the headless capture checks for the first frame
const FRAME_POLL_INTERVAL: Duration = Duration::from_millis(100);

/// Options that override the configuration file for one run
#[derive(Args, Debug, Default)]
pub struct Overrides {
    /// Camera source: auto, test, pipewire[:target] or v4l2:<device>
    #[arg(long, global = true)]
    pub camera: Option<CameraSource>,

    /// Initial filter: none, sepia, grayscale, blur, brightness or contrast
    #[arg(long, global = true, value_parser = parse_filter)]
    pub filter: Option<FilterType>,

    /// Fixed latitude for the weather overlay (requires --longitude)
    #[arg(long, global = true, requires = "longitude", allow_hyphen_values = true)]
    pub latitude: Option<f64>,

    /// Fixed longitude for the weather overlay (requires --latitude)
    #[arg(long, global = true, requires = "latitude", allow_hyphen_values = true)]
    pub longitude: Option<f64>,

    /// Do not look up the location (no weather overlay)
    #[arg(long, global = true, conflicts_with = "latitude")]
    pub no_location: bool,

    /// Do not mirror the live preview
    #[arg(long, global = true)]
    pub no_mirror: bool,

    /// Directory for saved photos
    #[arg(long, global = true)]
    pub save_dir: Option<PathBuf>,
}

impl Overrides {
    /// Apply the overrides on top of the loaded configuration
    pub fn apply(self, config: &mut Config) {
        if let Some(camera) = self.camera {
            config.camera = camera;
        }
        if let Some(filter) = self.filter {
            config.default_filter = filter;
        }
        if let (Some(latitude), Some(longitude)) = (self.latitude, self.longitude) {
            config.location = LocationProvider::Fixed {
                latitude,
                longitude,
            };
        }
        if self.no_location {
            config.location = LocationProvider::Disabled;
        }
        if self.no_mirror {
            config.mirror_preview = false;
        }
        if let Some(dir) = self.save_dir {
            config.save_dir = Some(dir);
        }
    }
}

fn parse_filter(name: &str) -> Result<FilterType, String> {
    FilterType::from_name(name).ok_or_else(|| {
        let names: Vec<_> = FilterType::ALL
            .iter()
            .map(|f| f.display_name().to_lowercase())
            .collect();
        format!("unknown filter '{}' (expected one of {})", name, names.join(", "))
    })
}

/// List all available cameras
pub fn list_cameras() -> Result<(), Box<dyn std::error::Error>> {
    let cameras = enumerate_cameras()?;

    if cameras.is_empty() {
        println!("No cameras found.");
        return Ok(());
    }

    println!("Available cameras:");
    println!();
    for (index, camera) in cameras.iter().enumerate() {
        println!("  [{}] {}", index, camera.name);
        println!("      --camera {}", camera.source);
    }
    println!();
    println!("Use --camera test for a synthetic test pattern.");

    Ok(())
}

/// Look up location, temperature and AQI once and print them
pub fn print_weather(config: &Config) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let reading = rt.block_on(SystemReporter::from_config(config).fetch());

    if let Some(position) = reading.position {
        println!("Location:    {}", position);
    }
    println!("Temperature: {}", reading.temperature_label());
    println!("AQI:         {}", reading.aqi_label());
    if let Some(message) = reading.status_message() {
        println!();
        println!("{}", message);
    }
    Ok(())
}

/// Run the countdown without the terminal UI and save the capture
pub fn take_photo(config: Config, output: Option<PathBuf>) -> Result<(), Box<dyn std::error::Error>> {
    let rt = tokio::runtime::Runtime::new()?;
    let outcome = rt.block_on(async {
        tokio::time::timeout(PHOTO_TIMEOUT, headless_capture(config, output)).await
    });
    match outcome {
        Ok(result) => result,
        Err(_) => Err("Timed out waiting for the camera".into()),
    }
}

async fn headless_capture(
    config: Config,
    output: Option<PathBuf>,
) -> Result<(), Box<dyn std::error::Error>> {
    // The weather overlay is never shown here; skip the lookup entirely
    let quiet = Config {
        location: LocationProvider::Disabled,
        ..config.clone()
    };
    let mut runtime = Runtime::new(
        GstCameraBackend::new(config.camera.clone()),
        SystemReporter::from_config(&quiet),
        config.save_directory(),
    );
    let (mut model, commands) = AppModel::init(Flags {
        filter: config.default_filter,
        mirror_preview: false,
    });
    if runtime.execute(commands).is_break() {
        return Ok(());
    }

    // No welcome screen without a screen
    let _ = runtime.dispatch(&mut model, Message::NotificationElapsed);

    let mut poll = tokio::time::interval(FRAME_POLL_INTERVAL);
    let mut countdown = CountdownEcho::default();
    let mut save_requested = false;

    loop {
        let message = tokio::select! {
            message = runtime.next_message() => Some(message.ok_or("Event channel closed")?),
            _ = poll.tick() => {
                (model.shutter_enabled() && runtime.current_frame().is_some()).then(|| {
                    println!("Get ready...");
                    Message::Shutter
                })
            }
        };
        let Some(message) = message else {
            continue;
        };

        if let Message::CameraReady(Err(e)) = &message {
            let e = e.clone();
            runtime.shutdown();
            return Err(e.into());
        }
        let saved = match &message {
            Message::Saved(result) => Some(result.clone()),
            _ => None,
        };

        if runtime.dispatch(&mut model, message).is_break() {
            return Ok(());
        }

        if let Some(label) = countdown.observe(model.countdown_label()) {
            println!("{}", label);
        }

        if let Some(result) = saved {
            let _ = runtime.dispatch(&mut model, Message::Quit);
            let path = result?;
            println!("Photo saved: {}", path.display());
            return Ok(());
        }

        if model.stage == Stage::Captured && !save_requested {
            save_requested = true;
            match &output {
                Some(path) => {
                    let png = model
                        .captured
                        .as_ref()
                        .map(|c| c.png.to_vec())
                        .ok_or("Capture disappeared")?;
                    let written = tokio::fs::write(path, png).await;
                    let _ = runtime.dispatch(&mut model, Message::Quit);
                    written?;
                    println!("Photo saved: {}", path.display());
                    return Ok(());
                }
                None => {
                    let _ = runtime.dispatch(&mut model, Message::Save);
                }
            }
        }
    }
}

/// Reports each countdown label once, when it first appears
#[derive(Debug, Default)]
struct CountdownEcho {
    last: Option<&'static str>,
}

impl CountdownEcho {
    /// The label to print for the current model state, if it changed
    fn observe(&mut self, label: Option<&'static str>) -> Option<&'static str> {
        if label == self.last {
            return None;
        }
        self.last = label;
        label
    }
}
