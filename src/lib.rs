// SPDX-License-Identifier: GPL-3.0-only

//! Smile Camera - a photo booth for the terminal
//!
//! The booth shows a short welcome screen, opens the camera, counts down
//! "1, 2, 3, Smile!" on the shutter and freezes the filtered still so it
//! can be saved. A small overlay shows the local temperature and air
//! quality.
//!
//! # Architecture
//!
//! The crate is organized into several modules:
//!
//! - [`app`]: Booth state machine and the runtime that executes its commands
//! - [`backends`]: Camera (GStreamer) and location (GeoClue2) access
//! - [`environment`]: Weather and air quality lookups
//! - [`filters`]: Per-pixel and spatial photo filters
//! - [`pipelines`]: Still capture and PNG encoding
//! - [`config`]: User configuration handling
//! - [`storage`]: Saving photos to disk
//! - [`terminal`]: ratatui front end
//!
//! # Example
//!
//! ```ignore
//! // Usually run via the binary:
//! // smile-camera --filter sepia
//! ```

pub mod app;
pub mod backends;
pub mod config;
pub mod constants;
pub mod environment;
pub mod errors;
pub mod filters;
pub mod pipelines;
pub mod storage;
pub mod terminal;

// Re-export commonly used types
pub use app::{AppModel, Command, Message, Stage};
pub use config::Config;
pub use filters::FilterType;
