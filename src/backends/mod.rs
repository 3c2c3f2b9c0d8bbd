// SPDX-License-Identifier: GPL-3.0-only

//! Platform backends
//!
//! - [`camera`]: live video through GStreamer
//! - [`location`]: one-shot device position through GeoClue2

pub mod camera;
pub mod location;
