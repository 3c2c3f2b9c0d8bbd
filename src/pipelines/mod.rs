// SPDX-License-Identifier: GPL-3.0-only

//! Processing pipelines for captured stills
//!
//! ```text
//! ┌──────────────┐     ┌───────────────────┐     ┌──────────────┐
//! │ Latest Frame │ ──▶ │  Photo Pipeline   │ ──▶ │  PNG bytes   │
//! │   (RGBA)     │     │  - unpad stride   │     │  + pixels    │
//! │              │     │  - filter         │     │              │
//! │              │     │  - PNG encoding   │     │              │
//! └──────────────┘     └───────────────────┘     └──────────────┘
//! ```
//!
//! Everything CPU-bound runs on the blocking pool so the preview keeps
//! updating while a capture is processed.

pub mod photo;
