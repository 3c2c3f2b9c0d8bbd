// SPDX-License-Identifier: GPL-3.0-only

//! Photo booth application core
//!
//! # Architecture
//!
//! - `state`: application state types (AppModel, Message, Command, Stage)
//! - `update`: message dispatcher
//! - `handlers`: message handlers by domain
//! - `timers`: cancellable delayed messages
//! - `runtime`: executes commands against the camera, timers and services
//!
//! The model never performs I/O. Front ends (the terminal booth, the
//! headless `photo` command) pump messages from the [`Runtime`] into
//! [`AppModel::update`] and hand the returned commands back to the runtime.

mod handlers;
pub mod runtime;
mod state;
pub mod timers;
mod update;

pub use runtime::Runtime;
pub use state::{
    AppModel, Command, CountdownStep, Flags, Message, Stage, StreamState, TimerId,
};
