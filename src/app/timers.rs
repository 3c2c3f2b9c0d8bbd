// SPDX-License-Identifier: GPL-3.0-only

//! Scoped timers
//!
//! Every delayed message is a tokio task owned by the [`Scheduler`]. Tasks
//! are grouped by [`TimerId`] and aborted on cancel, on `cancel_all` and
//! when the scheduler is dropped, so no timer outlives the booth.

use crate::app::state::{Message, TimerId};
use std::collections::HashMap;
use std::time::Duration;
use tokio::sync::mpsc::UnboundedSender;
use tokio::task::JoinHandle;
use tracing::debug;

pub struct Scheduler {
    sender: UnboundedSender<Message>,
    pending: HashMap<TimerId, Vec<JoinHandle<()>>>,
}

impl Scheduler {
    pub fn new(sender: UnboundedSender<Message>) -> Self {
        Self {
            sender,
            pending: HashMap::new(),
        }
    }

    /// Send `message` after `delay` unless `id` is cancelled first
    pub fn schedule(&mut self, id: TimerId, delay: Duration, message: Message) {
        let sender = self.sender.clone();
        let handle = tokio::spawn(async move {
            tokio::time::sleep(delay).await;
            // Receiver gone means the booth is shutting down
            let _ = sender.send(message);
        });

        let handles = self.pending.entry(id).or_default();
        handles.retain(|h| !h.is_finished());
        handles.push(handle);
    }

    /// Abort every pending timer of a group
    pub fn cancel(&mut self, id: TimerId) {
        if let Some(handles) = self.pending.remove(&id) {
            let live = handles.iter().filter(|h| !h.is_finished()).count();
            debug!(?id, live, "Cancelling timers");
            for handle in handles {
                handle.abort();
            }
        }
    }

    /// Abort every pending timer
    pub fn cancel_all(&mut self) {
        let ids: Vec<TimerId> = self.pending.keys().copied().collect();
        for id in ids {
            self.cancel(id);
        }
    }

    /// Number of timers of a group that have not fired yet
    pub fn pending(&self, id: TimerId) -> usize {
        self.pending
            .get(&id)
            .map(|handles| handles.iter().filter(|h| !h.is_finished()).count())
            .unwrap_or(0)
    }
}

impl Drop for Scheduler {
    fn drop(&mut self) {
        self.cancel_all();
    }
}
