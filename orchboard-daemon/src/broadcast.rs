//! Fan-out of parsed sections to connected viewers.
//!
//! Delivery is best-effort: publishing never waits on a viewer, and a viewer
//! that falls more than the channel capacity behind skips the missed updates.

use orchboard_core::SectionSet;
use serde::Serialize;
use tokio::sync::broadcast;

use crate::config::BROADCAST_CAPACITY;

/// Event name carried by every viewer frame.
pub const UPDATE_EVENT: &str = "orchestrator_update";

/// JSON text frame sent to viewers.
#[derive(Debug, Clone, Serialize)]
pub struct UpdateEvent<'a> {
    pub event: &'static str,
    pub data: &'a SectionSet,
}

impl<'a> UpdateEvent<'a> {
    pub fn new(data: &'a SectionSet) -> Self {
        Self {
            event: UPDATE_EVENT,
            data,
        }
    }

    pub fn to_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string(self)
    }
}

#[derive(Debug, Clone)]
pub struct Broadcaster {
    tx: broadcast::Sender<SectionSet>,
}

impl Broadcaster {
    pub fn new() -> Self {
        Self::with_capacity(BROADCAST_CAPACITY)
    }

    pub fn with_capacity(capacity: usize) -> Self {
        let (tx, _) = broadcast::channel(capacity);
        Self { tx }
    }

    /// Send `sections` to every current viewer; returns how many were reached.
    pub fn publish(&self, sections: SectionSet) -> usize {
        match self.tx.send(sections) {
            Ok(viewers) => {
                tracing::debug!(viewers, "published orchestrator update");
                viewers
            }
            Err(_) => 0,
        }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<SectionSet> {
        self.tx.subscribe()
    }

    pub fn viewer_count(&self) -> usize {
        self.tx.receiver_count()
    }
}

impl Default for Broadcaster {
    fn default() -> Self {
        Self::new()
    }
}
