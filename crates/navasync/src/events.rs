//! Event Bus - progress events for a batch run
//!
//! Design: Type-safe events over a broadcast channel.
//! No dynamic dispatch overhead - use enums, not trait objects.
//! Publishing never blocks and never fails, so observers cannot influence
//! the run.

use serde::{Deserialize, Serialize};
use std::path::PathBuf;
use tokio::sync::broadcast;
use uuid::Uuid;

use crate::rewriter::PageOutcome;

/// Batch events that can be dispatched
#[derive(Debug, Clone, Serialize, Deserialize)]
pub enum BatchEvent {
    Started {
        run_id: Uuid,
        total: usize,
    },
    SourceExtracted {
        source: PathBuf,
        fragment: PathBuf,
    },
    PageFinished {
        path: PathBuf,
        outcome: PageOutcome,
        completed: usize,
        total: usize,
    },
    Finished {
        run_id: Uuid,
        processed: usize,
        skipped: usize,
        failed: usize,
    },
}

/// Simple event bus using tokio broadcast channel
#[derive(Clone)]
pub struct EventBus {
    tx: broadcast::Sender<BatchEvent>,
}

impl EventBus {
    pub fn new() -> Self {
        let (tx, _) = broadcast::channel(1024);
        Self { tx }
    }

    /// Publish an event
    pub fn publish(&self, event: BatchEvent) {
        let _ = self.tx.send(event); // Ignore error if no subscribers
    }

    /// Subscribe to events
    pub fn subscribe(&self) -> broadcast::Receiver<BatchEvent> {
        self.tx.subscribe()
    }
}

impl Default for EventBus {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn test_event_bus() {
        let bus = EventBus::new();
        let mut rx = bus.subscribe();

        let run_id = Uuid::now_v7();
        bus.publish(BatchEvent::Started { run_id, total: 3 });

        match rx.recv().await {
            Ok(BatchEvent::Started { run_id: got, total }) => {
                assert_eq!(got, run_id);
                assert_eq!(total, 3);
            }
            _ => panic!("Expected Started event"),
        }
    }

    #[test]
    fn test_publish_without_subscribers() {
        let bus = EventBus::new();
        bus.publish(BatchEvent::Finished {
            run_id: Uuid::now_v7(),
            processed: 0,
            skipped: 0,
            failed: 0,
        });
    }
}
