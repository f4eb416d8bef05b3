use serde::{Deserialize, Serialize};
use tokio::sync::mpsc;
use tracing::trace;

/// One event holds the whole buffer; the producer waits for the reader
pub const PROGRESS_CHANNEL_CAPACITY: usize = 1;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressEvent {
    /// Percentage in 0..=100
    pub progress: f64,
    pub total: usize,
    /// 1-based chunk number, 0 before the first chunk starts
    pub current: usize,
    pub status: String,
}

impl ProgressEvent {
    pub fn starting(total: usize) -> Self {
        Self {
            progress: 0.0,
            total,
            current: 0,
            status: "Starting".to_string(),
        }
    }

    pub fn processing_chunk(current: usize, total: usize) -> Self {
        Self {
            progress: (current - 1) as f64 / total as f64 * 100.0,
            total,
            current,
            status: format!("Processing chunk {} of {}", current, total),
        }
    }

    /// Halfway marker for text small enough to extract in one call
    pub fn single_pass() -> Self {
        Self {
            progress: 50.0,
            total: 1,
            current: 1,
            status: "Processing".to_string(),
        }
    }

    pub fn complete(total: usize) -> Self {
        Self {
            progress: 100.0,
            total,
            current: total,
            status: "Complete".to_string(),
        }
    }
}

/// Sending half of a request's progress channel.
///
/// Emission is best-effort: without a listener, or once the listener has
/// gone away, events are dropped.
#[derive(Debug, Clone, Default)]
pub struct ProgressReporter {
    sender: Option<mpsc::Sender<ProgressEvent>>,
}

impl ProgressReporter {
    pub fn disabled() -> Self {
        Self { sender: None }
    }

    /// A reporter wired to a fresh single-slot channel
    pub fn channel() -> (Self, mpsc::Receiver<ProgressEvent>) {
        let (tx, rx) = mpsc::channel(PROGRESS_CHANNEL_CAPACITY);
        (Self { sender: Some(tx) }, rx)
    }

    pub async fn emit(&self, event: ProgressEvent) {
        let Some(sender) = &self.sender else {
            return;
        };

        if sender.send(event).await.is_err() {
            trace!("Progress listener is gone, dropping event");
        }
    }
}
