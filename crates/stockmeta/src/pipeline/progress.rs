use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::queue::{ItemStatus, QueueItem};
use super::result::BatchSummary;

/// Events emitted by the orchestrator during a run.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "camelCase")]
pub enum ProgressEvent {
    #[serde(rename_all = "camelCase")]
    RunStarted {
        total: usize,
        timestamp: DateTime<Utc>,
    },
    /// An item changed status.
    #[serde(rename_all = "camelCase")]
    ItemStatus {
        item_id: Uuid,
        /// Position of the item in the queue.
        index: usize,
        filename: String,
        status: ItemStatus,
        message: String,
        #[serde(default, skip_serializing_if = "Option::is_none")]
        error: Option<String>,
        timestamp: DateTime<Utc>,
    },
    #[serde(rename_all = "camelCase")]
    RunFinished {
        summary: BatchSummary,
        timestamp: DateTime<Utc>,
    },
}

impl ProgressEvent {
    pub fn run_started(total: usize) -> Self {
        ProgressEvent::RunStarted {
            total,
            timestamp: Utc::now(),
        }
    }

    /// Status event for the item's current status.
    pub fn item(item: &QueueItem, index: usize, message: &str) -> Self {
        ProgressEvent::ItemStatus {
            item_id: item.id,
            index,
            filename: item.filename.clone(),
            status: item.status(),
            message: message.to_string(),
            error: None,
            timestamp: Utc::now(),
        }
    }

    pub fn item_failed(item: &QueueItem, index: usize, error: &str) -> Self {
        ProgressEvent::ItemStatus {
            item_id: item.id,
            index,
            filename: item.filename.clone(),
            status: item.status(),
            message: "Processing failed".to_string(),
            error: Some(error.to_string()),
            timestamp: Utc::now(),
        }
    }

    pub fn run_finished(summary: BatchSummary) -> Self {
        ProgressEvent::RunFinished {
            summary,
            timestamp: Utc::now(),
        }
    }

    pub fn timestamp(&self) -> DateTime<Utc> {
        match self {
            ProgressEvent::RunStarted { timestamp, .. }
            | ProgressEvent::ItemStatus { timestamp, .. }
            | ProgressEvent::RunFinished { timestamp, .. } => *timestamp,
        }
    }
}

pub trait ProgressReporter: Send + Sync {
    fn report(&self, event: ProgressEvent);
}

/// Discards every event.
pub struct NoopProgress;

impl ProgressReporter for NoopProgress {
    fn report(&self, _event: ProgressEvent) {}
}

impl<F> ProgressReporter for F
where
    F: Fn(ProgressEvent) + Send + Sync,
{
    fn report(&self, event: ProgressEvent) {
        self(event)
    }
}
