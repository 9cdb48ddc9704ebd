use std::sync::Arc;

use serde::{Deserialize, Serialize};
use tracing::warn;
use uuid::Uuid;

/// Processing status of a queued image.
///
/// Within one run an item only moves forward:
/// `Pending -> Processing -> Completed | Error`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum ItemStatus {
    Pending,
    Processing,
    Completed,
    Error,
}

impl ItemStatus {
    pub fn is_terminal(&self) -> bool {
        matches!(self, ItemStatus::Completed | ItemStatus::Error)
    }

    fn can_advance_to(self, next: ItemStatus) -> bool {
        matches!(
            (self, next),
            (ItemStatus::Pending, ItemStatus::Processing)
                | (ItemStatus::Processing, ItemStatus::Completed)
                | (ItemStatus::Processing, ItemStatus::Error)
        )
    }
}

impl std::fmt::Display for ItemStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        match self {
            ItemStatus::Pending => write!(f, "Pending"),
            ItemStatus::Processing => write!(f, "Processing"),
            ItemStatus::Completed => write!(f, "Completed"),
            ItemStatus::Error => write!(f, "Error"),
        }
    }
}

/// One submitted image and its processing status.
#[derive(Debug, Clone)]
pub struct QueueItem {
    /// Assigned at submission, stable for the item's lifetime.
    pub id: Uuid,
    /// Display name. Not unique.
    pub filename: String,
    pub mime_type: String,
    source: Arc<[u8]>,
    status: ItemStatus,
}

impl QueueItem {
    pub fn new(filename: impl Into<String>, mime_type: impl Into<String>, source: Vec<u8>) -> Self {
        Self {
            id: Uuid::new_v4(),
            filename: filename.into(),
            mime_type: mime_type.into(),
            source: Arc::from(source),
            status: ItemStatus::Pending,
        }
    }

    pub fn status(&self) -> ItemStatus {
        self.status
    }

    pub fn source(&self) -> &[u8] {
        &self.source
    }

    /// Shared handle to the source bytes, for moving into a blocking task.
    pub(crate) fn source_handle(&self) -> Arc<[u8]> {
        Arc::clone(&self.source)
    }

    pub fn size_bytes(&self) -> u64 {
        self.source.len() as u64
    }

    /// Moves the item forward. Backward or skipping transitions are refused.
    pub(crate) fn advance(&mut self, next: ItemStatus) -> bool {
        if !self.status.can_advance_to(next) {
            warn!(
                item_id = %self.id,
                "Refusing status transition {} -> {}",
                self.status,
                next
            );
            return false;
        }
        self.status = next;
        true
    }

    /// Puts the item back to `Pending` at the start of a new run.
    pub(crate) fn reset(&mut self) {
        self.status = ItemStatus::Pending;
    }
}
