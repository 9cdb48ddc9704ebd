use serde::{Deserialize, Serialize};

use crate::downsample::{Dimensions, DownsampledImage};
use crate::extractor::StockMetadata;

use super::queue::QueueItem;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RecordStatus {
    Success,
    Error,
}

/// Outcome of processing one [`QueueItem`].
///
/// Failed records carry neutral metadata so every record exports with the
/// same shape.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ResultRecord {
    pub filename: String,
    pub status: RecordStatus,
    pub metadata: StockMetadata,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub error: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub compressed_size_bytes: Option<u64>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub original_dimensions: Option<Dimensions>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub dimensions: Option<Dimensions>,
}

impl ResultRecord {
    pub fn success(item: &QueueItem, metadata: StockMetadata, image: &DownsampledImage) -> Self {
        Self {
            filename: item.filename.clone(),
            status: RecordStatus::Success,
            metadata,
            error: None,
            original_size_bytes: Some(image.original_size_bytes),
            compressed_size_bytes: Some(image.compressed_size_bytes),
            original_dimensions: Some(image.original_dimensions),
            dimensions: Some(image.dimensions),
        }
    }

    pub fn failure(item: &QueueItem, error: String) -> Self {
        Self {
            filename: item.filename.clone(),
            status: RecordStatus::Error,
            metadata: StockMetadata::default(),
            error: Some(error),
            original_size_bytes: None,
            compressed_size_bytes: None,
            original_dimensions: None,
            dimensions: None,
        }
    }

    pub fn is_success(&self) -> bool {
        self.status == RecordStatus::Success
    }

    pub fn bytes_saved(&self) -> Option<i64> {
        match (self.original_size_bytes, self.compressed_size_bytes) {
            (Some(original), Some(compressed)) => Some(original as i64 - compressed as i64),
            _ => None,
        }
    }
}

/// Aggregate view of a finished run.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct BatchSummary {
    pub total: usize,
    pub succeeded: usize,
    pub failed: usize,
    pub original_bytes: u64,
    pub compressed_bytes: u64,
    /// Sum of `original - compressed` over records with sizes. Zero or
    /// negative when the inputs were already small.
    pub bytes_saved: i64,
}

impl BatchSummary {
    pub fn from_records(records: &[ResultRecord]) -> Self {
        let mut summary = Self {
            total: records.len(),
            ..Self::default()
        };

        for record in records {
            if record.is_success() {
                summary.succeeded += 1;
            } else {
                summary.failed += 1;
            }
            summary.original_bytes += record.original_size_bytes.unwrap_or(0);
            summary.compressed_bytes += record.compressed_size_bytes.unwrap_or(0);
            summary.bytes_saved += record.bytes_saved().unwrap_or(0);
        }

        summary
    }
}

impl std::fmt::Display for BatchSummary {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}/{} successful", self.succeeded, self.total)
    }
}
