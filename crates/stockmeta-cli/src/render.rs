//! Terminal rendering of progress events and the final summary.

use stockmeta::pipeline::{BatchSummary, ItemStatus, ProgressEvent};
use stockmeta::{format_bytes, ResultRecord};

/// One status line for an event, or `None` for events not worth printing.
pub fn event_line(event: &ProgressEvent, total: usize) -> Option<String> {
    match event {
        ProgressEvent::RunStarted { total, .. } => {
            Some(format!("Processing {} images", total))
        }
        ProgressEvent::ItemStatus {
            index,
            filename,
            status,
            error,
            ..
        } => {
            let position = format!("[{}/{}]", index + 1, total);
            let line = match status {
                ItemStatus::Pending => return None,
                ItemStatus::Processing => {
                    format!("{} {} - optimizing & analyzing...", position, filename)
                }
                ItemStatus::Completed => format!("{} {} - ready", position, filename),
                ItemStatus::Error => format!(
                    "{} {} - failed: {}",
                    position,
                    filename,
                    error.as_deref().unwrap_or("unknown error")
                ),
            };
            Some(line)
        }
        ProgressEvent::RunFinished { .. } => None,
    }
}

pub fn summary_lines(summary: &BatchSummary, records: &[ResultRecord]) -> Vec<String> {
    let mut lines = vec![format!("Processing complete: {}", summary)];

    if summary.bytes_saved > 0 {
        lines.push(format!(
            "Resizing to 1MP saved approximately {} of upload bandwidth",
            format_bytes(summary.bytes_saved)
        ));
    }

    for record in records.iter().filter(|r| !r.is_success()) {
        lines.push(format!(
            "  {}: {}",
            record.filename,
            record.error.as_deref().unwrap_or("unknown error")
        ));
    }

    lines
}
