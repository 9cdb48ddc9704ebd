//! The batch pipeline: queue model, orchestrator and progress reporting.

pub mod error;
pub mod progress;
pub mod queue;
pub mod result;
pub mod runner;

pub use error::PipelineError;
pub use progress::{NoopProgress, ProgressEvent, ProgressReporter};
pub use queue::{ItemStatus, QueueItem};
pub use result::{BatchSummary, RecordStatus, ResultRecord};
pub use runner::BatchOrchestrator;
