pub mod broadcast;
pub mod config;
pub mod downsample;
pub mod error;
pub mod export;
pub mod extractor;
pub mod pipeline;
pub mod sanitize;
pub mod secrets;
pub mod session;

pub use broadcast::ProgressBroadcaster;
pub use config::{load_config, load_config_or_default, Config};
pub use downsample::{Dimensions, DownsampledImage, Downsampler};
pub use error::{
    ConfigError, DownsampleError, ExportError, ExtractionError, Result, StockmetaError,
};
pub use export::{format_bytes, to_csv, write_csv};
pub use extractor::{GeminiExtractor, MetadataExtractor, StockMetadata};
pub use pipeline::{
    BatchOrchestrator, BatchSummary, ItemStatus, NoopProgress, PipelineError, ProgressEvent,
    ProgressReporter, QueueItem, RecordStatus, ResultRecord,
};
pub use secrets::{resolve_secret, Credential, SecretError};
pub use session::{Session, SessionError, SubmittedFile, WorkflowStage};
