use std::path::PathBuf;
use thiserror::Error;

#[derive(Error, Debug)]
pub enum StockmetaError {
    #[error("Configuration error: {0}")]
    Config(#[from] ConfigError),

    #[error("Downsampling error: {0}")]
    Downsample(#[from] DownsampleError),

    #[error("Extraction error: {0}")]
    Extraction(#[from] ExtractionError),

    #[error("Export error: {0}")]
    Export(#[from] ExportError),

    #[error("Credential error: {0}")]
    Secret(#[from] crate::secrets::SecretError),

    #[error("Session error: {0}")]
    Session(#[from] crate::session::SessionError),
}

#[derive(Error, Debug)]
pub enum ConfigError {
    #[error("Failed to read config file '{path}': {source}")]
    ReadFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("Failed to parse config JSON: {0}")]
    ParseJson(#[from] serde_json::Error),

    #[error("Config validation failed: {message}")]
    Validation { message: String },

    #[error("Schema validation failed: {errors}")]
    SchemaValidation { errors: String },
}

/// Failures of the local downsampling step. `Decode` is the only one user
/// input can trigger; `Encode` means the re-encoder itself failed.
#[derive(Error, Debug)]
pub enum DownsampleError {
    #[error("Failed to decode image: {0}")]
    Decode(String),

    #[error("Failed to encode image: {0}")]
    Encode(String),
}

#[derive(Error, Debug)]
pub enum ExtractionError {
    #[error("Failed to build HTTP client: {0}")]
    Client(String),

    #[error("Request to inference endpoint failed: {0}")]
    Transport(String),

    #[error("API key rejected ({status}): {message}")]
    Unauthorized { status: u16, message: String },

    #[error("Inference endpoint returned {status}: {body}")]
    Status { status: u16, body: String },

    #[error("Request blocked by the model: {0}")]
    Blocked(String),

    #[error("Empty response from AI")]
    EmptyResponse,

    #[error("Malformed metadata response: {0}")]
    Malformed(String),

    #[error("Metadata failed validation: {0}")]
    InvalidMetadata(String),
}

#[derive(Error, Debug)]
pub enum ExportError {
    #[error("Nothing to export: the result set is empty")]
    Empty,

    #[error("Failed to write report '{path}': {source}")]
    WriteFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

pub type Result<T> = std::result::Result<T, StockmetaError>;
