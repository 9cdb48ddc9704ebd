//! Remote metadata extraction.
//!
//! The [`MetadataExtractor`] trait is the seam between the batch pipeline
//! and the inference service; [`GeminiExtractor`] is the production
//! implementation.

pub mod gemini;
pub mod instruction;
pub mod metadata;
pub mod response;

use async_trait::async_trait;

use crate::error::ExtractionError;
use crate::secrets::Credential;

pub use gemini::GeminiExtractor;
pub use instruction::CATEGORIES;
pub use metadata::StockMetadata;
pub use response::{parse_metadata, strip_code_fences};

#[async_trait]
pub trait MetadataExtractor: Send + Sync {
    /// Extracts stock metadata for one JPEG-encoded image. A single call is
    /// a single attempt; there is no retry.
    async fn extract(
        &self,
        credential: &Credential,
        image: &[u8],
    ) -> Result<StockMetadata, ExtractionError>;
}
