//! Normalization and parsing of the model's text response.
//!
//! Contract: surrounding whitespace and a single pair of Markdown code fences
//! (optionally tagged with a language) are removed; what remains must be a
//! JSON object with the six metadata fields, or a one-element array holding
//! such an object. Anything else is an error.

use serde::Deserialize;

use super::metadata::StockMetadata;
use crate::error::ExtractionError;

const FENCE: &str = "```";

/// Removes a leading and a trailing code fence, if present.
pub fn strip_code_fences(text: &str) -> &str {
    let mut body = text.trim();

    if let Some(rest) = body.strip_prefix(FENCE) {
        // Drop the optional language tag on the opening line.
        body = match rest.find('\n') {
            Some(newline) if is_language_tag(&rest[..newline]) => &rest[newline + 1..],
            Some(_) => rest,
            None => rest.trim_start_matches(|c: char| c.is_ascii_alphanumeric()),
        };
    }

    if let Some(rest) = body.trim_end().strip_suffix(FENCE) {
        body = rest;
    }

    body.trim()
}

fn is_language_tag(line: &str) -> bool {
    line.trim()
        .chars()
        .all(|c| c.is_ascii_alphanumeric() || c == '-' || c == '_')
}

#[derive(Deserialize)]
#[serde(untagged)]
enum MetadataPayload {
    Object(StockMetadata),
    Wrapped(Vec<StockMetadata>),
}

/// Parses a raw response text into [`StockMetadata`].
pub fn parse_metadata(text: &str) -> Result<StockMetadata, ExtractionError> {
    let body = strip_code_fences(text);
    if body.is_empty() {
        return Err(ExtractionError::EmptyResponse);
    }

    match serde_json::from_str::<MetadataPayload>(body) {
        Ok(MetadataPayload::Object(metadata)) => Ok(metadata),
        Ok(MetadataPayload::Wrapped(mut items)) if items.len() == 1 => Ok(items.remove(0)),
        Ok(MetadataPayload::Wrapped(items)) => Err(ExtractionError::Malformed(format!(
            "expected a single metadata object, got an array of {}",
            items.len()
        ))),
        Err(_) => {
            // Re-parse as a plain object for a precise error message.
            let detail = match serde_json::from_str::<StockMetadata>(body) {
                Err(e) => e.to_string(),
                Ok(_) => "unexpected response shape".to_string(),
            };
            Err(ExtractionError::Malformed(detail))
        }
    }
}
