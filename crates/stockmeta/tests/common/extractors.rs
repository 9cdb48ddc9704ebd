//! Scriptable extractor used in place of the remote service.

#![allow(dead_code)]

use std::collections::HashSet;
use std::sync::Mutex;

use async_trait::async_trait;

use stockmeta::{Credential, ExtractionError, MetadataExtractor, StockMetadata};

pub const TEST_KEY: &str = "AIzaSy-test-key-0123456789";

pub fn credential() -> Credential {
    Credential::new(TEST_KEY).expect("valid test credential")
}

pub fn sample_metadata() -> StockMetadata {
    StockMetadata {
        description: "Colorful abstract gradient with smooth transitions".to_string(),
        keywords: "gradient, abstract, color, background, smooth, texture".to_string(),
        categories: "Abstract, Backgrounds/Textures".to_string(),
        editorial: "no".to_string(),
        mature_content: "no".to_string(),
        illustration: "yes".to_string(),
    }
}

/// Returns [`sample_metadata`] except on the scripted failing calls, and
/// records the size of every payload it receives.
pub struct FakeExtractor {
    failing_calls: HashSet<usize>,
    seen: Mutex<Vec<usize>>,
}

impl FakeExtractor {
    pub fn new() -> Self {
        Self::failing_on(&[])
    }

    /// Fails the listed zero-based calls with an authorization error.
    pub fn failing_on(calls: &[usize]) -> Self {
        Self {
            failing_calls: calls.iter().copied().collect(),
            seen: Mutex::new(Vec::new()),
        }
    }

    pub fn calls(&self) -> usize {
        self.seen.lock().unwrap().len()
    }

    pub fn payload_sizes(&self) -> Vec<usize> {
        self.seen.lock().unwrap().clone()
    }
}

#[async_trait]
impl MetadataExtractor for FakeExtractor {
    async fn extract(
        &self,
        _credential: &Credential,
        image: &[u8],
    ) -> Result<StockMetadata, ExtractionError> {
        let call = {
            let mut seen = self.seen.lock().unwrap();
            seen.push(image.len());
            seen.len() - 1
        };

        if self.failing_calls.contains(&call) {
            return Err(ExtractionError::Unauthorized {
                status: 403,
                message: "API key rejected".to_string(),
            });
        }
        Ok(sample_metadata())
    }
}
