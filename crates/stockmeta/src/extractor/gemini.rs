//! Metadata extraction through the Gemini `generateContent` REST endpoint.

use std::time::Duration;

use async_trait::async_trait;
use base64::{engine::general_purpose, Engine};
use serde::{Deserialize, Serialize};
use tracing::{debug, warn};

use super::instruction::{system_instruction, USER_PROMPT};
use super::metadata::StockMetadata;
use super::response::parse_metadata;
use super::MetadataExtractor;
use crate::config::ExtractorConfig;
use crate::downsample::OUTPUT_MIME_TYPE;
use crate::error::ExtractionError;
use crate::sanitize;
use crate::secrets::Credential;

const RESPONSE_MIME_TYPE: &str = "application/json";

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
    generation_config: GenerationConfig,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    #[serde(skip_serializing_if = "Option::is_none")]
    role: Option<&'static str>,
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    Inline {
        #[serde(rename = "inlineData")]
        inline_data: InlineData,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: &'static str,
    data: String,
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    response_mime_type: &'static str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    #[serde(default)]
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
    #[serde(default)]
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
struct ResponsePart {
    #[serde(default)]
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    #[serde(default)]
    block_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct ApiErrorEnvelope {
    error: ApiErrorBody,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: Option<String>,
}

/// [`MetadataExtractor`] backed by a Gemini vision model.
pub struct GeminiExtractor {
    http: reqwest::Client,
    endpoint: String,
    model: String,
    temperature: f32,
    instruction: String,
}

impl GeminiExtractor {
    pub fn new(config: &ExtractorConfig) -> Result<Self, ExtractionError> {
        let http = reqwest::Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .connect_timeout(Duration::from_secs(config.connect_timeout_secs))
            .build()
            .map_err(|e| ExtractionError::Client(e.to_string()))?;

        Ok(Self {
            http,
            endpoint: config.endpoint.trim().trim_end_matches('/').to_string(),
            model: config.model.trim().to_string(),
            temperature: config.temperature,
            instruction: system_instruction(),
        })
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }

    fn build_request<'a>(&'a self, image: &[u8]) -> GenerateContentRequest<'a> {
        GenerateContentRequest {
            system_instruction: Content {
                role: None,
                parts: vec![Part::Text {
                    text: &self.instruction,
                }],
            },
            contents: vec![Content {
                role: Some("user"),
                parts: vec![
                    Part::Text { text: USER_PROMPT },
                    Part::Inline {
                        inline_data: InlineData {
                            mime_type: OUTPUT_MIME_TYPE,
                            data: general_purpose::STANDARD.encode(image),
                        },
                    },
                ],
            }],
            generation_config: GenerationConfig {
                temperature: self.temperature,
                response_mime_type: RESPONSE_MIME_TYPE,
            },
        }
    }
}

#[async_trait]
impl MetadataExtractor for GeminiExtractor {
    async fn extract(
        &self,
        credential: &Credential,
        image: &[u8],
    ) -> Result<StockMetadata, ExtractionError> {
        let request = self.build_request(image);
        debug!(model = %self.model, bytes = image.len(), "Sending generateContent request");

        // The key travels in the query string, so reqwest errors must not
        // carry the URL into messages or logs.
        let response = self
            .http
            .post(self.url())
            .query(&[("key", credential.expose())])
            .json(&request)
            .send()
            .await
            .map_err(|e| ExtractionError::Transport(e.without_url().to_string()))?;

        let status = response.status();
        let body = response
            .text()
            .await
            .map_err(|e| ExtractionError::Transport(e.without_url().to_string()))?;

        if !status.is_success() {
            let error = classify_error(status.as_u16(), &body);
            warn!("generateContent failed: {}", error);
            return Err(error);
        }

        let envelope: GenerateContentResponse = serde_json::from_str(&body).map_err(|e| {
            ExtractionError::Malformed(format!("unexpected response envelope: {}", e))
        })?;

        let text = response_text(envelope)?;
        parse_metadata(&text)
    }
}

/// Maps a non-2xx response onto an [`ExtractionError`].
fn classify_error(status: u16, body: &str) -> ExtractionError {
    let api_error = serde_json::from_str::<ApiErrorEnvelope>(body)
        .ok()
        .map(|e| e.error);

    let message = api_error
        .as_ref()
        .map(|e| e.message.clone())
        .filter(|m| !m.is_empty())
        .unwrap_or_else(|| sanitize::truncate_body(body));

    let invalid_key = status == 400
        && (body.contains("API_KEY_INVALID")
            || message.to_ascii_lowercase().contains("api key not valid"));

    if status == 401 || status == 403 || invalid_key {
        return ExtractionError::Unauthorized {
            status,
            message: sanitize::truncate_body(&message),
        };
    }

    let body = match api_error.and_then(|e| e.status) {
        Some(code) => format!("{}: {}", code, message),
        None => message,
    };

    ExtractionError::Status {
        status,
        body: sanitize::truncate_body(&body),
    }
}

/// Concatenates the text parts of the first candidate.
fn response_text(envelope: GenerateContentResponse) -> Result<String, ExtractionError> {
    if let Some(reason) = envelope.prompt_feedback.and_then(|f| f.block_reason) {
        return Err(ExtractionError::Blocked(reason));
    }

    let Some(candidate) = envelope.candidates.into_iter().next() else {
        return Err(ExtractionError::EmptyResponse);
    };

    let text: String = candidate
        .content
        .map(|c| c.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|p| p.text)
        .collect();

    if text.trim().is_empty() {
        if let Some(reason) = candidate.finish_reason.filter(|r| r == "SAFETY") {
            return Err(ExtractionError::Blocked(reason));
        }
        return Err(ExtractionError::EmptyResponse);
    }

    Ok(text)
}
