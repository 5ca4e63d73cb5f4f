//! Gemini implementation of [`ContentGenerator`].

use std::time::Duration;

use async_trait::async_trait;
use base64::Engine;
use base64::engine::general_purpose::STANDARD;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::error::GenerationError;
use crate::generator::{ChapterRequest, ContentGenerator, GeneratedChapter, GeneratedImage};
use crate::guidance::{chapter_prompt, illustration_prompt};

const API_BASE: &str = "https://generativelanguage.googleapis.com/v1";
const DEFAULT_TEXT_MODEL: &str = "gemini-2.0-flash";
const DEFAULT_IMAGE_MODEL: &str = "gemini-2.0-flash-exp-image-generation";

const MAX_OUTPUT_TOKENS: u32 = 1500;
const TEMPERATURE: f32 = 0.7;
const TOP_P: f32 = 0.9;
const STOP_SEQUENCES: [&str; 3] = ["Chapter", "THE END", "To be continued"];

/// Gemini-backed chapter and illustration generator.
#[derive(Debug, Clone)]
pub struct GeminiGenerator {
    client: reqwest::Client,
    api_key: String,
    base_url: String,
    text_model: String,
    image_model: String,
}

impl GeminiGenerator {
    /// Creates a generator with the default models.
    ///
    /// # Errors
    ///
    /// Returns `GenerationError::InvalidRequest` if the key is blank or the
    /// HTTP client cannot be built.
    pub fn new(api_key: impl Into<String>) -> Result<Self, GenerationError> {
        let api_key = api_key.into();
        if api_key.trim().is_empty() {
            return Err(GenerationError::InvalidRequest("Gemini API key is blank".into()));
        }
        let client = reqwest::Client::builder()
            .timeout(Duration::from_secs(120))
            .connect_timeout(Duration::from_secs(30))
            .build()
            .map_err(|e| GenerationError::InvalidRequest(format!("HTTP client: {e}")))?;
        Ok(Self {
            client,
            api_key,
            base_url: API_BASE.to_owned(),
            text_model: DEFAULT_TEXT_MODEL.to_owned(),
            image_model: DEFAULT_IMAGE_MODEL.to_owned(),
        })
    }

    /// Overrides the chapter model.
    #[must_use]
    pub fn with_text_model(mut self, model: impl Into<String>) -> Self {
        self.text_model = model.into();
        self
    }

    /// Overrides the illustration model.
    #[must_use]
    pub fn with_image_model(mut self, model: impl Into<String>) -> Self {
        self.image_model = model.into();
        self
    }

    /// Overrides the API base URL.
    #[must_use]
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_owned();
        self
    }

    fn endpoint(&self, model: &str) -> String {
        format!("{}/models/{model}:generateContent", self.base_url)
    }

    async fn post(
        &self,
        model: &str,
        body: &GenerateRequest,
    ) -> Result<GenerateResponse, GenerationError> {
        let response = self
            .client
            .post(self.endpoint(model))
            .header("x-goog-api-key", &self.api_key)
            .json(body)
            .send()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;

        if !response.status().is_success() {
            let status = response.status().as_u16();
            let message = response.text().await.unwrap_or_default();
            return Err(GenerationError::Api { status, message });
        }

        let text = response
            .text()
            .await
            .map_err(|e| GenerationError::Network(e.to_string()))?;
        serde_json::from_str(&text).map_err(|e| GenerationError::Malformed(e.to_string()))
    }
}

#[async_trait]
impl ContentGenerator for GeminiGenerator {
    async fn generate_chapter(
        &self,
        request: &ChapterRequest,
    ) -> Result<GeneratedChapter, GenerationError> {
        request.validate()?;
        info!(
            chapter = request.chapter_number,
            total = request.total_chapters,
            "generating chapter"
        );
        let body = GenerateRequest::text(chapter_prompt(request));
        let response = self.post(&self.text_model, &body).await?;
        let text = chapter_text(response)?;
        debug!(chars = text.len(), "chapter generated");
        Ok(GeneratedChapter {
            text,
            chapter_number: request.chapter_number,
            total_chapters: request.total_chapters,
        })
    }

    async fn generate_image(&self, prompt: &str) -> Vec<GeneratedImage> {
        let body = GenerateRequest::image(illustration_prompt(prompt));
        match self.post(&self.image_model, &body).await {
            Ok(response) => {
                let images = images(response);
                info!(count = images.len(), "illustrations generated");
                images
            }
            Err(e) => {
                warn!(error = %e, "illustration generation failed");
                Vec::new()
            }
        }
    }
}

// --- Wire types ---

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest {
    contents: Vec<RequestContent>,
    generation_config: GenerationConfig,
}

impl GenerateRequest {
    fn text(prompt: String) -> Self {
        Self {
            contents: vec![RequestContent::from(prompt)],
            generation_config: GenerationConfig {
                max_output_tokens: Some(MAX_OUTPUT_TOKENS),
                temperature: Some(TEMPERATURE),
                top_p: Some(TOP_P),
                stop_sequences: Some(STOP_SEQUENCES.iter().map(|s| (*s).to_owned()).collect()),
                response_modalities: None,
            },
        }
    }

    fn image(prompt: String) -> Self {
        Self {
            contents: vec![RequestContent::from(prompt)],
            generation_config: GenerationConfig {
                response_modalities: Some(vec!["Text".into(), "Image".into()]),
                ..GenerationConfig::default()
            },
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestContent {
    parts: Vec<RequestPart>,
}

impl From<String> for RequestContent {
    fn from(text: String) -> Self {
        Self {
            parts: vec![RequestPart { text }],
        }
    }
}

#[derive(Debug, Serialize)]
struct RequestPart {
    text: String,
}

#[derive(Debug, Default, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    #[serde(skip_serializing_if = "Option::is_none")]
    max_output_tokens: Option<u32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    temperature: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    top_p: Option<f32>,
    #[serde(skip_serializing_if = "Option::is_none")]
    stop_sequences: Option<Vec<String>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    response_modalities: Option<Vec<String>>,
}

#[derive(Debug, Deserialize)]
struct GenerateResponse {
    candidates: Option<Vec<Candidate>>,
    error: Option<ApiErrorBody>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct ResponsePart {
    text: Option<String>,
    inline_data: Option<InlineData>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Debug, Deserialize)]
struct ApiErrorBody {
    #[serde(default)]
    code: u16,
    message: String,
}

/// Concatenates every text part of the first candidate.
fn chapter_text(response: GenerateResponse) -> Result<String, GenerationError> {
    if let Some(err) = response.error {
        return Err(GenerationError::Api {
            status: if err.code == 0 { 200 } else { err.code },
            message: err.message,
        });
    }
    let Some(first) = response.candidates.and_then(|c| c.into_iter().next()) else {
        return Err(GenerationError::Empty { finish_reason: None });
    };
    let text: String = first
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.text)
        .collect();
    if text.trim().is_empty() {
        return Err(GenerationError::Empty {
            finish_reason: first.finish_reason,
        });
    }
    Ok(text)
}

/// Decodes every inline image part of the first candidate.
fn images(response: GenerateResponse) -> Vec<GeneratedImage> {
    let Some(first) = response.candidates.and_then(|c| c.into_iter().next()) else {
        return Vec::new();
    };
    first
        .content
        .map(|content| content.parts)
        .unwrap_or_default()
        .into_iter()
        .filter_map(|part| part.inline_data)
        .filter(|inline| inline.mime_type.starts_with("image/"))
        .filter_map(|inline| match STANDARD.decode(inline.data.as_bytes()) {
            Ok(data) => Some(GeneratedImage {
                data,
                mime_type: inline.mime_type,
            }),
            Err(e) => {
                warn!(error = %e, "discarding illustration with invalid base64 payload");
                None
            }
        })
        .collect()
}
