//! Gemini API client for image analysis

use std::path::Path;

use async_trait::async_trait;
use base64::Engine;
use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Serialize};

use super::{AnalysisResult, Analyzer, PromptVariant};
use crate::camera::CapturedImage;
use crate::config::AnalyzerConfig;
use crate::{Error, Result};

/// Analyzer backed by the Gemini `generateContent` endpoint
pub struct GeminiAnalyzer {
    client: reqwest::Client,
    api_key: SecretString,
    model: String,
    endpoint: String,
}

/// `generateContent` request
#[derive(Debug, Serialize)]
struct GenerateRequest<'a> {
    contents: Vec<Content<'a>>,
}

/// A turn in the request
#[derive(Debug, Serialize)]
struct Content<'a> {
    role: &'a str,
    parts: Vec<Part<'a>>,
}

/// Request part (text or inline image)
#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text { text: &'a str },
    Image { inline_data: InlineData<'a> },
}

/// Base64 image payload
#[derive(Debug, Serialize)]
struct InlineData<'a> {
    mime_type: &'a str,
    data: String,
}

/// `generateContent` response
#[derive(Debug, Default, Deserialize)]
struct GenerateResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
struct Candidate {
    #[serde(default)]
    content: Option<CandidateContent>,
}

#[derive(Debug, Default, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
struct ResponsePart {
    text: Option<String>,
}

impl GeminiAnalyzer {
    /// Create a client, validating the credential
    ///
    /// # Errors
    ///
    /// Returns error if the API key is missing or the HTTP client cannot be built
    pub fn new(config: AnalyzerConfig) -> Result<Self> {
        let api_key = config
            .api_key
            .filter(|k| !k.expose_secret().trim().is_empty())
            .ok_or_else(|| {
                Error::Config(
                    "Gemini API key required (set GEMINI_API_KEY or analyzer.api_key)".to_string(),
                )
            })?;

        let mut builder = reqwest::Client::builder();
        if let Some(timeout) = config.timeout {
            builder = builder.timeout(timeout);
        }

        Ok(Self {
            client: builder.build()?,
            api_key,
            model: config.model,
            endpoint: config.endpoint.trim_end_matches('/').to_string(),
        })
    }

    /// Model identifier in use
    #[must_use]
    pub fn model(&self) -> &str {
        &self.model
    }

    /// Send a prompt and image, returning the response text if any
    ///
    /// # Errors
    ///
    /// Returns error if the request fails or the service answers with an error status
    pub async fn generate(
        &self,
        prompt: &str,
        image_data: &[u8],
        mime_type: &str,
    ) -> Result<Option<String>> {
        let request = GenerateRequest {
            contents: vec![Content {
                role: "user",
                parts: vec![
                    Part::Text { text: prompt },
                    Part::Image {
                        inline_data: InlineData {
                            mime_type,
                            data: base64::engine::general_purpose::STANDARD.encode(image_data),
                        },
                    },
                ],
            }],
        };

        let url = format!("{}/models/{}:generateContent", self.endpoint, self.model);

        let response = self
            .client
            .post(&url)
            .header("x-goog-api-key", self.api_key.expose_secret())
            .json(&request)
            .send()
            .await
            .map_err(|e| Error::Analysis(format!("request failed: {e}")))?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Error::Analysis(format!("API error {status}: {body}")));
        }

        let result: GenerateResponse = response
            .json()
            .await
            .map_err(|e| Error::Analysis(format!("parse error: {e}")))?;

        Ok(extract_text(result))
    }
}

#[async_trait]
impl Analyzer for GeminiAnalyzer {
    async fn analyze(&self, image: &CapturedImage, variant: PromptVariant) -> AnalysisResult {
        let image_data = match tokio::fs::read(&image.path).await {
            Ok(data) => data,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return AnalysisResult::failure(format!(
                    "file not found: {}",
                    image.path.display()
                ));
            }
            Err(e) => {
                return AnalysisResult::failure(format!(
                    "failed to read {}: {e}",
                    image.path.display()
                ));
            }
        };

        tracing::info!(%variant, model = %self.model, "requesting caption");
        match self
            .generate(variant.prompt(), &image_data, mime_type_for(&image.path))
            .await
        {
            Ok(text) => {
                let result = AnalysisResult::from_text(text.as_deref());
                if result.is_success() {
                    tracing::debug!("caption received");
                }
                result
            }
            Err(e) => AnalysisResult::failure(e.to_string()),
        }
    }
}

/// Concatenate the text parts of the first candidate
fn extract_text(response: GenerateResponse) -> Option<String> {
    let text = response
        .candidates
        .into_iter()
        .next()?
        .content?
        .parts
        .into_iter()
        .filter_map(|p| p.text)
        .collect::<String>();

    (!text.is_empty()).then_some(text)
}

/// MIME type from the file extension; anything unknown is sent as JPEG
///
/// Only formats `CapturedImage::from_file` can read are listed.
fn mime_type_for(path: &Path) -> &'static str {
    match path
        .extension()
        .and_then(|e| e.to_str())
        .map(str::to_lowercase)
        .as_deref()
    {
        Some("png") => "image/png",
        Some("webp") => "image/webp",
        _ => "image/jpeg",
    }
}
