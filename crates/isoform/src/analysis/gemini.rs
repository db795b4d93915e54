//! Gemini `generateContent` provider.

use async_trait::async_trait;
use reqwest::StatusCode;
use serde::{Deserialize, Serialize};
use tracing::{debug, instrument};

use super::AnalysisProvider;
use crate::config::Config;
use crate::error::{Error, Result};
use crate::prompt::{PromptRequest, Segment};

/// Calls the Gemini generative-language REST API.
#[derive(Debug, Clone)]
pub struct GeminiProvider {
    client: reqwest::Client,
    endpoint: String,
    model: String,
    api_key: Option<String>,
}

impl GeminiProvider {
    /// Build a provider from configuration.
    ///
    /// A missing API key is not an error here; every request will fail with
    /// [`Error::AiRequest`] until one is configured.
    ///
    /// # Errors
    ///
    /// Returns an error if the HTTP client cannot be constructed.
    pub fn from_config(config: &Config) -> Result<Self> {
        let client = reqwest::Client::builder()
            .timeout(config.ai_timeout())
            .build()
            .map_err(|e| Error::ai_request(format!("failed to build HTTP client: {e}")))?;
        Ok(Self {
            client,
            endpoint: config.ai.endpoint.trim_end_matches('/').to_string(),
            model: config.ai.model.clone(),
            api_key: config.api_key(),
        })
    }

    /// Whether an API key is available.
    #[must_use]
    pub fn has_api_key(&self) -> bool {
        self.api_key.is_some()
    }

    fn url(&self) -> String {
        format!("{}/models/{}:generateContent", self.endpoint, self.model)
    }
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateRequest<'a> {
    system_instruction: Content<'a>,
    contents: Vec<Content<'a>>,
}

#[derive(Debug, Serialize)]
struct Content<'a> {
    parts: Vec<Part<'a>>,
}

#[derive(Debug, Serialize)]
#[serde(untagged)]
enum Part<'a> {
    Text {
        text: &'a str,
    },
    #[serde(rename_all = "camelCase")]
    Inline {
        inline_data: InlineData<'a>,
    },
}

#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData<'a> {
    mime_type: &'a str,
    data: &'a str,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct GenerateResponse {
    candidates: Vec<Candidate>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct Candidate {
    content: Option<ResponseContent>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponseContent {
    parts: Vec<ResponsePart>,
}

#[derive(Debug, Default, Deserialize)]
#[serde(default)]
struct ResponsePart {
    text: Option<String>,
}

impl<'a> GenerateRequest<'a> {
    fn from_prompt(request: &'a PromptRequest) -> Self {
        let parts = request
            .segments
            .iter()
            .map(|segment| match segment {
                Segment::Text(text) => Part::Text { text },
                Segment::Image { mime, data } => Part::Inline {
                    inline_data: InlineData {
                        mime_type: mime,
                        data,
                    },
                },
            })
            .collect();
        Self {
            system_instruction: Content {
                parts: vec![Part::Text {
                    text: request.instruction,
                }],
            },
            contents: vec![Content { parts }],
        }
    }
}

impl GenerateResponse {
    /// Concatenated text of the first candidate.
    fn text(self) -> String {
        self.candidates
            .into_iter()
            .next()
            .and_then(|c| c.content)
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|p| p.text)
                    .collect::<String>()
            })
            .unwrap_or_default()
    }
}

fn status_error(status: StatusCode, body: &str) -> Error {
    let detail = body.trim();
    let message = if detail.is_empty() {
        format!("provider returned {status}")
    } else {
        format!("provider returned {status}: {detail}")
    };
    if status == StatusCode::TOO_MANY_REQUESTS || status.is_server_error() {
        Error::ai_transient(message)
    } else {
        Error::ai_request(message)
    }
}

fn transport_error(err: &reqwest::Error) -> Error {
    if err.is_timeout() {
        Error::Timeout {
            operation: "AI request".to_string(),
        }
    } else if err.is_connect() || err.is_request() {
        Error::ai_transient(err.to_string())
    } else {
        Error::ai_request(err.to_string())
    }
}

/// Failure while reading or decoding the response body.
fn body_error(err: &reqwest::Error) -> Error {
    if err.is_decode() {
        Error::ai_request(format!("unreadable provider response: {err}"))
    } else {
        transport_error(err)
    }
}

#[async_trait]
impl AnalysisProvider for GeminiProvider {
    #[instrument(skip_all, fields(model = %self.model, segments = request.segments.len()))]
    async fn generate(&self, request: &PromptRequest) -> Result<String> {
        let api_key = self.api_key.as_deref().ok_or_else(|| {
            Error::ai_request("no API key configured (set ai.api_key or GEMINI_API_KEY)")
        })?;

        let body = GenerateRequest::from_prompt(request);
        let response = self
            .client
            .post(self.url())
            .header("x-goog-api-key", api_key)
            .json(&body)
            .send()
            .await
            .map_err(|e| transport_error(&e))?;

        let status = response.status();
        if !status.is_success() {
            let text = response.text().await.unwrap_or_default();
            return Err(status_error(status, &text));
        }

        let payload: GenerateResponse = response
            .json()
            .await
            .map_err(|e| body_error(&e))?;
        let text = payload.text();
        debug!(chars = text.len(), "Provider responded");
        Ok(text)
    }
}
