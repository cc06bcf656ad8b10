use std::time::Duration;

use crate::types::{GenerateRequest, GenerateResponse, GenerationOptions};
use crate::{GenAiError, Result};

pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com";
pub const DEFAULT_MODEL: &str = "gemini-2.0-flash";

const API_KEY_HEADER: &str = "x-goog-api-key";

// ─── GeminiClient ─────────────────────────────────────────────────────────

/// Blocking client for `models/{model}:generateContent`.
///
/// One request per call; there is no retry or backoff. A failed call is
/// returned to the caller immediately.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: reqwest::blocking::Client,
    api_key: String,
    model: String,
    base_url: String,
}

impl GeminiClient {
    pub fn new(api_key: impl Into<String>, model: impl Into<String>) -> Self {
        GeminiClient {
            http: reqwest::blocking::Client::builder()
                .connect_timeout(Duration::from_secs(30))
                .build()
                .unwrap_or_default(),
            api_key: api_key.into(),
            model: model.into(),
            base_url: DEFAULT_BASE_URL.to_string(),
        }
    }

    /// Point the client at a different host (proxies, tests).
    pub fn with_base_url(mut self, base_url: impl Into<String>) -> Self {
        self.base_url = base_url.into().trim_end_matches('/').to_string();
        self
    }

    pub fn model(&self) -> &str {
        &self.model
    }

    /// Generate text for `prompt` and return the first candidate's text.
    pub fn generate(&self, prompt: &str, opts: &GenerationOptions) -> Result<String> {
        let response = self.generate_raw(&GenerateRequest::from_prompt(prompt, opts))?;
        if let Some(reason) = response.block_reason() {
            return Err(GenAiError::Blocked(reason.to_string()));
        }
        response.text().ok_or(GenAiError::EmptyResponse)
    }

    /// Send a fully built request and decode the response body.
    pub fn generate_raw(&self, request: &GenerateRequest) -> Result<GenerateResponse> {
        let url = self.endpoint();
        tracing::debug!(model = %self.model, "gemini generateContent");

        let resp = self
            .http
            .post(&url)
            .header(API_KEY_HEADER, &self.api_key)
            .json(request)
            .send()?;

        let status = resp.status();
        let body = resp.text()?;
        if !status.is_success() {
            return Err(GenAiError::Status {
                status: status.as_u16(),
                body,
            });
        }

        let decoded: GenerateResponse =
            serde_json::from_str(&body).map_err(|source| GenAiError::Parse {
                body: body.clone(),
                source,
            })?;
        if let Some(usage) = decoded.usage_metadata {
            tracing::debug!(
                prompt_tokens = usage.prompt_token_count,
                output_tokens = usage.candidates_token_count,
                "gemini usage"
            );
        }
        Ok(decoded)
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/v1beta/models/{}:generateContent",
            self.base_url, self.model
        )
    }
}
