//! External generative-text provider backend.
//!
//! Speaks a `generateContent`-shaped HTTP API: an instruction part plus
//! either a text part or an inline base64 document part, with
//! generation tuning and safety settings attached to every request.
//! Provider failures are translated into typed
//! [`Error::ExternalService`] values at this boundary; callers never
//! see raw transport errors, and nothing is retried here.

use std::time::{Duration, Instant};

use base64::Engine;
use reqwest::{Client, StatusCode};
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use quill_core::{Error, ProviderErrorKind, Result};

use crate::config::ProviderConfig;
use crate::strategy::GenerationInput;

/// Harm categories every request attaches the configured threshold to.
const HARM_CATEGORIES: &[&str] = &[
    "HARM_CATEGORY_HARASSMENT",
    "HARM_CATEGORY_HATE_SPEECH",
    "HARM_CATEGORY_SEXUALLY_EXPLICIT",
    "HARM_CATEGORY_DANGEROUS_CONTENT",
];

/// HTTP backend for the external generative-text provider.
pub struct GenAiProvider {
    client: Client,
    config: ProviderConfig,
}

// =============================================================================
// WIRE TYPES
// =============================================================================

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentRequest {
    contents: Vec<Content>,
    generation_config: GenerationConfig,
    safety_settings: Vec<SafetySetting>,
}

#[derive(Serialize)]
struct Content {
    role: String,
    parts: Vec<Part>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Part {
    #[serde(skip_serializing_if = "Option::is_none")]
    text: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    inline_data: Option<InlineData>,
}

impl Part {
    fn text(text: impl Into<String>) -> Self {
        Self {
            text: Some(text.into()),
            inline_data: None,
        }
    }

    fn inline_data(mime_type: &str, data: &[u8]) -> Self {
        Self {
            text: None,
            inline_data: Some(InlineData {
                mime_type: mime_type.to_string(),
                data: base64::engine::general_purpose::STANDARD.encode(data),
            }),
        }
    }
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct InlineData {
    mime_type: String,
    data: String,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct GenerationConfig {
    temperature: f32,
    top_k: i32,
    top_p: f32,
    max_output_tokens: i32,
}

#[derive(Serialize)]
struct SafetySetting {
    category: String,
    threshold: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Deserialize)]
struct PromptFeedback {
    #[serde(rename = "blockReason")]
    block_reason: Option<String>,
}

#[derive(Deserialize)]
struct ApiErrorBody {
    error: ApiErrorDetail,
}

#[derive(Deserialize)]
struct ApiErrorDetail {
    #[serde(default)]
    message: String,
    #[serde(default)]
    status: String,
}

// =============================================================================
// PROVIDER
// =============================================================================

impl GenAiProvider {
    /// Create a provider from a validated configuration.
    pub fn new(config: ProviderConfig) -> Result<Self> {
        config.validate()?;

        let client = Client::builder()
            .timeout(Duration::from_secs(config.timeout_secs))
            .build()
            .map_err(|e| Error::Config(format!("failed to build HTTP client: {}", e)))?;

        info!(
            subsystem = "inference",
            component = "provider",
            model = %config.model,
            "Initialized generative-text provider"
        );

        Ok(Self { client, config })
    }

    /// The active configuration.
    pub fn config(&self) -> &ProviderConfig {
        &self.config
    }

    fn endpoint(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.config.base_url.trim_end_matches('/'),
            self.config.model
        )
    }

    fn safety_settings(&self) -> Vec<SafetySetting> {
        HARM_CATEGORIES
            .iter()
            .map(|category| SafetySetting {
                category: category.to_string(),
                threshold: self.config.safety_threshold.clone(),
            })
            .collect()
    }

    /// Generate text for an instruction plus payload.
    ///
    /// Any failure comes back as a typed [`Error::ExternalService`]
    /// carrying the provider's diagnostic message. Never retried.
    pub async fn generate(&self, instruction: &str, input: &GenerationInput) -> Result<String> {
        let start = Instant::now();

        let mut parts = vec![Part::text(instruction)];
        match input {
            GenerationInput::Text(text) => parts.push(Part::text(text)),
            GenerationInput::Document { mime_type, data } => {
                parts.push(Part::inline_data(mime_type, data))
            }
        }

        let request = GenerateContentRequest {
            contents: vec![Content {
                role: "user".to_string(),
                parts,
            }],
            generation_config: GenerationConfig {
                temperature: self.config.temperature,
                top_k: self.config.top_k,
                top_p: self.config.top_p,
                max_output_tokens: self.config.max_output_tokens,
            },
            safety_settings: self.safety_settings(),
        };

        debug!(
            subsystem = "inference",
            component = "provider",
            op = "generate",
            payload_len = input.payload_len(),
            "Sending generation request"
        );

        let mut http = self.client.post(self.endpoint()).json(&request);
        if let Some(key) = &self.config.api_key {
            http = http.query(&[("key", key.as_str())]);
        }

        let response = http.send().await.map_err(|e| {
            Error::external(
                ProviderErrorKind::Unavailable,
                format!("request failed: {}", e),
            )
        })?;

        let status = response.status();
        if !status.is_success() {
            let body = response.text().await.unwrap_or_default();
            return Err(Self::map_error_status(status, &body));
        }

        let parsed: GenerateContentResponse = response.json().await.map_err(|e| {
            Error::external(
                ProviderErrorKind::MalformedResponse,
                format!("failed to parse response: {}", e),
            )
        })?;

        let text = Self::extract_text(parsed)?;

        info!(
            subsystem = "inference",
            component = "provider",
            op = "generate",
            response_len = text.len(),
            duration_ms = start.elapsed().as_millis() as u64,
            "Generation completed"
        );
        Ok(text)
    }

    /// Translate a non-success HTTP status plus body into a typed failure.
    fn map_error_status(status: StatusCode, body: &str) -> Error {
        let detail = serde_json::from_str::<ApiErrorBody>(body)
            .map(|b| b.error)
            .unwrap_or(ApiErrorDetail {
                message: body.trim().to_string(),
                status: String::new(),
            });
        let message = if detail.message.is_empty() {
            format!("provider returned {}", status)
        } else {
            detail.message
        };

        let invalid_key = detail.status == "INVALID_ARGUMENT"
            && (message.contains("API key not valid") || message.contains("API_KEY_INVALID"));

        let kind = match status {
            StatusCode::UNAUTHORIZED | StatusCode::FORBIDDEN => {
                ProviderErrorKind::InvalidCredentials
            }
            StatusCode::TOO_MANY_REQUESTS => ProviderErrorKind::QuotaExceeded,
            StatusCode::BAD_REQUEST if invalid_key => ProviderErrorKind::InvalidCredentials,
            _ => ProviderErrorKind::Unavailable,
        };

        warn!(
            subsystem = "inference",
            component = "provider",
            status = %status,
            error = %message,
            "Provider request failed"
        );
        Error::external(kind, message)
    }

    /// Pull the generated text out of a successful response.
    fn extract_text(parsed: GenerateContentResponse) -> Result<String> {
        if let Some(feedback) = &parsed.prompt_feedback {
            if let Some(reason) = &feedback.block_reason {
                return Err(Error::external(
                    ProviderErrorKind::SafetyBlocked,
                    format!("content blocked by safety settings: {}", reason),
                ));
            }
        }

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            return Err(Error::external(
                ProviderErrorKind::MalformedResponse,
                "provider did not return valid content",
            ));
        };

        if candidate.finish_reason.as_deref() == Some("SAFETY") {
            return Err(Error::external(
                ProviderErrorKind::SafetyBlocked,
                "generation stopped by safety settings",
            ));
        }

        let text: String = candidate
            .content
            .map(|content| {
                content
                    .parts
                    .into_iter()
                    .filter_map(|part| part.text)
                    .collect::<Vec<_>>()
                    .join("")
            })
            .unwrap_or_default();

        if text.is_empty() {
            return Err(Error::external(
                ProviderErrorKind::MalformedResponse,
                "provider response contained no text part",
            ));
        }
        Ok(text)
    }
}
