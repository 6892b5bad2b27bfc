//! Provider configuration.
//!
//! Configuration is environment-variable driven (`QUILL_GENAI_*`).
//! A missing or placeholder API key does not make the configuration
//! invalid; it makes the provider *unconfigured*, which callers probe
//! with [`ProviderConfig::is_configured`] before ever issuing a call.

use quill_core::{defaults, Error, Result};

/// Configuration for the external generative-text provider.
#[derive(Debug, Clone)]
pub struct ProviderConfig {
    /// API key. `None`, empty, or the placeholder value all count as
    /// "not configured".
    pub api_key: Option<String>,
    /// Base URL of the provider API.
    pub base_url: String,
    /// Generation model name.
    pub model: String,
    /// Sampling temperature.
    pub temperature: f32,
    /// Top-k sampling parameter.
    pub top_k: i32,
    /// Top-p sampling parameter.
    pub top_p: f32,
    /// Maximum output tokens per request.
    pub max_output_tokens: i32,
    /// Safety threshold applied to every harm category.
    pub safety_threshold: String,
    /// Request timeout in seconds.
    pub timeout_secs: u64,
}

impl Default for ProviderConfig {
    fn default() -> Self {
        Self {
            api_key: None,
            base_url: defaults::GENAI_URL.to_string(),
            model: defaults::GENAI_MODEL.to_string(),
            temperature: defaults::GEN_TEMPERATURE,
            top_k: defaults::GEN_TOP_K,
            top_p: defaults::GEN_TOP_P,
            max_output_tokens: defaults::GEN_MAX_OUTPUT_TOKENS,
            safety_threshold: defaults::GEN_SAFETY_THRESHOLD.to_string(),
            timeout_secs: defaults::GEN_TIMEOUT_SECS,
        }
    }
}

impl ProviderConfig {
    /// Create from environment variables.
    ///
    /// Reads `QUILL_GENAI_API_KEY`, `QUILL_GENAI_URL`,
    /// `QUILL_GENAI_MODEL`, and `QUILL_GENAI_TIMEOUT_SECS`; anything
    /// unset falls back to the defaults.
    pub fn from_env() -> Self {
        let mut config = Self::default();
        if let Ok(key) = std::env::var("QUILL_GENAI_API_KEY") {
            config.api_key = Some(key);
        }
        if let Ok(url) = std::env::var("QUILL_GENAI_URL") {
            config.base_url = url;
        }
        if let Ok(model) = std::env::var("QUILL_GENAI_MODEL") {
            config.model = model;
        }
        if let Some(timeout) = std::env::var("QUILL_GENAI_TIMEOUT_SECS")
            .ok()
            .and_then(|v| v.parse::<u64>().ok())
        {
            config.timeout_secs = timeout;
        }
        config
    }

    /// Set the API key.
    pub fn with_api_key(mut self, key: impl Into<String>) -> Self {
        self.api_key = Some(key.into());
        self
    }

    /// Set the base URL (useful for pointing at a test server).
    pub fn with_base_url(mut self, url: impl Into<String>) -> Self {
        self.base_url = url.into();
        self
    }

    /// True when a usable (non-empty, non-placeholder) API key is present.
    pub fn is_configured(&self) -> bool {
        match self.api_key.as_deref().map(str::trim) {
            Some(key) => !key.is_empty() && key != defaults::GENAI_PLACEHOLDER_KEY,
            None => false,
        }
    }

    /// Validate the configuration.
    pub fn validate(&self) -> Result<()> {
        if self.base_url.is_empty() {
            return Err(Error::Config("provider base_url cannot be empty".to_string()));
        }
        if !self.base_url.starts_with("http://") && !self.base_url.starts_with("https://") {
            return Err(Error::Config(format!(
                "provider base_url must start with http:// or https://, got: {}",
                self.base_url
            )));
        }
        if self.model.is_empty() {
            return Err(Error::Config("provider model cannot be empty".to_string()));
        }
        if !(0.0..=2.0).contains(&self.temperature) {
            return Err(Error::Config(format!(
                "temperature must be within 0.0..=2.0, got {}",
                self.temperature
            )));
        }
        if self.max_output_tokens <= 0 {
            return Err(Error::Config(
                "max_output_tokens must be positive".to_string(),
            ));
        }
        Ok(())
    }
}
