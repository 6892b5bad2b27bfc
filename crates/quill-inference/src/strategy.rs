//! Generation strategy selection.
//!
//! A strategy is a tagged variant, chosen at construction time and
//! dispatched through one generate contract: either the external
//! provider or the local fallback reducer. There is no
//! fallback-on-error inside a call: if the external provider fails
//! mid-flight, the typed failure surfaces to the caller.

use tracing::{info, warn};

use quill_core::{defaults, Error, ProviderErrorKind, Result};

use crate::config::ProviderConfig;
use crate::fallback::BasicSummarizer;
use crate::provider::GenAiProvider;

/// What the pipeline wants generated.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum GenerationTask {
    /// Extract readable text from a raw document.
    PdfExtraction,
    /// Summarize note text.
    Summary,
    /// Derive quiz questions from note text.
    Quiz,
}

impl GenerationTask {
    /// The instruction sent to the provider for this task.
    pub fn instruction(&self) -> &'static str {
        match self {
            Self::PdfExtraction => defaults::PDF_EXTRACT_INSTRUCTION,
            Self::Summary => defaults::SUMMARY_INSTRUCTION,
            Self::Quiz => defaults::QUIZ_INSTRUCTION,
        }
    }

    pub fn as_str(&self) -> &'static str {
        match self {
            Self::PdfExtraction => "pdf_extraction",
            Self::Summary => "summary",
            Self::Quiz => "quiz",
        }
    }
}

/// Raw payload handed to a strategy.
#[derive(Debug, Clone)]
pub enum GenerationInput {
    /// Plain text (decoded note content).
    Text(String),
    /// Raw document bytes with their declared MIME type.
    Document { mime_type: String, data: Vec<u8> },
}

impl GenerationInput {
    /// Payload size in bytes, for logging.
    pub fn payload_len(&self) -> usize {
        match self {
            Self::Text(text) => text.len(),
            Self::Document { data, .. } => data.len(),
        }
    }
}

/// The configured generation algorithm.
///
/// Selection happens once, at construction, not per call.
pub enum GenerationStrategy {
    /// Calls the external generative-text provider.
    External(GenAiProvider),
    /// Local naive text reduction.
    Fallback(BasicSummarizer),
}

impl GenerationStrategy {
    /// Build the strategy from the environment: the external provider
    /// when usable credentials are present, the local fallback
    /// otherwise.
    pub fn from_env() -> Self {
        let config = ProviderConfig::from_env();
        if !config.is_configured() {
            warn!(
                subsystem = "inference",
                component = "strategy",
                "No usable provider credentials; using local fallback strategy"
            );
            return Self::Fallback(BasicSummarizer::new());
        }
        match GenAiProvider::new(config) {
            Ok(provider) => {
                info!(
                    subsystem = "inference",
                    component = "strategy",
                    "Using external provider strategy"
                );
                Self::External(provider)
            }
            Err(e) => {
                warn!(
                    subsystem = "inference",
                    component = "strategy",
                    error = %e,
                    "Provider configuration invalid; using local fallback strategy"
                );
                Self::Fallback(BasicSummarizer::new())
            }
        }
    }

    /// Strategy name for logs.
    pub fn name(&self) -> &'static str {
        match self {
            Self::External(_) => "external",
            Self::Fallback(_) => "fallback",
        }
    }

    /// True when this strategy can consume raw document bytes.
    ///
    /// The local fallback cannot; pipelines route document input to a
    /// placeholder path instead of calling it.
    pub fn supports_documents(&self) -> bool {
        matches!(self, Self::External(_))
    }

    /// Run the task over the input.
    pub async fn generate(&self, task: GenerationTask, input: &GenerationInput) -> Result<String> {
        match self {
            Self::External(provider) => provider.generate(task.instruction(), input).await,
            Self::Fallback(summarizer) => match input {
                GenerationInput::Text(text) => Ok(summarizer.summarize(text)),
                GenerationInput::Document { .. } => Err(Error::external(
                    ProviderErrorKind::Unavailable,
                    "local fallback strategy cannot process document input",
                )),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_task_instructions_are_distinct() {
        assert_ne!(
            GenerationTask::Summary.instruction(),
            GenerationTask::Quiz.instruction()
        );
        assert!(GenerationTask::PdfExtraction
            .instruction()
            .contains("PDF"));
    }

    #[test]
    fn test_fallback_does_not_support_documents() {
        let strategy = GenerationStrategy::Fallback(BasicSummarizer::new());
        assert!(!strategy.supports_documents());
        assert_eq!(strategy.name(), "fallback");
    }

    #[tokio::test]
    async fn test_fallback_generates_from_text() {
        let strategy = GenerationStrategy::Fallback(BasicSummarizer::new());
        let input = GenerationInput::Text("First point here. Extra detail. More.".to_string());
        let out = strategy
            .generate(GenerationTask::Summary, &input)
            .await
            .unwrap();
        assert_eq!(out, "First point here. Extra detail.");
    }

    #[tokio::test]
    async fn test_fallback_rejects_document_input() {
        let strategy = GenerationStrategy::Fallback(BasicSummarizer::new());
        let input = GenerationInput::Document {
            mime_type: "application/pdf".to_string(),
            data: vec![0x25, 0x50, 0x44, 0x46],
        };
        let err = strategy
            .generate(GenerationTask::PdfExtraction, &input)
            .await
            .unwrap_err();
        assert_eq!(err.kind(), "external_service");
    }

    #[test]
    fn test_payload_len() {
        assert_eq!(GenerationInput::Text("abcd".into()).payload_len(), 4);
        let doc = GenerationInput::Document {
            mime_type: "application/pdf".into(),
            data: vec![0; 16],
        };
        assert_eq!(doc.payload_len(), 16);
    }
}
