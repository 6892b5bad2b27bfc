//! Centralized default constants for the quill system.
//!
//! **This module is the single source of truth** for all shared default
//! values. All crates reference these constants instead of defining
//! their own magic numbers.

// =============================================================================
// CATEGORIES
// =============================================================================

/// Auto-provisioned category for PDF-imported notes.
pub const GENERATED_CATEGORY: &str = "Generated";

/// Auto-provisioned category for summary notes.
pub const SUMMARY_CATEGORY: &str = "Generated Summary";

/// Auto-provisioned category for quiz notes.
pub const QUIZ_CATEGORY: &str = "Generated Quiz";

// =============================================================================
// NOTES
// =============================================================================

/// Sentinel preview text used when no preview is supplied.
pub const DEFAULT_PREVIEW: &str = "No preview available.";

/// Maximum characters of generated text kept in a note preview.
pub const PREVIEW_MAX_CHARS: usize = 150;

// =============================================================================
// PIPELINE
// =============================================================================

/// Maximum accepted size for an uploaded PDF, in bytes (20 MiB).
pub const PDF_MAX_BYTES: usize = 20 * 1024 * 1024;

/// Accepted MIME type for uploaded documents.
pub const PDF_MIME: &str = "application/pdf";

/// Preview text used on the placeholder note when the provider is
/// unconfigured.
pub const PLACEHOLDER_PREVIEW: &str =
    "PDF processing unavailable. Please check server configuration.";

// =============================================================================
// INFERENCE
// =============================================================================

/// Default generative-text provider base URL.
pub const GENAI_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

/// Default generation model name.
pub const GENAI_MODEL: &str = "gemini-1.5-flash";

/// Placeholder API key value that counts as "not configured".
pub const GENAI_PLACEHOLDER_KEY: &str = "YOUR_GENAI_API_KEY";

/// Timeout for generation requests in seconds.
pub const GEN_TIMEOUT_SECS: u64 = 120;

/// Sampling temperature for generation requests.
pub const GEN_TEMPERATURE: f32 = 0.9;

/// Top-k sampling parameter.
pub const GEN_TOP_K: i32 = 1;

/// Top-p sampling parameter.
pub const GEN_TOP_P: f32 = 1.0;

/// Maximum output tokens per generation request.
pub const GEN_MAX_OUTPUT_TOKENS: i32 = 8192;

/// Content-safety threshold applied to every harm category.
pub const GEN_SAFETY_THRESHOLD: &str = "BLOCK_MEDIUM_AND_ABOVE";

// =============================================================================
// INSTRUCTIONS
// =============================================================================

/// Instruction sent with raw PDF bytes.
pub const PDF_EXTRACT_INSTRUCTION: &str = "Extract all text content from the following PDF \
    document. Present the extracted text clearly. If the PDF contains images or diagrams, \
    describe them briefly if possible, otherwise state that non-text content was present but \
    could not be fully extracted.";

/// Instruction sent with note text for summarization.
pub const SUMMARY_INSTRUCTION: &str =
    "Please summarize the following note content in a concise and clear manner:";

/// Instruction sent with note text for quiz generation.
pub const QUIZ_INSTRUCTION: &str = "Based on the following note content, generate five \
    challenging quiz questions. Provide only the questions.";

// =============================================================================
// FALLBACK STRATEGY
// =============================================================================

/// Sentences kept from each paragraph by the local fallback summarizer.
pub const FALLBACK_SENTENCES_PER_PARAGRAPH: usize = 2;

/// Minimum length a fallback summary must reach before the
/// insufficient-content sentence is substituted.
pub const FALLBACK_MIN_SUMMARY_LEN: usize = 10;

/// Substituted when the fallback summarizer cannot produce anything useful.
pub const FALLBACK_INSUFFICIENT_CONTENT: &str =
    "Unable to generate summary due to insufficient content.";
