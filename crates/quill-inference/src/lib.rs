//! # quill-inference
//!
//! Generative-text provider abstraction for quill.
//!
//! This crate provides:
//! - The external provider HTTP backend with typed failure mapping
//! - Env-driven provider configuration with placeholder-key detection
//! - The local fallback summarizer
//! - [`GenerationStrategy`]: the construction-time choice between them,
//!   dispatched through a single generate contract

pub mod config;
pub mod fallback;
pub mod provider;
pub mod strategy;

// Re-export core types
pub use quill_core::*;

pub use config::ProviderConfig;
pub use fallback::BasicSummarizer;
pub use provider::GenAiProvider;
pub use strategy::{GenerationInput, GenerationStrategy, GenerationTask};
