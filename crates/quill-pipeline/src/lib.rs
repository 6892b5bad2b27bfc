//! # quill-pipeline
//!
//! Content-generation pipeline for quill: turns raw external input (an
//! uploaded PDF, or an existing note) into a new persisted note via the
//! configured generation strategy, auto-provisioning the pipeline
//! categories along the way.

pub mod pipeline;

// Re-export core types
pub use quill_core::*;

pub use pipeline::{GenerationPipeline, PdfUpload, PipelineOutcome, PipelineStage};
