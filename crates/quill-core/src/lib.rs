//! # quill-core
//!
//! Core types, traits, and abstractions for the quill note engine.
//!
//! This crate provides the foundational data structures and trait
//! definitions that the other quill crates depend on: the Note and
//! Category entity model, the block-content codec, the error taxonomy,
//! the domain-event bus, and the repository interfaces.

pub mod blocks;
pub mod defaults;
pub mod error;
pub mod events;
pub mod logging;
pub mod models;
pub mod traits;

// Re-export commonly used types at crate root
pub use blocks::{blocks_from_plain_text, plain_text, plain_text_lines, preview_from_text};
pub use error::{is_unique_violation, Error, ProviderErrorKind, Result};
pub use events::{
    ActivityObserver, ActivityRecord, DomainEvent, EventBus, EventKind, EventObserver,
    LogObserver, WebhookObserver,
};
pub use models::*;
pub use traits::*;
