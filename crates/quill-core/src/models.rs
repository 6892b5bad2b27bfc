//! Core data models for quill.
//!
//! A [`Note`] is an owned rich-text document whose `content` is a tree
//! of [`Block`] nodes. A [`Category`] is an owned, case-insensitively
//! unique name that notes reference denormalized by name (not by id).
//! Provenance is a field on the note, not a subtype: the factory
//! constructors on [`CreateNoteRequest`] populate one struct with
//! different default tag sets and title templates.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use serde_json::Value as JsonValue;
use uuid::Uuid;

use crate::defaults;

// =============================================================================
// BLOCK CONTENT
// =============================================================================

fn default_inline_kind() -> String {
    "text".to_string()
}

/// An inline content run inside a block. Only `"text"` runs carry text.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InlineText {
    #[serde(rename = "type", default = "default_inline_kind")]
    pub kind: String,
    #[serde(default)]
    pub text: String,
    #[serde(default)]
    pub styles: serde_json::Map<String, JsonValue>,
}

impl InlineText {
    /// A plain unstyled text run.
    pub fn plain(text: impl Into<String>) -> Self {
        Self {
            kind: default_inline_kind(),
            text: text.into(),
            styles: serde_json::Map::new(),
        }
    }
}

/// A node in the rich-text document tree.
///
/// Deserialization is tolerant: missing `props`, `content`, and
/// `children` degrade to empty rather than erroring, so malformed
/// nodes from old clients still load.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Block {
    #[serde(default)]
    pub id: String,
    #[serde(rename = "type", default)]
    pub kind: String,
    #[serde(default)]
    pub props: serde_json::Map<String, JsonValue>,
    #[serde(default)]
    pub content: Vec<InlineText>,
    #[serde(default)]
    pub children: Vec<Block>,
}

fn default_props() -> serde_json::Map<String, JsonValue> {
    let mut props = serde_json::Map::new();
    props.insert("textColor".into(), JsonValue::String("default".into()));
    props.insert(
        "backgroundColor".into(),
        JsonValue::String("default".into()),
    );
    props.insert("textAlignment".into(), JsonValue::String("left".into()));
    props
}

impl Block {
    /// A paragraph block with default formatting properties.
    pub fn paragraph(id: impl Into<String>, text: impl Into<String>) -> Self {
        Self {
            id: id.into(),
            kind: "paragraph".to_string(),
            props: default_props(),
            content: vec![InlineText::plain(text)],
            children: Vec::new(),
        }
    }

    /// A heading block at the given level.
    pub fn heading(id: impl Into<String>, level: u8, text: impl Into<String>) -> Self {
        let mut props = default_props();
        props.insert("level".into(), JsonValue::String(level.to_string()));
        Self {
            id: id.into(),
            kind: "heading".to_string(),
            props,
            content: vec![InlineText::plain(text)],
            children: Vec::new(),
        }
    }
}

// =============================================================================
// ENTITIES
// =============================================================================

/// Which pipeline (if any) produced a note.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum NoteProvenance {
    #[default]
    Manual,
    PdfImport,
    Summary,
    Quiz,
}

impl NoteProvenance {
    /// Stable storage tag.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Manual => "manual",
            Self::PdfImport => "pdf-import",
            Self::Summary => "summary",
            Self::Quiz => "quiz",
        }
    }

    /// Parse a storage tag, falling back to `Manual` for unknown values.
    pub fn from_tag(tag: &str) -> Self {
        match tag {
            "pdf-import" => Self::PdfImport,
            "summary" => Self::Summary,
            "quiz" => Self::Quiz,
            _ => Self::Manual,
        }
    }
}

/// A note owned by a single user.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Note {
    /// Store-assigned identifier.
    pub id: Uuid,
    /// Client-visible routing identifier, unique across all notes.
    pub doc_id: String,
    /// Opaque owner identifier from the external identity system.
    pub owner_id: String,
    pub title: String,
    pub content: Vec<Block>,
    pub preview: String,
    /// Name of the owning category, if any. A denormalized reference
    /// to `Category::name`, not its id.
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub provenance: NoteProvenance,
    pub is_archived: bool,
    pub is_starred: bool,
    /// Set on create and rewritten on every mutation.
    pub updated_at: DateTime<Utc>,
}

/// A per-user category. `(owner_id, name)` is unique under
/// case-insensitive comparison.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Category {
    pub id: Uuid,
    pub owner_id: String,
    pub name: String,
    pub created_at: DateTime<Utc>,
}

/// Filter for listing a user's notes.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default)]
pub enum NoteFilter {
    #[default]
    All,
    Archived,
    Starred,
}

// =============================================================================
// REQUESTS & FACTORY CONSTRUCTORS
// =============================================================================

/// Generate a fresh pipeline doc id (UUIDv7, simple form).
pub fn new_doc_id() -> String {
    Uuid::now_v7().simple().to_string()
}

/// Strip a trailing `.pdf` (case-insensitive) from an uploaded filename.
fn pdf_stem(filename: &str) -> &str {
    let lower = filename.to_ascii_lowercase();
    if lower.ends_with(".pdf") {
        &filename[..filename.len() - 4]
    } else {
        filename
    }
}

/// Request for creating a new note.
#[derive(Debug, Clone)]
pub struct CreateNoteRequest {
    pub doc_id: String,
    pub owner_id: String,
    pub title: String,
    pub content: Vec<Block>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub preview: Option<String>,
    pub provenance: NoteProvenance,
}

impl CreateNoteRequest {
    /// A plain user-authored note.
    pub fn text(
        doc_id: impl Into<String>,
        owner_id: impl Into<String>,
        title: impl Into<String>,
        content: Vec<Block>,
    ) -> Self {
        Self {
            doc_id: doc_id.into(),
            owner_id: owner_id.into(),
            title: title.into(),
            content,
            category: None,
            tags: Vec::new(),
            preview: None,
            provenance: NoteProvenance::Manual,
        }
    }

    /// A note produced by the PDF import pipeline.
    pub fn from_pdf(
        owner_id: impl Into<String>,
        filename: &str,
        content: Vec<Block>,
        preview: String,
    ) -> Self {
        Self {
            doc_id: new_doc_id(),
            owner_id: owner_id.into(),
            title: format!("Note from PDF: {}", pdf_stem(filename)),
            content,
            category: Some(defaults::GENERATED_CATEGORY.to_string()),
            tags: vec!["pdf-import".to_string(), "genai".to_string()],
            preview: Some(preview),
            provenance: NoteProvenance::PdfImport,
        }
    }

    /// The placeholder note created when a PDF arrives but the
    /// provider is not configured to process it.
    pub fn pdf_placeholder(
        owner_id: impl Into<String>,
        filename: &str,
        content: Vec<Block>,
    ) -> Self {
        Self {
            doc_id: new_doc_id(),
            owner_id: owner_id.into(),
            title: format!("PDF Upload: {}", pdf_stem(filename)),
            content,
            category: Some(defaults::GENERATED_CATEGORY.to_string()),
            tags: vec!["pdf-upload".to_string(), "error".to_string()],
            preview: Some(defaults::PLACEHOLDER_PREVIEW.to_string()),
            provenance: NoteProvenance::PdfImport,
        }
    }

    /// A summary note derived from an existing note.
    pub fn summary_of(source: &Note, content: Vec<Block>, preview: String) -> Self {
        Self {
            doc_id: new_doc_id(),
            owner_id: source.owner_id.clone(),
            title: format!("Summary of {}", source.title),
            content,
            category: Some(defaults::SUMMARY_CATEGORY.to_string()),
            tags: vec!["llm".to_string(), "summary".to_string()],
            preview: Some(preview),
            provenance: NoteProvenance::Summary,
        }
    }

    /// A quiz note derived from an existing note.
    pub fn quiz_of(source: &Note, content: Vec<Block>, preview: String) -> Self {
        Self {
            doc_id: new_doc_id(),
            owner_id: source.owner_id.clone(),
            title: format!("Quiz Questions of {}", source.title),
            content,
            category: Some(defaults::QUIZ_CATEGORY.to_string()),
            tags: vec!["llm".to_string(), "quiz".to_string()],
            preview: Some(preview),
            provenance: NoteProvenance::Quiz,
        }
    }

    /// Set the category name.
    pub fn with_category(mut self, category: impl Into<String>) -> Self {
        self.category = Some(category.into());
        self
    }

    /// Set the tag list.
    pub fn with_tags(mut self, tags: Vec<String>) -> Self {
        self.tags = tags;
        self
    }

    /// Set an explicit preview.
    pub fn with_preview(mut self, preview: impl Into<String>) -> Self {
        self.preview = Some(preview.into());
        self
    }
}

/// Request for updating an existing note, identified by its doc id.
///
/// The owner is never changed on update.
#[derive(Debug, Clone)]
pub struct UpdateNoteRequest {
    pub title: String,
    pub content: Vec<Block>,
    pub category: Option<String>,
    pub tags: Vec<String>,
    pub preview: Option<String>,
}
