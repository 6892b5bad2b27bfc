//! Core traits for quill abstractions.
//!
//! These traits define the interfaces that concrete store
//! implementations must satisfy, enabling pluggable backends and
//! testability.

use async_trait::async_trait;
use uuid::Uuid;

use crate::error::Result;
use crate::models::*;

/// Repository for note CRUD and flag operations.
#[async_trait]
pub trait NoteRepository: Send + Sync {
    /// Create a new note. Fails with `Conflict` if the doc id is taken.
    async fn create(&self, req: CreateNoteRequest) -> Result<Note>;

    /// Fetch a note by its client-visible doc id.
    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Note>;

    /// List a user's notes, newest first, optionally filtered.
    async fn list_by_owner(&self, owner_id: &str, filter: NoteFilter) -> Result<Vec<Note>>;

    /// Update a note identified by doc id. The owner never changes.
    async fn update(&self, doc_id: &str, req: UpdateNoteRequest) -> Result<Note>;

    /// Delete a note by storage id.
    async fn delete(&self, id: Uuid) -> Result<()>;

    /// Flip the archived flag. Calling twice restores the original value.
    async fn toggle_archive(&self, id: Uuid) -> Result<Note>;

    /// Flip the starred flag. Calling twice restores the original value.
    async fn toggle_star(&self, id: Uuid) -> Result<Note>;

    /// Move a note to another category (or clear it with `None`). A
    /// non-null target must name an existing category of the owner.
    async fn set_category(
        &self,
        id: Uuid,
        owner_id: &str,
        category: Option<&str>,
    ) -> Result<Note>;
}

/// Repository for category operations, including the cross-entity
/// cascades that keep notes consistent with category renames/deletes.
#[async_trait]
pub trait CategoryRepository: Send + Sync {
    /// List a user's categories, name-ordered.
    async fn list(&self, owner_id: &str) -> Result<Vec<Category>>;

    /// Create a category. The `(owner, name)` pair is unique
    /// case-insensitively.
    async fn create(&self, owner_id: &str, name: &str) -> Result<Category>;

    /// Rename a category, cascading the new name to every note that
    /// references the old one. Returns the updated category and the
    /// number of notes touched.
    async fn rename(&self, id: Uuid, owner_id: &str, new_name: &str) -> Result<(Category, u64)>;

    /// Delete a category, cascading deletion to every note that
    /// references it. Returns the number of notes deleted.
    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<u64>;

    /// Idempotent create-if-absent. Concurrent calls for the same
    /// `(owner, name)` never produce duplicates nor surface an error;
    /// the second writer observes the first writer's row.
    async fn ensure_exists(&self, owner_id: &str, name: &str) -> Result<Category>;
}
