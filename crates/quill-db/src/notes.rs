//! Note repository implementation.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::Value as JsonValue;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use quill_core::{
    defaults, is_unique_violation, CreateNoteRequest, DomainEvent, Error, EventBus, Note,
    NoteFilter, NoteProvenance, NoteRepository, Result, UpdateNoteRequest,
};

/// PostgreSQL implementation of NoteRepository.
pub struct PgNoteRepository {
    pool: Pool<Postgres>,
    events: Arc<EventBus>,
}

const NOTE_COLUMNS: &str = "id, doc_id, owner_id, title, content, preview, category, tags, \
                            provenance, archived, starred, updated_at_utc";

/// Map a database row to a Note.
///
/// Content is stored as JSONB; malformed block payloads degrade to an
/// empty content vector rather than failing the read.
fn map_note_row(row: PgRow) -> Note {
    let content_json: JsonValue = row.get("content");
    let content = serde_json::from_value(content_json).unwrap_or_default();
    let provenance: String = row.get("provenance");

    Note {
        id: row.get("id"),
        doc_id: row.get("doc_id"),
        owner_id: row.get("owner_id"),
        title: row.get("title"),
        content,
        preview: row.get("preview"),
        category: row.get("category"),
        tags: row.get("tags"),
        provenance: NoteProvenance::from_tag(&provenance),
        is_archived: row.get("archived"),
        is_starred: row.get("starred"),
        updated_at: row.get("updated_at_utc"),
    }
}

/// Build the filter clause for a list query.
fn filter_clause(filter: NoteFilter) -> &'static str {
    match filter {
        NoteFilter::All => "",
        NoteFilter::Archived => "AND archived = TRUE",
        NoteFilter::Starred => "AND starred = TRUE",
    }
}

impl PgNoteRepository {
    /// Create a new PgNoteRepository with the given pool and event bus.
    pub fn new(pool: Pool<Postgres>, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    fn validate_create(req: &CreateNoteRequest) -> Result<()> {
        if req.doc_id.trim().is_empty() {
            return Err(Error::Validation("docId is required".to_string()));
        }
        if req.title.trim().is_empty() {
            return Err(Error::Validation("title is required".to_string()));
        }
        if req.owner_id.trim().is_empty() {
            return Err(Error::Validation("owner uid is required".to_string()));
        }
        Ok(())
    }
}

#[async_trait]
impl NoteRepository for PgNoteRepository {
    async fn create(&self, req: CreateNoteRequest) -> Result<Note> {
        Self::validate_create(&req)?;

        let id = Uuid::now_v7();
        let now = Utc::now();
        let preview = req
            .preview
            .unwrap_or_else(|| defaults::DEFAULT_PREVIEW.to_string());
        let content = serde_json::to_value(&req.content)?;

        let row = sqlx::query(&format!(
            "INSERT INTO note (id, doc_id, owner_id, title, content, preview, category, tags, \
             provenance, archived, starred, updated_at_utc)
             VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $9, FALSE, FALSE, $10)
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(id)
        .bind(&req.doc_id)
        .bind(&req.owner_id)
        .bind(&req.title)
        .bind(&content)
        .bind(&preview)
        .bind(&req.category)
        .bind(&req.tags)
        .bind(req.provenance.as_str())
        .bind(now)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("note with docId '{}' already exists", req.doc_id))
            } else {
                Error::Database(e)
            }
        })?;

        let note = map_note_row(row);
        info!(
            subsystem = "db",
            component = "notes",
            op = "create",
            doc_id = %note.doc_id,
            owner_id = %note.owner_id,
            "Note created"
        );
        self.events
            .notify(&DomainEvent::NoteCreated { note: note.clone() });
        Ok(note)
    }

    async fn get_by_doc_id(&self, doc_id: &str) -> Result<Note> {
        let row = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE doc_id = $1"
        ))
        .bind(doc_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(map_note_row)
            .ok_or_else(|| Error::NotFound(format!("note with docId '{}'", doc_id)))
    }

    async fn list_by_owner(&self, owner_id: &str, filter: NoteFilter) -> Result<Vec<Note>> {
        let rows = sqlx::query(&format!(
            "SELECT {NOTE_COLUMNS} FROM note WHERE owner_id = $1 {} \
             ORDER BY updated_at_utc DESC",
            filter_clause(filter)
        ))
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_note_row).collect())
    }

    async fn update(&self, doc_id: &str, req: UpdateNoteRequest) -> Result<Note> {
        if req.title.trim().is_empty() {
            return Err(Error::Validation(
                "title and content are required for update".to_string(),
            ));
        }

        let now = Utc::now();
        let content = serde_json::to_value(&req.content)?;

        // owner_id is never part of the SET list.
        let row = sqlx::query(&format!(
            "UPDATE note
             SET title = $1, content = $2, category = $3, tags = $4,
                 preview = COALESCE($5, preview), updated_at_utc = $6
             WHERE doc_id = $7
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(&req.title)
        .bind(&content)
        .bind(&req.category)
        .bind(&req.tags)
        .bind(&req.preview)
        .bind(now)
        .bind(doc_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = row
            .map(map_note_row)
            .ok_or_else(|| Error::NotFound(format!("note with docId '{}'", doc_id)))?;

        self.events
            .notify(&DomainEvent::NoteUpdated { note: note.clone() });
        Ok(note)
    }

    async fn delete(&self, id: Uuid) -> Result<()> {
        let row = sqlx::query("DELETE FROM note WHERE id = $1 RETURNING doc_id, owner_id")
            .bind(id)
            .fetch_optional(&self.pool)
            .await
            .map_err(Error::Database)?;

        let row = row.ok_or_else(|| Error::NotFound(format!("note {}", id)))?;
        let doc_id: String = row.get("doc_id");
        let owner_id: String = row.get("owner_id");

        info!(
            subsystem = "db",
            component = "notes",
            op = "delete",
            note_id = %id,
            doc_id = %doc_id,
            "Note deleted"
        );
        self.events.notify(&DomainEvent::NoteDeleted {
            note_id: id,
            doc_id,
            owner_id,
        });
        Ok(())
    }

    async fn toggle_archive(&self, id: Uuid) -> Result<Note> {
        // A flip, not a set-to-value: two calls restore the original state.
        let row = sqlx::query(&format!(
            "UPDATE note SET archived = NOT archived, updated_at_utc = $1
             WHERE id = $2
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = row
            .map(map_note_row)
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))?;

        self.events.notify(&DomainEvent::NoteArchived {
            note: note.clone(),
            archived: note.is_archived,
        });
        Ok(note)
    }

    async fn toggle_star(&self, id: Uuid) -> Result<Note> {
        let row = sqlx::query(&format!(
            "UPDATE note SET starred = NOT starred, updated_at_utc = $1
             WHERE id = $2
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(Utc::now())
        .bind(id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = row
            .map(map_note_row)
            .ok_or_else(|| Error::NotFound(format!("note {}", id)))?;

        self.events.notify(&DomainEvent::NoteStarred {
            note: note.clone(),
            starred: note.is_starred,
        });
        Ok(note)
    }

    async fn set_category(
        &self,
        id: Uuid,
        owner_id: &str,
        category: Option<&str>,
    ) -> Result<Note> {
        let owned: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM note WHERE id = $1 AND owner_id = $2)",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        if !owned {
            return Err(Error::NotFound(format!(
                "note {} not found for this owner",
                id
            )));
        }

        let target = category.map(str::trim).filter(|c| !c.is_empty());
        if let Some(name) = target {
            let exists: bool = sqlx::query_scalar(
                "SELECT EXISTS(SELECT 1 FROM category \
                 WHERE owner_id = $1 AND lower(name) = lower($2))",
            )
            .bind(owner_id)
            .bind(name)
            .fetch_one(&self.pool)
            .await
            .map_err(Error::Database)?;
            if !exists {
                return Err(Error::Validation(format!(
                    "category '{}' not found for this owner",
                    name
                )));
            }
        }

        let row = sqlx::query(&format!(
            "UPDATE note SET category = $1, updated_at_utc = $2
             WHERE id = $3
             RETURNING {NOTE_COLUMNS}"
        ))
        .bind(target)
        .bind(Utc::now())
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;

        let note = map_note_row(row);
        self.events
            .notify(&DomainEvent::NoteUpdated { note: note.clone() });
        Ok(note)
    }
}
