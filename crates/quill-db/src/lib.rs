//! # quill-db
//!
//! PostgreSQL storage layer for quill.
//!
//! This crate provides:
//! - Connection pool management with an explicit open/close lifecycle
//! - Repository implementations for notes and categories
//! - The consistency coordinator for category rename/delete cascades
//!
//! ## Example
//!
//! ```rust,ignore
//! use quill_db::Database;
//! use quill_core::{CreateNoteRequest, NoteRepository};
//!
//! #[tokio::main]
//! async fn main() -> Result<(), Box<dyn std::error::Error>> {
//!     let db = Database::connect("postgres://localhost/quill").await?;
//!
//!     let note = db
//!         .notes
//!         .create(CreateNoteRequest::text("n1", "alice", "Hello", vec![]))
//!         .await?;
//!
//!     println!("Created note: {}", note.doc_id);
//!     db.close().await;
//!     Ok(())
//! }
//! ```

pub mod categories;
pub mod notes;
pub mod pool;

// Test fixtures for integration tests.
// Always compiled so integration tests (in tests/) can use TestDatabase.
pub mod test_fixtures;

use std::sync::Arc;

// Re-export core types
pub use quill_core::*;

pub use categories::PgCategoryRepository;
pub use notes::PgNoteRepository;
pub use pool::{create_pool, create_pool_with_config, log_pool_metrics, PoolConfig};

/// Combined database context with all repositories and the shared
/// event bus.
pub struct Database {
    /// The underlying connection pool.
    pub pool: sqlx::Pool<sqlx::Postgres>,
    /// Note repository for CRUD and flag operations.
    pub notes: PgNoteRepository,
    /// Category repository, including cascade coordination.
    pub categories: PgCategoryRepository,
    /// Domain-event bus shared by both repositories.
    pub events: Arc<EventBus>,
}

impl Database {
    /// Create a new Database from a connection pool, with the default
    /// log observer subscribed.
    pub fn new(pool: sqlx::Pool<sqlx::Postgres>) -> Self {
        Self::with_event_bus(pool, Arc::new(EventBus::with_defaults()))
    }

    /// Create a Database around an externally configured event bus.
    pub fn with_event_bus(pool: sqlx::Pool<sqlx::Postgres>, events: Arc<EventBus>) -> Self {
        Self {
            notes: PgNoteRepository::new(pool.clone(), events.clone()),
            categories: PgCategoryRepository::new(pool.clone(), events.clone()),
            events,
            pool,
        }
    }

    /// Create a new Database by connecting to the given URL.
    pub async fn connect(url: &str) -> Result<Self> {
        let pool = create_pool(url).await?;
        Ok(Self::new(pool))
    }

    /// Connect with custom pool configuration.
    pub async fn connect_with_config(url: &str, config: PoolConfig) -> Result<Self> {
        let pool = create_pool_with_config(url, config).await?;
        Ok(Self::new(pool))
    }

    /// Close the connection pool. Part of the explicit pool lifecycle;
    /// idempotent.
    pub async fn close(&self) {
        self.pool.close().await;
    }

    /// Get the underlying connection pool.
    pub fn pool(&self) -> &sqlx::Pool<sqlx::Postgres> {
        &self.pool
    }

    /// Run pending migrations.
    #[cfg(feature = "migrations")]
    pub async fn migrate(&self) -> Result<()> {
        sqlx::migrate!("../../migrations")
            .run(&self.pool)
            .await
            .map_err(|e| Error::Database(sqlx::Error::Migrate(Box::new(e))))?;
        Ok(())
    }
}

impl Clone for Database {
    fn clone(&self) -> Self {
        Self {
            pool: self.pool.clone(),
            notes: PgNoteRepository::new(self.pool.clone(), self.events.clone()),
            categories: PgCategoryRepository::new(self.pool.clone(), self.events.clone()),
            events: self.events.clone(),
        }
    }
}
