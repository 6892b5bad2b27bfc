//! Category repository implementation, including the consistency
//! coordinator for cross-entity cascades.
//!
//! Cascades are two-phase and not wrapped in a transaction: dependents
//! (notes) are mutated first, then the owning category row. A crash in
//! between leaves notes individually consistent and the category one
//! step behind, which is the accepted risk window.

use std::sync::Arc;

use async_trait::async_trait;
use chrono::Utc;
use sqlx::{postgres::PgRow, Pool, Postgres, Row};
use tracing::info;
use uuid::Uuid;

use quill_core::{
    is_unique_violation, Category, CategoryRepository, DomainEvent, Error, EventBus, Result,
};

/// PostgreSQL implementation of CategoryRepository.
pub struct PgCategoryRepository {
    pool: Pool<Postgres>,
    events: Arc<EventBus>,
}

fn map_category_row(row: PgRow) -> Category {
    Category {
        id: row.get("id"),
        owner_id: row.get("owner_id"),
        name: row.get("name"),
        created_at: row.get("created_at_utc"),
    }
}

impl PgCategoryRepository {
    /// Create a new PgCategoryRepository with the given pool and event bus.
    pub fn new(pool: Pool<Postgres>, events: Arc<EventBus>) -> Self {
        Self { pool, events }
    }

    /// Fetch a category owned by the given user, or NotFound.
    async fn fetch_owned(&self, id: Uuid, owner_id: &str) -> Result<Category> {
        let row = sqlx::query(
            "SELECT id, owner_id, name, created_at_utc FROM category \
             WHERE id = $1 AND owner_id = $2",
        )
        .bind(id)
        .bind(owner_id)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?;

        row.map(map_category_row)
            .ok_or_else(|| Error::NotFound(format!("category {} for this owner", id)))
    }

    /// Advisory case-insensitive existence check, excluding `exclude_id`
    /// when renaming. The unique index remains the authoritative
    /// conflict detector.
    async fn name_taken(
        &self,
        owner_id: &str,
        name: &str,
        exclude_id: Option<Uuid>,
    ) -> Result<bool> {
        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM category \
             WHERE owner_id = $1 AND lower(name) = lower($2) AND ($3::uuid IS NULL OR id <> $3))",
        )
        .bind(owner_id)
        .bind(name)
        .bind(exclude_id)
        .fetch_one(&self.pool)
        .await
        .map_err(Error::Database)?;
        Ok(taken)
    }
}

#[async_trait]
impl CategoryRepository for PgCategoryRepository {
    async fn list(&self, owner_id: &str) -> Result<Vec<Category>> {
        let rows = sqlx::query(
            "SELECT id, owner_id, name, created_at_utc FROM category \
             WHERE owner_id = $1 ORDER BY name",
        )
        .bind(owner_id)
        .fetch_all(&self.pool)
        .await
        .map_err(Error::Database)?;

        Ok(rows.into_iter().map(map_category_row).collect())
    }

    async fn create(&self, owner_id: &str, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name is required".to_string()));
        }
        if owner_id.trim().is_empty() {
            return Err(Error::Validation("owner uid is required".to_string()));
        }

        if self.name_taken(owner_id, name, None).await? {
            return Err(Error::Conflict(format!(
                "category '{}' already exists",
                name
            )));
        }

        let row = sqlx::query(
            "INSERT INTO category (id, owner_id, name, created_at_utc)
             VALUES ($1, $2, $3, $4)
             RETURNING id, owner_id, name, created_at_utc",
        )
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(name)
        .bind(Utc::now())
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!("category '{}' already exists", name))
            } else {
                Error::Database(e)
            }
        })?;

        let category = map_category_row(row);
        info!(
            subsystem = "db",
            component = "categories",
            op = "create",
            owner_id = %category.owner_id,
            category = %category.name,
            "Category created"
        );
        self.events.notify(&DomainEvent::CategoryCreated {
            category: category.clone(),
        });
        Ok(category)
    }

    async fn rename(&self, id: Uuid, owner_id: &str, new_name: &str) -> Result<(Category, u64)> {
        let new_name = new_name.trim();
        if new_name.is_empty() {
            return Err(Error::Validation("category name is required".to_string()));
        }

        let existing = self.fetch_owned(id, owner_id).await?;

        if self.name_taken(owner_id, new_name, Some(id)).await? {
            return Err(Error::Conflict(format!(
                "another category named '{}' already exists",
                new_name
            )));
        }

        // Phase one: dependents first. Notes referencing the old name
        // are switched over before the category row changes.
        let notes_updated = sqlx::query(
            "UPDATE note SET category = $1, updated_at_utc = $2 \
             WHERE owner_id = $3 AND category = $4",
        )
        .bind(new_name)
        .bind(Utc::now())
        .bind(owner_id)
        .bind(&existing.name)
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        // Phase two: the category row itself.
        let row = sqlx::query(
            "UPDATE category SET name = $1 WHERE id = $2 \
             RETURNING id, owner_id, name, created_at_utc",
        )
        .bind(new_name)
        .bind(id)
        .fetch_one(&self.pool)
        .await
        .map_err(|e| {
            if is_unique_violation(&e) {
                Error::Conflict(format!(
                    "another category named '{}' already exists ({} notes already renamed)",
                    new_name, notes_updated
                ))
            } else {
                Error::Database(e)
            }
        })?;

        let category = map_category_row(row);
        info!(
            subsystem = "db",
            component = "categories",
            op = "rename",
            owner_id = %category.owner_id,
            category = %category.name,
            cascade_count = notes_updated,
            "Category renamed"
        );
        self.events.notify(&DomainEvent::CategoryRenamed {
            category: category.clone(),
            old_name: existing.name,
            notes_updated,
        });
        Ok((category, notes_updated))
    }

    async fn delete(&self, id: Uuid, owner_id: &str) -> Result<u64> {
        let existing = self.fetch_owned(id, owner_id).await?;

        // Phase one: delete dependent notes first.
        let notes_deleted = sqlx::query("DELETE FROM note WHERE owner_id = $1 AND category = $2")
            .bind(owner_id)
            .bind(&existing.name)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?
            .rows_affected();

        // Phase two: the category record itself.
        sqlx::query("DELETE FROM category WHERE id = $1")
            .bind(id)
            .execute(&self.pool)
            .await
            .map_err(Error::Database)?;

        info!(
            subsystem = "db",
            component = "categories",
            op = "delete",
            owner_id = %owner_id,
            category = %existing.name,
            cascade_count = notes_deleted,
            "Category deleted"
        );
        self.events.notify(&DomainEvent::CategoryDeleted {
            category_id: id,
            owner_id: owner_id.to_string(),
            name: existing.name,
            notes_deleted,
        });
        Ok(notes_deleted)
    }

    async fn ensure_exists(&self, owner_id: &str, name: &str) -> Result<Category> {
        let name = name.trim();
        if name.is_empty() {
            return Err(Error::Validation("category name is required".to_string()));
        }

        // Insert-if-absent against the case-insensitive unique index;
        // a concurrent winner makes this a no-op and we read their row.
        let inserted = sqlx::query(
            "INSERT INTO category (id, owner_id, name, created_at_utc)
             VALUES ($1, $2, $3, $4)
             ON CONFLICT (owner_id, lower(name)) DO NOTHING",
        )
        .bind(Uuid::now_v7())
        .bind(owner_id)
        .bind(name)
        .bind(Utc::now())
        .execute(&self.pool)
        .await
        .map_err(Error::Database)?
        .rows_affected();

        let row = sqlx::query(
            "SELECT id, owner_id, name, created_at_utc FROM category \
             WHERE owner_id = $1 AND lower(name) = lower($2)",
        )
        .bind(owner_id)
        .bind(name)
        .fetch_optional(&self.pool)
        .await
        .map_err(Error::Database)?
        .ok_or_else(|| {
            Error::Internal(format!(
                "category '{}' missing immediately after upsert",
                name
            ))
        })?;

        let category = map_category_row(row);
        if inserted > 0 {
            info!(
                subsystem = "db",
                component = "categories",
                op = "ensure_exists",
                owner_id = %owner_id,
                category = %category.name,
                "Category auto-provisioned"
            );
            self.events.notify(&DomainEvent::CategoryCreated {
                category: category.clone(),
            });
        }
        Ok(category)
    }
}
