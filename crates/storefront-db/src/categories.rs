//! Database operations for the `categories` table.
//!
//! Names are unique case-insensitively (`uq_categories_name_lower`); callers
//! map the resulting unique violation to a conflict.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct CategoryRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails (including unique violations).
pub async fn create_category(
    pool: &PgPool,
    name: &str,
    description: &str,
) -> Result<CategoryRow, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "INSERT INTO categories (name, description) VALUES ($1, $2) \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(name)
    .bind(description)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns all categories, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_categories(pool: &PgPool) -> Result<Vec<CategoryRow>, DbError> {
    let rows = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, created_at, updated_at \
         FROM categories \
         ORDER BY created_at DESC, id DESC",
    )
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_category(pool: &PgPool, id: Uuid) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "SELECT id, name, description, created_at, updated_at FROM categories WHERE id = $1",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Sparse update; returns `None` when the category does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails (including unique violations).
pub async fn update_category(
    pool: &PgPool,
    id: Uuid,
    name: Option<&str>,
    description: Option<&str>,
) -> Result<Option<CategoryRow>, DbError> {
    let row = sqlx::query_as::<_, CategoryRow>(
        "UPDATE categories \
         SET name        = COALESCE($2, name), \
             description = COALESCE($3, description), \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING id, name, description, created_at, updated_at",
    )
    .bind(id)
    .bind(name)
    .bind(description)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a category. Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the delete fails, including a foreign key
/// violation while products still reference the category.
pub async fn delete_category(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM categories WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
