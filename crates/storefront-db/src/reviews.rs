//! Database operations for the `reviews` table.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ReviewRow {
    pub id: Uuid,
    pub rating: i16,
    pub comment: Option<String>,
    pub user_id: Uuid,
    pub product_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Creates the reviewer's review for a product, or replaces the one they
/// already have. A reviewer holds at most one review per product.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn upsert_review(
    pool: &PgPool,
    user_id: Uuid,
    product_id: Uuid,
    rating: i16,
    comment: Option<&str>,
) -> Result<ReviewRow, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "INSERT INTO reviews (rating, comment, user_id, product_id) \
         VALUES ($1, $2, $3, $4) \
         ON CONFLICT (user_id, product_id) DO UPDATE \
         SET rating = EXCLUDED.rating, \
             comment = EXCLUDED.comment, \
             updated_at = NOW() \
         RETURNING id, rating, comment, user_id, product_id, created_at, updated_at",
    )
    .bind(rating)
    .bind(comment)
    .bind(user_id)
    .bind(product_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a product's reviews, newest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_reviews(pool: &PgPool, product_id: Uuid) -> Result<Vec<ReviewRow>, DbError> {
    let rows = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, rating, comment, user_id, product_id, created_at, updated_at \
         FROM reviews \
         WHERE product_id = $1 \
         ORDER BY created_at DESC, id DESC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_review(
    pool: &PgPool,
    product_id: Uuid,
    review_id: Uuid,
) -> Result<Option<ReviewRow>, DbError> {
    let row = sqlx::query_as::<_, ReviewRow>(
        "SELECT id, rating, comment, user_id, product_id, created_at, updated_at \
         FROM reviews \
         WHERE id = $1 AND product_id = $2",
    )
    .bind(review_id)
    .bind(product_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a review. Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_review(pool: &PgPool, review_id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM reviews WHERE id = $1")
        .bind(review_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
