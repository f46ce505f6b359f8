//! Image references attached to products. Storage of the files is external.

use chrono::{DateTime, Utc};
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductImageRow {
    pub id: Uuid,
    pub product_id: Uuid,
    pub url: String,
    pub position: i32,
    pub created_at: DateTime<Utc>,
}

/// Appends an image after the product's current last position.
///
/// The product row is locked for the duration of the insert so concurrent
/// appends to the same product are serialized.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails. A position collision
/// surfaces as a unique violation.
pub async fn add_product_image(
    pool: &PgPool,
    product_id: Uuid,
    url: &str,
) -> Result<ProductImageRow, DbError> {
    let mut tx = pool.begin().await?;

    sqlx::query("SELECT id FROM products WHERE id = $1 FOR UPDATE")
        .bind(product_id)
        .execute(&mut *tx)
        .await?;

    let row = sqlx::query_as::<_, ProductImageRow>(
        "INSERT INTO product_images (product_id, url, position) \
         VALUES ($1, $2, \
                 (SELECT COALESCE(MAX(position), 0) + 1 FROM product_images WHERE product_id = $1)) \
         RETURNING id, product_id, url, position, created_at",
    )
    .bind(product_id)
    .bind(url)
    .fetch_one(&mut *tx)
    .await?;

    tx.commit().await?;
    Ok(row)
}

/// Returns a product's images in display order.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_product_images(
    pool: &PgPool,
    product_id: Uuid,
) -> Result<Vec<ProductImageRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductImageRow>(
        "SELECT id, product_id, url, position, created_at \
         FROM product_images \
         WHERE product_id = $1 \
         ORDER BY position ASC, id ASC",
    )
    .bind(product_id)
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Deletes one image of a product. Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_product_image(
    pool: &PgPool,
    product_id: Uuid,
    image_id: Uuid,
) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM product_images WHERE id = $1 AND product_id = $2")
        .bind(image_id)
        .bind(product_id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}
