//! Cursor-paginated product listing.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use storefront_core::{CatalogQuery, Page};
use uuid::Uuid;

use crate::DbError;

/// Product card returned by catalog listings.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductListRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Uuid,
    pub category_name: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Returns one page of products matching `query`, ordered by id.
///
/// Every filter is optional and the present ones are AND-ed together. One
/// row beyond `page_size` is fetched so `has_more` is exact.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_page(
    pool: &PgPool,
    query: &CatalogQuery,
) -> Result<Page<ProductListRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductListRow>(
        "SELECT \
             p.id, p.name, p.description, p.price, p.stock, \
             p.category_id, c.name AS category_name, p.user_id, \
             p.created_at, p.updated_at \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         WHERE ($1::UUID IS NULL OR p.id > $1) \
           AND ($2::TEXT IS NULL OR p.name ILIKE $2) \
           AND ($3::UUID IS NULL OR p.category_id = $3) \
           AND ($4::NUMERIC IS NULL OR p.price >= $4) \
           AND ($5::NUMERIC IS NULL OR p.price <= $5) \
           AND ($6::BOOL IS NULL OR (p.stock > 0) = $6) \
         ORDER BY p.id ASC \
         LIMIT $7",
    )
    .bind(query.cursor)
    .bind(query.name_pattern())
    .bind(query.category_id)
    .bind(query.min_price)
    .bind(query.max_price)
    .bind(query.in_stock)
    .bind(query.page_size + 1)
    .fetch_all(pool)
    .await?;

    Ok(Page::from_lookahead(rows, query.page_size, |row| row.id))
}
