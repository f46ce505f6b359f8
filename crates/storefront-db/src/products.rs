//! Database operations for the `products` table.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use sqlx::PgPool;
use uuid::Uuid;

use crate::DbError;

// ---------------------------------------------------------------------------
// Row types
// ---------------------------------------------------------------------------

/// A row from the `products` table.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Uuid,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A product joined with its category and review aggregates.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductDetailRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Uuid,
    pub category_name: String,
    pub category_description: String,
    pub user_id: Uuid,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// `0` when the product has no reviews.
    pub average_rating: f64,
    pub reviews_count: i64,
}

/// A product flattened into the shape mirrored to the spreadsheet.
#[derive(Debug, Clone, sqlx::FromRow)]
pub struct ProductSheetRow {
    pub id: Uuid,
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: i32,
    pub category_name: Option<String>,
    pub owner_name: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Input for [`create_product`].
#[derive(Debug, Clone)]
pub struct NewProduct<'a> {
    pub name: &'a str,
    pub description: &'a str,
    pub price: Decimal,
    pub stock: i32,
    pub category_id: Uuid,
    pub user_id: Uuid,
}

/// Sparse product update; `None` keeps the stored value.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct ProductPatch {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
}

impl ProductPatch {
    #[must_use]
    pub fn is_empty(&self) -> bool {
        self.name.is_none()
            && self.description.is_none()
            && self.price.is_none()
            && self.stock.is_none()
            && self.category_id.is_none()
    }
}

const PRODUCT_COLUMNS: &str =
    "id, name, description, price, stock, category_id, user_id, created_at, updated_at";

// ---------------------------------------------------------------------------
// Queries
// ---------------------------------------------------------------------------

/// Inserts a product and returns the stored row.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the insert fails, including foreign key
/// violations for an unknown category or owner.
pub async fn create_product(pool: &PgPool, product: NewProduct<'_>) -> Result<ProductRow, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "INSERT INTO products (name, description, price, stock, category_id, user_id) \
         VALUES ($1, $2, $3, $4, $5, $6) \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(product.name)
    .bind(product.description)
    .bind(product.price)
    .bind(product.stock)
    .bind(product.category_id)
    .bind(product.user_id)
    .fetch_one(pool)
    .await?;
    Ok(row)
}

/// Returns a product by id, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product(pool: &PgPool, id: Uuid) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "SELECT {PRODUCT_COLUMNS} FROM products WHERE id = $1"
    ))
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Returns a product with its category and review aggregates.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_detail(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ProductDetailRow>, DbError> {
    let row = sqlx::query_as::<_, ProductDetailRow>(
        "SELECT \
             p.id, p.name, p.description, p.price, p.stock, \
             p.category_id, c.name AS category_name, c.description AS category_description, \
             p.user_id, p.created_at, p.updated_at, \
             COALESCE(AVG(r.rating)::FLOAT8, 0) AS average_rating, \
             COUNT(r.id) AS reviews_count \
         FROM products p \
         JOIN categories c ON c.id = p.category_id \
         LEFT JOIN reviews r ON r.product_id = p.id \
         WHERE p.id = $1 \
         GROUP BY p.id, c.id",
    )
    .bind(id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Applies a sparse update and bumps `updated_at`.
///
/// Lookup and write happen in one `UPDATE … RETURNING`, so a missing product
/// is reported as `None` without any write.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn update_product(
    pool: &PgPool,
    id: Uuid,
    patch: &ProductPatch,
) -> Result<Option<ProductRow>, DbError> {
    let row = sqlx::query_as::<_, ProductRow>(&format!(
        "UPDATE products \
         SET name        = COALESCE($2, name), \
             description = COALESCE($3, description), \
             price       = COALESCE($4, price), \
             stock       = COALESCE($5, stock), \
             category_id = COALESCE($6, category_id), \
             updated_at  = NOW() \
         WHERE id = $1 \
         RETURNING {PRODUCT_COLUMNS}"
    ))
    .bind(id)
    .bind(patch.name.as_deref())
    .bind(patch.description.as_deref())
    .bind(patch.price)
    .bind(patch.stock)
    .bind(patch.category_id)
    .fetch_optional(pool)
    .await?;
    Ok(row)
}

/// Deletes a product. Returns `false` when no row matched.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn delete_product(pool: &PgPool, id: Uuid) -> Result<bool, DbError> {
    let result = sqlx::query("DELETE FROM products WHERE id = $1")
        .bind(id)
        .execute(pool)
        .await?;
    Ok(result.rows_affected() > 0)
}

const SHEET_SELECT: &str = "SELECT \
         p.id, p.name, p.description, p.price, p.stock, \
         c.name AS category_name, u.name AS owner_name, \
         p.created_at, p.updated_at \
     FROM products p \
     LEFT JOIN categories c ON c.id = p.category_id \
     LEFT JOIN users u ON u.id = p.user_id";

/// Returns every product with category and owner names, oldest first.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn list_products_for_sheet(pool: &PgPool) -> Result<Vec<ProductSheetRow>, DbError> {
    let rows = sqlx::query_as::<_, ProductSheetRow>(&format!(
        "{SHEET_SELECT} ORDER BY p.created_at ASC, p.id ASC"
    ))
    .fetch_all(pool)
    .await?;
    Ok(rows)
}

/// Returns a single product in sheet shape, or `None` if it does not exist.
///
/// # Errors
///
/// Returns [`DbError::Sqlx`] if the query fails.
pub async fn get_product_for_sheet(
    pool: &PgPool,
    id: Uuid,
) -> Result<Option<ProductSheetRow>, DbError> {
    let row = sqlx::query_as::<_, ProductSheetRow>(&format!("{SHEET_SELECT} WHERE p.id = $1"))
        .bind(id)
        .fetch_optional(pool)
        .await?;
    Ok(row)
}
