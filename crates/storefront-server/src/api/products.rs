//! Product handlers.
//!
//! - `GET    /api/v1/products`      cursor-paginated catalog with filters
//! - `POST   /api/v1/products`      create (owner = caller)
//! - `GET    /api/v1/products/{id}` detail with category, images and ratings
//! - `PATCH  /api/v1/products/{id}` sparse update, owner only
//! - `DELETE /api/v1/products/{id}` owner only
//!
//! Successful writes mirror the product to the sheet in a background task.

use std::sync::Arc;

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use storefront_core::{validation, CatalogQuery, CoreError, Page};
use storefront_db::{DbError, NewProduct, ProductPatch, ProductRow};
use storefront_sheets::SheetSync;
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::{ensure_owner, map_db_error, ApiError, ApiResponse, AppState};

// ---------------------------------------------------------------------------
// Query and bodies
// ---------------------------------------------------------------------------

#[derive(Debug, Deserialize)]
pub(super) struct ListProductsQuery {
    pub cursor: Option<Uuid>,
    pub limit: Option<i64>,
    pub search: Option<String>,
    pub category_id: Option<Uuid>,
    pub min_price: Option<Decimal>,
    pub max_price: Option<Decimal>,
    pub in_stock: Option<bool>,
}

#[derive(Debug, Deserialize)]
pub(super) struct CreateProductRequest {
    pub name: String,
    pub description: String,
    pub price: Decimal,
    pub stock: Option<i32>,
    pub category_id: Uuid,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateProductRequest {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub stock: Option<i32>,
    pub category_id: Option<Uuid>,
}

// ---------------------------------------------------------------------------
// Responses
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
pub(super) struct ProductListItem {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category_id: Uuid,
    category_name: String,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductItem {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category_id: Uuid,
    user_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ProductRow> for ProductItem {
    fn from(row: ProductRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            price: row.price,
            stock: row.stock,
            category_id: row.category_id,
            user_id: row.user_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

#[derive(Debug, Serialize)]
pub(super) struct CategorySummary {
    id: Uuid,
    name: String,
    description: String,
}

#[derive(Debug, Serialize)]
pub(super) struct ImageItem {
    pub id: Uuid,
    pub url: String,
    pub position: i32,
}

#[derive(Debug, Serialize)]
pub(super) struct ProductDetail {
    id: Uuid,
    name: String,
    description: String,
    price: Decimal,
    stock: i32,
    category: CategorySummary,
    user_id: Uuid,
    images: Vec<ImageItem>,
    average_rating: f64,
    reviews_count: i64,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

// ---------------------------------------------------------------------------
// Helpers
// ---------------------------------------------------------------------------

pub(super) fn validation_error(request_id: &str, error: &CoreError) -> ApiError {
    ApiError::new(request_id, "validation_error", error.to_string())
}

/// Unknown category on insert or update surfaces as a foreign key violation.
fn map_write_error(request_id: &str, error: &DbError) -> ApiError {
    if error.is_foreign_key_violation() {
        return ApiError::new(request_id, "validation_error", "category does not exist");
    }
    map_db_error(request_id.to_owned(), error)
}

/// Load a product, returning 404 if it does not exist.
pub(super) async fn resolve_product(
    pool: &sqlx::PgPool,
    id: Uuid,
    request_id: &str,
) -> Result<ProductRow, ApiError> {
    storefront_db::get_product(pool, id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .ok_or_else(|| ApiError::new(request_id, "not_found", format!("product {id} not found")))
}

/// The caller from `x-user-id` must be a known user before it can own rows.
pub(super) async fn ensure_known_user(
    pool: &sqlx::PgPool,
    user_id: Uuid,
    request_id: &str,
) -> Result<(), ApiError> {
    storefront_db::get_user(pool, user_id)
        .await
        .map_err(|e| map_db_error(request_id.to_owned(), &e))?
        .map(|_| ())
        .ok_or_else(|| ApiError::new(request_id, "unauthorized", format!("unknown user {user_id}")))
}

fn spawn_sheet_upsert(sheets: &Arc<SheetSync>, id: Uuid) {
    let sheets = Arc::clone(sheets);
    tokio::spawn(async move { sheets.upsert_product(id).await });
}

fn spawn_sheet_removal(sheets: &Arc<SheetSync>, id: Uuid) {
    let sheets = Arc::clone(sheets);
    tokio::spawn(async move { sheets.remove_product(id).await });
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

pub(super) async fn list_products(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<ListProductsQuery>,
) -> Result<Json<ApiResponse<Page<ProductListItem>>>, ApiError> {
    let mut catalog = CatalogQuery::new(query.limit).with_search(query.search.as_deref());
    catalog.cursor = query.cursor;
    catalog.category_id = query.category_id;
    catalog.min_price = query.min_price;
    catalog.max_price = query.max_price;
    catalog.in_stock = query.in_stock;

    if let Some(message) = catalog.price_range_error() {
        return Err(ApiError::new(&req_id.0, "validation_error", message));
    }

    let page = storefront_db::list_products_page(&state.pool, &catalog)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = Page {
        items: page
            .items
            .into_iter()
            .map(|row| ProductListItem {
                id: row.id,
                name: row.name,
                description: row.description,
                price: row.price,
                stock: row.stock,
                category_id: row.category_id,
                category_name: row.category_name,
                user_id: row.user_id,
                created_at: row.created_at,
                updated_at: row.updated_at,
            })
            .collect(),
        next_cursor: page.next_cursor,
        has_more: page.has_more,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// POST /api/v1/products
pub(super) async fn create_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Json(body): Json<CreateProductRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ProductItem>>), ApiError> {
    let rid = &req_id.0;

    let name = validation::normalize_name("name", &body.name).map_err(|e| validation_error(rid, &e))?;
    let description = body.description.trim();
    if description.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "description is required"));
    }
    let price = validation::validate_price(body.price).map_err(|e| validation_error(rid, &e))?;
    let stock = validation::validate_stock(body.stock.unwrap_or(0))
        .map_err(|e| validation_error(rid, &e))?;
    ensure_known_user(&state.pool, user_id, rid).await?;

    let row = storefront_db::create_product(
        &state.pool,
        NewProduct {
            name: &name,
            description,
            price,
            stock,
            category_id: body.category_id,
            user_id,
        },
    )
    .await
    .map_err(|e| map_write_error(rid, &e))?;

    tracing::info!(product_id = %row.id, user_id = %user_id, "product created");
    spawn_sheet_upsert(&state.sheets, row.id);

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(ProductItem::from(row), req_id.0)),
    ))
}

/// GET /api/v1/products/{id}
pub(super) async fn get_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<ProductDetail>>, ApiError> {
    let rid = &req_id.0;

    let row = storefront_db::get_product_detail(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("product {id} not found")))?;

    let images = storefront_db::list_product_images(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .into_iter()
        .map(|img| ImageItem {
            id: img.id,
            url: img.url,
            position: img.position,
        })
        .collect();

    let data = ProductDetail {
        id: row.id,
        name: row.name,
        description: row.description,
        price: row.price,
        stock: row.stock,
        category: CategorySummary {
            id: row.category_id,
            name: row.category_name,
            description: row.category_description,
        },
        user_id: row.user_id,
        images,
        average_rating: row.average_rating,
        reviews_count: row.reviews_count,
        created_at: row.created_at,
        updated_at: row.updated_at,
    };

    Ok(Json(ApiResponse::new(data, req_id.0)))
}

/// PATCH /api/v1/products/{id}
pub(super) async fn update_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateProductRequest>,
) -> Result<Json<ApiResponse<ProductItem>>, ApiError> {
    let rid = &req_id.0;
    let product = resolve_product(&state.pool, id, rid).await?;
    ensure_owner(rid, product.user_id, user_id)?;

    let mut patch = ProductPatch {
        category_id: body.category_id,
        ..ProductPatch::default()
    };
    if let Some(ref name) = body.name {
        patch.name =
            Some(validation::normalize_name("name", name).map_err(|e| validation_error(rid, &e))?);
    }
    if let Some(ref description) = body.description {
        let description = description.trim();
        if description.is_empty() {
            return Err(ApiError::new(rid, "validation_error", "description must not be empty"));
        }
        patch.description = Some(description.to_owned());
    }
    if let Some(price) = body.price {
        patch.price = Some(validation::validate_price(price).map_err(|e| validation_error(rid, &e))?);
    }
    if let Some(stock) = body.stock {
        patch.stock = Some(validation::validate_stock(stock).map_err(|e| validation_error(rid, &e))?);
    }

    let row = storefront_db::update_product(&state.pool, id, &patch)
        .await
        .map_err(|e| map_write_error(rid, &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("product {id} not found")))?;

    spawn_sheet_upsert(&state.sheets, id);

    Ok(Json(ApiResponse::new(ProductItem::from(row), req_id.0)))
}

/// DELETE /api/v1/products/{id}
pub(super) async fn delete_product(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let product = resolve_product(&state.pool, id, rid).await?;
    ensure_owner(rid, product.user_id, user_id)?;

    let deleted = storefront_db::delete_product(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::new(rid, "not_found", format!("product {id} not found")));
    }

    tracing::info!(product_id = %id, user_id = %user_id, "product deleted");
    spawn_sheet_removal(&state.sheets, id);

    Ok(StatusCode::NO_CONTENT)
}
