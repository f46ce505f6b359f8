//! Category CRUD. Names are unique case-insensitively.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::validation;
use storefront_db::{CategoryRow, DbError};
use uuid::Uuid;

use crate::middleware::RequestId;

use super::products::validation_error;
use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct CreateCategoryRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateCategoryRequest {
    pub name: Option<String>,
    pub description: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct CategoryItem {
    id: Uuid,
    name: String,
    description: String,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<CategoryRow> for CategoryItem {
    fn from(row: CategoryRow) -> Self {
        Self {
            id: row.id,
            name: row.name,
            description: row.description,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

fn map_unique_violation(req_id: &str, e: &DbError) -> ApiError {
    if e.is_unique_violation() {
        return ApiError::new(req_id, "conflict", "a category with that name already exists");
    }
    map_db_error(req_id.to_owned(), e)
}

fn not_found(req_id: &str, id: Uuid) -> ApiError {
    ApiError::new(req_id, "not_found", format!("category {id} not found"))
}

pub(super) async fn list_categories(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<Vec<CategoryItem>>>, ApiError> {
    let rows = storefront_db::list_categories(&state.pool)
        .await
        .map_err(|e| map_db_error(req_id.0.clone(), &e))?;

    let data = rows.into_iter().map(CategoryItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn create_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(body): Json<CreateCategoryRequest>,
) -> Result<(StatusCode, Json<ApiResponse<CategoryItem>>), ApiError> {
    let rid = &req_id.0;
    let name = validation::normalize_name("name", &body.name).map_err(|e| validation_error(rid, &e))?;

    let row = storefront_db::create_category(&state.pool, &name, body.description.trim())
        .await
        .map_err(|e| map_unique_violation(rid, &e))?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(CategoryItem::from(row), req_id.0)),
    ))
}

pub(super) async fn get_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let rid = &req_id.0;
    let row = storefront_db::get_category(&state.pool, id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| not_found(rid, id))?;

    Ok(Json(ApiResponse::new(CategoryItem::from(row), req_id.0)))
}

pub(super) async fn update_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
    Json(body): Json<UpdateCategoryRequest>,
) -> Result<Json<ApiResponse<CategoryItem>>, ApiError> {
    let rid = &req_id.0;
    let name = body
        .name
        .as_deref()
        .map(|n| validation::normalize_name("name", n))
        .transpose()
        .map_err(|e| validation_error(rid, &e))?;

    let row = storefront_db::update_category(
        &state.pool,
        id,
        name.as_deref(),
        body.description.as_deref().map(str::trim),
    )
    .await
    .map_err(|e| map_unique_violation(rid, &e))?
    .ok_or_else(|| not_found(rid, id))?;

    Ok(Json(ApiResponse::new(CategoryItem::from(row), req_id.0)))
}

/// Deleting a category that products still reference is a conflict.
pub(super) async fn delete_category(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(id): Path<Uuid>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let deleted = storefront_db::delete_category(&state.pool, id)
        .await
        .map_err(|e| {
            if e.is_foreign_key_violation() {
                ApiError::new(rid, "conflict", "category is still referenced by products")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    if !deleted {
        return Err(not_found(rid, id));
    }
    Ok(StatusCode::NO_CONTENT)
}
