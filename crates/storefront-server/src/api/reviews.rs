//! Product reviews. A caller holds at most one review per product;
//! posting again replaces it.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use storefront_core::validation;
use storefront_db::ReviewRow;
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::products::{ensure_known_user, resolve_product, validation_error};
use super::{ensure_owner, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct ReviewRequest {
    pub rating: i16,
    pub comment: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct ReviewItem {
    id: Uuid,
    rating: i16,
    comment: Option<String>,
    user_id: Uuid,
    product_id: Uuid,
    created_at: DateTime<Utc>,
    updated_at: DateTime<Utc>,
}

impl From<ReviewRow> for ReviewItem {
    fn from(row: ReviewRow) -> Self {
        Self {
            id: row.id,
            rating: row.rating,
            comment: row.comment,
            user_id: row.user_id,
            product_id: row.product_id,
            created_at: row.created_at,
            updated_at: row.updated_at,
        }
    }
}

pub(super) async fn upsert_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path(product_id): Path<Uuid>,
    Json(body): Json<ReviewRequest>,
) -> Result<Json<ApiResponse<ReviewItem>>, ApiError> {
    let rid = &req_id.0;
    let rating = validation::validate_rating(body.rating).map_err(|e| validation_error(rid, &e))?;
    resolve_product(&state.pool, product_id, rid).await?;
    ensure_known_user(&state.pool, user_id, rid).await?;

    let comment = body
        .comment
        .as_deref()
        .map(str::trim)
        .filter(|c| !c.is_empty());

    let row = storefront_db::upsert_review(&state.pool, user_id, product_id, rating, comment)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    Ok(Json(ApiResponse::new(ReviewItem::from(row), req_id.0)))
}

pub(super) async fn list_reviews(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(product_id): Path<Uuid>,
) -> Result<Json<ApiResponse<Vec<ReviewItem>>>, ApiError> {
    let rid = &req_id.0;
    resolve_product(&state.pool, product_id, rid).await?;

    let rows = storefront_db::list_reviews(&state.pool, product_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;

    let data = rows.into_iter().map(ReviewItem::from).collect();
    Ok(Json(ApiResponse::new(data, req_id.0)))
}

pub(super) async fn delete_review(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path((product_id, review_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let review = storefront_db::get_review(&state.pool, product_id, review_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "not_found", format!("review {review_id} not found")))?;
    ensure_owner(rid, review.user_id, user_id)?;

    storefront_db::delete_review(&state.pool, review_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    Ok(StatusCode::NO_CONTENT)
}
