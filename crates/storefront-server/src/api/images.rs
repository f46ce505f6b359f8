//! Product image references. Only URLs are stored; uploads happen elsewhere.

use axum::{
    extract::{Path, State},
    http::StatusCode,
    Extension, Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::products::{resolve_product, ImageItem};
use super::{ensure_owner, map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AddImageRequest {
    pub url: String,
}

/// POST /api/v1/products/{id}/images
pub(super) async fn add_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path(id): Path<Uuid>,
    Json(body): Json<AddImageRequest>,
) -> Result<(StatusCode, Json<ApiResponse<ImageItem>>), ApiError> {
    let rid = &req_id.0;
    let product = resolve_product(&state.pool, id, rid).await?;
    ensure_owner(rid, product.user_id, user_id)?;

    let url = reqwest::Url::parse(body.url.trim()).map_err(|_| {
        ApiError::new(
            rid,
            "validation_error",
            format!("'url' must be a valid URL, got '{}'", body.url),
        )
    })?;

    let row = storefront_db::add_product_image(&state.pool, id, url.as_str())
        .await
        .map_err(|e| {
            if e.is_unique_violation() {
                ApiError::new(rid, "conflict", "image position already taken, retry the request")
            } else {
                map_db_error(rid.clone(), &e)
            }
        })?;

    Ok((
        StatusCode::CREATED,
        Json(ApiResponse::new(
            ImageItem {
                id: row.id,
                url: row.url,
                position: row.position,
            },
            req_id.0,
        )),
    ))
}

/// DELETE /api/v1/products/{id}/images/{image_id}
pub(super) async fn delete_image(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
    Path((id, image_id)): Path<(Uuid, Uuid)>,
) -> Result<StatusCode, ApiError> {
    let rid = &req_id.0;
    let product = resolve_product(&state.pool, id, rid).await?;
    ensure_owner(rid, product.user_id, user_id)?;

    let deleted = storefront_db::delete_product_image(&state.pool, id, image_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?;
    if !deleted {
        return Err(ApiError::new(
            rid,
            "not_found",
            format!("image {image_id} not found"),
        ));
    }
    Ok(StatusCode::NO_CONTENT)
}
