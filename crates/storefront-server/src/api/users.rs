//! The caller's own account.

use axum::{extract::State, Extension, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;
use storefront_db::UserRow;
use uuid::Uuid;

use crate::middleware::{CurrentUser, RequestId};

use super::{map_db_error, ApiError, ApiResponse, AppState};

#[derive(Debug, Serialize)]
pub(super) struct ProfileItem {
    id: Uuid,
    email: String,
    name: String,
    created_at: DateTime<Utc>,
}

impl From<UserRow> for ProfileItem {
    fn from(row: UserRow) -> Self {
        Self {
            id: row.id,
            email: row.email,
            name: row.name,
            created_at: row.created_at,
        }
    }
}

pub(super) async fn get_profile(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    CurrentUser(user_id): CurrentUser,
) -> Result<Json<ApiResponse<ProfileItem>>, ApiError> {
    let rid = &req_id.0;
    let user = storefront_db::get_user(&state.pool, user_id)
        .await
        .map_err(|e| map_db_error(rid.clone(), &e))?
        .ok_or_else(|| ApiError::new(rid, "unauthorized", format!("unknown user {user_id}")))?;

    Ok(Json(ApiResponse::new(ProfileItem::from(user), req_id.0)))
}
