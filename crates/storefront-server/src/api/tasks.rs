//! Operator endpoints for runtime cron jobs and on-demand sheet sync.

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    Extension, Json,
};
use serde::{Deserialize, Serialize};

use crate::middleware::RequestId;
use crate::scheduler::{JobAction, JobInfo, JobRegistryError};

use super::{ApiError, ApiResponse, AppState};

#[derive(Debug, Deserialize)]
pub(super) struct AddJobQuery {
    pub name: String,
    pub cron: String,
    pub action: Option<String>,
}

#[derive(Debug, Deserialize)]
pub(super) struct UpdateJobQuery {
    pub cron: String,
    pub action: Option<String>,
}

#[derive(Debug, Serialize)]
pub(super) struct SheetsSyncResult {
    enabled: bool,
    products_synced: usize,
}

fn parse_action(raw: Option<&str>) -> Result<JobAction, JobRegistryError> {
    raw.unwrap_or("log").parse()
}

fn map_registry_error(request_id: &str, error: &JobRegistryError) -> ApiError {
    let code = match error {
        JobRegistryError::AlreadyExists(_) => "conflict",
        JobRegistryError::NotFound(_) => "not_found",
        JobRegistryError::InvalidSchedule { .. } | JobRegistryError::UnknownAction(_) => {
            "validation_error"
        }
        JobRegistryError::Scheduler(_) => {
            tracing::error!(error = %error, "dynamic job scheduler failure");
            "internal_error"
        }
    };
    ApiError::new(request_id, code, error.to_string())
}

pub(super) async fn list_jobs(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Json<ApiResponse<Vec<JobInfo>>> {
    Json(ApiResponse::new(state.jobs.list().await, req_id.0))
}

pub(super) async fn add_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Query(query): Query<AddJobQuery>,
) -> Result<(StatusCode, Json<ApiResponse<JobInfo>>), ApiError> {
    let rid = &req_id.0;
    let name = query.name.trim();
    if name.is_empty() {
        return Err(ApiError::new(rid, "validation_error", "job name must not be empty"));
    }
    let action = parse_action(query.action.as_deref()).map_err(|e| map_registry_error(rid, &e))?;

    let job = state
        .jobs
        .add(name, query.cron.trim(), action)
        .await
        .map_err(|e| map_registry_error(rid, &e))?;

    tracing::info!(job = %job.name, cron = %job.cron, action = %job.action, "dynamic job added");
    Ok((StatusCode::CREATED, Json(ApiResponse::new(job, req_id.0))))
}

pub(super) async fn update_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
    Query(query): Query<UpdateJobQuery>,
) -> Result<Json<ApiResponse<JobInfo>>, ApiError> {
    let rid = &req_id.0;
    let action = parse_action(query.action.as_deref()).map_err(|e| map_registry_error(rid, &e))?;

    let job = state
        .jobs
        .update(&name, query.cron.trim(), action)
        .await
        .map_err(|e| map_registry_error(rid, &e))?;

    tracing::info!(job = %job.name, cron = %job.cron, "dynamic job rescheduled");
    Ok(Json(ApiResponse::new(job, req_id.0)))
}

pub(super) async fn delete_job(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Path(name): Path<String>,
) -> Result<StatusCode, ApiError> {
    state
        .jobs
        .delete(&name)
        .await
        .map_err(|e| map_registry_error(&req_id.0, &e))?;

    tracing::info!(job = %name, "dynamic job deleted");
    Ok(StatusCode::NO_CONTENT)
}

/// Runs a full sheet sync inline and reports how many products were written.
pub(super) async fn run_sheets_sync(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> Result<Json<ApiResponse<SheetsSyncResult>>, ApiError> {
    let enabled = state.sheets.is_enabled();
    let products_synced = state.sheets.try_full_sync().await.map_err(|e| {
        tracing::error!(error = %e, "manual sheets sync failed");
        ApiError::new(&req_id.0, "upstream_error", e.to_string())
    })?;

    Ok(Json(ApiResponse::new(
        SheetsSyncResult {
            enabled,
            products_synced,
        },
        req_id.0,
    )))
}
