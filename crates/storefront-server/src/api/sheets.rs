//! `POST /google-sheets/update`, the sheet script's edit and delete webhook.
//!
//! The shared secret is checked by middleware before the body is parsed.

use axum::{extract::State, Extension, Json};
use serde::Serialize;
use storefront_sheets::{InboundUpdate, SyncError};

use crate::middleware::RequestId;

use super::{ApiError, AppState};

#[derive(Debug, Serialize)]
pub(super) struct WebhookAck {
    success: bool,
    message: String,
}

fn map_sync_error(request_id: &str, error: SyncError) -> ApiError {
    match error {
        SyncError::WrongSheet(_) | SyncError::Validation(_) => {
            ApiError::new(request_id, "validation_error", error.to_string())
        }
        SyncError::NotFound(_) => ApiError::new(request_id, "not_found", error.to_string()),
        SyncError::Sheets(e) => {
            tracing::error!(error = %e, "sheet webhook: Sheets API call failed");
            ApiError::new(request_id, "upstream_error", "Google Sheets request failed")
        }
        SyncError::Store(e) => {
            tracing::error!(error = %e, "sheet webhook: database write failed");
            ApiError::new(request_id, "internal_error", "database query failed")
        }
    }
}

pub(super) async fn handle_sheet_update(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
    Json(update): Json<InboundUpdate>,
) -> Result<Json<WebhookAck>, ApiError> {
    let outcome = state
        .sheets
        .apply_inbound(&update)
        .await
        .map_err(|e| map_sync_error(&req_id.0, e))?;

    tracing::info!(
        request_id = %req_id.0,
        sheet = %update.sheet_name,
        action = %update.action,
        outcome = %outcome,
        "sheet webhook processed"
    );

    Ok(Json(WebhookAck {
        success: true,
        message: format!("Successfully processed update for {}", update.sheet_name),
    }))
}
