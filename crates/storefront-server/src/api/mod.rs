mod categories;
mod images;
mod products;
mod reviews;
mod sheets;
mod tasks;
mod users;

use std::sync::Arc;
use std::time::Duration;

use axum::{
    extract::State,
    http::{header, HeaderName, Method, StatusCode},
    response::IntoResponse,
    routing::{delete, get, post},
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::Serialize;
use sqlx::PgPool;
use storefront_sheets::SheetSync;
use tower::ServiceBuilder;
use tower_http::cors::CorsLayer;
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, require_sheet_secret, AuthState,
    RateLimitState, RequestId, SheetSecret,
};
use crate::scheduler::JobRegistry;

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
    pub sheets: Arc<SheetSync>,
    pub jobs: Arc<dyn JobRegistry>,
}

#[derive(Debug, Serialize)]
pub struct ApiResponse<T: Serialize> {
    pub data: T,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ResponseMeta {
    pub request_id: String,
    pub timestamp: DateTime<Utc>,
}

#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: ErrorBody,
    pub meta: ResponseMeta,
}

#[derive(Debug, Serialize)]
pub struct ErrorBody {
    pub code: String,
    pub message: String,
}

#[derive(Debug, Serialize, PartialEq, Eq)]
struct HealthData {
    status: &'static str,
    database: &'static str,
    sheets: &'static str,
}

impl ResponseMeta {
    pub(super) fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
}

impl<T: Serialize> ApiResponse<T> {
    pub(super) fn new(data: T, request_id: String) -> Self {
        Self {
            data,
            meta: ResponseMeta::new(request_id),
        }
    }
}

impl ApiError {
    pub fn new(
        request_id: impl Into<String>,
        code: impl Into<String>,
        message: impl Into<String>,
    ) -> Self {
        Self {
            error: ErrorBody {
                code: code.into(),
                message: message.into(),
            },
            meta: ResponseMeta::new(request_id.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        let status = match self.error.code.as_str() {
            "not_found" => StatusCode::NOT_FOUND,
            "unauthorized" => StatusCode::UNAUTHORIZED,
            "forbidden" => StatusCode::FORBIDDEN,
            "bad_request" | "validation_error" => StatusCode::BAD_REQUEST,
            "conflict" => StatusCode::CONFLICT,
            "rate_limited" => StatusCode::TOO_MANY_REQUESTS,
            "upstream_error" => StatusCode::BAD_GATEWAY,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

pub(super) fn map_db_error(request_id: String, error: &storefront_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

/// Fails with `forbidden` unless `caller` owns the resource.
pub(super) fn ensure_owner(request_id: &str, owner: Uuid, caller: Uuid) -> Result<(), ApiError> {
    if owner == caller {
        Ok(())
    } else {
        Err(ApiError::new(
            request_id,
            "forbidden",
            "only the owner may modify this resource",
        ))
    }
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([
            Method::GET,
            Method::POST,
            Method::PUT,
            Method::PATCH,
            Method::DELETE,
        ])
        .allow_headers([
            header::CONTENT_TYPE,
            header::AUTHORIZATION,
            HeaderName::from_static("x-request-id"),
            HeaderName::from_static(crate::middleware::USER_ID_HEADER),
            HeaderName::from_static(crate::middleware::SHEET_SECRET_HEADER),
        ])
}

fn protected_router(auth: AuthState, rate_limit: RateLimitState) -> Router<AppState> {
    Router::new()
        .route(
            "/api/v1/products",
            get(products::list_products).post(products::create_product),
        )
        .route(
            "/api/v1/products/{id}",
            get(products::get_product)
                .patch(products::update_product)
                .delete(products::delete_product),
        )
        .route("/api/v1/products/{id}/images", post(images::add_image))
        .route(
            "/api/v1/products/{id}/images/{image_id}",
            delete(images::delete_image),
        )
        .route(
            "/api/v1/products/{id}/reviews",
            get(reviews::list_reviews).post(reviews::upsert_review),
        )
        .route(
            "/api/v1/products/{id}/reviews/{review_id}",
            delete(reviews::delete_review),
        )
        .route(
            "/api/v1/categories",
            get(categories::list_categories).post(categories::create_category),
        )
        .route(
            "/api/v1/categories/{id}",
            get(categories::get_category)
                .patch(categories::update_category)
                .delete(categories::delete_category),
        )
        .route(
            "/api/v1/tasks/dynamic-jobs",
            get(tasks::list_jobs).post(tasks::add_job),
        )
        .route(
            "/api/v1/tasks/dynamic-jobs/{name}",
            post(tasks::update_job).delete(tasks::delete_job),
        )
        .route("/api/v1/tasks/sheets-sync", post(tasks::run_sheets_sync))
        .route("/api/v1/users/profile", get(users::get_profile))
        .layer(
            ServiceBuilder::new()
                .layer(axum::middleware::from_fn_with_state(
                    rate_limit,
                    enforce_rate_limit,
                ))
                .layer(axum::middleware::from_fn_with_state(
                    auth,
                    require_bearer_auth,
                )),
        )
}

/// The sheet's script authenticates with the shared secret, not a bearer key.
fn webhook_router(secret: SheetSecret) -> Router<AppState> {
    Router::new()
        .route("/google-sheets/update", post(sheets::handle_sheet_update))
        .layer(axum::middleware::from_fn_with_state(
            secret,
            require_sheet_secret,
        ))
}

pub fn build_app(
    state: AppState,
    auth: AuthState,
    rate_limit: RateLimitState,
    sheet_secret: SheetSecret,
) -> Router {
    let public_routes = Router::new().route("/api/v1/health", get(health));

    Router::new()
        .merge(public_routes)
        .merge(webhook_router(sheet_secret))
        .merge(protected_router(auth, rate_limit))
        .layer(
            ServiceBuilder::new()
                .layer(build_cors())
                .layer(axum::middleware::from_fn(request_id)),
        )
        .with_state(state)
}

async fn health(
    State(state): State<AppState>,
    Extension(req_id): Extension<RequestId>,
) -> impl IntoResponse {
    let meta = ResponseMeta::new(req_id.0);
    let sheets = if state.sheets.is_enabled() {
        "enabled"
    } else {
        "disabled"
    };

    match storefront_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(ApiResponse {
                data: HealthData {
                    status: "ok",
                    database: "ok",
                    sheets,
                },
                meta,
            }),
        ),
        Err(e) => {
            tracing::warn!(error = %e, "health check: database unavailable");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(ApiResponse {
                    data: HealthData {
                        status: "degraded",
                        database: "unavailable",
                        sheets,
                    },
                    meta,
                }),
            )
        }
    }
}

pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

#[cfg(test)]
#[path = "tests.rs"]
mod tests;
