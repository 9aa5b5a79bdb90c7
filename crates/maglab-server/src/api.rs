//! Read-only HTTP API: health plus monitor/lead/run listings.
//!
//! The write path never goes through HTTP — all mutation happens in the
//! scheduled scan and push jobs.

use std::time::Duration;

use axum::{
    extract::{Query, State},
    http::{header, Method, StatusCode},
    response::IntoResponse,
    routing::get,
    Extension, Json, Router,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::PgPool;
use tower::ServiceBuilder;
use tower_http::{cors::CorsLayer, trace::TraceLayer};
use uuid::Uuid;

use crate::middleware::{
    enforce_rate_limit, request_id, require_bearer_auth, AuthState, RateLimitState, RequestId,
};

#[derive(Clone)]
pub struct AppState {
    pub pool: PgPool,
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

impl ResponseMeta {
    fn new(request_id: String) -> Self {
        Self {
            request_id,
            timestamp: Utc::now(),
        }
    }
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

impl ApiError {
    fn new(
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
            "bad_request" => StatusCode::BAD_REQUEST,
            _ => StatusCode::INTERNAL_SERVER_ERROR,
        };
        (status, Json(self)).into_response()
    }
}

fn map_db_error(request_id: String, error: &maglab_db::DbError) -> ApiError {
    tracing::error!(error = %error, "database query failed");
    ApiError::new(request_id, "internal_error", "database query failed")
}

// ---------------------------------------------------------------------------
// DTOs
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct MonitorDto {
    id: Uuid,
    owner_id: Uuid,
    kind: String,
    target: String,
    cadence_mins: i32,
    is_active: bool,
    last_run_at: Option<DateTime<Utc>>,
}

impl From<maglab_db::SignalMonitorRow> for MonitorDto {
    fn from(row: maglab_db::SignalMonitorRow) -> Self {
        Self {
            id: row.public_id,
            owner_id: row.owner_id,
            kind: row.kind,
            target: row.target,
            cadence_mins: row.cadence_mins,
            is_active: row.is_active,
            last_run_at: row.last_run_at,
        }
    }
}

#[derive(Debug, Serialize)]
struct LeadDto {
    id: Uuid,
    owner_id: Uuid,
    profile_url: String,
    full_name: Option<String>,
    job_title: Option<String>,
    company: Option<String>,
    icp_score: i16,
    icp_match: bool,
    first_seen_at: DateTime<Utc>,
    last_seen_at: DateTime<Utc>,
    pushed_to_outreach: bool,
}

impl From<maglab_db::SignalLeadRow> for LeadDto {
    fn from(row: maglab_db::SignalLeadRow) -> Self {
        Self {
            id: row.public_id,
            owner_id: row.owner_id,
            profile_url: row.profile_url,
            full_name: row.full_name,
            job_title: row.job_title,
            company: row.company,
            icp_score: row.icp_score,
            icp_match: row.icp_match,
            first_seen_at: row.first_seen_at,
            last_seen_at: row.last_seen_at,
            pushed_to_outreach: row.pushed_to_outreach,
        }
    }
}

#[derive(Debug, Serialize)]
struct RunDto {
    id: Uuid,
    run_type: String,
    trigger_source: String,
    status: String,
    started_at: Option<DateTime<Utc>>,
    completed_at: Option<DateTime<Utc>>,
    records_processed: i32,
    error_message: Option<String>,
}

impl From<maglab_db::ScanRunRow> for RunDto {
    fn from(row: maglab_db::ScanRunRow) -> Self {
        Self {
            id: row.public_id,
            run_type: row.run_type,
            trigger_source: row.trigger_source,
            status: row.status,
            started_at: row.started_at,
            completed_at: row.completed_at,
            records_processed: row.records_processed,
            error_message: row.error_message,
        }
    }
}

// ---------------------------------------------------------------------------
// Router
// ---------------------------------------------------------------------------

#[must_use]
pub fn default_rate_limit_state() -> RateLimitState {
    RateLimitState::new(120, Duration::from_secs(60))
}

pub fn build_app(state: AppState, auth: AuthState, rate_limit: RateLimitState) -> Router {
    let protected = Router::new()
        .route("/monitors", get(list_monitors))
        .route("/leads", get(list_leads))
        .route("/runs", get(list_runs))
        .layer(axum::middleware::from_fn_with_state(
            auth,
            require_bearer_auth,
        ))
        .layer(axum::middleware::from_fn_with_state(
            rate_limit,
            enforce_rate_limit,
        ));

    Router::new()
        .route("/health", get(health))
        .nest("/api", protected)
        .layer(
            ServiceBuilder::new()
                .layer(TraceLayer::new_for_http())
                .layer(build_cors()),
        )
        .layer(axum::middleware::from_fn(request_id))
        .with_state(state)
}

fn build_cors() -> CorsLayer {
    CorsLayer::new()
        .allow_origin(tower_http::cors::Any)
        .allow_methods([Method::GET])
        .allow_headers([header::CONTENT_TYPE, header::AUTHORIZATION])
}

// ---------------------------------------------------------------------------
// Handlers
// ---------------------------------------------------------------------------

#[derive(Debug, Serialize)]
struct HealthData {
    status: &'static str,
    database: &'static str,
}

async fn health(State(state): State<AppState>) -> impl IntoResponse {
    match maglab_db::health_check(&state.pool).await {
        Ok(()) => (
            StatusCode::OK,
            Json(HealthData {
                status: "ok",
                database: "reachable",
            }),
        ),
        Err(e) => {
            tracing::error!(error = %e, "health check failed");
            (
                StatusCode::SERVICE_UNAVAILABLE,
                Json(HealthData {
                    status: "degraded",
                    database: "unreachable",
                }),
            )
        }
    }
}

#[derive(Debug, Deserialize)]
struct MonitorsParams {
    kind: Option<String>,
    owner_id: Option<Uuid>,
}

async fn list_monitors(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<MonitorsParams>,
) -> Result<Json<ApiResponse<Vec<MonitorDto>>>, ApiError> {
    let kinds: Vec<&str> = match params.kind.as_deref() {
        Some(kind) => {
            let Some(parsed) = maglab_core::MonitorKind::parse(kind) else {
                return Err(ApiError::new(
                    request_id,
                    "bad_request",
                    format!("unknown monitor kind '{kind}'"),
                ));
            };
            vec![parsed.as_str()]
        }
        None => vec!["keyword", "company", "profile"],
    };

    let mut monitors = Vec::new();
    for kind in kinds {
        let rows = maglab_db::list_active_monitors(&state.pool, kind, params.owner_id)
            .await
            .map_err(|e| map_db_error(request_id.clone(), &e))?;
        monitors.extend(rows.into_iter().map(MonitorDto::from));
    }

    Ok(Json(ApiResponse {
        data: monitors,
        meta: ResponseMeta::new(request_id),
    }))
}

#[derive(Debug, Deserialize)]
struct LeadsParams {
    owner_id: Option<Uuid>,
    matched: Option<bool>,
    limit: Option<i64>,
}

async fn list_leads(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<LeadsParams>,
) -> Result<Json<ApiResponse<Vec<LeadDto>>>, ApiError> {
    let query = maglab_db::LeadQuery {
        owner_id: params.owner_id,
        matched: params.matched,
        limit: params.limit.unwrap_or(100).clamp(1, 500),
    };

    let rows = maglab_db::list_leads(&state.pool, query)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(LeadDto::from).collect(),
        meta: ResponseMeta::new(request_id),
    }))
}

#[derive(Debug, Deserialize)]
struct RunsParams {
    limit: Option<i64>,
}

async fn list_runs(
    State(state): State<AppState>,
    Extension(RequestId(request_id)): Extension<RequestId>,
    Query(params): Query<RunsParams>,
) -> Result<Json<ApiResponse<Vec<RunDto>>>, ApiError> {
    let limit = params.limit.unwrap_or(50).clamp(1, 200);

    let rows = maglab_db::list_scan_runs(&state.pool, limit)
        .await
        .map_err(|e| map_db_error(request_id.clone(), &e))?;

    Ok(Json(ApiResponse {
        data: rows.into_iter().map(RunDto::from).collect(),
        meta: ResponseMeta::new(request_id),
    }))
}
