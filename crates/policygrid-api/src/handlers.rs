//! REST API handlers.
//!
//! Writes go through the binder so the store and the scheduler stay in
//! step; reads go straight to the store.

use axum::Json;
use axum::body::Bytes;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use axum::response::IntoResponse;
use serde::Serialize;
use tracing::debug;

use policygrid_binding::{BindOutcome, UnbindOutcome};
use policygrid_core::PolicyDocument;

use crate::ApiState;

/// Response wrapper for consistent API format.
#[derive(Serialize)]
struct ApiResponse<T: Serialize> {
    success: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    data: Option<T>,
    #[serde(skip_serializing_if = "Option::is_none")]
    error: Option<String>,
}

impl<T: Serialize> ApiResponse<T> {
    fn ok(data: T) -> Json<Self> {
        Json(Self {
            success: true,
            data: Some(data),
            error: None,
        })
    }
}

fn error_response(msg: &str, status: StatusCode) -> impl IntoResponse {
    (
        status,
        Json(ApiResponse::<()> {
            success: false,
            data: None,
            error: Some(msg.to_string()),
        }),
    )
}

/// Body of a committed bind.
#[derive(Debug, Serialize)]
pub struct BindResult {
    pub app_id: String,
    pub policy_guid: String,
    pub replaced: bool,
}

/// Body of a committed unbind.
#[derive(Debug, Serialize)]
pub struct UnbindResult {
    pub app_id: String,
    pub had_policy: bool,
}

// ── Binding ────────────────────────────────────────────────────

/// PUT /v1/apps/:app_id/policy
pub async fn bind_policy(
    State(state): State<ApiState>,
    Path(app_id): Path<String>,
    body: Bytes,
) -> impl IntoResponse {
    // Decoded by hand so malformed JSON gets the envelope instead of axum's
    // plain-text rejection.
    let policy: PolicyDocument = match serde_json::from_slice(&body) {
        Ok(policy) => policy,
        Err(e) => {
            debug!(%app_id, error = %e, "malformed policy document");
            return error_response(
                &format!("malformed policy document: {e}"),
                StatusCode::BAD_REQUEST,
            )
            .into_response();
        }
    };

    let outcome = state.binder.bind(&app_id, policy).await;
    debug!(%app_id, outcome = outcome.label(), "bind request finished");
    match outcome {
        BindOutcome::Committed {
            policy_guid,
            replaced,
        } => {
            let status = if replaced {
                StatusCode::OK
            } else {
                StatusCode::CREATED
            };
            let result = BindResult {
                app_id,
                policy_guid,
                replaced,
            };
            (status, ApiResponse::ok(result)).into_response()
        }
        BindOutcome::Rejected(e) => {
            error_response(&e.to_string(), StatusCode::BAD_REQUEST).into_response()
        }
        BindOutcome::PersistenceFailure(e) => error_response(
            &format!("failed to store policy: {e}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
        BindOutcome::NotificationFailure { error, .. } => error_response(
            &format!("failed to activate schedules: {error}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
    }
}

/// DELETE /v1/apps/:app_id/policy
pub async fn unbind_policy(
    State(state): State<ApiState>,
    Path(app_id): Path<String>,
) -> impl IntoResponse {
    let outcome = state.binder.unbind(&app_id).await;
    debug!(%app_id, outcome = outcome.label(), "unbind request finished");
    match outcome {
        UnbindOutcome::Committed { had_policy } => {
            ApiResponse::ok(UnbindResult { app_id, had_policy }).into_response()
        }
        UnbindOutcome::PersistenceFailure(e) => error_response(
            &format!("failed to remove policy: {e}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
        UnbindOutcome::NotificationFailure(e) => error_response(
            &format!("failed to deactivate schedules: {e}"),
            StatusCode::INTERNAL_SERVER_ERROR,
        )
        .into_response(),
    }
}

// ── Reads ──────────────────────────────────────────────────────

/// GET /v1/apps/:app_id/policy
pub async fn get_policy(
    State(state): State<ApiState>,
    Path(app_id): Path<String>,
) -> impl IntoResponse {
    match state.binder.store().get_policy(&app_id) {
        Ok(Some(record)) => ApiResponse::ok(record).into_response(),
        Ok(None) => error_response("policy not found", StatusCode::NOT_FOUND).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /v1/apps
pub async fn list_app_ids(State(state): State<ApiState>) -> impl IntoResponse {
    match state.binder.store().list_app_ids() {
        Ok(ids) => ApiResponse::ok(ids).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /v1/policies
pub async fn list_policies(State(state): State<ApiState>) -> impl IntoResponse {
    match state.binder.store().list_policies() {
        Ok(records) => ApiResponse::ok(records).into_response(),
        Err(e) => error_response(&e.to_string(), StatusCode::INTERNAL_SERVER_ERROR).into_response(),
    }
}

/// GET /healthz
pub async fn healthz() -> impl IntoResponse {
    ApiResponse::ok("ok")
}
