//! API request handlers

use axum::{
    extract::State,
    http::{HeaderMap, StatusCode},
    response::IntoResponse,
    Json,
};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::error;

use crate::api::state::AppState;
use crate::error::OtpError;
use crate::notify::validate_email;

/// Header carrying the caller's session identifier
pub const SESSION_HEADER: &str = "x-session-id";

/// Response with error details
#[derive(Debug, Serialize)]
pub struct ApiError {
    pub error: String,
}

type ApiResult<T> = Result<T, (StatusCode, Json<ApiError>)>;

fn api_error(status: StatusCode, message: impl Into<String>) -> (StatusCode, Json<ApiError>) {
    (
        status,
        Json(ApiError {
            error: message.into(),
        }),
    )
}

fn session_id(headers: &HeaderMap) -> ApiResult<String> {
    headers
        .get(SESSION_HEADER)
        .and_then(|v| v.to_str().ok())
        .map(str::trim)
        .filter(|v| !v.is_empty())
        .map(str::to_string)
        .ok_or_else(|| api_error(StatusCode::UNAUTHORIZED, "Missing session"))
}

#[derive(Debug, Deserialize)]
pub struct SendRequest {
    pub email: String,
}

#[derive(Debug, Serialize)]
pub struct SendResponse {
    /// False when the notifier failed; the code is still valid
    pub delivered: bool,
    pub expires_at: DateTime<Utc>,
    pub expires_in_seconds: i64,
}

#[derive(Debug, Deserialize)]
pub struct VerifyRequest {
    pub code: String,
}

#[derive(Debug, Serialize)]
pub struct VerifyResponse {
    pub verified: bool,
    pub attempts_remaining: u32,
}

#[derive(Debug, Serialize)]
pub struct StatusResponse {
    pub active: bool,
    pub attempts_remaining: u32,
    pub expires_at: Option<DateTime<Utc>>,
}

/// POST /api/otp/send - Issue (or re-issue) a code for the session
pub async fn send_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<SendRequest>,
) -> ApiResult<Json<SendResponse>> {
    let session = session_id(&headers)?;
    let email = payload.email.trim();

    validate_email(email).map_err(|e| api_error(StatusCode::BAD_REQUEST, e.to_string()))?;

    let manager = state.session(&session).await;
    let issued = manager
        .lock()
        .await
        .issue_detailed(email)
        .await
        .map_err(|e| match e {
            OtpError::InvalidDestination(_) => api_error(StatusCode::BAD_REQUEST, e.to_string()),
            _ => {
                error!("Failed to issue code: {}", e);
                api_error(StatusCode::INTERNAL_SERVER_ERROR, "Failed to issue code")
            }
        })?;

    Ok(Json(SendResponse {
        delivered: issued.delivered,
        expires_at: issued.expires_at,
        expires_in_seconds: state.settings().ttl.num_seconds(),
    }))
}

/// POST /api/otp/verify - Check a candidate code
pub async fn verify_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    Json(payload): Json<VerifyRequest>,
) -> ApiResult<Json<VerifyResponse>> {
    let session = session_id(&headers)?;

    let Some(manager) = state.existing(&session).await else {
        return Ok(Json(VerifyResponse {
            verified: false,
            attempts_remaining: 0,
        }));
    };

    let mut manager = manager.lock().await;
    let verified = manager.verify(payload.code.trim());

    Ok(Json(VerifyResponse {
        verified,
        attempts_remaining: manager.attempts_remaining(),
    }))
}

/// DELETE /api/otp - Abandon the pending verification
pub async fn clear_code(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<StatusCode> {
    let session = session_id(&headers)?;

    if let Some(manager) = state.existing(&session).await {
        manager.lock().await.clear();
    }

    Ok(StatusCode::NO_CONTENT)
}

/// GET /api/otp/status - Whether a code is pending for the session
pub async fn status(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<Json<StatusResponse>> {
    let session = session_id(&headers)?;

    let response = match state.existing(&session).await {
        Some(manager) => {
            let manager = manager.lock().await;
            StatusResponse {
                active: manager.is_active(),
                attempts_remaining: manager.attempts_remaining(),
                expires_at: manager.status().map(|s| s.expires_at),
            }
        }
        None => StatusResponse {
            active: false,
            attempts_remaining: 0,
            expires_at: None,
        },
    };

    Ok(Json(response))
}

/// GET /health
pub async fn health(State(state): State<Arc<AppState>>) -> impl IntoResponse {
    Json(serde_json::json!({
        "status": "ok",
        "service": "otp-rs",
        "version": env!("CARGO_PKG_VERSION"),
        "timestamp": Utc::now().timestamp(),
        "sessions": state.session_count().await,
    }))
}
