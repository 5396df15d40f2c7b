// ============================
// authd-backend-lib/src/router.rs
// ============================
//! HTTP adapter exposing the five credential operations.
use std::sync::Arc;
use std::time::{Duration, Instant};

use authd_common::{
    LogoutRequest, RefreshTokensRequest, RefreshTokensResponse, SignInRequest, SignInResponse,
    SignUpRequest, VerifyAccessTokenRequest, VerifyAccessTokenResponse,
};
use axum::{
    extract::State,
    http::StatusCode,
    routing::{get, post},
    Json, Router,
};
use tower_http::{timeout::TimeoutLayer, trace::TraceLayer};
use tracing::error;

use crate::error::AppError;
use crate::metrics::{self, OP_LOGOUT, OP_REFRESH, OP_SIGN_IN, OP_SIGN_UP, OP_VERIFY};
use crate::AppState;

/// Create the HTTP router
pub fn create_router(state: Arc<AppState>) -> Router {
    let timeout = Duration::from_secs(state.settings.request_timeout_secs);
    Router::new()
        .route("/health", get(health))
        .route("/v1/auth/sign-up", post(sign_up))
        .route("/v1/auth/sign-in", post(sign_in))
        .route("/v1/auth/refresh", post(refresh_tokens))
        .route("/v1/auth/verify", post(verify_access_token))
        .route("/v1/auth/logout", post(logout))
        // A timed-out request drops its future, and with it the open transaction.
        .layer(TimeoutLayer::with_status_code(StatusCode::REQUEST_TIMEOUT, timeout))
        .layer(TraceLayer::new_for_http())
        .with_state(state)
}

async fn health() -> &'static str {
    "ok"
}

/// Record metrics and surface internal failures in the log
fn finish<T>(operation: &'static str, started: Instant, result: &Result<T, AppError>) {
    let status = match result {
        Ok(_) => StatusCode::OK,
        Err(e) => {
            if e.is_internal() {
                error!(operation, error = %e, "request failed");
            }
            e.status_code()
        },
    };
    metrics::observe_request(operation, status.as_u16(), started.elapsed());
}

async fn sign_up(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignUpRequest>,
) -> Result<StatusCode, AppError> {
    let started = Instant::now();
    let result = state.auth.sign_up(req.credentials).await;
    finish(OP_SIGN_UP, started, &result);
    result.map(|()| StatusCode::NO_CONTENT)
}

async fn sign_in(
    State(state): State<Arc<AppState>>,
    Json(req): Json<SignInRequest>,
) -> Result<Json<SignInResponse>, AppError> {
    let started = Instant::now();
    let result = state.auth.sign_in(req.credentials).await;
    finish(OP_SIGN_IN, started, &result);
    result.map(|tokens| Json(SignInResponse { tokens }))
}

async fn refresh_tokens(
    State(state): State<Arc<AppState>>,
    Json(req): Json<RefreshTokensRequest>,
) -> Result<Json<RefreshTokensResponse>, AppError> {
    let started = Instant::now();
    let result = state.auth.refresh_tokens(&req.refresh_token).await;
    finish(OP_REFRESH, started, &result);
    result.map(|tokens| Json(RefreshTokensResponse { tokens }))
}

async fn verify_access_token(
    State(state): State<Arc<AppState>>,
    Json(req): Json<VerifyAccessTokenRequest>,
) -> Result<Json<VerifyAccessTokenResponse>, AppError> {
    let started = Instant::now();
    let result = state.auth.verify_access_token(&req.access).await;
    finish(OP_VERIFY, started, &result);
    result.map(|user_id| Json(VerifyAccessTokenResponse { user_id }))
}

async fn logout(
    State(state): State<Arc<AppState>>,
    Json(req): Json<LogoutRequest>,
) -> Result<StatusCode, AppError> {
    let started = Instant::now();
    let result = state.auth.logout(req.tokens).await;
    finish(OP_LOGOUT, started, &result);
    result.map(|()| StatusCode::NO_CONTENT)
}
