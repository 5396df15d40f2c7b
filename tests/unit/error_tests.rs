// ==== tests/unit/error_tests.rs ====
//! Error mapping as seen by HTTP callers.

use authd_backend_lib::error::AppError;
use authd_backend_lib::store::StoreError;
use axum::{body::to_bytes, http::StatusCode, response::IntoResponse};
use serde_json::Value;

async fn body_of(err: AppError) -> (StatusCode, Value) {
    let response = err.into_response();
    let status = response.status();
    let bytes = to_bytes(response.into_body(), usize::MAX)
        .await
        .expect("Failed to read body");
    let value = serde_json::from_slice(&bytes).expect("body is not JSON");
    (status, value)
}

#[tokio::test]
async fn test_sign_in_failures_look_identical() {
    let (status_a, body_a) = body_of(AppError::CredentialsNotFound).await;
    let (status_b, body_b) = body_of(AppError::InvalidPassword).await;

    assert_eq!(status_a, StatusCode::UNAUTHORIZED);
    assert_eq!(status_a, status_b);
    assert_eq!(body_a, body_b);
    assert_eq!(body_a["error"]["code"], "AUTH_001");
    assert_eq!(body_a["error"]["message"], "Authentication failed");
}

#[tokio::test]
async fn test_token_errors_are_unauthorized() {
    for (err, code) in [
        (AppError::InvalidAccessToken, "AUTH_002"),
        (AppError::InvalidRefreshToken, "AUTH_003"),
        (AppError::RevokedRefreshToken, "AUTH_004"),
    ] {
        let (status, body) = body_of(err).await;
        assert_eq!(status, StatusCode::UNAUTHORIZED);
        assert_eq!(body["error"]["code"], code);
    }
}

#[tokio::test]
async fn test_storage_failure_is_internal() {
    let err = AppError::from(StoreError::Unexpected(anyhow::anyhow!("disk on fire")));
    assert!(err.is_internal());

    let (status, body) = body_of(err).await;
    assert_eq!(status, StatusCode::INTERNAL_SERVER_ERROR);
    assert_eq!(body["error"]["code"], "STORE_001");
}

#[test]
fn test_caller_mistakes_are_not_internal() {
    assert!(!AppError::EmailAlreadyExists.is_internal());
    assert!(!AppError::InvalidArgument("bad".into()).is_internal());
    assert_eq!(AppError::EmailAlreadyExists.status_code(), StatusCode::CONFLICT);
    assert_eq!(
        AppError::InvalidArgument("bad".into()).status_code(),
        StatusCode::BAD_REQUEST
    );
}
