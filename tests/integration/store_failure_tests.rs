// ==== tests/integration/store_failure_tests.rs ====
//! Failed commits must leave no trace.

use std::sync::Arc;

use authd_backend_lib::auth::AuthService;
use authd_backend_lib::error::AppError;
use authd_backend_lib::store::MemoryStore;

use crate::test_utils::{auth_over, credentials, sign_up_and_in, FailingCommitStore};

fn failing_over(store: &MemoryStore) -> Arc<authd_backend_lib::auth::DefaultAuth> {
    auth_over(Arc::new(FailingCommitStore::new(store.clone())))
}

#[tokio::test]
async fn test_sign_up_commit_failure_writes_nothing() {
    let store = MemoryStore::new();
    let auth = failing_over(&store);

    let err = auth
        .sign_up(credentials("alice@x.com", "secret1"))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::Storage(_)));
    assert!(err.is_internal());
    assert!(store.committed().await.credentials.is_empty());

    // The email is still free once the store recovers.
    let healthy = auth_over(Arc::new(store.clone()));
    healthy
        .sign_up(credentials("alice@x.com", "secret1"))
        .await
        .expect("sign-up should succeed after the failure");
}

#[tokio::test]
async fn test_sign_in_commit_failure_issues_nothing() {
    let store = MemoryStore::new();
    let healthy = auth_over(Arc::new(store.clone()));
    healthy
        .sign_up(credentials("bob@x.com", "secret1"))
        .await
        .unwrap();

    let failing = failing_over(&store);
    assert!(failing
        .sign_in(credentials("bob@x.com", "secret1"))
        .await
        .unwrap_err()
        .is_internal());
    assert!(store.committed().await.tokens.is_empty());
}

#[tokio::test]
async fn test_refresh_commit_failure_keeps_old_family() {
    let store = MemoryStore::new();
    let healthy = auth_over(Arc::new(store.clone()));
    let tokens = sign_up_and_in(&healthy, "carol@x.com", "secret1").await;

    let failing = failing_over(&store);
    assert!(failing
        .refresh_tokens(&tokens.refresh)
        .await
        .unwrap_err()
        .is_internal());

    // The revoke-all never became visible, so the pair is still live.
    let state = store.committed().await;
    assert_eq!(state.tokens.len(), 2);
    assert!(state.tokens.rows().all(|t| !t.revoked));
    assert!(healthy.verify_access_token(&tokens.access).await.is_ok());
    assert!(healthy.refresh_tokens(&tokens.refresh).await.is_ok());
}

#[tokio::test]
async fn test_logout_commit_failure_keeps_tokens_valid() {
    let store = MemoryStore::new();
    let healthy = auth_over(Arc::new(store.clone()));
    let tokens = sign_up_and_in(&healthy, "dave@x.com", "secret1").await;

    let failing = failing_over(&store);
    assert!(failing.logout(tokens.clone()).await.unwrap_err().is_internal());
    assert!(healthy.verify_access_token(&tokens.access).await.is_ok());
}

#[tokio::test]
async fn test_verify_never_commits() {
    let store = MemoryStore::new();
    let healthy = auth_over(Arc::new(store.clone()));
    let tokens = sign_up_and_in(&healthy, "erin@x.com", "secret1").await;

    // Read-only path works even when commits would fail.
    let failing = failing_over(&store);
    assert!(failing.verify_access_token(&tokens.access).await.is_ok());
}
