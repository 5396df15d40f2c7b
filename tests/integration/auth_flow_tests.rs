// ==== tests/integration/auth_flow_tests.rs ====
//! End-to-end credential lifecycle against the in-memory store.

use authd_backend_lib::auth::AuthService;
use authd_backend_lib::error::AppError;
use authd_common::Tokens;

use crate::test_utils::{credentials, setup_auth, setup_flat_file, sign_up_and_in};

#[tokio::test]
async fn test_rotation_scenario() {
    let (auth, _store) = setup_auth();

    let first = sign_up_and_in(&auth, "alice@x.com", "secret1").await;
    let subject = auth
        .verify_access_token(&first.access)
        .await
        .expect("fresh access token should verify");

    let second = auth
        .refresh_tokens(&first.refresh)
        .await
        .expect("first refresh should succeed");
    assert_ne!(first.access, second.access);
    assert_ne!(first.refresh, second.refresh);

    assert!(matches!(
        auth.verify_access_token(&first.access).await,
        Err(AppError::InvalidAccessToken)
    ));
    assert!(matches!(
        auth.refresh_tokens(&first.refresh).await,
        Err(AppError::RevokedRefreshToken)
    ));
    assert_eq!(
        auth.verify_access_token(&second.access).await.unwrap(),
        subject
    );
}

#[tokio::test]
async fn test_duplicate_sign_up_rejected() {
    let (auth, store) = setup_auth();

    auth.sign_up(credentials("bob@x.com", "hunter22"))
        .await
        .expect("first sign-up should succeed");

    for password in ["hunter22", "another-password"] {
        assert!(matches!(
            auth.sign_up(credentials("bob@x.com", password)).await,
            Err(AppError::EmailAlreadyExists)
        ));
    }
    assert_eq!(store.committed().await.credentials.len(), 1);
}

#[tokio::test]
async fn test_refresh_revokes_whole_family() {
    let (auth, store) = setup_auth();

    let a = sign_up_and_in(&auth, "carol@x.com", "secret1").await;
    // A second session for the same subject.
    let b = auth
        .sign_in(credentials("carol@x.com", "secret1"))
        .await
        .unwrap();

    auth.refresh_tokens(&a.refresh).await.unwrap();

    assert!(auth.verify_access_token(&a.access).await.is_err());
    assert!(auth.verify_access_token(&b.access).await.is_err());
    assert!(matches!(
        auth.refresh_tokens(&b.refresh).await,
        Err(AppError::RevokedRefreshToken)
    ));

    // Records are kept for audit, only flagged.
    let state = store.committed().await;
    assert_eq!(state.tokens.len(), 6);
    assert_eq!(state.tokens.rows().filter(|t| t.revoked).count(), 4);
}

#[tokio::test]
async fn test_refresh_leaves_other_subjects_alone() {
    let (auth, _store) = setup_auth();

    let dave = sign_up_and_in(&auth, "dave@x.com", "secret1").await;
    let erin = sign_up_and_in(&auth, "erin@x.com", "secret1").await;

    auth.refresh_tokens(&dave.refresh).await.unwrap();

    assert!(auth.verify_access_token(&erin.access).await.is_ok());
    assert!(auth.refresh_tokens(&erin.refresh).await.is_ok());
}

#[tokio::test]
async fn test_token_types_are_not_interchangeable() {
    let (auth, _store) = setup_auth();
    let tokens = sign_up_and_in(&auth, "frank@x.com", "secret1").await;

    assert!(matches!(
        auth.verify_access_token(&tokens.refresh).await,
        Err(AppError::InvalidAccessToken)
    ));
    assert!(matches!(
        auth.refresh_tokens(&tokens.access).await,
        Err(AppError::InvalidRefreshToken)
    ));

    // Neither rejection consumed anything.
    assert!(auth.verify_access_token(&tokens.access).await.is_ok());
    assert!(auth.refresh_tokens(&tokens.refresh).await.is_ok());
}

#[tokio::test]
async fn test_garbage_tokens_rejected() {
    let (auth, _store) = setup_auth();

    for token in ["", "not.a.jwt", "a.b.c"] {
        assert!(matches!(
            auth.verify_access_token(token).await,
            Err(AppError::InvalidAccessToken)
        ));
        assert!(matches!(
            auth.refresh_tokens(token).await,
            Err(AppError::InvalidRefreshToken)
        ));
    }
}

#[tokio::test]
async fn test_logout_revokes_only_the_presented_pair() {
    let (auth, _store) = setup_auth();

    let first = sign_up_and_in(&auth, "grace@x.com", "secret1").await;
    let second = auth
        .sign_in(credentials("grace@x.com", "secret1"))
        .await
        .unwrap();

    auth.logout(Tokens {
        access: first.access.clone(),
        refresh: first.refresh.clone(),
    })
    .await
    .expect("logout should succeed");

    assert!(matches!(
        auth.verify_access_token(&first.access).await,
        Err(AppError::InvalidAccessToken)
    ));
    assert!(matches!(
        auth.refresh_tokens(&first.refresh).await,
        Err(AppError::RevokedRefreshToken)
    ));
    assert!(auth.verify_access_token(&second.access).await.is_ok());
    assert!(auth.refresh_tokens(&second.refresh).await.is_ok());
}

#[tokio::test]
async fn test_logout_twice_is_harmless() {
    let (auth, _store) = setup_auth();
    let tokens = sign_up_and_in(&auth, "heidi@x.com", "secret1").await;

    auth.logout(tokens.clone()).await.unwrap();
    auth.logout(tokens).await.unwrap();
}

#[tokio::test]
async fn test_logout_rejects_swapped_tokens() {
    let (auth, _store) = setup_auth();
    let tokens = sign_up_and_in(&auth, "ivan@x.com", "secret1").await;

    let swapped = Tokens {
        access: tokens.refresh.clone(),
        refresh: tokens.access.clone(),
    };
    assert!(matches!(
        auth.logout(swapped).await,
        Err(AppError::InvalidArgument(_))
    ));
    assert!(auth.verify_access_token(&tokens.access).await.is_ok());
}

#[tokio::test]
async fn test_password_never_stored() {
    let (auth, _store) = setup_auth();
    auth.sign_up(credentials("judy@x.com", "secret1"))
        .await
        .unwrap();

    let stored = auth
        .credentials_by_email("judy@x.com")
        .await
        .unwrap()
        .expect("credential should exist");
    assert_eq!(stored.email, "judy@x.com");
    assert_ne!(stored.password_hash, "secret1");
    assert!(!stored.password_hash.contains("secret1"));

    assert!(auth
        .sign_in(credentials("judy@x.com", "secret1 "))
        .await
        .is_err());
    assert!(auth
        .sign_in(credentials("judy@x.com", "Secret1"))
        .await
        .is_err());
    assert!(auth
        .sign_in(credentials("judy@x.com", "secret1"))
        .await
        .is_ok());
}

#[tokio::test]
async fn test_unknown_email_lookup() {
    let (auth, _store) = setup_auth();
    assert!(auth
        .credentials_by_email("nobody@x.com")
        .await
        .unwrap()
        .is_none());
}

#[tokio::test]
async fn test_flat_file_state_survives_restart() {
    let dir = tempfile::tempdir().unwrap();

    let (tokens, subject) = {
        let (auth, _store) = setup_flat_file(dir.path()).await;
        let tokens = sign_up_and_in(&auth, "ken@x.com", "secret1").await;
        let subject = auth.verify_access_token(&tokens.access).await.unwrap();
        (tokens, subject)
    };

    let (auth, store) = setup_flat_file(dir.path()).await;
    assert_eq!(store.committed().await.credentials.len(), 1);
    assert_eq!(
        auth.verify_access_token(&tokens.access).await.unwrap(),
        subject
    );

    let rotated = auth.refresh_tokens(&tokens.refresh).await.unwrap();
    drop(auth);

    let (auth, _store) = setup_flat_file(dir.path()).await;
    assert!(auth.verify_access_token(&tokens.access).await.is_err());
    assert!(matches!(
        auth.refresh_tokens(&tokens.refresh).await,
        Err(AppError::RevokedRefreshToken)
    ));
    assert!(auth.verify_access_token(&rotated.access).await.is_ok());
}
