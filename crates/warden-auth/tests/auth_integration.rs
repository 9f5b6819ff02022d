#![allow(clippy::unwrap_used, clippy::expect_used)]

use std::path::Path;
use std::sync::Arc;
use warden_auth::{AuthFacade, Credentials};
use warden_core::{SystemClock, WardenError};
use warden_session::{build_policy, SessionBackend, SessionConfig};
use warden_users::{build_user_store, UsersBackend, UsersConfig};

async fn durable_facade(data_dir: &Path) -> AuthFacade {
    let clock = Arc::new(SystemClock);
    let sessions = build_policy(
        &SessionConfig {
            backend: SessionBackend::File,
            duration_secs: 3600,
            data_dir: data_dir.join("sessions"),
            ..SessionConfig::default()
        },
        clock.clone(),
    )
    .await
    .unwrap();
    let users = build_user_store(
        &UsersConfig {
            backend: UsersBackend::Sqlite,
        },
        data_dir,
        clock,
    )
    .await
    .unwrap();
    AuthFacade::new(users, sessions)
}

#[tokio::test]
async fn test_login_survives_restart() {
    let tmp = tempfile::tempdir().unwrap();
    let creds = Credentials::new("bob@example.com", "b4l0u").unwrap();

    let session_id = {
        let auth = durable_facade(tmp.path()).await;
        auth.register_user(&creds).await.unwrap();
        let (_, session_id) = auth.login(&creds).await.unwrap();
        session_id
    };

    let auth = durable_facade(tmp.path()).await;
    let identity = auth.current_user(&session_id).await.unwrap();
    assert_eq!(identity.email, "bob@example.com");

    assert!(auth.destroy_session(&session_id).await.unwrap());
    assert!(matches!(
        auth.current_user(&session_id).await,
        Err(WardenError::Unauthenticated)
    ));
}

#[tokio::test]
async fn test_storage_failure_is_not_unauthenticated() {
    let tmp = tempfile::tempdir().unwrap();
    let auth = durable_facade(tmp.path()).await;
    let creds = Credentials::new("bob@example.com", "pw").unwrap();
    auth.register_user(&creds).await.unwrap();
    let (_, session_id) = auth.login(&creds).await.unwrap();

    std::fs::write(tmp.path().join("sessions").join("sessions.json"), "[{").unwrap();
    assert!(matches!(
        auth.current_user(&session_id).await,
        Err(WardenError::StorageUnavailable(_))
    ));
}

#[tokio::test]
async fn test_reset_then_login_with_new_password() {
    let tmp = tempfile::tempdir().unwrap();
    let auth = durable_facade(tmp.path()).await;
    auth.register_user(&Credentials::new("bob@example.com", "old").unwrap())
        .await
        .unwrap();

    let token = auth.get_reset_password_token("bob@example.com").await.unwrap();
    auth.update_password(&token, "new").await.unwrap();

    let fresh = Credentials::new("bob@example.com", "new").unwrap();
    let (identity, session_id) = auth.login(&fresh).await.unwrap();
    assert_eq!(auth.current_user(&session_id).await.unwrap(), identity);
}
