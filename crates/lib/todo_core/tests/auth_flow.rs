//! Integration tests: registration, login, token lifecycle and the access
//! gate against an ephemeral PostgreSQL.

mod common;

use std::time::Instant;

use chrono::Duration;
use common::TestDb;
use todo_core::auth::password::{self, verify_password};
use todo_core::auth::{AuthError, gate, queries, session, tokens};

#[tokio::test]
async fn register_then_login() {
    let db = TestDb::start().await;

    let user = session::register(&db.pool, "alice", "pw123").await.expect("register");
    assert_eq!(user.username, "alice");

    let stored = queries::find_user_by_username(&db.pool, "alice")
        .await
        .unwrap()
        .expect("stored user");
    assert_eq!(stored.user, user);
    assert_ne!(stored.password_hash, "pw123");
    assert!(verify_password("pw123", &stored.password_hash));

    let (logged_in, token) = session::login(&db.pool, "alice", "pw123", tokens::default_ttl())
        .await
        .expect("login");
    assert_eq!(logged_in, user);
    assert_eq!(token.user_id, user.id);

    let by_id = queries::find_user_by_id(&db.pool, user.id).await.unwrap();
    assert_eq!(by_id, Some(user));

    db.stop().await;
}

#[tokio::test]
async fn login_failures_are_indistinguishable() {
    let db = TestDb::start().await;
    session::register(&db.pool, "alice", "pw123").await.unwrap();

    let wrong_password = session::login(&db.pool, "alice", "nope", tokens::default_ttl())
        .await
        .unwrap_err();
    let unknown_user = session::login(&db.pool, "mallory", "pw123", tokens::default_ttl())
        .await
        .unwrap_err();

    assert!(matches!(wrong_password, AuthError::InvalidCredential));
    assert!(matches!(unknown_user, AuthError::InvalidCredential));
    assert_eq!(wrong_password.to_string(), unknown_user.to_string());

    db.stop().await;
}

#[tokio::test]
async fn unknown_username_costs_a_password_check() {
    let db = TestDb::start().await;
    session::register(&db.pool, "alice", "pw123").await.unwrap();
    password::warm_up();

    let started = Instant::now();
    let _ = session::login(&db.pool, "alice", "nope", tokens::default_ttl()).await;
    let wrong_password = started.elapsed();

    let started = Instant::now();
    let _ = session::login(&db.pool, "mallory", "nope", tokens::default_ttl()).await;
    let unknown_user = started.elapsed();

    // Both paths are dominated by one bcrypt verification.
    assert!(
        unknown_user * 4 >= wrong_password,
        "unknown user {unknown_user:?} vs wrong password {wrong_password:?}"
    );

    db.stop().await;
}

#[tokio::test]
async fn duplicate_registration_fails_without_side_effects() {
    let db = TestDb::start().await;

    session::register(&db.pool, "alice", "pw123").await.unwrap();
    let err = session::register(&db.pool, "alice", "other").await.unwrap_err();
    assert!(matches!(err, AuthError::DuplicateUsername));
    assert_eq!(queries::user_count(&db.pool).await.unwrap(), 1);

    // The original password still works.
    session::login(&db.pool, "alice", "pw123", tokens::default_ttl())
        .await
        .expect("original credentials intact");

    db.stop().await;
}

#[tokio::test(flavor = "multi_thread", worker_threads = 4)]
async fn concurrent_registration_has_one_winner() {
    const ATTEMPTS: usize = 8;
    let db = TestDb::start().await;

    let mut set = tokio::task::JoinSet::new();
    for i in 0..ATTEMPTS {
        let pool = db.pool.clone();
        set.spawn(async move { session::register(&pool, "racer", &format!("pw{i}00")).await });
    }

    let mut ok = 0;
    let mut duplicate = 0;
    while let Some(res) = set.join_next().await {
        match res.expect("task") {
            Ok(_) => ok += 1,
            Err(AuthError::DuplicateUsername) => duplicate += 1,
            Err(e) => panic!("unexpected error: {e}"),
        }
    }
    assert_eq!(ok, 1);
    assert_eq!(duplicate, ATTEMPTS - 1);
    assert_eq!(queries::user_count(&db.pool).await.unwrap(), 1);

    db.stop().await;
}

#[tokio::test]
async fn invalid_input_never_reaches_storage() {
    let db = TestDb::start().await;

    let short_name = session::register(&db.pool, "al", "pw123").await.unwrap_err();
    let short_password = session::register(&db.pool, "alice", "pw").await.unwrap_err();
    assert!(matches!(short_name, AuthError::Validation(_)));
    assert!(matches!(short_password, AuthError::Validation(_)));
    assert_eq!(queries::user_count(&db.pool).await.unwrap(), 0);

    db.stop().await;
}

#[tokio::test]
async fn issued_token_expiry_matches_ttl() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();

    let ttl = Duration::minutes(15);
    let token = tokens::issue_token(&db.pool, user.id, ttl).await.unwrap();
    assert_eq!(token.expires_at, token.created_at + ttl);

    let resolved = tokens::validate_token(&db.pool, &token.token).await.unwrap();
    assert_eq!(resolved, user);

    db.stop().await;
}

#[tokio::test]
async fn expired_token_is_deleted_on_validation() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();

    let ttl = Duration::minutes(60);
    let token = tokens::issue_token(&db.pool, user.id, ttl).await.unwrap();

    // Still valid one microsecond before expiry.
    let just_before = token.expires_at - Duration::microseconds(1);
    tokens::validate_token_at(&db.pool, &token.token, just_before)
        .await
        .expect("active before expiry");

    let first = tokens::validate_token_at(&db.pool, &token.token, token.expires_at)
        .await
        .unwrap_err();
    assert!(matches!(first, AuthError::Expired));

    let second = tokens::validate_token(&db.pool, &token.token).await.unwrap_err();
    assert!(matches!(second, AuthError::InvalidCredential));
    assert_eq!(tokens::token_count(&db.pool, user.id).await.unwrap(), 0);

    db.stop().await;
}

#[tokio::test]
async fn zero_ttl_token_is_born_expired() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();

    let token = tokens::issue_token(&db.pool, user.id, Duration::zero()).await.unwrap();
    let err = tokens::validate_token(&db.pool, &token.token).await.unwrap_err();
    assert!(matches!(err, AuthError::Expired));

    db.stop().await;
}

#[tokio::test]
async fn out_of_range_ttl_is_rejected_without_issuing() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();

    let huge = Duration::minutes(1_000_000_000_000);
    let err = tokens::issue_token(&db.pool, user.id, huge).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let err = tokens::issue_token(&db.pool, user.id, Duration::minutes(-5))
        .await
        .unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    let err = session::login(&db.pool, "alice", "pw123", huge).await.unwrap_err();
    assert!(matches!(err, AuthError::Validation(_)));

    assert_eq!(tokens::token_count(&db.pool, user.id).await.unwrap(), 0);

    db.stop().await;
}

#[tokio::test]
async fn logout_revokes_only_that_session() {
    let db = TestDb::start().await;
    session::register(&db.pool, "alice", "pw123").await.unwrap();

    let ttl = tokens::default_ttl();
    let (_, laptop) = session::login(&db.pool, "alice", "pw123", ttl).await.unwrap();
    let (_, phone) = session::login(&db.pool, "alice", "pw123", ttl).await.unwrap();
    assert_ne!(laptop.token, phone.token);

    session::logout(&db.pool, &laptop.token).await.unwrap();
    // Idempotent.
    session::logout(&db.pool, &laptop.token).await.unwrap();

    assert!(matches!(
        tokens::validate_token(&db.pool, &laptop.token).await,
        Err(AuthError::InvalidCredential)
    ));
    assert!(tokens::validate_token(&db.pool, &phone.token).await.is_ok());

    db.stop().await;
}

#[tokio::test]
async fn purge_removes_only_expired_tokens() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();

    tokens::issue_token(&db.pool, user.id, Duration::zero()).await.unwrap();
    tokens::issue_token(&db.pool, user.id, Duration::zero()).await.unwrap();
    let live = tokens::issue_token(&db.pool, user.id, Duration::minutes(5))
        .await
        .unwrap();

    assert_eq!(tokens::purge_expired_tokens(&db.pool).await.unwrap(), 2);
    assert_eq!(tokens::token_count(&db.pool, user.id).await.unwrap(), 1);
    assert!(tokens::validate_token(&db.pool, &live.token).await.is_ok());

    db.stop().await;
}

#[tokio::test]
async fn gate_rejects_missing_and_garbled_credentials() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();
    let (_, token) = session::login(&db.pool, "alice", "pw123", tokens::default_ttl())
        .await
        .unwrap();

    for bad in [None, Some(""), Some("   "), Some("not-a-token")] {
        let err = gate::authenticate(&db.pool, bad).await.unwrap_err();
        assert!(matches!(err, AuthError::InvalidCredential), "{bad:?}");
    }

    let resolved = gate::authenticate(&db.pool, Some(&token.token)).await.unwrap();
    assert_eq!(resolved, user);

    db.stop().await;
}

#[tokio::test]
async fn deleting_user_cascades_tokens() {
    let db = TestDb::start().await;
    let user = session::register(&db.pool, "alice", "pw123").await.unwrap();
    let (_, token) = session::login(&db.pool, "alice", "pw123", tokens::default_ttl())
        .await
        .unwrap();

    assert!(queries::delete_user(&db.pool, user.id).await.unwrap());
    assert!(!queries::delete_user(&db.pool, user.id).await.unwrap());
    assert_eq!(tokens::token_count(&db.pool, user.id).await.unwrap(), 0);
    assert!(matches!(
        tokens::validate_token(&db.pool, &token.token).await,
        Err(AuthError::InvalidCredential)
    ));

    db.stop().await;
}
