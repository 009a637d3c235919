mod common;

use axum::http::{header, StatusCode};
use common::{
    body_json, get_request, json_request, register_and_login, send, setup_app, spawn_upstream,
    test_config,
};
use serde_json::json;
use std::time::{Duration, SystemTime};
use vocalis_db::{create_memory_pool, run_migrations};
use vocalis_identity::{issue_token_at, Claims, TokenSettings};
use vocalis_server::{app, AppState};

#[tokio::test]
async fn health_reports_version() {
    let app = setup_app().await;
    let response = send(&app.router, get_request("/health", None)).await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["status"], "ok");
    assert_eq!(body["version"], env!("CARGO_PKG_VERSION"));
}

#[tokio::test]
async fn login_returns_bearer_grant() {
    let app = setup_app().await;
    let token = register_and_login(&app.router).await;
    assert_eq!(token.split('.').count(), 3);

    let response = send(&app.router, get_request("/me", Some(&token))).await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"username": "ana", "email": "ana@example.com"})
    );
}

#[tokio::test]
async fn login_grant_shape() {
    let app = setup_app().await;
    register_and_login(&app.router).await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "ANA@example.com", "password": "s3creta"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    let body = body_json(response).await;
    assert_eq!(body["token_type"], "bearer");
    assert_eq!(body["username"], "ana");
    assert_eq!(body["email"], "ana@example.com");
}

#[tokio::test]
async fn duplicate_email_conflicts() {
    let app = setup_app().await;
    register_and_login(&app.router).await;

    let response = send(
        &app.router,
        json_request(
            "POST",
            "/register",
            None,
            json!({"username": "otra", "email": "ana@example.com", "password": "x"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
}

#[tokio::test]
async fn invalid_email_names_the_field() {
    let app = setup_app().await;
    let response = send(
        &app.router,
        json_request(
            "POST",
            "/register",
            None,
            json!({"username": "ana", "email": "no-es-correo", "password": "x"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(body_json(response).await["field"], "email");
}

#[tokio::test]
async fn bad_credentials_are_uniform() {
    let app = setup_app().await;
    register_and_login(&app.router).await;

    let wrong_password = send(
        &app.router,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "ana@example.com", "password": "nope"}),
        ),
    )
    .await;
    let unknown_user = send(
        &app.router,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "nadie@example.com", "password": "s3creta"}),
        ),
    )
    .await;

    assert_eq!(wrong_password.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(unknown_user.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(body_json(wrong_password).await, body_json(unknown_user).await);
}

#[tokio::test]
async fn protected_routes_challenge_without_token() {
    let app = setup_app().await;
    for uri in ["/me", "/logic/progress", "/logic/problem"] {
        let response = send(&app.router, get_request(uri, None)).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED, "{uri}");
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
    }
}

#[tokio::test]
async fn every_bad_token_gets_the_same_401() {
    let app = setup_app().await;
    register_and_login(&app.router).await;

    let settings = TokenSettings::new("test-secret");
    let mut with_sub = Claims::new();
    with_sub.insert("sub".to_string(), "ana@example.com".into());
    let mut ghost = Claims::new();
    ghost.insert("sub".to_string(), "fantasma@example.com".into());

    let expired = issue_token_at(
        with_sub.clone(),
        Some(Duration::from_secs(60)),
        SystemTime::now() - Duration::from_secs(3600),
        &settings,
    )
    .unwrap();
    let wrong_secret = issue_token_at(
        with_sub,
        None,
        SystemTime::now(),
        &TokenSettings::new("another-secret"),
    )
    .unwrap();
    let no_subject = issue_token_at(Claims::new(), None, SystemTime::now(), &settings).unwrap();
    let unknown_user = issue_token_at(ghost, None, SystemTime::now(), &settings).unwrap();

    let mut bodies = Vec::new();
    for token in [
        "not-a-token".to_string(),
        expired,
        wrong_secret,
        no_subject,
        unknown_user,
    ] {
        let response = send(&app.router, get_request("/me", Some(&token))).await;
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
        assert_eq!(response.headers()[header::WWW_AUTHENTICATE], "Bearer");
        bodies.push(body_json(response).await);
    }
    assert!(bodies.windows(2).all(|w| w[0] == w[1]));
}

#[tokio::test]
async fn unvalidated_huge_lifetime_fails_login_without_panicking() {
    let (url, _upstream) = spawn_upstream().await;
    let pool = create_memory_pool().unwrap();
    run_migrations(&pool.get().unwrap()).unwrap();

    let mut config = test_config(&url, "k");
    config.auth.access_token_expire_minutes = u64::MAX / 30;
    assert!(config.validate().is_err());
    let router = app(AppState::from_config(pool, &config).unwrap());

    let response = send(
        &router,
        json_request(
            "POST",
            "/register",
            None,
            json!({"username": "ana", "email": "ana@example.com", "password": "s3creta"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        &router,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "ana@example.com", "password": "s3creta"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::INTERNAL_SERVER_ERROR);
}

#[tokio::test]
async fn assistant_echoes_input() {
    let app = setup_app().await;
    let response = send(
        &app.router,
        json_request(
            "POST",
            "/ai/process",
            None,
            json!({"userInput": "repasar bucles", "context": {"page": "home"}}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    assert_eq!(
        body_json(response).await,
        json!({"response": "Entiendo que quieres repasar bucles"})
    );
}
