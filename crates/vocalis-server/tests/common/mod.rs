#![allow(dead_code)]

use axum::{
    body::Body,
    extract::State,
    http::{header, Request, StatusCode},
    response::Response,
    routing::{get, post},
    Json, Router,
};
use serde_json::{json, Value};
use std::sync::atomic::{AtomicUsize, Ordering};
use std::sync::Arc;
use tower::ServiceExt;
use vocalis_db::{create_memory_pool, run_migrations, DbPool};
use vocalis_server::{app, config::Config, AppState};

/// Hit counters for the fake Gemini and Polly upstream.
#[derive(Default)]
pub struct Upstream {
    pub gemini_calls: AtomicUsize,
    pub speech_calls: AtomicUsize,
}

async fn fake_generate(State(up): State<Arc<Upstream>>) -> Json<Value> {
    up.gemini_calls.fetch_add(1, Ordering::SeqCst);
    Json(json!({
        "candidates": [{
            "content": {"role": "model", "parts": [{
                "text": "```json\n{\"analysis\": \"Buen razonamiento.\", \"grade\": 12}\n```"
            }]},
            "finishReason": "STOP"
        }]
    }))
}

async fn fake_speech(State(up): State<Arc<Upstream>>, Json(body): Json<Value>) -> Response {
    up.speech_calls.fetch_add(1, Ordering::SeqCst);
    if body["VoiceId"] == "Rota" {
        return Response::builder()
            .status(StatusCode::BAD_REQUEST)
            .body(Body::from(r#"{"message":"Invalid voice"}"#))
            .unwrap();
    }
    Response::new(Body::from(&b"ID3audio"[..]))
}

async fn fake_voices() -> Json<Value> {
    Json(json!({
        "Voices": [{
            "Id": "Lucia",
            "Name": "Lucia",
            "Gender": "Female",
            "LanguageCode": "es-ES",
            "LanguageName": "Castilian Spanish",
            "SupportedEngines": ["neural"]
        }]
    }))
}

pub async fn spawn_upstream() -> (String, Arc<Upstream>) {
    let upstream = Arc::new(Upstream::default());
    let router = Router::new()
        .route("/v1beta/models/{call}", post(fake_generate))
        .route("/v1/speech", post(fake_speech))
        .route("/v1/voices", get(fake_voices))
        .with_state(upstream.clone());

    let listener = tokio::net::TcpListener::bind("127.0.0.1:0").await.unwrap();
    let addr = listener.local_addr().unwrap();
    tokio::spawn(async move {
        axum::serve(listener, router).await.unwrap();
    });
    (format!("http://{addr}"), upstream)
}

pub struct TestApp {
    pub router: Router,
    pub pool: DbPool,
    pub upstream: Arc<Upstream>,
}

pub fn test_config(upstream_url: &str, gemini_key: &str) -> Config {
    let mut config = Config::default();
    config.auth.jwt_secret = "test-secret".to_string();
    config.auth.password_cost = vocalis_identity::MIN_COST;
    config.gemini.api_key = gemini_key.to_string();
    config.gemini.base_url = format!("{upstream_url}/v1beta");
    config.polly.endpoint = Some(upstream_url.to_string());
    config.polly.access_key_id = "AKIDTEST".to_string();
    config.polly.secret_access_key = "secret".to_string();
    config
}

pub async fn setup_app_with(gemini_key: &str) -> TestApp {
    let (url, upstream) = spawn_upstream().await;
    let pool = create_memory_pool().unwrap();
    {
        let conn = pool.get().unwrap();
        run_migrations(&conn).unwrap();
    }
    let state = AppState::from_config(pool.clone(), &test_config(&url, gemini_key)).unwrap();
    TestApp {
        router: app(state),
        pool,
        upstream,
    }
}

pub async fn setup_app() -> TestApp {
    setup_app_with("test-gemini-key").await
}

pub async fn send(router: &Router, request: Request<Body>) -> Response {
    router.clone().oneshot(request).await.unwrap()
}

pub fn json_request(method: &str, uri: &str, token: Option<&str>, body: Value) -> Request<Body> {
    let mut builder = Request::builder()
        .method(method)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json");
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::from(body.to_string())).unwrap()
}

pub fn get_request(uri: &str, token: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = token {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {token}"));
    }
    builder.body(Body::empty()).unwrap()
}

pub async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// Registers `ana@example.com` and returns a fresh access token.
pub async fn register_and_login(router: &Router) -> String {
    let response = send(
        router,
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
        router,
        json_request(
            "POST",
            "/login",
            None,
            json!({"email": "ana@example.com", "password": "s3creta"}),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);
    body_json(response).await["access_token"]
        .as_str()
        .unwrap()
        .to_string()
}
