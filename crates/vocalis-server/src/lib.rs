//! Vocalis HTTP server library logic.

pub mod api;
pub mod api_auth;
pub mod api_logic;
pub mod api_speech;
pub mod config;
pub mod middleware;
pub mod practice;

use axum::{
    extract::DefaultBodyLimit,
    http::HeaderValue,
    routing::{get, post},
    Extension, Json, Router,
};
use config::{Config, ConfigError};
use serde_json::{json, Value};
use std::sync::Arc;
use std::time::Duration;
use tower_http::cors::{AllowOrigin, Any, CorsLayer};
use tower_http::trace::TraceLayer;
use vocalis_db::DbPool;
use vocalis_grading::GradingGateway;
use vocalis_identity::{SqliteUserDirectory, TokenSettings, UserDirectory};
use vocalis_voice::SpeechGateway;

/// Application state shared across all request handlers.
#[derive(Clone)]
pub struct AppState {
    /// Database connection pool.
    pub pool: DbPool,
    /// User lookup for bearer-token verification.
    pub directory: Arc<dyn UserDirectory>,
    /// Token signing secret, algorithm, and lifetime.
    pub tokens: TokenSettings,
    /// bcrypt cost for new passwords.
    pub password_cost: u32,
    pub grading: GradingGateway,
    pub speech: SpeechGateway,
    /// Allowed CORS origins; `"*"` allows any.
    pub cors_origins: Vec<String>,
}

impl AppState {
    /// Builds the state from validated configuration.
    ///
    /// # Errors
    ///
    /// [`ConfigError::Invalid`] if token or speech settings are unusable.
    pub fn from_config(pool: DbPool, config: &Config) -> Result<Self, ConfigError> {
        let tokens = TokenSettings::from_parts(
            config.auth.jwt_secret.as_bytes(),
            &config.auth.algorithm,
            Duration::from_secs(config.auth.access_token_expire_minutes.saturating_mul(60)),
        )
        .map_err(|e| ConfigError::Invalid {
            field: "auth.algorithm",
            reason: e.to_string(),
        })?;

        let speech =
            SpeechGateway::from_config(config.polly.clone()).map_err(|e| ConfigError::Invalid {
                field: "polly.endpoint",
                reason: e.to_string(),
            })?;

        Ok(Self {
            directory: Arc::new(SqliteUserDirectory::new(pool.clone())),
            pool,
            tokens,
            password_cost: config.auth.password_cost,
            grading: GradingGateway::from_config(config.gemini.clone()),
            speech,
            cors_origins: config.cors.allowed_origins.clone(),
        })
    }
}

/// Maximum request body size (1 MiB).
const MAX_REQUEST_BODY_BYTES: usize = 1024 * 1024;

/// Health check handler.
async fn health() -> Json<Value> {
    Json(json!({
        "status": "ok",
        "version": env!("CARGO_PKG_VERSION")
    }))
}

fn cors_layer(origins: &[String]) -> CorsLayer {
    let layer = CorsLayer::new().allow_methods(Any).allow_headers(Any);

    if origins.iter().any(|o| o == "*") {
        return layer.allow_origin(Any);
    }

    let allowed: Vec<HeaderValue> = origins
        .iter()
        .filter_map(|origin| match HeaderValue::from_str(origin) {
            Ok(value) => Some(value),
            Err(_) => {
                tracing::warn!(origin = %origin, "ignoring invalid CORS origin");
                None
            }
        })
        .collect();
    layer.allow_origin(AllowOrigin::list(allowed))
}

/// Builds the application router with all routes.
pub fn app(state: AppState) -> Router {
    let protected_routes = Router::new()
        .route("/me", get(api_auth::me_handler))
        .route("/logic/problem", get(api_logic::problem_handler))
        .route("/logic/submit_answer", post(api_logic::submit_answer_handler))
        .route("/logic/progress", get(api_logic::progress_handler))
        .route("/logic/tts", post(api_logic::tts_handler))
        .layer(axum::middleware::from_fn(middleware::auth_middleware));

    let cors = cors_layer(&state.cors_origins);

    Router::new()
        .route("/health", get(health))
        .route("/register", post(api_auth::register_handler))
        .route("/login", post(api_auth::login_handler))
        .route("/synthesize", post(api_speech::synthesize_handler))
        .route("/tts/synthesize", post(api_speech::synthesize_handler))
        .route("/voices", get(api_speech::voices_handler))
        .route("/ai/process", post(api_speech::ai_process_handler))
        .merge(protected_routes)
        .layer(DefaultBodyLimit::max(MAX_REQUEST_BODY_BYTES))
        .layer(TraceLayer::new_for_http())
        .layer(cors)
        .layer(Extension(Arc::new(state)))
}
