//! Account registration, login, and the current-user endpoint.

use crate::api::ApiError;
use crate::middleware::CurrentUser;
use crate::AppState;
use axum::{
    extract::{Extension, Json},
    http::StatusCode,
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vocalis_identity::{login, register, LoginGrant, NewUser};

#[derive(Debug, Deserialize)]
pub struct RegisterRequest {
    pub username: String,
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MessageResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct LoginRequest {
    pub email: String,
    pub password: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct ProfileResponse {
    pub username: String,
    pub email: String,
}

/// Handler for `POST /register`.
pub async fn register_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<RegisterRequest>,
) -> Result<(StatusCode, Json<MessageResponse>), ApiError> {
    let user = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db)?;
        register(
            &conn,
            NewUser {
                username: &payload.username,
                email: &payload.email,
                password: &payload.password,
            },
            state.password_cost,
        )
        .map_err(ApiError::from)
    })
    .await
    .map_err(ApiError::join)??;

    tracing::info!(user_id = user.id, "account created");
    Ok((
        StatusCode::CREATED,
        Json(MessageResponse {
            message: "Usuario registrado correctamente".to_string(),
        }),
    ))
}

/// Handler for `POST /login`.
pub async fn login_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginGrant>, ApiError> {
    let grant = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db)?;
        login(
            &conn,
            &payload.email,
            &payload.password,
            &state.tokens,
            None,
            state.password_cost,
        )
        .map_err(|e| {
            if matches!(e, vocalis_identity::IdentityError::InvalidLogin) {
                tracing::info!("rejected login attempt");
            }
            ApiError::from(e)
        })
    })
    .await
    .map_err(ApiError::join)??;

    Ok(Json(grant))
}

/// Handler for `GET /me`.
pub async fn me_handler(Extension(CurrentUser(user)): Extension<CurrentUser>) -> Json<ProfileResponse> {
    Json(ProfileResponse {
        username: user.username,
        email: user.email,
    })
}
