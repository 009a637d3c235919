//! Text-to-speech and the voice assistant echo endpoint.

use crate::api::ApiError;
use crate::AppState;
use axum::{
    extract::{Extension, Json, Query},
    http::{header, HeaderValue},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vocalis_types::{SynthesisRequest, VoiceDescriptor};
use vocalis_voice::SynthesizedAudio;

#[derive(Debug, Deserialize)]
pub struct VoicesQuery {
    #[serde(rename = "languageCode")]
    pub language_code: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct AssistantRequest {
    #[serde(rename = "userInput")]
    pub user_input: String,
    #[serde(default)]
    pub context: Option<serde_json::Value>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AssistantResponse {
    pub response: String,
}

/// Serves synthesized audio with exact length headers.
pub(crate) fn audio_response(audio: SynthesizedAudio) -> Response {
    let len = audio.len();
    let mut response = audio.audio.into_response();
    let headers = response.headers_mut();
    headers.insert(
        header::CONTENT_TYPE,
        HeaderValue::from_static(audio.content_type),
    );
    headers.insert(header::CONTENT_LENGTH, HeaderValue::from(len));
    response
}

/// Shared by the public and practice synthesis routes.
pub(crate) async fn synthesize(
    state: &AppState,
    request: SynthesisRequest,
) -> Result<Response, ApiError> {
    let audio = state.speech.synthesize(&request).await?;
    Ok(audio_response(audio))
}

/// Handler for `POST /synthesize` and `POST /tts/synthesize`.
pub async fn synthesize_handler(
    Extension(state): Extension<Arc<AppState>>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Response, ApiError> {
    synthesize(&state, request).await
}

/// Handler for `GET /voices`.
pub async fn voices_handler(
    Extension(state): Extension<Arc<AppState>>,
    Query(query): Query<VoicesQuery>,
) -> Result<Json<Vec<VoiceDescriptor>>, ApiError> {
    let voices = state
        .speech
        .voices(query.language_code.as_deref())
        .await
        .map_err(|e| ApiError::Upstream {
            message: "Error al obtener las voces".to_string(),
            error: e.to_string(),
        })?;
    Ok(Json(voices))
}

/// Handler for `POST /ai/process`.
pub async fn ai_process_handler(Json(request): Json<AssistantRequest>) -> Json<AssistantResponse> {
    tracing::debug!(has_context = request.context.is_some(), "assistant request");
    Json(AssistantResponse {
        response: format!("Entiendo que quieres {}", request.user_input),
    })
}
