//! Logic practice: problems, graded submissions, progress.

use crate::api::ApiError;
use crate::api_speech;
use crate::middleware::CurrentUser;
use crate::practice;
use crate::AppState;
use axum::{
    extract::{Extension, Form, Json, Query},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use vocalis_grading::GradingOutcome;
use vocalis_types::{Difficulty, FeedbackResult, ProgressSummary, SynthesisRequest};

#[derive(Debug, Deserialize)]
pub struct ProblemQuery {
    pub difficulty: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct NoProblemResponse {
    pub message: String,
}

#[derive(Debug, Deserialize)]
pub struct SubmitAnswerForm {
    pub problem_id: String,
    pub user_answer: String,
}

/// Handler for `GET /logic/problem`.
pub async fn problem_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Query(query): Query<ProblemQuery>,
) -> Result<Response, ApiError> {
    let difficulty = match query.difficulty.as_deref().map(str::trim) {
        None => None,
        Some(label) => Some(label.parse::<Difficulty>().map_err(|e| ApiError::Validation {
            field: "difficulty",
            message: e.to_string(),
        })?),
    };

    let user_id = user.id;
    let problem = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db)?;
        practice::random_unsolved_problem(&conn, user_id, difficulty).map_err(ApiError::db)
    })
    .await
    .map_err(ApiError::join)??;

    Ok(match problem {
        Some(problem) => {
            tracing::info!(user_id, problem_id = problem.id, "serving problem");
            Json(problem).into_response()
        }
        None => Json(NoProblemResponse {
            message: practice::all_solved_message(difficulty),
        })
        .into_response(),
    })
}

/// Handler for `POST /logic/submit_answer`.
///
/// The submission is graded and then stored. A storage failure is logged
/// and the feedback is still returned.
pub async fn submit_answer_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Form(form): Form<SubmitAnswerForm>,
) -> Result<Json<FeedbackResult>, ApiError> {
    let problem_id: i64 = form
        .problem_id
        .trim()
        .parse()
        .map_err(|_| ApiError::Validation {
            field: "problem_id",
            message: "ID de problema inválido.".to_string(),
        })?;

    let lookup_state = state.clone();
    let problem = tokio::task::spawn_blocking(move || {
        let conn = lookup_state.pool.get().map_err(ApiError::db)?;
        practice::get_problem(&conn, problem_id).map_err(ApiError::db)
    })
    .await
    .map_err(ApiError::join)??
    .ok_or_else(|| {
        ApiError::NotFound("El problema especificado no fue encontrado.".to_string())
    })?;

    let outcome = state.grading.grade(&problem.text, &form.user_answer).await;
    if let GradingOutcome::UpstreamFailed { error, .. } = &outcome {
        tracing::warn!(problem_id, %error, "grading fell back after upstream failure");
    }
    let feedback = outcome.into_feedback();

    let user_id = user.id;
    let stored = feedback.clone();
    let saved = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(|e| e.to_string())?;
        practice::record_submission(&conn, user_id, &problem, &form.user_answer, &stored)
            .map_err(|e| e.to_string())
    })
    .await;

    match saved {
        Ok(Ok(submission_id)) => {
            tracing::info!(user_id, problem_id, submission_id, grade = feedback.grade, "submission recorded");
        }
        Ok(Err(error)) => {
            tracing::error!(user_id, problem_id, %error, "failed to record submission");
        }
        Err(error) => {
            tracing::error!(user_id, problem_id, %error, "submission task failed");
        }
    }

    Ok(Json(feedback))
}

/// Handler for `GET /logic/progress`.
pub async fn progress_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
) -> Result<Json<ProgressSummary>, ApiError> {
    let user_id = user.id;
    let summary = tokio::task::spawn_blocking(move || {
        let conn = state.pool.get().map_err(ApiError::db)?;
        practice::progress(&conn, user_id).map_err(ApiError::db)
    })
    .await
    .map_err(ApiError::join)??;

    Ok(Json(summary))
}

/// Handler for `POST /logic/tts`.
pub async fn tts_handler(
    Extension(state): Extension<Arc<AppState>>,
    Extension(CurrentUser(user)): Extension<CurrentUser>,
    Json(request): Json<SynthesisRequest>,
) -> Result<Response, ApiError> {
    tracing::debug!(user_id = user.id, "practice speech request");
    api_speech::synthesize(&state, request).await
}
