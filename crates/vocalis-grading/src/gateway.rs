use crate::client::GeminiClient;
use crate::config::GeminiConfig;
use crate::error::GradingError;
use crate::prompt::GenerateContentRequest;
use crate::reply::normalize_reply;
use vocalis_types::FeedbackResult;

pub const MISSING_API_KEY_ANALYSIS: &str = "Error interno: API Key de Gemini no configurada.";

const UPSTREAM_FAILURE_PREFIX: &str = "Error al contactar al asistente de IA:";

/// What happened while grading. Every variant carries a well-formed
/// [`FeedbackResult`] that can be returned to the student as-is.
#[derive(Debug)]
pub enum GradingOutcome {
    /// The model answered. The result may still be a shape fallback.
    Graded(FeedbackResult),
    /// Gemini could not be reached or rejected the request.
    UpstreamFailed {
        feedback: FeedbackResult,
        error: GradingError,
    },
    /// No API key is configured; nothing was sent.
    CredentialMissing(FeedbackResult),
}

impl GradingOutcome {
    pub fn feedback(&self) -> &FeedbackResult {
        match self {
            Self::Graded(feedback)
            | Self::UpstreamFailed { feedback, .. }
            | Self::CredentialMissing(feedback) => feedback,
        }
    }

    pub fn into_feedback(self) -> FeedbackResult {
        match self {
            Self::Graded(feedback)
            | Self::UpstreamFailed { feedback, .. }
            | Self::CredentialMissing(feedback) => feedback,
        }
    }
}

/// Grades transcribed answers with Gemini.
#[derive(Debug, Clone)]
pub struct GradingGateway {
    client: GeminiClient,
}

impl GradingGateway {
    pub fn new(client: GeminiClient) -> Self {
        Self { client }
    }

    pub fn from_config(config: GeminiConfig) -> Self {
        if !config.has_api_key() {
            tracing::warn!("Gemini API key not configured; grading will return a fixed diagnostic");
        }
        Self::new(GeminiClient::new(reqwest::Client::new(), config))
    }

    pub fn is_configured(&self) -> bool {
        self.client.config().has_api_key()
    }

    pub async fn grade(&self, problem_text: &str, user_answer: &str) -> GradingOutcome {
        if !self.is_configured() {
            tracing::error!("grading requested without a Gemini API key");
            return GradingOutcome::CredentialMissing(FeedbackResult::fallback(
                MISSING_API_KEY_ANALYSIS,
            ));
        }

        let request = GenerateContentRequest::grading(problem_text, user_answer);
        tracing::info!(model = %self.client.config().model, "requesting grade from Gemini");

        match self.client.generate(&request).await {
            Ok(reply) => {
                tracing::debug!(reply = %reply, "raw Gemini reply");
                let feedback = normalize_reply(&reply);
                tracing::info!(grade = feedback.grade, "answer graded");
                GradingOutcome::Graded(feedback)
            }
            Err(error) => {
                tracing::error!(%error, "grading request failed");
                GradingOutcome::UpstreamFailed {
                    feedback: FeedbackResult::fallback(format!(
                        "{UPSTREAM_FAILURE_PREFIX} {error}"
                    )),
                    error,
                }
            }
        }
    }
}
