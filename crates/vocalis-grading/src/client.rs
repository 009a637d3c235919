use crate::config::GeminiConfig;
use crate::error::GradingError;
use crate::prompt::GenerateContentRequest;
use reqwest::Client as HttpClient;
use serde::Deserialize;

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct GenerateContentResponse {
    #[serde(default)]
    candidates: Vec<Candidate>,
    prompt_feedback: Option<PromptFeedback>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct Candidate {
    content: Option<CandidateContent>,
    finish_reason: Option<String>,
}

#[derive(Debug, Deserialize)]
struct CandidateContent {
    #[serde(default)]
    parts: Vec<CandidatePart>,
}

#[derive(Debug, Deserialize)]
struct CandidatePart {
    text: Option<String>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct PromptFeedback {
    block_reason: Option<String>,
}

/// Thin `generateContent` client.
#[derive(Debug, Clone)]
pub struct GeminiClient {
    http: HttpClient,
    config: GeminiConfig,
}

impl GeminiClient {
    pub fn new(http: HttpClient, config: GeminiConfig) -> Self {
        Self { http, config }
    }

    pub fn config(&self) -> &GeminiConfig {
        &self.config
    }

    /// Sends one request and returns the concatenated text of the first
    /// candidate.
    pub async fn generate(&self, request: &GenerateContentRequest) -> Result<String, GradingError> {
        let response = self
            .http
            .post(self.config.generate_content_url())
            .header("x-goog-api-key", self.config.api_key.trim())
            .json(request)
            .send()
            .await?;

        let status = response.status();
        let body = response.text().await?;
        if !status.is_success() {
            let message = upstream_message(&body);
            tracing::warn!(status = status.as_u16(), %message, "Gemini request failed");
            return Err(GradingError::Upstream {
                status: status.as_u16(),
                message,
            });
        }

        let parsed: GenerateContentResponse = serde_json::from_str(&body)
            .map_err(|e| GradingError::Decode(e.to_string()))?;

        let Some(candidate) = parsed.candidates.into_iter().next() else {
            let reason = parsed
                .prompt_feedback
                .and_then(|f| f.block_reason)
                .unwrap_or_else(|| "NO_CANDIDATES".to_string());
            return Err(GradingError::EmptyReply {
                finish_reason: reason,
            });
        };

        let text: String = candidate
            .content
            .map(|c| c.parts.into_iter().filter_map(|p| p.text).collect())
            .unwrap_or_default();
        if text.trim().is_empty() {
            return Err(GradingError::EmptyReply {
                finish_reason: candidate
                    .finish_reason
                    .unwrap_or_else(|| "UNSPECIFIED".to_string()),
            });
        }

        Ok(text)
    }
}

/// Google APIs report `{"error": {"message": ...}}`.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| v["error"]["message"].as_str().map(str::to_string))
        .unwrap_or_else(|| body.trim().to_string())
}
