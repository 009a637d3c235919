use serde::Deserialize;
use std::fmt;

pub const DEFAULT_MODEL: &str = "gemini-1.5-flash";
pub const DEFAULT_BASE_URL: &str = "https://generativelanguage.googleapis.com/v1beta";

fn default_model() -> String {
    DEFAULT_MODEL.to_string()
}

fn default_base_url() -> String {
    DEFAULT_BASE_URL.to_string()
}

/// Gemini credentials and endpoint.
///
/// An empty `api_key` is valid configuration: grading then answers with a
/// fixed diagnostic result instead of calling the model.
#[derive(Clone, Deserialize)]
pub struct GeminiConfig {
    #[serde(default)]
    pub api_key: String,
    #[serde(default = "default_model")]
    pub model: String,
    #[serde(default = "default_base_url")]
    pub base_url: String,
}

impl Default for GeminiConfig {
    fn default() -> Self {
        Self {
            api_key: String::new(),
            model: default_model(),
            base_url: default_base_url(),
        }
    }
}

impl fmt::Debug for GeminiConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("GeminiConfig")
            .field(
                "api_key",
                &if self.has_api_key() { "[REDACTED]" } else { "" },
            )
            .field("model", &self.model)
            .field("base_url", &self.base_url)
            .finish()
    }
}

impl GeminiConfig {
    pub fn new(api_key: impl Into<String>) -> Self {
        Self {
            api_key: api_key.into(),
            ..Self::default()
        }
    }

    pub fn has_api_key(&self) -> bool {
        !self.api_key.trim().is_empty()
    }

    /// `{base_url}/models/{model}:generateContent`
    pub fn generate_content_url(&self) -> String {
        format!(
            "{}/models/{}:generateContent",
            self.base_url.trim().trim_end_matches('/'),
            self.model.trim()
        )
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn url_joins_base_and_model() {
        let config = GeminiConfig {
            base_url: "http://127.0.0.1:8080/v1beta/".to_string(),
            ..GeminiConfig::new("k")
        };
        assert_eq!(
            config.generate_content_url(),
            "http://127.0.0.1:8080/v1beta/models/gemini-1.5-flash:generateContent"
        );
    }

    #[test]
    fn whitespace_key_counts_as_missing() {
        assert!(!GeminiConfig::new("   ").has_api_key());
        assert!(GeminiConfig::new("abc").has_api_key());
    }

    #[test]
    fn debug_hides_key() {
        let rendered = format!("{:?}", GeminiConfig::new("AIza-secret"));
        assert!(!rendered.contains("AIza-secret"));
        assert!(rendered.contains("[REDACTED]"));
    }
}
