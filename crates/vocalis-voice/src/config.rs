use serde::Deserialize;
use std::fmt;

fn default_region() -> String {
    "us-east-1".to_string()
}

fn default_engine() -> String {
    "neural".to_string()
}

fn default_voice_id() -> String {
    "Conchita".to_string()
}

fn default_language_code() -> String {
    "es-ES".to_string()
}

/// Polly credentials and synthesis defaults.
#[derive(Clone, Deserialize)]
pub struct PollyConfig {
    #[serde(default = "default_region")]
    pub region: String,
    #[serde(default)]
    pub access_key_id: String,
    #[serde(default)]
    pub secret_access_key: String,
    #[serde(default)]
    pub session_token: Option<String>,
    /// Overrides `https://polly.{region}.amazonaws.com`.
    #[serde(default)]
    pub endpoint: Option<String>,
    /// Polly engine, `neural` or `standard`.
    #[serde(default = "default_engine")]
    pub engine: String,
    #[serde(default = "default_voice_id")]
    pub default_voice_id: String,
    #[serde(default = "default_language_code")]
    pub default_language_code: String,
}

impl Default for PollyConfig {
    fn default() -> Self {
        Self {
            region: default_region(),
            access_key_id: String::new(),
            secret_access_key: String::new(),
            session_token: None,
            endpoint: None,
            engine: default_engine(),
            default_voice_id: default_voice_id(),
            default_language_code: default_language_code(),
        }
    }
}

impl fmt::Debug for PollyConfig {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("PollyConfig")
            .field("region", &self.region)
            .field("access_key_id", &self.access_key_id)
            .field("secret_access_key", &"[REDACTED]")
            .field(
                "session_token",
                &self.session_token.as_ref().map(|_| "[REDACTED]"),
            )
            .field("endpoint", &self.endpoint)
            .field("engine", &self.engine)
            .field("default_voice_id", &self.default_voice_id)
            .field("default_language_code", &self.default_language_code)
            .finish()
    }
}

impl PollyConfig {
    pub fn new(
        region: impl Into<String>,
        access_key_id: impl Into<String>,
        secret_access_key: impl Into<String>,
    ) -> Self {
        Self {
            region: region.into(),
            access_key_id: access_key_id.into(),
            secret_access_key: secret_access_key.into(),
            ..Self::default()
        }
    }

    pub fn has_credentials(&self) -> bool {
        !self.access_key_id.is_empty() && !self.secret_access_key.is_empty()
    }

    /// Base URL requests are sent to, without a trailing slash.
    pub fn endpoint_url(&self) -> String {
        match &self.endpoint {
            Some(endpoint) if !endpoint.trim().is_empty() => {
                endpoint.trim().trim_end_matches('/').to_string()
            }
            _ => format!("https://polly.{}.amazonaws.com", self.region),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn endpoint_defaults_to_regional_host() {
        let config = PollyConfig::new("eu-west-1", "AKID", "SECRET");
        assert_eq!(config.endpoint_url(), "https://polly.eu-west-1.amazonaws.com");
    }

    #[test]
    fn endpoint_override_drops_trailing_slash() {
        let config = PollyConfig {
            endpoint: Some("http://127.0.0.1:9000/".to_string()),
            ..PollyConfig::default()
        };
        assert_eq!(config.endpoint_url(), "http://127.0.0.1:9000");
    }

    #[test]
    fn debug_redacts_secrets() {
        let config = PollyConfig {
            session_token: Some("tok".to_string()),
            ..PollyConfig::new("us-east-1", "AKID", "very-secret")
        };
        let rendered = format!("{config:?}");
        assert!(!rendered.contains("very-secret"));
        assert!(!rendered.contains("\"tok\""));
        assert!(rendered.contains("AKID"));
    }
}
