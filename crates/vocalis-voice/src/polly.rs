//! Amazon Polly REST client.

use crate::config::PollyConfig;
use crate::error::VoiceError;
use crate::sigv4::{self, RequestParts, SigningParams};
use chrono::Utc;
use reqwest::{Client as HttpClient, Method, Response, Url};
use serde::{Deserialize, Serialize};
use vocalis_types::VoiceDescriptor;

const SERVICE: &str = "polly";
const SPEECH_PATH: &str = "/v1/speech";
const VOICES_PATH: &str = "/v1/voices";

#[derive(Serialize)]
#[serde(rename_all = "PascalCase")]
struct SynthesizeSpeechBody<'a> {
    engine: &'a str,
    language_code: &'a str,
    output_format: &'a str,
    text: &'a str,
    voice_id: &'a str,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct DescribeVoicesOutput {
    #[serde(default)]
    voices: Vec<PollyVoice>,
    next_token: Option<String>,
}

#[derive(Deserialize)]
#[serde(rename_all = "PascalCase")]
struct PollyVoice {
    id: String,
    #[serde(default)]
    name: String,
    #[serde(default)]
    gender: String,
    #[serde(default)]
    language_code: String,
    #[serde(default)]
    language_name: String,
    #[serde(default)]
    supported_engines: Vec<String>,
}

impl From<PollyVoice> for VoiceDescriptor {
    fn from(v: PollyVoice) -> Self {
        Self {
            id: v.id,
            name: v.name,
            gender: v.gender,
            language_code: v.language_code,
            language_name: v.language_name,
            supported_engines: v.supported_engines,
        }
    }
}

/// Signs and sends Polly API calls.
#[derive(Debug, Clone)]
pub struct PollyClient {
    http: HttpClient,
    config: PollyConfig,
    base: Url,
    host: String,
}

impl PollyClient {
    /// # Errors
    ///
    /// [`VoiceError::Config`] if the endpoint is not a usable URL.
    pub fn new(http: HttpClient, config: PollyConfig) -> Result<Self, VoiceError> {
        let endpoint = config.endpoint_url();
        let base = Url::parse(&endpoint)
            .map_err(|e| VoiceError::Config(format!("invalid Polly endpoint {endpoint}: {e}")))?;
        let host = match (base.host_str(), base.port()) {
            (Some(host), Some(port)) => format!("{host}:{port}"),
            (Some(host), None) => host.to_string(),
            (None, _) => {
                return Err(VoiceError::Config(format!(
                    "Polly endpoint has no host: {endpoint}"
                )))
            }
        };

        if !config.has_credentials() {
            tracing::warn!("Polly credentials not configured; synthesis requests will fail");
        }

        Ok(Self {
            http,
            config,
            base,
            host,
        })
    }

    pub fn config(&self) -> &PollyConfig {
        &self.config
    }

    /// Calls `SynthesizeSpeech` and returns the complete MP3 stream.
    pub async fn synthesize_speech(
        &self,
        text: &str,
        voice_id: &str,
        language_code: &str,
    ) -> Result<Vec<u8>, VoiceError> {
        let body = serde_json::to_vec(&SynthesizeSpeechBody {
            engine: &self.config.engine,
            language_code,
            output_format: "mp3",
            text,
            voice_id,
        })
        .map_err(|e| VoiceError::Decode(format!("failed to encode request: {e}")))?;

        let response = self.send(Method::POST, SPEECH_PATH, &[], body).await?;
        let audio = response.bytes().await?;
        Ok(audio.to_vec())
    }

    /// Calls `DescribeVoices`, following pagination to the end.
    pub async fn describe_voices(
        &self,
        language_code: Option<&str>,
    ) -> Result<Vec<VoiceDescriptor>, VoiceError> {
        let mut voices = Vec::new();
        let mut next_token: Option<String> = None;

        loop {
            let mut query: Vec<(&str, &str)> = Vec::new();
            if let Some(code) = language_code {
                query.push(("LanguageCode", code));
            }
            if let Some(token) = next_token.as_deref() {
                query.push(("NextToken", token));
            }

            let response = self.send(Method::GET, VOICES_PATH, &query, Vec::new()).await?;
            let page: DescribeVoicesOutput = response
                .json()
                .await
                .map_err(|e| VoiceError::Decode(format!("invalid DescribeVoices body: {e}")))?;

            voices.extend(page.voices.into_iter().map(VoiceDescriptor::from));

            match page.next_token {
                Some(token) if !token.is_empty() => next_token = Some(token),
                _ => break,
            }
        }

        Ok(voices)
    }

    async fn send(
        &self,
        method: Method,
        path: &str,
        query: &[(&str, &str)],
        body: Vec<u8>,
    ) -> Result<Response, VoiceError> {
        let mut url = self.base.clone();
        url.set_path(path);
        if !query.is_empty() {
            let encoded: Vec<String> = query
                .iter()
                .map(|(k, v)| format!("{}={}", sigv4::uri_encode(k), sigv4::uri_encode(v)))
                .collect();
            url.set_query(Some(&encoded.join("&")));
        }

        let signed = sigv4::sign(
            &SigningParams {
                access_key_id: &self.config.access_key_id,
                secret_access_key: &self.config.secret_access_key,
                session_token: self.config.session_token.as_deref(),
                region: &self.config.region,
                service: SERVICE,
            },
            &RequestParts {
                method: method.as_str(),
                host: &self.host,
                path,
                query,
                payload: &body,
            },
            Utc::now(),
        );

        let mut request = self
            .http
            .request(method, url)
            .header("x-amz-date", &signed.amz_date)
            .header("authorization", &signed.authorization);
        if let Some(token) = &signed.security_token {
            request = request.header("x-amz-security-token", token);
        }
        if !body.is_empty() {
            request = request.header("content-type", "application/json").body(body);
        }

        let response = request.send().await?;
        let status = response.status();
        if status.is_success() {
            return Ok(response);
        }

        let text = response.text().await.unwrap_or_default();
        let message = upstream_message(&text);
        tracing::warn!(status = status.as_u16(), %message, path, "Polly request failed");
        Err(VoiceError::Upstream {
            status: status.as_u16(),
            message,
        })
    }
}

/// Polly errors carry `message` (or `Message`); fall back to the raw body.
fn upstream_message(body: &str) -> String {
    serde_json::from_str::<serde_json::Value>(body)
        .ok()
        .and_then(|v| {
            v.get("message")
                .or_else(|| v.get("Message"))
                .and_then(|m| m.as_str())
                .map(str::to_string)
        })
        .unwrap_or_else(|| body.trim().to_string())
}
