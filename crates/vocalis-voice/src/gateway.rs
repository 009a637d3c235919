use crate::config::PollyConfig;
use crate::error::VoiceError;
use crate::polly::PollyClient;
use vocalis_types::{SynthesisRequest, VoiceDescriptor};

/// Longest input Polly accepts for plain-text synthesis.
pub const MAX_TEXT_CHARS: usize = 3000;

const MP3_CONTENT_TYPE: &str = "audio/mpeg";

/// Rendered speech, ready to be served as-is.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SynthesizedAudio {
    pub audio: Vec<u8>,
    pub content_type: &'static str,
}

impl SynthesizedAudio {
    pub fn len(&self) -> usize {
        self.audio.len()
    }

    pub fn is_empty(&self) -> bool {
        self.audio.is_empty()
    }
}

/// Validates synthesis requests and forwards them to Polly.
#[derive(Debug, Clone)]
pub struct SpeechGateway {
    client: PollyClient,
}

impl SpeechGateway {
    pub fn new(client: PollyClient) -> Self {
        Self { client }
    }

    /// Builds a gateway with its own HTTP client.
    pub fn from_config(config: PollyConfig) -> Result<Self, VoiceError> {
        Ok(Self::new(PollyClient::new(reqwest::Client::new(), config)?))
    }

    pub fn config(&self) -> &PollyConfig {
        self.client.config()
    }

    /// Synthesizes `request.text` as MP3.
    ///
    /// Text that is empty after trimming is rejected without contacting
    /// Polly. Missing voice and language fall back to the configured
    /// defaults.
    pub async fn synthesize(
        &self,
        request: &SynthesisRequest,
    ) -> Result<SynthesizedAudio, VoiceError> {
        let text = request.text.trim();
        if text.is_empty() {
            return Err(VoiceError::EmptyText);
        }
        let len = text.chars().count();
        if len > MAX_TEXT_CHARS {
            return Err(VoiceError::TextTooLong {
                len,
                limit: MAX_TEXT_CHARS,
            });
        }

        let config = self.client.config();
        let voice_id = non_blank(request.voice_id.as_deref()).unwrap_or(&config.default_voice_id);
        let language_code = non_blank(request.language_code.as_deref())
            .unwrap_or(&config.default_language_code);

        tracing::debug!(voice_id, language_code, chars = len, "synthesizing speech");
        let audio = self
            .client
            .synthesize_speech(text, voice_id, language_code)
            .await?;
        tracing::info!(voice_id, bytes = audio.len(), "speech synthesized");

        Ok(SynthesizedAudio {
            audio,
            content_type: MP3_CONTENT_TYPE,
        })
    }

    /// Lists the voices Polly offers, optionally for one language.
    pub async fn voices(
        &self,
        language_code: Option<&str>,
    ) -> Result<Vec<VoiceDescriptor>, VoiceError> {
        self.client.describe_voices(non_blank(language_code)).await
    }
}

fn non_blank(value: Option<&str>) -> Option<&str> {
    value.map(str::trim).filter(|v| !v.is_empty())
}
