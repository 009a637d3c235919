//! Speech synthesis request and voice catalogue types.

use serde::{Deserialize, Serialize};

/// Body of a synthesis request as accepted by the HTTP surface.
///
/// Voice and language are optional; the speech gateway fills in its
/// configured defaults when they are absent.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct SynthesisRequest {
    pub text: String,
    #[serde(rename = "voiceId", default, skip_serializing_if = "Option::is_none")]
    pub voice_id: Option<String>,
    #[serde(
        rename = "languageCode",
        default,
        skip_serializing_if = "Option::is_none"
    )]
    pub language_code: Option<String>,
}

impl SynthesisRequest {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            voice_id: None,
            language_code: None,
        }
    }

    pub fn with_voice(mut self, voice_id: impl Into<String>) -> Self {
        self.voice_id = Some(voice_id.into());
        self
    }

    pub fn with_language(mut self, language_code: impl Into<String>) -> Self {
        self.language_code = Some(language_code.into());
        self
    }
}

/// A voice offered by the upstream text-to-speech service.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct VoiceDescriptor {
    pub id: String,
    pub name: String,
    pub gender: String,
    #[serde(rename = "languageCode")]
    pub language_code: String,
    #[serde(rename = "languageName")]
    pub language_name: String,
    #[serde(rename = "supportedEngines", default)]
    pub supported_engines: Vec<String>,
}
