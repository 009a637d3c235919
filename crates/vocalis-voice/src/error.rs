use thiserror::Error;

#[derive(Error, Debug)]
pub enum VoiceError {
    #[error("text must not be empty")]
    EmptyText,

    #[error("text exceeds {limit} characters (got {len})")]
    TextTooLong { len: usize, limit: usize },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("speech service returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("speech service unreachable: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected speech service response: {0}")]
    Decode(String),
}

impl VoiceError {
    /// Whether the caller sent something unusable, as opposed to the
    /// upstream service failing.
    pub fn is_client_error(&self) -> bool {
        matches!(self, Self::EmptyText | Self::TextTooLong { .. })
    }
}
