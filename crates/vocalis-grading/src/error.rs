use thiserror::Error;

#[derive(Error, Debug)]
pub enum GradingError {
    #[error("Gemini returned {status}: {message}")]
    Upstream { status: u16, message: String },

    #[error("{0}")]
    Transport(#[from] reqwest::Error),

    #[error("unexpected Gemini response: {0}")]
    Decode(String),

    #[error("Gemini returned no text (finish reason {finish_reason})")]
    EmptyReply { finish_reason: String },
}
