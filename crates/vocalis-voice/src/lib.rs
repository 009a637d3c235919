//! Speech synthesis for Vocalis.
//!
//! Text is rendered to MP3 by Amazon Polly. [`PollyClient`] speaks the
//! Polly REST API directly, signing each request with AWS Signature
//! Version 4, and [`SpeechGateway`] sits in front of it: it validates
//! input, applies the configured voice and language defaults, and hands
//! back audio ready to be served as `audio/mpeg`.
//!
//! Every call re-synthesizes. There is no caching and no retry.

pub mod config;
pub mod error;
pub mod gateway;
pub mod polly;
pub mod sigv4;

pub use config::PollyConfig;
pub use error::VoiceError;
pub use gateway::{SpeechGateway, SynthesizedAudio, MAX_TEXT_CHARS};
pub use polly::PollyClient;
