//! Answer grading for Vocalis.
//!
//! A student's spoken answer, transcribed to text, is sent to Google Gemini
//! together with the problem statement and a fixed Spanish instruction. The
//! reply is reduced to a [`FeedbackResult`](vocalis_types::FeedbackResult)
//! with an integer grade between 0 and 10. Grading never fails from the
//! caller's point of view: a missing key, an unreachable service and a
//! malformed reply all produce a zero-grade result with a diagnostic
//! analysis, and [`GradingOutcome`] says which of these happened.

pub mod client;
pub mod config;
pub mod error;
pub mod gateway;
pub mod prompt;
pub mod reply;

pub use client::GeminiClient;
pub use config::GeminiConfig;
pub use error::GradingError;
pub use gateway::{GradingGateway, GradingOutcome, MISSING_API_KEY_ANALYSIS};
pub use reply::{extract_json_candidate, normalize_reply};
