//! Shared types for the Vocalis tutor backend.
//!
//! This crate holds the serde-facing data model used across the workspace:
//! the normalized grading result, speech synthesis requests and voice
//! descriptors, and the practice (logic problem) types. It has no I/O.

pub mod practice;
pub mod voice;

pub use practice::{
    Difficulty, DifficultyProgress, Problem, ProgressSummary, UnknownDifficulty,
};
pub use voice::{SynthesisRequest, VoiceDescriptor};

use serde::{Deserialize, Serialize};

/// Lowest grade a feedback result can carry.
pub const MIN_GRADE: i64 = 0;

/// Highest grade a feedback result can carry.
pub const MAX_GRADE: i64 = 10;

/// Normalized `{analysis, grade}` object returned by the grading gateway.
///
/// `grade` is always within [`MIN_GRADE`]..=[`MAX_GRADE`]; use
/// [`FeedbackResult::new`] which clamps, or [`FeedbackResult::fallback`] for
/// diagnostic zero-grade results.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct FeedbackResult {
    pub analysis: String,
    pub grade: i64,
}

impl FeedbackResult {
    /// Builds a result, clamping `grade` into the valid range.
    pub fn new(analysis: impl Into<String>, grade: i64) -> Self {
        Self {
            analysis: analysis.into(),
            grade: grade.clamp(MIN_GRADE, MAX_GRADE),
        }
    }

    /// A zero-grade result whose analysis carries a diagnostic message.
    pub fn fallback(analysis: impl Into<String>) -> Self {
        Self {
            analysis: analysis.into(),
            grade: MIN_GRADE,
        }
    }
}
