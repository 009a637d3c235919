//! Turning a free-form model reply into a [`FeedbackResult`].
//!
//! The model is asked for a bare `{"analysis", "grade"}` object but often
//! wraps it in a Markdown fence or surrounds it with prose. Extraction takes
//! the first fenced object if there is one and the whole reply otherwise.
//! Anything that does not parse into the expected shape becomes a zero-grade
//! result whose analysis quotes the raw reply, so a bad reply never fails
//! the caller.

use regex::Regex;
use serde_json::Value;
use std::sync::LazyLock;
use vocalis_types::{FeedbackResult, MAX_GRADE, MIN_GRADE};

static FENCED_OBJECT: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?is)```(?:json)?\s*(\{.*?\})\s*```").expect("valid fenced object regex")
});

const UNEXPECTED_SHAPE: &str = "Respuesta de IA (estructura JSON inesperada):";
const NOT_JSON: &str = "Respuesta de IA (no JSON / error parseo):";
const NOTHING_EXTRACTED: &str = "Respuesta de IA (sin JSON extraíble):";

/// The text that should hold the JSON object, if any.
///
/// Returns the braces of the first ```` ``` ```` / ```` ```json ```` fence,
/// else the trimmed reply, else `None` for a blank reply.
pub fn extract_json_candidate(raw: &str) -> Option<String> {
    if let Some(captures) = FENCED_OBJECT.captures(raw) {
        return captures.get(1).map(|m| m.as_str().to_string());
    }
    let trimmed = raw.trim();
    (!trimmed.is_empty()).then(|| trimmed.to_string())
}

/// Normalizes a model reply. Never fails.
pub fn normalize_reply(raw: &str) -> FeedbackResult {
    let raw = raw.trim();

    let Some(candidate) = extract_json_candidate(raw) else {
        tracing::warn!("model reply was empty");
        return FeedbackResult::fallback(format!("{NOTHING_EXTRACTED} {raw}"));
    };

    let value: Value = match serde_json::from_str(&candidate) {
        Ok(value) => value,
        Err(e) => {
            tracing::warn!(error = %e, "model reply is not JSON");
            return FeedbackResult::fallback(format!("{NOT_JSON} {raw}"));
        }
    };

    let (Some(analysis), Some(grade)) = (
        value.get("analysis").and_then(Value::as_str),
        value.get("grade"),
    ) else {
        tracing::warn!("model reply JSON lacks a string analysis and a grade");
        return FeedbackResult::fallback(format!("{UNEXPECTED_SHAPE} {raw}"));
    };

    let grade = coerce_grade(grade).unwrap_or_else(|| {
        tracing::warn!(%grade, "non-numeric grade in model reply; using 0");
        MIN_GRADE
    });

    FeedbackResult::new(analysis.trim(), grade)
}

/// Numbers and numeric strings, clamped to the grade range and rounded
/// half-to-even. `None` for anything else.
pub fn coerce_grade(value: &Value) -> Option<i64> {
    let number = match value {
        Value::Number(n) => n.as_f64()?,
        Value::String(s) => s.trim().parse::<f64>().ok()?,
        _ => return None,
    };
    if !number.is_finite() {
        return None;
    }
    let clamped = number.clamp(MIN_GRADE as f64, MAX_GRADE as f64);
    Some(clamped.round_ties_even() as i64)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn bare_object_is_used_as_is() {
        assert_eq!(
            extract_json_candidate("  {\"grade\": 1}  ").as_deref(),
            Some("{\"grade\": 1}")
        );
    }

    #[test]
    fn fenced_object_inside_prose_is_extracted() {
        let raw = "Claro, aquí va:\n```json\n{\"analysis\": \"bien\", \"grade\": 8}\n```\nSaludos";
        assert_eq!(
            extract_json_candidate(raw).as_deref(),
            Some("{\"analysis\": \"bien\", \"grade\": 8}")
        );
    }

    #[test]
    fn fence_match_ignores_case_and_language_tag() {
        let raw = "```JSON {\"a\":1} ```";
        assert_eq!(extract_json_candidate(raw).as_deref(), Some("{\"a\":1}"));
        let raw = "```\n{\"a\":\n2}\n```";
        assert_eq!(extract_json_candidate(raw).as_deref(), Some("{\"a\":\n2}"));
    }

    #[test]
    fn blank_reply_has_no_candidate() {
        assert_eq!(extract_json_candidate(""), None);
        assert_eq!(extract_json_candidate(" \n\t "), None);
    }

    #[test]
    fn fenced_and_bare_replies_normalize_identically() {
        let bare = r#"{"analysis": "Correcto", "grade": 9}"#;
        let fenced = format!("Mi evaluación:\n```json\n{bare}\n```");
        assert_eq!(normalize_reply(bare), normalize_reply(&fenced));
        assert_eq!(normalize_reply(bare), FeedbackResult::new("Correcto", 9));
    }

    #[test]
    fn grade_is_clamped() {
        assert_eq!(normalize_reply(r#"{"analysis":"x","grade":15}"#).grade, 10);
        assert_eq!(normalize_reply(r#"{"analysis":"x","grade":-3}"#).grade, 0);
    }

    #[test]
    fn non_numeric_grade_keeps_analysis() {
        assert_eq!(
            normalize_reply(r#"{"analysis":"x","grade":"three"}"#),
            FeedbackResult::new("x", 0)
        );
        assert_eq!(
            normalize_reply(r#"{"analysis":" x ","grade":null}"#),
            FeedbackResult::new("x", 0)
        );
    }

    #[test]
    fn fractional_grades_round_half_to_even() {
        assert_eq!(coerce_grade(&json!(7.5)), Some(8));
        assert_eq!(coerce_grade(&json!(6.5)), Some(6));
        assert_eq!(coerce_grade(&json!(6.51)), Some(7));
        assert_eq!(coerce_grade(&json!(" 4 ")), Some(4));
        assert_eq!(coerce_grade(&json!("NaN")), None);
        assert_eq!(coerce_grade(&json!(true)), None);
    }

    #[test]
    fn prose_reply_falls_back_with_raw_text() {
        let result = normalize_reply("  Buen intento, pero falta el bucle.  ");
        assert_eq!(result.grade, 0);
        assert_eq!(
            result.analysis,
            "Respuesta de IA (no JSON / error parseo): Buen intento, pero falta el bucle."
        );
    }

    #[test]
    fn wrong_shape_falls_back() {
        for raw in [
            r#"{"analysis": 5, "grade": 5}"#,
            r#"{"analysis": "falta nota"}"#,
            r#"[1, 2, 3]"#,
            r#""solo texto""#,
        ] {
            let result = normalize_reply(raw);
            assert_eq!(result.grade, 0, "{raw}");
            assert_eq!(result.analysis, format!("{UNEXPECTED_SHAPE} {raw}"));
        }
    }

    #[test]
    fn empty_reply_falls_back() {
        let result = normalize_reply("   ");
        assert_eq!(result.grade, 0);
        assert!(result.analysis.starts_with(NOTHING_EXTRACTED));
    }

    #[test]
    fn every_reply_yields_grade_in_range() {
        let replies = [
            "",
            "hola",
            "{}",
            r#"{"analysis":"a","grade":1e300}"#,
            r#"{"analysis":"a","grade":-1e300}"#,
            r#"{"analysis":"a","grade":"11"}"#,
            r#"{"analysis":"a","grade":[7]}"#,
            "```json\n{\"analysis\":\"a\",\"grade\":10}\n```",
            "```json\n{broken\n```",
        ];
        for raw in replies {
            let grade = normalize_reply(raw).grade;
            assert!((MIN_GRADE..=MAX_GRADE).contains(&grade), "{raw} -> {grade}");
        }
    }
}
