//! Problem catalogue and submission history.
//!
//! A problem counts as solved for a user once they have submitted any
//! answer to it, whatever the grade.

use rusqlite::{params, Connection, OptionalExtension, Row};
use vocalis_types::{Difficulty, FeedbackResult, Problem, ProgressSummary};

fn problem_from_row(row: &Row<'_>) -> rusqlite::Result<Problem> {
    let difficulty: String = row.get(2)?;
    let topics_json: String = row.get(3)?;
    Ok(Problem {
        id: row.get(0)?,
        text: row.get(1)?,
        difficulty: difficulty.parse().map_err(|e| {
            rusqlite::Error::FromSqlConversionFailure(2, rusqlite::types::Type::Text, Box::new(e))
        })?,
        topics: serde_json::from_str(&topics_json).unwrap_or_default(),
    })
}

pub fn get_problem(conn: &Connection, problem_id: i64) -> rusqlite::Result<Option<Problem>> {
    conn.query_row(
        "SELECT id, text, difficulty, topics_json FROM problems WHERE id = ?1",
        [problem_id],
        problem_from_row,
    )
    .optional()
}

/// A random problem `user_id` has not answered yet, optionally limited to
/// one difficulty.
pub fn random_unsolved_problem(
    conn: &Connection,
    user_id: i64,
    difficulty: Option<Difficulty>,
) -> rusqlite::Result<Option<Problem>> {
    conn.query_row(
        "SELECT id, text, difficulty, topics_json FROM problems p
         WHERE (?2 IS NULL OR p.difficulty = ?2)
           AND NOT EXISTS (
               SELECT 1 FROM submissions s WHERE s.user_id = ?1 AND s.problem_id = p.id
           )
         ORDER BY RANDOM()
         LIMIT 1",
        params![user_id, difficulty.map(Difficulty::as_str)],
        problem_from_row,
    )
    .optional()
}

pub fn record_submission(
    conn: &Connection,
    user_id: i64,
    problem: &Problem,
    user_answer: &str,
    feedback: &FeedbackResult,
) -> rusqlite::Result<i64> {
    conn.execute(
        "INSERT INTO submissions
             (user_id, problem_id, problem_difficulty, user_answer, analysis, grade)
         VALUES (?1, ?2, ?3, ?4, ?5, ?6)",
        params![
            user_id,
            problem.id,
            problem.difficulty.as_str(),
            user_answer,
            feedback.analysis,
            feedback.grade,
        ],
    )?;
    Ok(conn.last_insert_rowid())
}

/// Summarizes every submission of `user_id`.
///
/// Rows with an unrecognized difficulty are skipped.
pub fn progress(conn: &Connection, user_id: i64) -> rusqlite::Result<ProgressSummary> {
    let mut stmt = conn.prepare(
        "SELECT problem_difficulty, grade FROM submissions WHERE user_id = ?1 ORDER BY id",
    )?;
    let rows = stmt.query_map([user_id], |row| {
        Ok((row.get::<_, String>(0)?, row.get::<_, i64>(1)?))
    })?;

    let mut grades = Vec::new();
    for row in rows {
        let (difficulty, grade) = row?;
        match difficulty.parse::<Difficulty>() {
            Ok(d) => grades.push((d, grade)),
            Err(e) => tracing::warn!(user_id, error = %e, "skipping submission"),
        }
    }

    Ok(ProgressSummary::from_grades(grades))
}

/// Message returned when nothing is left to practise.
pub fn all_solved_message(difficulty: Option<Difficulty>) -> String {
    match difficulty {
        Some(d) => format!("¡Felicidades! Has resuelto todos los problemas de nivel '{d}'."),
        None => "¡Felicidades! Has resuelto todos los problemas.".to_string(),
    }
}
