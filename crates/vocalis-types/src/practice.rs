//! Logic practice problems and per-user progress.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

/// Problem difficulty tiers, stored and serialized by their Spanish labels.
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    Basico,
    Intermedio,
    Avanzado,
}

impl Difficulty {
    pub const ALL: [Difficulty; 3] = [Self::Basico, Self::Intermedio, Self::Avanzado];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Basico => "basico",
            Self::Intermedio => "intermedio",
            Self::Avanzado => "avanzado",
        }
    }
}

impl fmt::Display for Difficulty {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Error)]
#[error("unknown difficulty: {0}")]
pub struct UnknownDifficulty(pub String);

impl FromStr for Difficulty {
    type Err = UnknownDifficulty;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s {
            "basico" => Ok(Self::Basico),
            "intermedio" => Ok(Self::Intermedio),
            "avanzado" => Ok(Self::Avanzado),
            other => Err(UnknownDifficulty(other.to_string())),
        }
    }
}

/// A logic problem presented to the student.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Problem {
    pub id: i64,
    pub text: String,
    pub difficulty: Difficulty,
    #[serde(default)]
    pub topics: Vec<String>,
}

/// Solved count and mean grade for one difficulty tier.
#[derive(Debug, Clone, Copy, PartialEq, Default, Serialize, Deserialize)]
pub struct DifficultyProgress {
    pub solved_count: u32,
    pub average_grade: f64,
}

/// Aggregated progress across all submissions of a user.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ProgressSummary {
    pub total_solved: u32,
    pub progress_by_difficulty: BTreeMap<Difficulty, DifficultyProgress>,
    pub overall_average_grade: f64,
    pub message: String,
}

impl ProgressSummary {
    /// Builds a summary from `(difficulty, grade)` pairs.
    ///
    /// Every tier appears in the output, with zeroes when it has no
    /// submissions. Averages are rounded to two decimals.
    pub fn from_grades(grades: impl IntoIterator<Item = (Difficulty, i64)>) -> Self {
        let mut sums: BTreeMap<Difficulty, (u32, i64)> =
            Difficulty::ALL.iter().map(|d| (*d, (0, 0))).collect();
        let mut total = 0u32;
        let mut total_sum = 0i64;

        for (difficulty, grade) in grades {
            let entry = sums.entry(difficulty).or_default();
            entry.0 += 1;
            entry.1 += grade;
            total += 1;
            total_sum += grade;
        }

        let progress_by_difficulty = sums
            .into_iter()
            .map(|(difficulty, (count, sum))| {
                (
                    difficulty,
                    DifficultyProgress {
                        solved_count: count,
                        average_grade: round2(sum, count),
                    },
                )
            })
            .collect();

        Self {
            total_solved: total,
            progress_by_difficulty,
            overall_average_grade: round2(total_sum, total),
            message: "Tu progreso ha sido cargado.".to_string(),
        }
    }
}

fn round2(sum: i64, count: u32) -> f64 {
    if count == 0 {
        return 0.0;
    }
    let avg = sum as f64 / f64::from(count);
    (avg * 100.0).round() / 100.0
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn difficulty_round_trips_through_labels() {
        for d in Difficulty::ALL {
            assert_eq!(d.as_str().parse::<Difficulty>().unwrap(), d);
        }
        assert!("experto".parse::<Difficulty>().is_err());
    }

    #[test]
    fn progress_covers_every_tier() {
        let summary = ProgressSummary::from_grades(vec![
            (Difficulty::Basico, 7),
            (Difficulty::Basico, 8),
            (Difficulty::Avanzado, 10),
        ]);

        assert_eq!(summary.total_solved, 3);
        assert_eq!(summary.progress_by_difficulty.len(), 3);

        let basico = summary.progress_by_difficulty[&Difficulty::Basico];
        assert_eq!(basico.solved_count, 2);
        assert_eq!(basico.average_grade, 7.5);

        let intermedio = summary.progress_by_difficulty[&Difficulty::Intermedio];
        assert_eq!(intermedio.solved_count, 0);
        assert_eq!(intermedio.average_grade, 0.0);

        assert_eq!(summary.overall_average_grade, 8.33);
    }

    #[test]
    fn progress_serializes_with_label_keys() {
        let summary = ProgressSummary::from_grades(Vec::new());
        let json = serde_json::to_value(&summary).unwrap();
        assert_eq!(json["progress_by_difficulty"]["basico"]["solved_count"], 0);
        assert_eq!(json["overall_average_grade"], 0.0);
    }
}
