/*!
 * Manual per-criterion scores.
 *
 * Every rubric row gets one score entry, in rubric order, starting at the
 * configured default. Scores are whole numbers from 0 to 10.
 */

use std::fmt;
use std::str::FromStr;

use regex::Regex;

use crate::errors::ScoreError;
use crate::rubric::Rubric;

/// Highest score a criterion can receive
pub const MAX_SCORE: u8 = 10;

/// A score between 0 and 10 inclusive
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord)]
pub struct Score(u8);

impl Score {
    pub fn new(value: i64) -> Result<Self, ScoreError> {
        if (0..=MAX_SCORE as i64).contains(&value) {
            Ok(Self(value as u8))
        } else {
            Err(ScoreError::OutOfRange(value))
        }
    }

    pub fn value(&self) -> u8 {
        self.0
    }
}

impl fmt::Display for Score {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.0)
    }
}

/// One criterion and its score
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreEntry {
    pub criterion: String,
    pub score: Score,
}

/// A manual score override parsed from `Criterion=N`
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreOverride {
    pub criterion: String,
    pub score: Score,
}

impl FromStr for ScoreOverride {
    type Err = ScoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        // The criterion may itself contain '=', the score is after the last one
        let re = Regex::new(r"^(?P<criterion>.+)=\s*(?P<score>-?\d+)\s*$")
            .map_err(|_| ScoreError::InvalidOverride(s.to_string()))?;

        let caps = re
            .captures(s)
            .ok_or_else(|| ScoreError::InvalidOverride(s.to_string()))?;

        let criterion = caps["criterion"].trim().to_string();
        if criterion.is_empty() {
            return Err(ScoreError::InvalidOverride(s.to_string()));
        }

        let value: i64 = caps["score"]
            .parse()
            .map_err(|_| ScoreError::InvalidOverride(s.to_string()))?;

        Ok(Self {
            criterion,
            score: Score::new(value)?,
        })
    }
}

/// Scores for one student, one entry per rubric row
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ScoreSheet {
    student_name: String,
    entries: Vec<ScoreEntry>,
}

impl ScoreSheet {
    /// Start every rubric criterion at `default_score`
    pub fn from_rubric(
        student_name: impl Into<String>,
        rubric: &Rubric,
        default_score: Score,
    ) -> Self {
        let entries = rubric
            .criteria()
            .map(|criterion| ScoreEntry {
                criterion: criterion.to_string(),
                score: default_score,
            })
            .collect();

        Self {
            student_name: student_name.into(),
            entries,
        }
    }

    pub fn student_name(&self) -> &str {
        &self.student_name
    }

    pub fn entries(&self) -> &[ScoreEntry] {
        &self.entries
    }

    /// Set the score of every row labelled `criterion`
    ///
    /// Labels are compared after trimming; returns the number of rows updated.
    pub fn set_score(&mut self, criterion: &str, score: Score) -> Result<usize, ScoreError> {
        let wanted = criterion.trim();
        let mut updated = 0;

        for entry in self.entries.iter_mut().filter(|e| e.criterion.trim() == wanted) {
            entry.score = score;
            updated += 1;
        }

        if updated == 0 {
            return Err(ScoreError::UnknownCriterion(criterion.to_string()));
        }
        Ok(updated)
    }

    /// Set the score of the row at `index` (rubric order)
    pub fn set_score_at(&mut self, index: usize, score: Score) -> Result<(), ScoreError> {
        let entry = self
            .entries
            .get_mut(index)
            .ok_or_else(|| ScoreError::UnknownCriterion(format!("#{}", index + 1)))?;
        entry.score = score;
        Ok(())
    }

    /// Apply a batch of overrides, stopping at the first unknown criterion
    pub fn apply_overrides(&mut self, overrides: &[ScoreOverride]) -> Result<(), ScoreError> {
        for o in overrides {
            self.set_score(&o.criterion, o.score)?;
        }
        Ok(())
    }
}
