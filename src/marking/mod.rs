/*!
 * AI-assisted marking.
 *
 * - `prompts`: builds the marking prompt from rubric, submission and context
 * - `core`: sends it to the configured provider and returns the feedback
 */

use std::fmt;
use std::str::FromStr;

use serde::{Deserialize, Serialize};

pub mod core;
pub mod prompts;

pub use self::core::{Feedback, FeedbackGenerator};
pub use self::prompts::{MarkingContext, MarkingPromptBuilder, DEFAULT_SYSTEM_PROMPT};

/// Benchmark quality tier used to calibrate marking strictness
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum SampleLevel {
    Low,
    #[default]
    Medium,
    High,
}

impl SampleLevel {
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::Low => "low",
            Self::Medium => "medium",
            Self::High => "high",
        }
    }
}

impl fmt::Display for SampleLevel {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

impl FromStr for SampleLevel {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_lowercase().as_str() {
            "low" => Ok(Self::Low),
            "medium" => Ok(Self::Medium),
            "high" => Ok(Self::High),
            other => Err(format!("Invalid sample level: {} (expected low, medium or high)", other)),
        }
    }
}
