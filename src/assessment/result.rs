//! Assessment inputs and outcomes

use serde::{Deserialize, Serialize};

use super::policy::AssessmentKind;
use crate::api::ExecutionResponse;

/// The outcome of a learner's attempt, one variant per kind of evidence
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(tag = "kind", rename_all = "snake_case")]
pub enum AssessmentResult {
    /// Quiz score in percent
    Quiz { score: f64 },
    /// Test results from a code challenge run
    Tests { passed: u32, total: u32 },
    /// A plain code run
    Execution { success: bool, output: String, error: Option<String> },
    /// An exercise judged right or wrong
    Exercise { correct: bool },
    /// Comprehension questions score in percent
    Comprehension { score: f64 },
    /// Reading engagement for a text block
    Engagement { seconds_on_block: u64, scrolled_to_bottom: bool },
    /// Portion of a video watched, in percent
    Video { watch_percent: f64 },
}

impl AssessmentResult {
    /// Score in percent, when the evidence has one
    pub fn score(&self) -> Option<f64> {
        match self {
            Self::Quiz { score } | Self::Comprehension { score } => Some(*score),
            Self::Tests { passed, total } if *total > 0 => {
                Some(f64::from(*passed) / f64::from(*total) * 100.0)
            }
            Self::Tests { .. } => Some(0.0),
            Self::Execution { success, error, .. } => {
                let clean = *success && error.as_deref().is_none_or(|e| e.trim().is_empty());
                Some(if clean { 100.0 } else { 0.0 })
            }
            Self::Exercise { correct } => Some(if *correct { 100.0 } else { 0.0 }),
            Self::Video { watch_percent } => Some(*watch_percent),
            Self::Engagement { .. } => None,
        }
    }

    /// Short label used in logs and feedback
    pub fn label(&self) -> &'static str {
        match self {
            Self::Quiz { .. } => "quiz",
            Self::Tests { .. } => "tests",
            Self::Execution { .. } => "execution",
            Self::Exercise { .. } => "exercise",
            Self::Comprehension { .. } => "comprehension",
            Self::Engagement { .. } => "engagement",
            Self::Video { .. } => "video",
        }
    }

    /// Turn an execution response into the evidence the block kind expects
    pub fn from_execution(
        kind: AssessmentKind,
        response: &ExecutionResponse,
        expected_output: Option<&str>,
    ) -> Self {
        match kind {
            AssessmentKind::CodeChallenge => Self::Tests {
                passed: response.tests_passed.unwrap_or(0),
                total: response.total_tests.unwrap_or(0),
            },
            AssessmentKind::CodingExercise => {
                let matches = expected_output
                    .is_some_and(|expected| response.output.trim() == expected.trim());
                Self::Exercise { correct: response.is_clean() && matches }
            }
            _ => Self::Execution {
                success: response.success,
                output: response.output.clone(),
                error: response.error_message().map(str::to_string),
            },
        }
    }
}

/// What `AssessmentPolicy::evaluate` decided
#[derive(Debug, Clone, PartialEq)]
pub struct Evaluation {
    /// Whether the block is (now) complete
    pub accepted: bool,
    /// Message to show the learner
    pub feedback: String,
    /// Attempts used so far
    pub attempts: u32,
    /// Attempts left, `None` when the kind has no retry budget
    pub attempts_remaining: Option<u32>,
    /// True once the retry budget is spent without a pass
    pub exhausted: bool,
    /// Score of this attempt, if any
    pub score: Option<f64>,
}

impl Evaluation {
    pub(crate) fn rejected(feedback: impl Into<String>) -> Self {
        Self {
            accepted: false,
            feedback: feedback.into(),
            attempts: 0,
            attempts_remaining: None,
            exhausted: false,
            score: None,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn tests_score_is_pass_ratio() {
        assert_eq!(AssessmentResult::Tests { passed: 4, total: 5 }.score(), Some(80.0));
        assert_eq!(AssessmentResult::Tests { passed: 0, total: 0 }.score(), Some(0.0));
    }

    #[test]
    fn engagement_has_no_score() {
        let result = AssessmentResult::Engagement { seconds_on_block: 40, scrolled_to_bottom: true };
        assert_eq!(result.score(), None);
    }

    #[test]
    fn challenge_run_becomes_tests_result() {
        let response = ExecutionResponse {
            success: true,
            output: String::new(),
            error: None,
            tests_passed: Some(3),
            total_tests: Some(4),
        };
        let result = AssessmentResult::from_execution(AssessmentKind::CodeChallenge, &response, None);
        assert_eq!(result, AssessmentResult::Tests { passed: 3, total: 4 });
    }

    #[test]
    fn exercise_compares_trimmed_output() {
        let response = ExecutionResponse {
            success: true,
            output: "42\n".into(),
            ..Default::default()
        };
        let result =
            AssessmentResult::from_execution(AssessmentKind::CodingExercise, &response, Some("42"));
        assert_eq!(result, AssessmentResult::Exercise { correct: true });

        let wrong =
            AssessmentResult::from_execution(AssessmentKind::CodingExercise, &response, Some("41"));
        assert_eq!(wrong, AssessmentResult::Exercise { correct: false });
    }

    #[test]
    fn serializes_with_kind_tag() {
        let json = serde_json::to_value(AssessmentResult::Quiz { score: 70.0 }).unwrap();
        assert_eq!(json, serde_json::json!({ "kind": "quiz", "score": 70.0 }));
    }
}
