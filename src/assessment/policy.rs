//! Per-block completion rules
//!
//! Every block kind maps to a rule: a pass threshold, an optional retry budget
//! and a predicate over the learner's evidence. The policy keeps one
//! [`AssessmentRequirement`] per block for the session; requirements are
//! derived from the lesson on load and are not persisted on their own.

use std::collections::HashMap;

use serde::{Deserialize, Serialize};

use super::result::{AssessmentResult, Evaluation};
use crate::lesson::{Block, BlockKind, Lesson};

/// Grading strictness for quizzes
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum QuizDifficulty {
    Easy,
    #[default]
    Normal,
    Hard,
}

impl QuizDifficulty {
    /// Minimum quiz score in percent
    pub fn quiz_threshold(&self) -> f64 {
        match self {
            Self::Easy => 60.0,
            Self::Normal => 70.0,
            Self::Hard => 80.0,
        }
    }

    /// Parse from a command line or config value
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "easy" => Some(Self::Easy),
            "normal" | "medium" => Some(Self::Normal),
            "hard" => Some(Self::Hard),
            _ => None,
        }
    }
}

impl std::str::FromStr for QuizDifficulty {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::parse(s).ok_or_else(|| format!("Unknown difficulty: {}. Options: easy, normal, hard", s))
    }
}

/// How a block is assessed
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AssessmentKind {
    Quiz,
    CodeChallenge,
    InteractiveCode,
    CodingExercise,
    TextWithQuestions,
    Text,
    Video,
    /// Nothing to assess (code examples, unknown blocks)
    None,
}

impl AssessmentKind {
    /// Derive the assessment kind from a block
    pub fn for_block(block: &Block) -> Self {
        match &block.kind {
            BlockKind::Quiz(_) => Self::Quiz,
            BlockKind::Interactive(ex) if !ex.tests.is_empty() => Self::CodeChallenge,
            BlockKind::Interactive(ex) if ex.expected_output.is_some() => Self::CodingExercise,
            BlockKind::Interactive(_) => Self::InteractiveCode,
            BlockKind::Text(t) if !t.questions.is_empty() => Self::TextWithQuestions,
            BlockKind::Text(_) => Self::Text,
            BlockKind::Video(_) => Self::Video,
            BlockKind::CodeExample(_) | BlockKind::Unknown { .. } => Self::None,
        }
    }

    /// Whether completion needs passing evidence. Plain reading, watching and
    /// code examples complete on a "mark as read/watched/understood" action.
    pub fn requires_assessment(&self) -> bool {
        !matches!(self, Self::Text | Self::Video | Self::None)
    }

    /// Whether the kind accepts this kind of evidence
    pub fn accepts(&self, result: &AssessmentResult) -> bool {
        use AssessmentResult as R;
        matches!(
            (self, result),
            (Self::Quiz, R::Quiz { .. })
                | (Self::CodeChallenge, R::Tests { .. })
                | (Self::InteractiveCode, R::Execution { .. })
                | (Self::CodingExercise, R::Exercise { .. })
                | (Self::TextWithQuestions, R::Comprehension { .. })
                | (Self::Text, R::Engagement { .. })
                | (Self::Video, R::Video { .. })
        )
    }
}

/// Threshold and retry budget for one kind
#[derive(Debug, Clone, Copy, PartialEq)]
pub struct Rule {
    /// Pass threshold: percent, or seconds for reading engagement
    pub minimum: f64,
    /// Retry budget; `None` means unlimited
    pub max_attempts: Option<u32>,
}

/// Minimum reading time for a text block, in seconds
pub const MIN_READING_SECONDS: u64 = 30;

/// The rule table
#[derive(Debug, Clone, Default)]
pub struct RuleTable {
    difficulty: QuizDifficulty,
    attempt_overrides: HashMap<AssessmentKind, u32>,
}

impl RuleTable {
    /// Table for a quiz difficulty
    pub fn new(difficulty: QuizDifficulty) -> Self {
        Self { difficulty, attempt_overrides: HashMap::new() }
    }

    /// Override the retry budget of a kind
    pub fn with_max_attempts(mut self, kind: AssessmentKind, max_attempts: u32) -> Self {
        self.attempt_overrides.insert(kind, max_attempts);
        self
    }

    /// Rule for a kind
    pub fn rule(&self, kind: AssessmentKind) -> Rule {
        let (minimum, max_attempts) = match kind {
            AssessmentKind::Quiz => (self.difficulty.quiz_threshold(), Some(3)),
            AssessmentKind::CodeChallenge => (80.0, Some(5)),
            AssessmentKind::InteractiveCode => (100.0, Some(10)),
            AssessmentKind::CodingExercise => (100.0, Some(3)),
            AssessmentKind::TextWithQuestions => (60.0, Some(2)),
            AssessmentKind::Text => (MIN_READING_SECONDS as f64, None),
            AssessmentKind::Video => (80.0, None),
            AssessmentKind::None => (0.0, None),
        };
        let max_attempts = self.attempt_overrides.get(&kind).copied().or(max_attempts);
        Rule { minimum, max_attempts }
    }
}

/// Does the evidence pass the rule? On failure, returns a hint.
fn check(kind: AssessmentKind, rule: &Rule, result: &AssessmentResult) -> Result<(), String> {
    use AssessmentResult as R;

    match result {
        R::Quiz { score } if *score >= rule.minimum => Ok(()),
        R::Quiz { score } => Err(format!(
            "You scored {:.0}%. You need {:.0}% to pass. Review the material and try again.",
            score, rule.minimum
        )),

        R::Tests { total: 0, .. } => Err("No tests were run. Check that your code compiles.".into()),
        R::Tests { passed, total } => {
            let ratio = f64::from(*passed) / f64::from(*total) * 100.0;
            if ratio >= rule.minimum {
                Ok(())
            } else {
                Err(format!(
                    "{} of {} tests passed. At least {:.0}% must pass.",
                    passed, total, rule.minimum
                ))
            }
        }

        R::Execution { error: Some(e), .. } if !e.trim().is_empty() => {
            Err(format!("Your code raised an error: {}", e.trim()))
        }
        R::Execution { success: false, .. } => Err("Your code did not run successfully.".into()),
        R::Execution { output, .. } if output.trim().is_empty() => {
            Err("Your code ran but printed nothing. Print the result to see it.".into())
        }
        R::Execution { .. } => Ok(()),

        R::Exercise { correct: true } => Ok(()),
        R::Exercise { correct: false } => {
            Err("Not quite right yet. Compare your output with the expected result.".into())
        }

        R::Comprehension { score } if *score >= rule.minimum => Ok(()),
        R::Comprehension { score } => Err(format!(
            "You answered {:.0}% correctly. You need {:.0}%. Re-read the section and try again.",
            score, rule.minimum
        )),

        R::Engagement { seconds_on_block, scrolled_to_bottom } => {
            if *seconds_on_block as f64 >= rule.minimum && *scrolled_to_bottom {
                Ok(())
            } else {
                Err(format!(
                    "Keep reading: spend at least {:.0} seconds and scroll to the end.",
                    rule.minimum
                ))
            }
        }

        R::Video { watch_percent } if *watch_percent >= rule.minimum => Ok(()),
        R::Video { .. } => {
            Err(format!("Watch at least {:.0}% of the video to continue.", rule.minimum))
        }
    }
    .map_err(|hint| {
        tracing::debug!("{:?} assessment failed: {}", kind, hint);
        hint
    })
}

/// Per-block status for the session
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum BlockStatus {
    NotStarted,
    InProgress,
    Completed,
    /// Retry budget spent without a pass (not persisted)
    Exhausted,
}

/// Session-scoped assessment state of one block
#[derive(Debug, Clone, PartialEq)]
pub struct AssessmentRequirement {
    pub block_id: String,
    pub kind: AssessmentKind,
    pub requires_assessment: bool,
    /// Pass threshold (percent, or seconds for reading)
    pub minimum_score: f64,
    pub max_attempts: Option<u32>,
    pub attempts: u32,
    pub best_score: Option<f64>,
    pub is_completed: bool,
}

impl AssessmentRequirement {
    /// Whether the retry budget is spent
    pub fn is_exhausted(&self) -> bool {
        !self.is_completed && self.max_attempts.is_some_and(|max| self.attempts >= max)
    }

    /// Attempts left, if the kind has a budget
    pub fn attempts_remaining(&self) -> Option<u32> {
        self.max_attempts.map(|max| max.saturating_sub(self.attempts))
    }

    /// Current status
    pub fn status(&self) -> BlockStatus {
        if self.is_completed {
            BlockStatus::Completed
        } else if self.is_exhausted() {
            BlockStatus::Exhausted
        } else if self.attempts > 0 {
            BlockStatus::InProgress
        } else {
            BlockStatus::NotStarted
        }
    }
}

/// Assessment state for every block of a lesson
#[derive(Debug, Clone, Default)]
pub struct AssessmentPolicy {
    table: RuleTable,
    requirements: HashMap<String, AssessmentRequirement>,
}

impl AssessmentPolicy {
    /// Derive requirements for every block of a lesson
    pub fn for_lesson(lesson: &Lesson, table: RuleTable) -> Self {
        let requirements = lesson
            .blocks
            .iter()
            .map(|block| {
                let kind = AssessmentKind::for_block(block);
                let rule = table.rule(kind);
                let requirement = AssessmentRequirement {
                    block_id: block.id.clone(),
                    kind,
                    requires_assessment: kind.requires_assessment(),
                    minimum_score: rule.minimum,
                    max_attempts: rule.max_attempts,
                    attempts: 0,
                    best_score: None,
                    is_completed: false,
                };
                (block.id.clone(), requirement)
            })
            .collect();

        Self { table, requirements }
    }

    /// The rule table in use
    pub fn table(&self) -> &RuleTable {
        &self.table
    }

    /// Requirement for a block
    pub fn requirement(&self, block_id: &str) -> Option<&AssessmentRequirement> {
        self.requirements.get(block_id)
    }

    /// Status for a block (`NotStarted` for unknown ids)
    pub fn status(&self, block_id: &str) -> BlockStatus {
        self.requirements.get(block_id).map_or(BlockStatus::NotStarted, |r| r.status())
    }

    /// Mark a block completed without evaluation (restored from saved progress)
    pub fn restore_completed(&mut self, block_id: &str) {
        if let Some(requirement) = self.requirements.get_mut(block_id) {
            requirement.is_completed = true;
        }
    }

    /// Complete a block that needs no assessment. Returns false when the
    /// block requires evidence or is unknown.
    pub fn mark_without_assessment(&mut self, block_id: &str) -> bool {
        match self.requirements.get_mut(block_id) {
            Some(r) if r.is_completed => true,
            Some(r) if !r.requires_assessment => {
                r.is_completed = true;
                true
            }
            _ => false,
        }
    }

    /// Evaluate an attempt
    pub fn evaluate(&mut self, block_id: &str, result: &AssessmentResult) -> Evaluation {
        let Some(requirement) = self.requirements.get_mut(block_id) else {
            return Evaluation::rejected(format!("Unknown block '{}'", block_id));
        };

        if requirement.is_completed {
            return Evaluation {
                accepted: true,
                feedback: "Already completed.".to_string(),
                attempts: requirement.attempts,
                attempts_remaining: requirement.attempts_remaining(),
                exhausted: false,
                score: requirement.best_score,
            };
        }

        if requirement.is_exhausted() {
            return Evaluation {
                accepted: false,
                feedback: exhausted_message(requirement.max_attempts.unwrap_or_default()),
                attempts: requirement.attempts,
                attempts_remaining: Some(0),
                exhausted: true,
                score: None,
            };
        }

        if !requirement.kind.accepts(result) {
            return Evaluation::rejected(format!(
                "This block cannot be completed with a {} result.",
                result.label()
            ));
        }

        requirement.attempts += 1;
        let score = result.score();
        if let Some(score) = score {
            requirement.best_score = Some(requirement.best_score.map_or(score, |b| b.max(score)));
        }

        let rule = Rule { minimum: requirement.minimum_score, max_attempts: requirement.max_attempts };
        match check(requirement.kind, &rule, result) {
            Ok(()) => {
                requirement.is_completed = true;
                tracing::info!(
                    "Block {} passed {:?} assessment on attempt {}",
                    block_id,
                    requirement.kind,
                    requirement.attempts
                );
                Evaluation {
                    accepted: true,
                    feedback: "Great job! Block completed.".to_string(),
                    attempts: requirement.attempts,
                    attempts_remaining: requirement.attempts_remaining(),
                    exhausted: false,
                    score,
                }
            }
            Err(hint) => {
                let exhausted = requirement.is_exhausted();
                let feedback = if exhausted {
                    exhausted_message(requirement.max_attempts.unwrap_or_default())
                } else {
                    match requirement.attempts_remaining() {
                        Some(1) => format!("{} (1 attempt left)", hint),
                        Some(n) => format!("{} ({} attempts left)", hint, n),
                        None => hint,
                    }
                };
                Evaluation {
                    accepted: false,
                    feedback,
                    attempts: requirement.attempts,
                    attempts_remaining: requirement.attempts_remaining(),
                    exhausted,
                    score,
                }
            }
        }
    }
}

fn exhausted_message(max_attempts: u32) -> String {
    format!(
        "You have used all {} attempts for this block. Ask your instructor or the community for help.",
        max_attempts
    )
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::{
        Block, BlockKind, CodeExample, Difficulty, InteractiveExercise, QuizBlock, TestCase,
        TextBlock,
    };

    fn lesson(blocks: Vec<Block>) -> Lesson {
        Lesson {
            id: "L".into(),
            title: "T".into(),
            description: String::new(),
            difficulty: Difficulty::Beginner,
            blocks,
        }
    }

    fn quiz(id: &str) -> Block {
        Block::new(id, 0, BlockKind::Quiz(QuizBlock { quiz_id: "Q1".into(), title: None }))
    }

    fn challenge(id: &str) -> Block {
        Block::new(
            id,
            0,
            BlockKind::Interactive(InteractiveExercise {
                tests: vec![TestCase::default()],
                ..Default::default()
            }),
        )
    }

    #[test]
    fn quiz_threshold_follows_difficulty() {
        assert_eq!(RuleTable::new(QuizDifficulty::Easy).rule(AssessmentKind::Quiz).minimum, 60.0);
        assert_eq!(RuleTable::new(QuizDifficulty::Normal).rule(AssessmentKind::Quiz).minimum, 70.0);
        assert_eq!(RuleTable::new(QuizDifficulty::Hard).rule(AssessmentKind::Quiz).minimum, 80.0);
    }

    #[test]
    fn quiz_at_threshold_passes_and_below_fails() {
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![quiz("q")]), RuleTable::default());

        let low = policy.evaluate("q", &AssessmentResult::Quiz { score: 65.0 });
        assert!(!low.accepted);
        assert_eq!(low.attempts_remaining, Some(2));
        assert!(low.feedback.contains("70%"));

        let pass = policy.evaluate("q", &AssessmentResult::Quiz { score: 70.0 });
        assert!(pass.accepted);
        assert_eq!(policy.status("q"), BlockStatus::Completed);
    }

    #[test]
    fn exhausted_block_rejects_any_score() {
        let table = RuleTable::default().with_max_attempts(AssessmentKind::CodeChallenge, 3);
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![challenge("c")]), table);

        for _ in 0..3 {
            let eval = policy.evaluate("c", &AssessmentResult::Tests { passed: 1, total: 5 });
            assert!(!eval.accepted);
        }
        assert_eq!(policy.status("c"), BlockStatus::Exhausted);

        let fourth = policy.evaluate("c", &AssessmentResult::Tests { passed: 5, total: 5 });
        assert!(!fourth.accepted);
        assert!(fourth.exhausted);
        assert_eq!(fourth.attempts, 3);
        assert!(fourth.feedback.contains("Ask your instructor"));
    }

    #[test]
    fn attempts_increment_before_the_check() {
        let mut policy =
            AssessmentPolicy::for_lesson(&lesson(vec![challenge("c")]), RuleTable::default());
        let eval = policy.evaluate("c", &AssessmentResult::Tests { passed: 4, total: 5 });
        assert!(eval.accepted);
        assert_eq!(eval.attempts, 1);
        assert_eq!(eval.score, Some(80.0));
    }

    #[test]
    fn mismatched_evidence_does_not_consume_attempts() {
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![quiz("q")]), RuleTable::default());
        let eval = policy.evaluate("q", &AssessmentResult::Exercise { correct: true });
        assert!(!eval.accepted);
        assert_eq!(policy.requirement("q").unwrap().attempts, 0);
        assert_eq!(policy.status("q"), BlockStatus::NotStarted);
    }

    #[test]
    fn interactive_code_needs_output_and_no_error() {
        let block = Block::new("i", 0, BlockKind::Interactive(InteractiveExercise::default()));
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![block]), RuleTable::default());

        let silent = AssessmentResult::Execution { success: true, output: " ".into(), error: None };
        assert!(!policy.evaluate("i", &silent).accepted);
        assert_eq!(policy.status("i"), BlockStatus::InProgress);

        let failing = AssessmentResult::Execution {
            success: true,
            output: "x".into(),
            error: Some("NameError".into()),
        };
        assert!(policy.evaluate("i", &failing).feedback.contains("NameError"));

        let ok = AssessmentResult::Execution { success: true, output: "hi".into(), error: None };
        assert!(policy.evaluate("i", &ok).accepted);
    }

    #[test]
    fn text_engagement_needs_time_and_scroll() {
        let block = Block::new("t", 0, BlockKind::Text(TextBlock::default()));
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![block]), RuleTable::default());

        let skimmed = AssessmentResult::Engagement { seconds_on_block: 45, scrolled_to_bottom: false };
        let eval = policy.evaluate("t", &skimmed);
        assert!(!eval.accepted);
        assert_eq!(eval.attempts_remaining, None);

        let read = AssessmentResult::Engagement { seconds_on_block: 30, scrolled_to_bottom: true };
        assert!(policy.evaluate("t", &read).accepted);
    }

    #[test]
    fn plain_blocks_complete_without_assessment() {
        let blocks = vec![
            Block::new("t", 0, BlockKind::Text(TextBlock::default())),
            Block::new("c", 1, BlockKind::CodeExample(CodeExample::default())),
            quiz("q"),
        ];
        let mut policy = AssessmentPolicy::for_lesson(&lesson(blocks), RuleTable::default());

        assert!(policy.mark_without_assessment("t"));
        assert!(policy.mark_without_assessment("c"));
        assert!(!policy.mark_without_assessment("q"));
        assert!(!policy.mark_without_assessment("missing"));
    }

    #[test]
    fn kinds_are_derived_from_blocks() {
        let exercise = Block::new(
            "e",
            0,
            BlockKind::Interactive(InteractiveExercise {
                expected_output: Some("3".into()),
                ..Default::default()
            }),
        );
        assert_eq!(AssessmentKind::for_block(&exercise), AssessmentKind::CodingExercise);
        assert_eq!(AssessmentKind::for_block(&challenge("c")), AssessmentKind::CodeChallenge);
        assert_eq!(AssessmentKind::for_block(&quiz("q")), AssessmentKind::Quiz);
    }

    #[test]
    fn completion_never_reverts() {
        let mut policy = AssessmentPolicy::for_lesson(&lesson(vec![quiz("q")]), RuleTable::default());
        assert!(policy.evaluate("q", &AssessmentResult::Quiz { score: 90.0 }).accepted);
        let again = policy.evaluate("q", &AssessmentResult::Quiz { score: 10.0 });
        assert!(again.accepted);
        assert_eq!(policy.requirement("q").unwrap().attempts, 1);
    }
}
