//! Assessment rules for lesson blocks

pub mod policy;
pub mod result;

pub use policy::{
    AssessmentKind, AssessmentPolicy, AssessmentRequirement, BlockStatus, QuizDifficulty, Rule,
    RuleTable,
};
pub use result::{AssessmentResult, Evaluation};
