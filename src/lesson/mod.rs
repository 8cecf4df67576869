//! Lesson content: model, normalization and loading

pub mod fetcher;
pub mod model;
pub mod normalize;

pub use fetcher::{LessonFetcher, LessonSource};
pub use model::{
    Block, BlockKind, CodeExample, ComprehensionQuestion, Difficulty, InteractiveExercise, Lesson,
    QuizBlock, TestCase, TextBlock, VideoBlock,
};
pub use normalize::normalize;
