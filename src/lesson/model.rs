//! Content model for lessons
//!
//! A lesson is an ordered list of blocks. Each block is one renderable unit of
//! content; its kind decides how it is drawn and how it is assessed. Lessons
//! are immutable once loaded.

use serde::{Deserialize, Serialize};

/// Lesson difficulty as shown to the learner
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Difficulty {
    #[default]
    Beginner,
    Intermediate,
    Advanced,
}

impl Difficulty {
    /// Lenient parse accepting the labels used by older lesson documents
    pub fn parse(s: &str) -> Option<Self> {
        match s.trim().to_lowercase().as_str() {
            "beginner" | "easy" | "basic" => Some(Self::Beginner),
            "intermediate" | "medium" | "normal" => Some(Self::Intermediate),
            "advanced" | "hard" | "expert" => Some(Self::Advanced),
            _ => None,
        }
    }

    /// Display label
    pub fn label(&self) -> &'static str {
        match self {
            Self::Beginner => "Beginner",
            Self::Intermediate => "Intermediate",
            Self::Advanced => "Advanced",
        }
    }
}

/// A complete, normalized lesson
#[derive(Debug, Clone, Serialize)]
pub struct Lesson {
    /// Lesson identifier
    pub id: String,
    /// Display title
    pub title: String,
    /// Short description
    pub description: String,
    /// Difficulty label
    pub difficulty: Difficulty,
    /// Blocks in document order
    pub blocks: Vec<Block>,
}

impl Lesson {
    /// Blocks in render order: ascending `order`, ties keep document order
    pub fn ordered_blocks(&self) -> Vec<&Block> {
        let mut blocks: Vec<&Block> = self.blocks.iter().collect();
        blocks.sort_by_key(|b| b.order);
        blocks
    }

    /// Total number of blocks (the denominator for progress)
    pub fn total_blocks(&self) -> usize {
        self.blocks.len()
    }

    /// Find a block by id
    pub fn block(&self, block_id: &str) -> Option<&Block> {
        self.blocks.iter().find(|b| b.id == block_id)
    }
}

/// One renderable unit of lesson content
#[derive(Debug, Clone, Serialize)]
pub struct Block {
    /// Unique id within the lesson
    pub id: String,
    /// Render position
    pub order: i64,
    /// Type-specific payload
    pub kind: BlockKind,
}

impl Block {
    /// Create a block
    pub fn new(id: impl Into<String>, order: i64, kind: BlockKind) -> Self {
        Self { id: id.into(), order, kind }
    }

    /// The wire `type` string for this block
    pub fn type_name(&self) -> &str {
        match &self.kind {
            BlockKind::Text(_) => "text",
            BlockKind::CodeExample(_) => "code_example",
            BlockKind::Interactive(_) => "interactive",
            BlockKind::Quiz(_) => "quiz",
            BlockKind::Video(_) => "video",
            BlockKind::Unknown { type_name, .. } => type_name,
        }
    }

    /// Title to show in lists, falling back to a label per kind
    pub fn display_title(&self) -> String {
        let explicit = match &self.kind {
            BlockKind::Text(t) => t.title.clone(),
            BlockKind::CodeExample(c) => c.title.clone(),
            BlockKind::Interactive(i) => i.title.clone(),
            BlockKind::Quiz(q) => q.title.clone(),
            BlockKind::Video(v) => v.title.clone(),
            BlockKind::Unknown { .. } => None,
        };

        explicit.filter(|t| !t.trim().is_empty()).unwrap_or_else(|| match &self.kind {
            BlockKind::Text(_) => "Reading".to_string(),
            BlockKind::CodeExample(_) => "Code Example".to_string(),
            BlockKind::Interactive(_) => "Exercise".to_string(),
            BlockKind::Quiz(_) => "Quiz".to_string(),
            BlockKind::Video(_) => "Video".to_string(),
            BlockKind::Unknown { type_name, .. } => format!("Unsupported block ({})", type_name),
        })
    }

    /// Code shown in an editor or panel, if this block has any
    pub fn code(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::CodeExample(c) => Some(&c.code),
            BlockKind::Interactive(i) => Some(&i.starter_code),
            _ => None,
        }
    }

    /// Language annotation, if this block has code
    pub fn language(&self) -> Option<&str> {
        match &self.kind {
            BlockKind::CodeExample(c) => c.language.as_deref(),
            BlockKind::Interactive(i) => i.language.as_deref(),
            _ => None,
        }
    }
}

/// Block payload, one variant per block type
#[derive(Debug, Clone, Serialize)]
#[serde(tag = "type", rename_all = "snake_case")]
pub enum BlockKind {
    /// Prose (markdown), optionally with comprehension questions
    Text(TextBlock),
    /// Read-only code sample
    CodeExample(CodeExample),
    /// Editable, runnable exercise
    Interactive(InteractiveExercise),
    /// Placeholder for the external quiz subsystem
    Quiz(QuizBlock),
    /// Embedded video
    Video(VideoBlock),
    /// Anything else, preserved verbatim for the diagnostic renderer
    Unknown {
        /// The unrecognised `type` value
        type_name: String,
        /// The raw block document
        raw: serde_json::Value,
    },
}

/// A text block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct TextBlock {
    #[serde(default)]
    pub title: Option<String>,
    /// Markdown content
    #[serde(default)]
    pub content: String,
    /// Comprehension questions attached to the reading
    #[serde(default)]
    pub questions: Vec<ComprehensionQuestion>,
}

impl TextBlock {
    /// Percentage of comprehension questions answered correctly.
    ///
    /// `answers[i]` is the option picked for question `i`. A question without
    /// an answer key counts once any option is picked.
    pub fn grade(&self, answers: &[Option<usize>]) -> f64 {
        if self.questions.is_empty() {
            return 100.0;
        }
        let correct = self
            .questions
            .iter()
            .enumerate()
            .filter(|(i, question)| match (answers.get(*i).copied().flatten(), question.answer) {
                (Some(picked), Some(key)) => picked == key,
                (Some(picked), None) => picked < question.options.len(),
                (None, _) => false,
            })
            .count();
        correct as f64 / self.questions.len() as f64 * 100.0
    }
}

/// A comprehension question attached to a text block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct ComprehensionQuestion {
    pub question: String,
    #[serde(default)]
    pub options: Vec<String>,
    /// Index of the correct option
    #[serde(default)]
    pub answer: Option<usize>,
}

/// A read-only code example
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct CodeExample {
    #[serde(default)]
    pub title: Option<String>,
    pub code: String,
    #[serde(default)]
    pub language: Option<String>,
    #[serde(default)]
    pub explanation: Option<String>,
}

/// An interactive coding exercise
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct InteractiveExercise {
    #[serde(default)]
    pub title: Option<String>,
    #[serde(default, alias = "description")]
    pub instructions: Option<String>,
    #[serde(default, alias = "starterCode")]
    pub starter_code: String,
    #[serde(default)]
    pub solution: Option<String>,
    #[serde(default)]
    pub hints: Vec<String>,
    #[serde(default)]
    pub language: Option<String>,
    /// When present, the exercise is judged by comparing output
    #[serde(default, alias = "expectedOutput")]
    pub expected_output: Option<String>,
    /// When non-empty, the exercise is a code challenge judged by tests
    #[serde(default)]
    pub tests: Vec<TestCase>,
}

/// A test case for a code challenge (run remotely)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct TestCase {
    #[serde(default)]
    pub name: Option<String>,
    #[serde(default)]
    pub input: String,
    #[serde(default)]
    pub expected: String,
}

/// A quiz placeholder
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct QuizBlock {
    #[serde(alias = "quizId")]
    pub quiz_id: String,
    #[serde(default)]
    pub title: Option<String>,
}

/// A video block
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct VideoBlock {
    pub url: String,
    #[serde(default)]
    pub title: Option<String>,
}
