//! Lesson normalization
//!
//! Lesson documents come in two shapes: the current one with a `blocks` array,
//! and the legacy flat one (`content`, `code_examples`, `exercises`,
//! `quiz_id`). Both are turned into a [`Lesson`] with a uniform block list.

use serde::de::DeserializeOwned;
use serde_json::{Map, Value};

use super::model::{
    Block, BlockKind, CodeExample, Difficulty, InteractiveExercise, Lesson, QuizBlock, TextBlock,
    VideoBlock,
};
use crate::api::ApiError;

/// Title used when the document has none
pub const DEFAULT_TITLE: &str = "Untitled Lesson";

/// Normalize a raw lesson document
pub fn normalize(raw: Value) -> Result<Lesson, ApiError> {
    let Value::Object(doc) = raw else {
        return Err(ApiError::Validation("lesson document is not an object".to_string()));
    };

    let id = id_string(doc.get("id"))
        .ok_or_else(|| ApiError::Validation("lesson document has no id".to_string()))?;

    let title = doc
        .get("title")
        .and_then(Value::as_str)
        .filter(|s| !s.trim().is_empty())
        .unwrap_or(DEFAULT_TITLE)
        .to_string();
    let description = doc.get("description").and_then(Value::as_str).unwrap_or("").to_string();
    let difficulty = doc
        .get("difficulty")
        .and_then(Value::as_str)
        .and_then(Difficulty::parse)
        .unwrap_or_default();

    let blocks = match doc.get("blocks") {
        Some(Value::Array(items)) => parse_blocks(&id, items),
        _ => {
            tracing::debug!("Lesson {} has no blocks array, converting legacy fields", id);
            legacy_blocks(&id, &doc)
        }
    };

    Ok(Lesson { id, title, description, difficulty, blocks })
}

/// Ids may be strings or numbers on the wire
fn id_string(value: Option<&Value>) -> Option<String> {
    match value? {
        Value::String(s) if !s.trim().is_empty() => Some(s.trim().to_string()),
        Value::Number(n) => Some(n.to_string()),
        _ => None,
    }
}

fn parse_blocks(lesson_id: &str, items: &[Value]) -> Vec<Block> {
    items
        .iter()
        .enumerate()
        .map(|(index, item)| {
            let id = id_string(item.get("id"))
                .unwrap_or_else(|| format!("{}-block-{}", lesson_id, index));
            let order = item.get("order").and_then(Value::as_i64).unwrap_or(index as i64);
            let type_name = item.get("type").and_then(Value::as_str).unwrap_or("").to_string();
            Block::new(id, order, parse_kind(&type_name, item))
        })
        .collect()
}

/// Dispatch on the wire type. Known types with malformed payloads degrade to
/// `Unknown` so the renderer can show a diagnostic instead of failing.
fn parse_kind(type_name: &str, item: &Value) -> BlockKind {
    let parsed = match type_name {
        "text" => decode(item).map(BlockKind::Text),
        "code_example" | "code" => decode(item).map(BlockKind::CodeExample),
        "interactive" | "exercise" | "interactive_code" => decode(item).map(BlockKind::Interactive),
        "quiz" => decode(item).map(BlockKind::Quiz),
        "video" => decode(item).map(BlockKind::Video),
        _ => None,
    };

    parsed.unwrap_or_else(|| {
        if !type_name.is_empty() {
            tracing::warn!("Unrecognised or malformed block of type '{}'", type_name);
        }
        BlockKind::Unknown {
            type_name: if type_name.is_empty() { "unknown".into() } else { type_name.into() },
            raw: item.clone(),
        }
    })
}

fn decode<T: DeserializeOwned>(item: &Value) -> Option<T> {
    serde_json::from_value(item.clone()).ok()
}

fn legacy_blocks(lesson_id: &str, doc: &Map<String, Value>) -> Vec<Block> {
    let mut blocks = Vec::new();
    let mut next_order = 0i64;
    let mut push = |blocks: &mut Vec<Block>, id: String, kind: BlockKind| {
        blocks.push(Block::new(id, next_order, kind));
        next_order += 1;
    };

    if let Some(content) = doc.get("content").and_then(Value::as_str) {
        if !content.trim().is_empty() {
            push(
                &mut blocks,
                format!("{}-intro", lesson_id),
                BlockKind::Text(TextBlock {
                    title: Some("Introduction".to_string()),
                    content: content.to_string(),
                    questions: Vec::new(),
                }),
            );
        }
    }

    if let Some(Value::Array(examples)) = doc.get("code_examples") {
        for (i, example) in examples.iter().enumerate() {
            let kind = match example {
                Value::String(code) => {
                    BlockKind::CodeExample(CodeExample { code: code.clone(), ..Default::default() })
                }
                other => decode::<CodeExample>(other).map(BlockKind::CodeExample).unwrap_or_else(
                    || BlockKind::Unknown { type_name: "code_example".into(), raw: other.clone() },
                ),
            };
            push(&mut blocks, format!("{}-code-{}", lesson_id, i), kind);
        }
    }

    if let Some(Value::Array(exercises)) = doc.get("exercises") {
        for (i, exercise) in exercises.iter().enumerate() {
            let kind = decode::<InteractiveExercise>(exercise)
                .map(BlockKind::Interactive)
                .unwrap_or_else(|| BlockKind::Unknown {
                    type_name: "interactive".into(),
                    raw: exercise.clone(),
                });
            push(&mut blocks, format!("{}-exercise-{}", lesson_id, i), kind);
        }
    }

    if let Some(quiz_id) = id_string(doc.get("quiz_id")) {
        push(
            &mut blocks,
            format!("{}-quiz", lesson_id),
            BlockKind::Quiz(QuizBlock { quiz_id, title: None }),
        );
    }

    if let Some(url) = doc.get("video_url").and_then(Value::as_str) {
        push(
            &mut blocks,
            format!("{}-video", lesson_id),
            BlockKind::Video(VideoBlock { url: url.to_string(), title: None }),
        );
    }

    blocks
}
