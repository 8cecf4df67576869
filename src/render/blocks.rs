//! Per-kind block fragments

use super::html::Element;
use super::markdown;
use crate::lesson::{Block, BlockKind, CodeExample, InteractiveExercise, QuizBlock, TextBlock, VideoBlock};
use crate::syntax;

/// `data-action` values understood by the interaction controller
pub mod action {
    pub const MARK_READ: &str = "mark-read";
    pub const MARK_UNDERSTOOD: &str = "mark-understood";
    pub const MARK_WATCHED: &str = "mark-watched";
    pub const RUN_CODE: &str = "run-code";
    pub const RESET_CODE: &str = "reset-code";
    pub const SHOW_HINT: &str = "show-hint";
    pub const SHOW_SOLUTION: &str = "show-solution";
    pub const COPY_CODE: &str = "copy-code";
    pub const SUBMIT_QUIZ: &str = "submit-quiz";
    pub const SUBMIT_COMPREHENSION: &str = "submit-comprehension";
    pub const RETRY: &str = "retry";
}

fn button(action: &str, label: &str) -> Element {
    Element::new("button").attr("type", "button").class("btn").data("action", action).text(label)
}

fn actions(buttons: impl IntoIterator<Item = Element>) -> Element {
    Element::new("div").class("block-actions").children(buttons)
}

/// Wrapper shared by every block
pub fn render_block(block: &Block, completed: bool) -> Element {
    let mut header = Element::new("header")
        .class("block-header")
        .child(Element::new("h3").class("block-title").text(block.display_title()));
    if completed {
        header = header.child(Element::new("span").class("badge").class("completed-badge").text("✓ Completed"));
    }

    let mut wrapper = Element::new("section")
        .class("lesson-block")
        .class(&format!("block-{}", css_token(block.type_name())))
        .data("block-id", block.id.as_str())
        .data("block-type", block.type_name());
    if completed {
        wrapper = wrapper.class("completed");
    }

    let body = match &block.kind {
        BlockKind::Text(text) => text_body(block, text),
        BlockKind::CodeExample(example) => code_example_body(example),
        BlockKind::Interactive(exercise) => interactive_body(block, exercise),
        BlockKind::Quiz(quiz) => quiz_body(quiz),
        BlockKind::Video(video) => video_body(video),
        BlockKind::Unknown { type_name, raw } => fallback_body(type_name, raw),
    };

    wrapper.child(header).child(body)
}

/// Class-safe form of a block type
fn css_token(type_name: &str) -> String {
    type_name
        .chars()
        .map(|c| if c.is_ascii_alphanumeric() || c == '-' || c == '_' { c.to_ascii_lowercase() } else { '-' })
        .collect()
}

fn text_body(block: &Block, text: &TextBlock) -> Element {
    let body = Element::new("div")
        .class("block-body")
        .child(Element::new("div").class("block-content").raw(markdown::to_html(&text.content)));

    if text.questions.is_empty() {
        return body.child(actions([button(action::MARK_READ, "Mark as read")]));
    }

    let questions = text.questions.iter().enumerate().map(|(i, q)| {
        let name = format!("{}-q{}", block.id, i);
        let options = q.options.iter().enumerate().map(|(j, option)| {
            Element::new("label").child(
                Element::new("input").attr("type", "radio").attr("name", name.clone()).attr("value", j.to_string()),
            ).text(option.clone())
        });
        Element::new("li")
            .class("question")
            .data("question", i.to_string())
            .child(Element::new("p").text(q.question.clone()))
            .children(options)
    });
    body.child(Element::new("ol").class("comprehension").children(questions))
        .child(actions([button(action::SUBMIT_COMPREHENSION, "Check answers")]))
}

fn code_panel(code: &str, language: &str) -> Element {
    Element::new("pre")
        .class("code")
        .child(Element::new("code").data("language", language).raw(syntax::highlight_html(code, language)))
}

fn code_example_body(example: &CodeExample) -> Element {
    let language = example.language.as_deref().unwrap_or("text");
    let mut body = Element::new("div").class("block-body").child(code_panel(&example.code, language));
    if let Some(explanation) = example.explanation.as_deref().filter(|e| !e.trim().is_empty()) {
        body = body.child(Element::new("div").class("explanation").raw(markdown::to_html(explanation)));
    }
    body.child(actions([button(action::COPY_CODE, "Copy"), button(action::MARK_UNDERSTOOD, "Mark as understood")]))
}

fn interactive_body(block: &Block, exercise: &InteractiveExercise) -> Element {
    let language = exercise.language.as_deref().unwrap_or("python");
    let mut body = Element::new("div").class("block-body");

    if let Some(instructions) = exercise.instructions.as_deref().filter(|i| !i.trim().is_empty()) {
        body = body.child(Element::new("div").class("instructions").raw(markdown::to_html(instructions)));
    }

    body = body.child(
        Element::new("textarea")
            .class("code-editor")
            .attr("spellcheck", "false")
            .data("block-id", block.id.as_str())
            .data("language", language)
            .text(exercise.starter_code.clone()),
    );

    let mut buttons = vec![button(action::RUN_CODE, "Run"), button(action::RESET_CODE, "Reset")];
    if !exercise.hints.is_empty() {
        buttons.push(button(action::SHOW_HINT, &format!("Hint (0/{})", exercise.hints.len())));
    }
    if exercise.solution.is_some() {
        buttons.push(button(action::SHOW_SOLUTION, "Solution"));
    }
    if !exercise.tests.is_empty() {
        body = body.child(Element::new("p").class("test-count").text(format!("{} tests", exercise.tests.len())));
    }

    body.child(actions(buttons))
        .child(Element::new("div").class("hints"))
        .child(Element::new("div").class("output-panel").data("state", "idle"))
}

fn quiz_body(quiz: &QuizBlock) -> Element {
    Element::new("div")
        .class("block-body")
        .child(Element::new("div").class("quiz-placeholder").data("quiz-id", quiz.quiz_id.as_str()))
        .child(actions([button(action::SUBMIT_QUIZ, "Submit quiz")]))
}

fn video_body(video: &VideoBlock) -> Element {
    let title = video.title.clone().unwrap_or_else(|| "Watch video".to_string());
    Element::new("div")
        .class("block-body")
        .child(
            Element::new("a")
                .class("video-link")
                .attr("href", video.url.as_str())
                .attr("target", "_blank")
                .attr("rel", "noopener")
                .text(title),
        )
        .child(actions([button(action::MARK_WATCHED, "Mark as watched")]))
}

fn fallback_body(type_name: &str, raw: &serde_json::Value) -> Element {
    let dump = serde_json::to_string_pretty(raw).unwrap_or_else(|_| raw.to_string());
    Element::new("div")
        .class("block-body")
        .class("block-fallback")
        .child(Element::new("p").text(format!("This block type ({}) is not supported yet.", type_name)))
        .child(Element::new("pre").class("raw-block").text(dump))
}
