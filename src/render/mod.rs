//! Lesson rendering
//!
//! The renderer turns a lesson plus its progress into a fresh
//! `div#lesson-content` tree on every call. Blocks are emitted in `order`;
//! each wrapper carries `data-block-id` and `data-block-type` so interaction
//! events can be routed back to the block they came from.

pub mod blocks;
pub mod html;
pub mod markdown;

pub use blocks::action;
pub use html::{Element, Node};

use crate::lesson::Lesson;
use crate::progress::ProgressRecord;
use crate::theme::ThemeMode;

/// Builds HTML fragments for lessons
#[derive(Debug, Clone, Copy, Default)]
pub struct Renderer {
    pub theme: ThemeMode,
}

impl Renderer {
    pub fn new(theme: ThemeMode) -> Self {
        Self { theme }
    }

    /// Render a whole lesson
    pub fn render(&self, lesson: &Lesson, progress: &ProgressRecord) -> Element {
        let mut header = Element::new("header")
            .class("lesson-header")
            .child(Element::new("h1").class("lesson-title").text(lesson.title.clone()))
            .child(
                Element::new("span")
                    .class("difficulty")
                    .class(&format!("difficulty-{}", lesson.difficulty.label().to_lowercase()))
                    .text(lesson.difficulty.label()),
            );
        if !lesson.description.trim().is_empty() {
            header = header.child(Element::new("p").class("lesson-description").text(lesson.description.clone()));
        }

        let blocks = lesson
            .ordered_blocks()
            .into_iter()
            .map(|block| blocks::render_block(block, progress.is_completed(&block.id)));

        Element::new("div")
            .id("lesson-content")
            .data("theme", self.theme.as_str())
            .data("lesson-id", lesson.id.as_str())
            .child(header)
            .child(self.render_progress(progress, lesson.total_blocks()))
            .child(Element::new("div").class("lesson-blocks").children(blocks))
    }

    /// Progress indicator: bar, "n of m blocks" and percentage
    pub fn render_progress(&self, progress: &ProgressRecord, total: usize) -> Element {
        let completed = progress.completed_blocks.len().min(total);
        let percent = crate::progress::percentage(completed, total);

        let mut indicator = Element::new("div")
            .class("lesson-progress")
            .data("progress", percent.to_string())
            .child(
                Element::new("div").class("progress-bar").child(
                    Element::new("div")
                        .class("progress-fill")
                        .attr("style", format!("width: {}%", percent)),
                ),
            )
            .child(
                Element::new("span")
                    .class("progress-text")
                    .text(format!("{} of {} blocks", completed, total)),
            )
            .child(Element::new("span").class("progress-percent").text(format!("{}%", percent)));

        if total > 0 && completed == total {
            indicator = indicator.class("complete");
        }
        indicator
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::normalize;
    use pretty_assertions::assert_eq;
    use serde_json::json;

    fn lesson() -> Lesson {
        normalize(json!({
            "id": "L1",
            "title": "Loops",
            "blocks": [
                { "id": "b2", "type": "code_example", "order": 2, "code": "for i in range(3):\n    print(i)", "language": "python" },
                { "id": "b1", "type": "text", "order": 1, "content": "Loops **repeat**." },
                { "id": "b3", "type": "foo", "order": 3, "weird": "<tag>" },
                { "id": "b4", "type": "interactive", "order": 4, "starterCode": "x = 1", "hints": ["one", "two"] },
                { "id": "b5", "type": "quiz", "order": 5, "quizId": "Q9" }
            ]
        }))
        .unwrap()
    }

    fn blocks_of(root: &Element) -> Vec<&Element> {
        let mut out = Vec::new();
        root.find_all(&|e| e.get_attr("data-block-type").is_some() && e.tag == "section", &mut out);
        out
    }

    #[test]
    fn blocks_render_in_order_with_ids() {
        let root = Renderer::default().render(&lesson(), &ProgressRecord::default());
        assert_eq!(root.get_attr("id"), Some("lesson-content"));
        assert_eq!(root.get_attr("data-theme"), Some("dark"));

        let ids: Vec<_> = blocks_of(&root).iter().filter_map(|b| b.get_attr("data-block-id")).collect();
        assert_eq!(ids, vec!["b1", "b2", "b3", "b4", "b5"]);
    }

    #[test]
    fn unknown_type_renders_fallback_and_later_blocks() {
        let root = Renderer::default().render(&lesson(), &ProgressRecord::default());
        let fallback = root.find(&|e| e.has_class("block-fallback")).unwrap();
        assert!(fallback.text_content().contains("foo"));

        let html = root.to_html();
        assert!(html.contains("&lt;tag&gt;"));
        assert!(!html.contains("<tag>"));
        assert!(html.contains("data-quiz-id=\"Q9\""));
    }

    #[test]
    fn completed_blocks_are_marked() {
        let mut progress = ProgressRecord::default();
        progress.completed_blocks.insert("b1".into());

        let root = Renderer::default().render(&lesson(), &progress);
        let blocks = blocks_of(&root);
        assert!(blocks[0].has_class("completed"));
        assert!(blocks[0].find(&|e| e.has_class("completed-badge")).is_some());
        assert!(!blocks[1].has_class("completed"));
    }

    #[test]
    fn interactive_block_has_editor_and_actions() {
        let root = Renderer::default().render(&lesson(), &ProgressRecord::default());
        let editor = root.find(&|e| e.tag == "textarea").unwrap();
        assert_eq!(editor.text_content(), "x = 1");

        for name in [action::RUN_CODE, action::RESET_CODE, action::SHOW_HINT] {
            assert!(root.find(&|e| e.get_attr("data-action") == Some(name)).is_some(), "{name}");
        }
        assert!(root.find(&|e| e.get_attr("data-action") == Some(action::SHOW_SOLUTION)).is_none());
    }

    #[test]
    fn reading_with_questions_only_offers_check_answers() {
        let lesson = normalize(json!({
            "id": "L2",
            "blocks": [
                { "id": "plain", "type": "text", "content": "Read me." },
                { "id": "asked", "type": "text", "content": "Then answer.", "questions": [
                    { "question": "Ready?", "options": ["yes", "no"], "answer": 0 }
                ] }
            ]
        }))
        .unwrap();
        let root = Renderer::default().render(&lesson, &ProgressRecord::default());
        let blocks = blocks_of(&root);
        let has_action = |block: &Element, name: &str| block.find(&|e| e.get_attr("data-action") == Some(name)).is_some();

        assert!(has_action(blocks[0], action::MARK_READ));
        assert!(!has_action(blocks[0], action::SUBMIT_COMPREHENSION));
        assert!(has_action(blocks[1], action::SUBMIT_COMPREHENSION));
        assert!(!has_action(blocks[1], action::MARK_READ));
        assert!(blocks[1].find(&|e| e.get_attr("data-question") == Some("0")).is_some());
    }

    #[test]
    fn progress_indicator_counts_blocks() {
        let mut progress = ProgressRecord::default();
        progress.completed_blocks.insert("a".into());
        progress.completed_blocks.insert("b".into());

        let indicator = Renderer::new(ThemeMode::Light).render_progress(&progress, 4);
        assert_eq!(indicator.get_attr("data-progress"), Some("50"));
        assert_eq!(
            indicator.to_html(),
            "<div class=\"lesson-progress\" data-progress=\"50\"><div class=\"progress-bar\">\
             <div class=\"progress-fill\" style=\"width: 50%\"></div></div>\
             <span class=\"progress-text\">2 of 4 blocks</span>\
             <span class=\"progress-percent\">50%</span></div>"
        );
    }

    #[test]
    fn empty_lesson_renders_zero_progress() {
        let lesson = normalize(json!({ "id": "E", "blocks": [] })).unwrap();
        let root = Renderer::default().render(&lesson, &ProgressRecord::default());
        assert!(root.to_html().contains("0 of 0 blocks"));
    }
}
