//! UI events routed to the controller

use std::collections::BTreeMap;

use crossterm::event::{KeyCode, KeyModifiers};

use crate::render::action;

/// The element an event happened on
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Target {
    pub tag: String,
    /// `data-*` attributes, without the prefix
    pub data: BTreeMap<String, String>,
    /// Enclosing elements, innermost first
    pub ancestors: Vec<Target>,
}

impl Target {
    pub fn new(tag: impl Into<String>) -> Self {
        Self { tag: tag.into(), ..Default::default() }
    }

    pub fn with_data(mut self, name: impl Into<String>, value: impl Into<String>) -> Self {
        self.data.insert(name.into(), value.into());
        self
    }

    pub fn within(mut self, ancestor: Target) -> Self {
        self.ancestors.push(ancestor);
        self
    }

    /// A button inside a block wrapper
    pub fn button(block_id: &str, action: &str) -> Self {
        Self::new("button")
            .with_data("action", action)
            .within(Target::new("section").with_data("block-id", block_id))
    }

    /// The code editor of a block
    pub fn editor(block_id: &str) -> Self {
        Self::new("textarea").with_data("block-id", block_id)
    }

    /// Look up a `data-*` value on this element or the nearest ancestor
    pub fn closest(&self, name: &str) -> Option<&str> {
        self.data
            .get(name)
            .or_else(|| self.ancestors.iter().find_map(|a| a.data.get(name)))
            .map(String::as_str)
    }

    pub fn block_id(&self) -> Option<&str> {
        self.closest("block-id")
    }

    pub fn is_editor(&self) -> bool {
        self.tag.eq_ignore_ascii_case("textarea")
    }
}

/// An input event
#[derive(Debug, Clone, PartialEq)]
pub enum UiEvent {
    Click { target: Target },
    Key { key: KeyCode, modifiers: KeyModifiers, focused: Option<Target> },
    /// The editor buffer of a block changed
    Edit { block_id: String, text: String },
}

/// What the learner asked for
#[derive(Debug, Clone, PartialEq)]
pub enum Action {
    RunCode,
    ResetCode,
    ShowHint,
    ShowSolution,
    CopyCode,
    MarkComplete,
    SubmitQuiz { score: f64 },
    /// Picked option per comprehension question, graded against the answer key
    SubmitAnswers { answers: Vec<Option<usize>> },
    ReportEngagement { seconds: u64, scrolled_to_bottom: bool },
    ReportVideo { watch_percent: f64 },
    Retry,
}

impl Action {
    /// Decode a `data-action` attribute. Quiz scores come from `data-score`,
    /// comprehension picks from `data-answers`.
    pub fn from_target(target: &Target) -> Option<Self> {
        let score = || target.closest("score").and_then(|s| s.parse::<f64>().ok());

        match target.closest("action")? {
            action::RUN_CODE => Some(Self::RunCode),
            action::RESET_CODE => Some(Self::ResetCode),
            action::SHOW_HINT => Some(Self::ShowHint),
            action::SHOW_SOLUTION => Some(Self::ShowSolution),
            action::COPY_CODE => Some(Self::CopyCode),
            action::MARK_READ | action::MARK_UNDERSTOOD | action::MARK_WATCHED => Some(Self::MarkComplete),
            action::SUBMIT_QUIZ => score().map(|score| Self::SubmitQuiz { score }),
            action::SUBMIT_COMPREHENSION => {
                target.closest("answers").and_then(parse_answers).map(|answers| Self::SubmitAnswers { answers })
            }
            action::RETRY => Some(Self::Retry),
            other => {
                tracing::debug!("Ignoring unknown action '{}'", other);
                None
            }
        }
    }

    /// Ctrl+Enter or Cmd+Enter in a code editor runs it
    pub fn from_key(key: KeyCode, modifiers: KeyModifiers, focused: Option<&Target>) -> Option<Self> {
        let run_chord = key == KeyCode::Enter
            && (modifiers.contains(KeyModifiers::CONTROL) || modifiers.contains(KeyModifiers::SUPER));
        (run_chord && focused.is_some_and(Target::is_editor)).then_some(Self::RunCode)
    }
}

/// Parse `data-answers`: comma separated option indexes, empty or `-` for unanswered
pub fn parse_answers(value: &str) -> Option<Vec<Option<usize>>> {
    value
        .split(',')
        .map(str::trim)
        .map(|part| match part {
            "" | "-" => Some(None),
            n => n.parse().ok().map(Some),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn block_id_resolves_from_ancestor() {
        let target = Target::button("L1-code-0", action::RUN_CODE);
        assert_eq!(target.block_id(), Some("L1-code-0"));
        assert_eq!(Action::from_target(&target), Some(Action::RunCode));
    }

    #[test]
    fn mark_variants_map_to_mark_complete() {
        for name in [action::MARK_READ, action::MARK_UNDERSTOOD, action::MARK_WATCHED] {
            assert_eq!(Action::from_target(&Target::button("b", name)), Some(Action::MarkComplete));
        }
    }

    #[test]
    fn quiz_submission_needs_a_score() {
        let bare = Target::button("q", action::SUBMIT_QUIZ);
        assert_eq!(Action::from_target(&bare), None);

        let scored = bare.with_data("score", "75");
        assert_eq!(Action::from_target(&scored), Some(Action::SubmitQuiz { score: 75.0 }));
    }

    #[test]
    fn comprehension_submission_carries_picked_options() {
        let bare = Target::button("t", action::SUBMIT_COMPREHENSION);
        assert_eq!(Action::from_target(&bare), None);

        let picked = bare.clone().with_data("answers", "1, -,0");
        assert_eq!(
            Action::from_target(&picked),
            Some(Action::SubmitAnswers { answers: vec![Some(1), None, Some(0)] })
        );

        let letters = bare.with_data("answers", "b");
        assert_eq!(Action::from_target(&letters), None);
    }

    #[test]
    fn ctrl_or_cmd_enter_runs_focused_editor() {
        let editor = Target::editor("b");
        assert_eq!(Action::from_key(KeyCode::Enter, KeyModifiers::CONTROL, Some(&editor)), Some(Action::RunCode));
        assert_eq!(Action::from_key(KeyCode::Enter, KeyModifiers::SUPER, Some(&editor)), Some(Action::RunCode));
        assert_eq!(Action::from_key(KeyCode::Enter, KeyModifiers::NONE, Some(&editor)), None);

        let button = Target::button("b", action::COPY_CODE);
        assert_eq!(Action::from_key(KeyCode::Enter, KeyModifiers::CONTROL, Some(&button)), None);
        assert_eq!(Action::from_key(KeyCode::Enter, KeyModifiers::CONTROL, None), None);
    }
}
