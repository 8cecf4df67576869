//! Key mapping for the player

use crossterm::event::{KeyCode, KeyModifiers};

/// Things a key press can ask the player to do
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Action {
    Up,
    Down,
    Top,
    Bottom,
    ScrollUp,
    ScrollDown,
    MarkComplete,
    RunCode,
    ResetCode,
    ShowHint,
    ShowSolution,
    CopyCode,
    EditCode,
    EnterCommand,
    ToggleTheme,
    Help,
    Quit,
}

/// Map a key in normal mode
pub fn key_to_action(key: KeyCode, modifiers: KeyModifiers) -> Option<Action> {
    if modifiers.intersects(KeyModifiers::CONTROL | KeyModifiers::SUPER) {
        return match key {
            KeyCode::Enter => Some(Action::RunCode),
            KeyCode::Char('d') => Some(Action::ScrollDown),
            KeyCode::Char('u') => Some(Action::ScrollUp),
            KeyCode::Char('c') => Some(Action::Quit),
            _ => None,
        };
    }

    match key {
        KeyCode::Char('j') | KeyCode::Down => Some(Action::Down),
        KeyCode::Char('k') | KeyCode::Up => Some(Action::Up),
        KeyCode::Char('g') | KeyCode::Home => Some(Action::Top),
        KeyCode::Char('G') | KeyCode::End => Some(Action::Bottom),
        KeyCode::PageDown => Some(Action::ScrollDown),
        KeyCode::PageUp => Some(Action::ScrollUp),
        KeyCode::Char('m') | KeyCode::Enter => Some(Action::MarkComplete),
        KeyCode::Char('r') => Some(Action::ResetCode),
        KeyCode::Char('h') => Some(Action::ShowHint),
        KeyCode::Char('s') => Some(Action::ShowSolution),
        KeyCode::Char('y') => Some(Action::CopyCode),
        KeyCode::Char('e') | KeyCode::Char('i') => Some(Action::EditCode),
        KeyCode::Char(':') => Some(Action::EnterCommand),
        KeyCode::Char('t') => Some(Action::ToggleTheme),
        KeyCode::Char('?') => Some(Action::Help),
        KeyCode::Char('q') => Some(Action::Quit),
        _ => None,
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn vim_motion_keys() {
        assert_eq!(key_to_action(KeyCode::Char('j'), KeyModifiers::NONE), Some(Action::Down));
        assert_eq!(key_to_action(KeyCode::Char('k'), KeyModifiers::NONE), Some(Action::Up));
        assert_eq!(key_to_action(KeyCode::Char('G'), KeyModifiers::SHIFT), Some(Action::Bottom));
    }

    #[test]
    fn enter_marks_and_ctrl_enter_runs() {
        assert_eq!(key_to_action(KeyCode::Enter, KeyModifiers::NONE), Some(Action::MarkComplete));
        assert_eq!(key_to_action(KeyCode::Enter, KeyModifiers::CONTROL), Some(Action::RunCode));
        assert_eq!(key_to_action(KeyCode::Enter, KeyModifiers::SUPER), Some(Action::RunCode));
    }

    #[test]
    fn unknown_key_returns_none() {
        assert_eq!(key_to_action(KeyCode::Char('x'), KeyModifiers::NONE), None);
        assert_eq!(key_to_action(KeyCode::Char('x'), KeyModifiers::CONTROL), None);
    }
}
