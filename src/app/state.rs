//! Player state

use std::collections::HashMap;
use std::sync::Arc;

use tokio::time::Instant;

use crate::assessment::BlockStatus;
use crate::lesson::{Block, Lesson};
use crate::notify::Notifications;
use crate::progress::ProgressRecord;
use crate::theme::ThemeMode;

/// Input mode
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq)]
pub enum Mode {
    #[default]
    Normal,
    /// Typing a `:` command
    Command,
    /// Typing into the code editor of the selected block
    Insert,
}

/// Command line input and status message
#[derive(Debug, Clone, Default)]
pub struct CommandLineState {
    pub input: String,
    /// Cursor position in characters
    pub cursor: usize,
    pub message: Option<String>,
    pub is_error: bool,
}

impl CommandLineState {
    pub fn start(&mut self) {
        self.input.clear();
        self.cursor = 0;
        self.message = None;
    }

    pub fn set_message(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = false;
    }

    pub fn set_error(&mut self, msg: impl Into<String>) {
        self.message = Some(msg.into());
        self.is_error = true;
    }

    fn byte_index(&self, char_idx: usize) -> usize {
        self.input.char_indices().nth(char_idx).map_or(self.input.len(), |(i, _)| i)
    }

    pub fn insert_char(&mut self, c: char) {
        let at = self.byte_index(self.cursor);
        self.input.insert(at, c);
        self.cursor += 1;
    }

    pub fn delete_char(&mut self) {
        if self.cursor > 0 {
            self.cursor -= 1;
            let at = self.byte_index(self.cursor);
            self.input.remove(at);
        }
    }

    pub fn move_left(&mut self) {
        self.cursor = self.cursor.saturating_sub(1);
    }

    pub fn move_right(&mut self) {
        self.cursor = (self.cursor + 1).min(self.input.chars().count());
    }
}

/// Progress data copied out of the store once per frame
#[derive(Debug, Clone, Default)]
pub struct ProgressView {
    pub record: ProgressRecord,
    pub statuses: HashMap<String, BlockStatus>,
}

impl ProgressView {
    pub fn status(&self, block_id: &str) -> BlockStatus {
        self.statuses.get(block_id).copied().unwrap_or(BlockStatus::NotStarted)
    }
}

/// Everything the player draws from
#[derive(Debug)]
pub struct PlayerState {
    pub lesson: Arc<Lesson>,
    /// Index into `lesson.ordered_blocks()`
    pub selected: usize,
    /// Scroll offset of the detail pane
    pub detail_scroll: usize,
    /// Rendered line count of the detail pane (updated on draw)
    pub detail_lines: usize,
    /// Visible height of the detail pane (updated on draw)
    pub detail_height: usize,
    pub mode: Mode,
    pub command_line: CommandLineState,
    pub notifications: Notifications,
    pub theme: ThemeMode,
    pub progress: ProgressView,
    /// When the selected block was opened
    pub selected_since: Instant,
    /// Whether the end of the selected block has been shown
    pub scrolled_to_bottom: bool,
    /// Width of the block list in percent
    pub list_width_percent: u16,
}

impl PlayerState {
    pub fn new(lesson: Arc<Lesson>, theme: ThemeMode) -> Self {
        Self {
            lesson,
            selected: 0,
            detail_scroll: 0,
            detail_lines: 0,
            detail_height: 0,
            mode: Mode::Normal,
            command_line: CommandLineState::default(),
            notifications: Notifications::default(),
            theme,
            progress: ProgressView::default(),
            selected_since: Instant::now(),
            scrolled_to_bottom: false,
            list_width_percent: 35,
        }
    }

    pub fn blocks(&self) -> Vec<&Block> {
        self.lesson.ordered_blocks()
    }

    pub fn selected_block(&self) -> Option<&Block> {
        self.lesson.ordered_blocks().get(self.selected).copied()
    }

    pub fn selected_block_id(&self) -> Option<String> {
        self.selected_block().map(|b| b.id.clone())
    }

    /// Select a block by index, clamped. Returns whether the selection moved.
    pub fn select(&mut self, index: usize) -> bool {
        let last = self.lesson.total_blocks().saturating_sub(1);
        let index = index.min(last);
        if index == self.selected {
            return false;
        }
        self.selected = index;
        self.detail_scroll = 0;
        self.scrolled_to_bottom = false;
        self.selected_since = Instant::now();
        true
    }

    /// Select a block by id
    pub fn select_id(&mut self, block_id: &str) -> bool {
        match self.blocks().iter().position(|b| b.id == block_id) {
            Some(index) => self.select(index),
            None => false,
        }
    }

    pub fn scroll_detail(&mut self, delta: isize) {
        let max = self.detail_lines.saturating_sub(self.detail_height);
        self.detail_scroll = self.detail_scroll.saturating_add_signed(delta).min(max);
        self.note_scroll_position();
    }

    /// Track whether the whole selected block has been on screen
    pub fn note_scroll_position(&mut self) {
        if self.detail_scroll + self.detail_height >= self.detail_lines {
            self.scrolled_to_bottom = true;
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::lesson::normalize;
    use serde_json::json;

    fn state() -> PlayerState {
        let lesson = normalize(json!({
            "id": "L",
            "blocks": [
                { "id": "a", "type": "text", "content": "x" },
                { "id": "b", "type": "text", "content": "y" }
            ]
        }))
        .unwrap();
        PlayerState::new(Arc::new(lesson), ThemeMode::Dark)
    }

    #[test]
    fn selection_is_clamped() {
        let mut state = state();
        assert!(state.select(10));
        assert_eq!(state.selected, 1);
        assert!(!state.select(1));
        assert!(state.select_id("a"));
        assert_eq!(state.selected_block_id().as_deref(), Some("a"));
    }

    #[test]
    fn scrolling_to_the_end_is_tracked() {
        let mut state = state();
        state.detail_lines = 30;
        state.detail_height = 10;
        state.scroll_detail(5);
        assert!(!state.scrolled_to_bottom);
        state.scroll_detail(50);
        assert_eq!(state.detail_scroll, 20);
        assert!(state.scrolled_to_bottom);
    }

    #[test]
    fn command_line_editing() {
        let mut line = CommandLineState::default();
        for c in "score 8".chars() {
            line.insert_char(c);
        }
        line.move_left();
        line.insert_char('9');
        assert_eq!(line.input, "score 98");
        line.delete_char();
        assert_eq!(line.input, "score 8");
    }
}
