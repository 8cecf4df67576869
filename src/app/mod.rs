//! Terminal lesson player

pub mod command;
pub mod input;
pub mod state;

use std::collections::HashMap;
use std::io::{self, Stdout};
use std::sync::Arc;
use std::time::Duration;

use anyhow::Result;
use crossterm::{
    event::{self, DisableMouseCapture, EnableMouseCapture, Event, KeyCode, KeyEvent, KeyEventKind, KeyModifiers},
    execute,
    terminal::{EnterAlternateScreen, LeaveAlternateScreen, disable_raw_mode, enable_raw_mode},
};
use ratatui::{Terminal, backend::CrosstermBackend};

use crate::config::LocalStore;
use crate::config::session::Session;
use crate::interaction::{self, InteractionController, Outcome, UiEvent};
use crate::lesson::{BlockKind, Lesson};
use crate::notify::Toast;
use crate::progress::{Autosaver, EventReceiver, SharedStore};
use crate::theme::ThemeMode;
use crate::ui;
use command::{Command, ParseResult, parse_command};
use input::{Action, key_to_action};
use state::{Mode, PlayerState, ProgressView};

/// The interactive lesson player
pub struct Player {
    state: PlayerState,
    controller: InteractionController,
    store: SharedStore,
    events: EventReceiver,
    /// Where the theme choice is remembered
    local: Arc<LocalStore>,
}

impl Player {
    pub async fn new(
        lesson: Arc<Lesson>,
        store: SharedStore,
        controller: InteractionController,
        local: Arc<LocalStore>,
        theme: ThemeMode,
    ) -> Self {
        let events = store.lock().await.subscribe();
        let mut player = Self { state: PlayerState::new(lesson, theme), controller, store, events, local };
        player.refresh().await;
        player
    }

    pub fn state(&self) -> &PlayerState {
        &self.state
    }

    pub fn controller(&self) -> &InteractionController {
        &self.controller
    }

    /// Put the player back where a previous session left it
    pub fn restore(&mut self, session: &Session) {
        self.state.list_width_percent = session.block_list_width_percent;
        if let Some(saved) = session.lesson(&self.state.lesson.id) {
            self.state.select(saved.selected_block);
            self.state.detail_scroll = saved.detail_scroll_offset;
            self.controller.restore_buffers(&saved.editor_buffers);
        }
        self.state.selected_since = tokio::time::Instant::now();
    }

    /// Record where the player is in the session
    pub fn remember(&self, session: &mut Session) {
        let lesson_id = self.state.lesson.id.clone();
        session.current_lesson_id = Some(lesson_id.clone());
        session.block_list_width_percent = self.state.list_width_percent;
        let saved = session.lesson_mut(&lesson_id);
        saved.selected_block = self.state.selected;
        saved.detail_scroll_offset = self.state.detail_scroll;
        saved.editor_buffers = self.controller.modified_buffers();
    }

    /// Apply finished code runs, copy progress out of the store and turn
    /// lesson events into toasts
    pub async fn refresh(&mut self) {
        for outcome in self.controller.collect_runs().await {
            self.report(outcome);
        }
        {
            let store = self.store.lock().await;
            let statuses: HashMap<_, _> =
                self.state.lesson.blocks.iter().map(|b| (b.id.clone(), store.status(&b.id))).collect();
            self.state.progress = ProgressView { record: store.record().clone(), statuses };
        }

        while let Ok(event) = self.events.try_recv() {
            tracing::debug!("Lesson event: {:?}", event);
            self.state.notifications.push_event(&event);
        }
        self.state.notifications.prune();
    }

    /// Handle a key press. Returns true when the player should exit.
    pub async fn handle_key(&mut self, key: KeyEvent) -> bool {
        let quit = match self.state.mode {
            Mode::Normal => self.handle_normal_key(key).await,
            Mode::Command => self.handle_command_key(key).await,
            Mode::Insert => {
                self.handle_insert_key(key).await;
                false
            }
        };
        self.refresh().await;
        quit
    }

    async fn handle_normal_key(&mut self, key: KeyEvent) -> bool {
        let Some(action) = key_to_action(key.code, key.modifiers) else {
            return false;
        };

        match action {
            Action::Up => self.move_to(self.state.selected.saturating_sub(1)).await,
            Action::Down => self.move_to(self.state.selected + 1).await,
            Action::Top => self.move_to(0).await,
            Action::Bottom => self.move_to(usize::MAX).await,
            Action::ScrollDown => self.state.scroll_detail(half_page(self.state.detail_height)),
            Action::ScrollUp => self.state.scroll_detail(-half_page(self.state.detail_height)),
            Action::MarkComplete => self.act(interaction::Action::MarkComplete).await,
            Action::RunCode => self.act(interaction::Action::RunCode).await,
            Action::ResetCode => self.act(interaction::Action::ResetCode).await,
            Action::ShowHint => self.act(interaction::Action::ShowHint).await,
            Action::ShowSolution => self.act(interaction::Action::ShowSolution).await,
            Action::CopyCode => self.act(interaction::Action::CopyCode).await,
            Action::EditCode => {
                if matches!(self.state.selected_block().map(|b| &b.kind), Some(BlockKind::Interactive(_))) {
                    self.state.mode = Mode::Insert;
                    self.state.command_line.set_message("-- INSERT --");
                }
            }
            Action::EnterCommand => {
                self.state.mode = Mode::Command;
                self.state.command_line.start();
            }
            Action::ToggleTheme => self.toggle_theme(),
            Action::Help => self.state.command_line.set_message(command::HELP),
            Action::Quit => {
                self.leave_block().await;
                return true;
            }
        }
        false
    }

    async fn handle_command_key(&mut self, key: KeyEvent) -> bool {
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Normal;
                self.state.command_line.start();
            }
            KeyCode::Enter => {
                self.state.mode = Mode::Normal;
                let input = std::mem::take(&mut self.state.command_line.input);
                self.state.command_line.cursor = 0;
                return self.run_command(&input).await;
            }
            KeyCode::Backspace => {
                if self.state.command_line.input.is_empty() {
                    self.state.mode = Mode::Normal;
                } else {
                    self.state.command_line.delete_char();
                }
            }
            KeyCode::Left => self.state.command_line.move_left(),
            KeyCode::Right => self.state.command_line.move_right(),
            KeyCode::Char(c) => self.state.command_line.insert_char(c),
            _ => {}
        }
        false
    }

    async fn handle_insert_key(&mut self, key: KeyEvent) {
        let Some(block_id) = self.state.selected_block_id() else {
            self.state.mode = Mode::Normal;
            return;
        };

        // The editor of the selected block is the focused element
        let focused = interaction::Target::editor(&block_id);
        if interaction::Action::from_key(key.code, key.modifiers, Some(&focused)).is_some() {
            let outcome =
                self.controller.handle(UiEvent::Key { key: key.code, modifiers: key.modifiers, focused: Some(focused) }).await;
            self.report(outcome);
            return;
        }

        let mut buffer = self.controller.editor(&block_id).map(|e| e.buffer.clone()).unwrap_or_default();
        match key.code {
            KeyCode::Esc => {
                self.state.mode = Mode::Normal;
                self.state.command_line.message = None;
                return;
            }
            KeyCode::Enter => buffer.push('\n'),
            KeyCode::Tab => buffer.push_str("    "),
            KeyCode::Backspace => {
                buffer.pop();
            }
            KeyCode::Char(c) if !key.modifiers.contains(KeyModifiers::CONTROL) => buffer.push(c),
            _ => return,
        }

        let outcome = self.controller.handle(UiEvent::Edit { block_id, text: buffer }).await;
        self.report(outcome);
        // Keep the end of the buffer in view
        self.state.scroll_detail(isize::MAX / 2);
    }

    /// Run a parsed `:` command. Returns true on quit.
    async fn run_command(&mut self, input: &str) -> bool {
        let command = match parse_command(input) {
            ParseResult::Ok(command) => command,
            ParseResult::UnknownCommand(cmd) => {
                self.state.command_line.set_error(format!("Unknown command: {}", cmd));
                return false;
            }
            ParseResult::MissingArgument(cmd) => {
                self.state.command_line.set_error(format!("{} needs a value", cmd));
                return false;
            }
            ParseResult::InvalidArgument { command, value } => {
                self.state.command_line.set_error(format!("Invalid value for {}: {}", command, value));
                return false;
            }
        };

        match command {
            Command::Score(score) => self.act(interaction::Action::SubmitQuiz { score }).await,
            Command::Answers(answers) => self.act(interaction::Action::SubmitAnswers { answers }).await,
            Command::Watched(watch_percent) => self.act(interaction::Action::ReportVideo { watch_percent }).await,
            Command::Goto(n) => self.move_to(n - 1).await,
            Command::Theme => self.toggle_theme(),
            Command::Save => {
                self.controller.save_now();
                self.state.command_line.set_message("Saving progress…");
            }
            Command::Quit => {
                self.leave_block().await;
                return true;
            }
            Command::Help => self.state.command_line.set_message(command::HELP),
            Command::Nop => {}
        }
        false
    }

    /// Move the selection, reporting reading time for the block being left
    async fn move_to(&mut self, index: usize) {
        let last = self.state.lesson.total_blocks().saturating_sub(1);
        if index.min(last) == self.state.selected {
            return;
        }
        self.leave_block().await;
        self.state.select(index);
        self.state.command_line.message = None;
    }

    /// Text blocks complete once read long enough and to the end. Rejections stay silent.
    async fn leave_block(&mut self) {
        let Some(block) = self.state.selected_block() else {
            return;
        };
        if !matches!(block.kind, BlockKind::Text(_)) || self.state.progress.record.is_completed(&block.id) {
            return;
        }
        let block_id = block.id.clone();
        let action = interaction::Action::ReportEngagement {
            seconds: self.state.selected_since.elapsed().as_secs(),
            scrolled_to_bottom: self.state.scrolled_to_bottom,
        };
        if let Outcome::Evaluated { evaluation, .. } = self.controller.dispatch(&block_id, action).await {
            tracing::debug!("Engagement on {}: {}", block_id, evaluation.feedback);
        }
    }

    async fn act(&mut self, action: interaction::Action) {
        let Some(block_id) = self.state.selected_block_id() else {
            return;
        };
        let outcome = self.controller.dispatch(&block_id, action).await;
        self.report(outcome);
    }

    /// Show the result of an action on the status line
    fn report(&mut self, outcome: Outcome) {
        match outcome {
            Outcome::Ignored | Outcome::Updated { .. } => {}
            Outcome::Evaluated { evaluation, .. } => {
                if evaluation.accepted {
                    self.state.command_line.set_message(evaluation.feedback);
                } else {
                    self.state.command_line.set_error(evaluation.feedback);
                }
            }
            Outcome::Copied { .. } => self.state.notifications.push(Toast::info("Copied to clipboard")),
            Outcome::Failed { message, .. } => self.state.command_line.set_error(message),
        }
    }

    fn toggle_theme(&mut self) {
        self.state.theme = self.state.theme.toggled();
        if let Err(e) = self.state.theme.save(&self.local) {
            tracing::warn!("Failed to remember theme: {:#}", e);
        }
        self.state.command_line.set_message(format!("Theme: {}", self.state.theme));
    }

    /// Run the player until the learner quits
    pub async fn run(mut self, autosave: Duration) -> Result<Session> {
        let mut session = Session::load().unwrap_or_else(|e| {
            tracing::warn!("Starting a fresh session: {:#}", e);
            Session::default()
        });
        self.restore(&session);

        let autosaver = Autosaver::spawn(self.store.clone(), autosave);
        let mut terminal = setup_terminal()?;

        let original_hook = std::panic::take_hook();
        std::panic::set_hook(Box::new(move |panic_info| {
            let _ = disable_raw_mode();
            let _ = execute!(io::stdout(), LeaveAlternateScreen, DisableMouseCapture);
            original_hook(panic_info);
        }));

        let result = self.event_loop(&mut terminal).await;
        restore_terminal(&mut terminal)?;

        self.controller.flush_saves().await;
        autosaver.shutdown().await;
        self.remember(&mut session);
        if let Err(e) = session.save() {
            tracing::warn!("Failed to save session: {:#}", e);
        }

        result.map(|()| session)
    }

    async fn event_loop(&mut self, terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
        loop {
            terminal.draw(|frame| ui::draw(frame, &mut self.state, &self.controller))?;

            if event::poll(Duration::from_millis(50))? {
                if let Event::Key(key) = event::read()? {
                    if key.kind == KeyEventKind::Press && self.handle_key(key).await {
                        return Ok(());
                    }
                }
            } else {
                self.refresh().await;
            }
        }
    }
}

fn half_page(height: usize) -> isize {
    (height / 2).max(1) as isize
}

fn setup_terminal() -> Result<Terminal<CrosstermBackend<Stdout>>> {
    enable_raw_mode()?;
    let mut stdout = io::stdout();
    execute!(stdout, EnterAlternateScreen, EnableMouseCapture)?;
    Ok(Terminal::new(CrosstermBackend::new(stdout))?)
}

fn restore_terminal(terminal: &mut Terminal<CrosstermBackend<Stdout>>) -> Result<()> {
    disable_raw_mode()?;
    execute!(terminal.backend_mut(), LeaveAlternateScreen, DisableMouseCapture)?;
    terminal.show_cursor()?;
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::assessment::{BlockStatus, RuleTable};
    use crate::interaction::ClipboardSink;
    use crate::lesson::normalize;
    use crate::progress::{ProgressPersistence, ProgressRecord, ProgressStore};
    use serde_json::json;
    use std::sync::Mutex as StdMutex;
    use tokio::sync::Mutex;

    #[derive(Default)]
    struct MemoryClipboard(StdMutex<Vec<String>>);

    impl ClipboardSink for MemoryClipboard {
        fn copy(&self, text: &str) -> anyhow::Result<()> {
            self.0.lock().unwrap().push(text.to_string());
            Ok(())
        }
    }

    async fn player() -> (Player, Arc<MemoryClipboard>) {
        player_with(json!([
            { "id": "intro", "type": "text", "content": "Loops repeat things." },
            { "id": "quiz", "type": "quiz", "quizId": "q1" },
            { "id": "ex", "type": "interactive", "starterCode": "print(1)", "hints": ["Use range"] }
        ]))
        .await
    }

    async fn player_with(blocks: serde_json::Value) -> (Player, Arc<MemoryClipboard>) {
        let lesson = Arc::new(normalize(json!({ "id": "L1", "title": "Loops", "blocks": blocks })).unwrap());
        let local = Arc::new(LocalStore::in_memory());
        let persistence = ProgressPersistence::local_only(local.clone());
        let store = ProgressStore::new(lesson.clone(), ProgressRecord::default(), RuleTable::default(), persistence);
        let store: SharedStore = Arc::new(Mutex::new(store));
        let clipboard = Arc::new(MemoryClipboard::default());
        let controller = InteractionController::new(lesson.clone(), store.clone(), None, clipboard.clone());
        (Player::new(lesson, store, controller, local, ThemeMode::Dark).await, clipboard)
    }

    fn key(code: KeyCode) -> KeyEvent {
        KeyEvent::new(code, KeyModifiers::NONE)
    }

    async fn type_command(player: &mut Player, text: &str) -> bool {
        player.handle_key(key(KeyCode::Char(':'))).await;
        for c in text.chars() {
            player.handle_key(key(KeyCode::Char(c))).await;
        }
        player.handle_key(key(KeyCode::Enter)).await
    }

    #[tokio::test]
    async fn marking_text_as_read_updates_progress() {
        let (mut player, _) = player().await;
        player.handle_key(key(KeyCode::Char('m'))).await;

        assert_eq!(player.state().progress.status("intro"), BlockStatus::Completed);
        assert_eq!(player.state().progress.record.progress, 33);
        assert!(player.state().notifications.latest().is_some());
    }

    #[tokio::test]
    async fn quiz_score_goes_through_the_command_line() {
        let (mut player, _) = player().await;
        player.handle_key(key(KeyCode::Char('j'))).await;

        assert!(!type_command(&mut player, "score 40").await);
        assert_eq!(player.state().progress.status("quiz"), BlockStatus::InProgress);
        assert!(player.state().command_line.is_error);

        type_command(&mut player, "score 90").await;
        assert_eq!(player.state().progress.status("quiz"), BlockStatus::Completed);
    }

    #[tokio::test]
    async fn unknown_command_is_reported() {
        let (mut player, _) = player().await;
        type_command(&mut player, "frobnicate").await;
        assert!(player.state().command_line.is_error);
        assert_eq!(player.state().mode, Mode::Normal);
    }

    #[tokio::test]
    async fn insert_mode_edits_the_selected_exercise() {
        let (mut player, clipboard) = player().await;
        player.handle_key(key(KeyCode::Char('G'))).await;
        player.handle_key(key(KeyCode::Char('e'))).await;
        assert_eq!(player.state().mode, Mode::Insert);

        player.handle_key(key(KeyCode::Backspace)).await;
        player.handle_key(key(KeyCode::Char('2'))).await;
        player.handle_key(key(KeyCode::Char(')'))).await;
        player.handle_key(key(KeyCode::Esc)).await;
        assert_eq!(player.controller().editor("ex").unwrap().buffer, "print(12)");

        player.handle_key(key(KeyCode::Char('y'))).await;
        assert_eq!(clipboard.0.lock().unwrap().as_slice(), ["print(12)"]);
    }

    #[tokio::test]
    async fn running_code_offline_shows_an_error() {
        let (mut player, _) = player().await;
        player.handle_key(key(KeyCode::Char('G'))).await;
        player.handle_key(KeyEvent::new(KeyCode::Enter, KeyModifiers::CONTROL)).await;

        assert!(player.state().command_line.is_error);
        assert_eq!(player.state().progress.status("ex"), BlockStatus::NotStarted);
    }

    #[tokio::test]
    async fn session_keeps_selection_and_edits() {
        let (mut player, _) = player().await;
        type_command(&mut player, "goto 3").await;
        player.handle_key(key(KeyCode::Char('e'))).await;
        player.handle_key(key(KeyCode::Char('#'))).await;

        let mut session = Session::default();
        player.remember(&mut session);
        assert_eq!(session.current_lesson_id.as_deref(), Some("L1"));
        assert_eq!(session.lesson("L1").unwrap().selected_block, 2);

        let (mut fresh, _) = self::player().await;
        fresh.restore(&session);
        assert_eq!(fresh.state().selected, 2);
        assert_eq!(fresh.controller().editor("ex").unwrap().buffer, "print(1)#");
    }

    #[tokio::test]
    async fn answers_command_grades_the_reading() {
        let (mut player, _) = player_with(json!([
            { "id": "read", "type": "text", "content": "Loops repeat.", "questions": [
                { "question": "Which keyword loops?", "options": ["if", "for"], "answer": 1 },
                { "question": "Which repeats?", "options": ["while", "def"], "answer": 0 }
            ] },
            { "id": "quiz", "type": "quiz", "quizId": "q1" }
        ]))
        .await;

        type_command(&mut player, "answers b b").await;
        assert!(player.state().command_line.is_error);
        assert_ne!(player.state().progress.status("read"), BlockStatus::Completed);

        type_command(&mut player, "answers b a").await;
        assert_eq!(player.state().progress.status("read"), BlockStatus::Completed);
    }

    #[tokio::test]
    async fn save_command_does_not_wait_for_the_write() {
        let (mut player, _) = player().await;
        player.handle_key(key(KeyCode::Char('m'))).await;
        type_command(&mut player, "w").await;
        assert!(!player.state().command_line.is_error);

        player.controller.flush_saves().await;
        assert!(!player.store.lock().await.is_dirty());
    }

    #[tokio::test]
    async fn quit_command_exits() {
        let (mut player, _) = player().await;
        assert!(type_command(&mut player, "q").await);
    }
}
