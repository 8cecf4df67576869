//! Routes UI events to lesson actions
//!
//! Events are resolved to a block through `data-block-id` on the target or
//! its nearest ancestor. Every failure ends up in the block's output panel or
//! in the returned [`Outcome`]; `handle` never returns an error.
//!
//! Network work never runs inside `handle`: code runs report back through
//! [`InteractionController::collect_runs`] and saves happen in spawned tasks.

use std::collections::HashMap;
use std::sync::Arc;

use tokio::sync::mpsc;
use tokio::task::JoinHandle;

use super::CodeExecutor;
use super::clipboard::ClipboardSink;
use super::events::{Action, UiEvent};
use super::panel::{OutputPanel, PanelState};
use crate::api::{ApiError, ExecuteRequest, ExecutionResponse};
use crate::assessment::{AssessmentKind, AssessmentResult, Evaluation};
use crate::lesson::{BlockKind, Lesson};
use crate::progress::{SaveOutcome, SharedStore, spawn_save};

type RunResult = (String, Result<ExecutionResponse, ApiError>);

/// Editor state of an interactive block
#[derive(Debug, Clone, Default, PartialEq)]
pub struct EditorState {
    pub buffer: String,
    /// Number of hints revealed so far
    pub hints_shown: usize,
    pub solution_shown: bool,
}

/// Result of handling one event
#[derive(Debug, Clone, PartialEq)]
pub enum Outcome {
    /// Nothing to do for this event
    Ignored,
    /// Local state of a block changed (editor, hints, panel)
    Updated { block_id: String },
    /// An attempt was evaluated
    Evaluated { block_id: String, evaluation: Evaluation },
    Copied { block_id: String },
    Failed { block_id: String, message: String },
}

pub struct InteractionController {
    lesson: Arc<Lesson>,
    store: SharedStore,
    executor: Option<Arc<dyn CodeExecutor>>,
    clipboard: Arc<dyn ClipboardSink>,
    default_language: String,
    editors: HashMap<String, EditorState>,
    panels: HashMap<String, OutputPanel>,
    runs_tx: mpsc::UnboundedSender<RunResult>,
    runs_rx: mpsc::UnboundedReceiver<RunResult>,
    pending_saves: Vec<JoinHandle<SaveOutcome>>,
}

impl InteractionController {
    pub fn new(
        lesson: Arc<Lesson>,
        store: SharedStore,
        executor: Option<Arc<dyn CodeExecutor>>,
        clipboard: Arc<dyn ClipboardSink>,
    ) -> Self {
        let editors = lesson
            .blocks
            .iter()
            .filter_map(|block| match &block.kind {
                BlockKind::Interactive(ex) => Some((
                    block.id.clone(),
                    EditorState { buffer: ex.starter_code.clone(), ..Default::default() },
                )),
                _ => None,
            })
            .collect();
        let (runs_tx, runs_rx) = mpsc::unbounded_channel();

        Self {
            lesson,
            store,
            executor,
            clipboard,
            default_language: "python".to_string(),
            editors,
            panels: HashMap::new(),
            runs_tx,
            runs_rx,
            pending_saves: Vec::new(),
        }
    }

    /// Language used when a block does not name one
    pub fn with_default_language(mut self, language: impl Into<String>) -> Self {
        self.default_language = language.into();
        self
    }

    /// Restore editor contents saved in a previous session
    pub fn restore_buffers(&mut self, buffers: &HashMap<String, String>) {
        for (block_id, text) in buffers {
            if let Some(editor) = self.editors.get_mut(block_id) {
                editor.buffer = text.clone();
            }
        }
    }

    /// Editor contents that differ from the starter code
    pub fn modified_buffers(&self) -> HashMap<String, String> {
        self.editors
            .iter()
            .filter(|(id, editor)| {
                self.lesson.block(id).and_then(|b| b.code()).is_some_and(|starter| starter != editor.buffer)
            })
            .map(|(id, editor)| (id.clone(), editor.buffer.clone()))
            .collect()
    }

    pub fn editor(&self, block_id: &str) -> Option<&EditorState> {
        self.editors.get(block_id)
    }

    pub fn panel(&self, block_id: &str) -> Option<&OutputPanel> {
        self.panels.get(block_id)
    }

    /// Hints revealed so far for a block
    pub fn visible_hints(&self, block_id: &str) -> &[String] {
        match (self.lesson.block(block_id).map(|b| &b.kind), self.editors.get(block_id)) {
            (Some(BlockKind::Interactive(ex)), Some(editor)) => &ex.hints[..editor.hints_shown.min(ex.hints.len())],
            _ => &[],
        }
    }

    /// Handle one UI event
    pub async fn handle(&mut self, event: UiEvent) -> Outcome {
        match event {
            UiEvent::Click { target } => {
                let (Some(block_id), Some(action)) = (target.block_id(), Action::from_target(&target)) else {
                    return Outcome::Ignored;
                };
                let block_id = block_id.to_string();
                self.dispatch(&block_id, action).await
            }
            UiEvent::Key { key, modifiers, focused } => {
                let Some(action) = Action::from_key(key, modifiers, focused.as_ref()) else {
                    return Outcome::Ignored;
                };
                let Some(block_id) = focused.as_ref().and_then(|t| t.block_id()).map(str::to_string) else {
                    return Outcome::Ignored;
                };
                self.dispatch(&block_id, action).await
            }
            UiEvent::Edit { block_id, text } => match self.editors.get_mut(&block_id) {
                Some(editor) => {
                    editor.buffer = text;
                    Outcome::Updated { block_id }
                }
                None => Outcome::Ignored,
            },
        }
    }

    /// Perform an action on a block
    pub async fn dispatch(&mut self, block_id: &str, action: Action) -> Outcome {
        if self.lesson.block(block_id).is_none() {
            tracing::warn!("Action {:?} for unknown block {}", action, block_id);
            return Outcome::Ignored;
        }

        match action {
            Action::RunCode => self.run_code(block_id).await,
            Action::Retry => {
                if self.panels.get(block_id).is_some_and(OutputPanel::can_retry) {
                    self.run_code(block_id).await
                } else {
                    Outcome::Ignored
                }
            }
            Action::ResetCode => self.reset(block_id),
            Action::ShowHint => self.show_hint(block_id),
            Action::ShowSolution => self.show_solution(block_id),
            Action::CopyCode => self.copy(block_id),
            Action::MarkComplete => self.submit(block_id, None).await,
            Action::SubmitQuiz { score } => self.submit(block_id, Some(AssessmentResult::Quiz { score })).await,
            Action::SubmitAnswers { answers } => {
                let score = match self.lesson.block(block_id).map(|b| &b.kind) {
                    Some(BlockKind::Text(text)) if !text.questions.is_empty() => text.grade(&answers),
                    _ => return Outcome::Ignored,
                };
                self.submit(block_id, Some(AssessmentResult::Comprehension { score })).await
            }
            Action::ReportEngagement { seconds, scrolled_to_bottom } => {
                let result = AssessmentResult::Engagement { seconds_on_block: seconds, scrolled_to_bottom };
                self.submit(block_id, Some(result)).await
            }
            Action::ReportVideo { watch_percent } => {
                self.submit(block_id, Some(AssessmentResult::Video { watch_percent })).await
            }
        }
    }

    /// Evaluate an attempt; a newly completed block is saved in the background
    async fn submit(&mut self, block_id: &str, result: Option<AssessmentResult>) -> Outcome {
        let (was_completed, evaluation) = {
            let mut store = self.store.lock().await;
            let was_completed = store.is_block_completed(block_id);
            (was_completed, store.submit(block_id, result.as_ref()))
        };

        if evaluation.accepted && !was_completed {
            tracing::debug!("Saving after completing {}", block_id);
            self.save_now();
        }

        Outcome::Evaluated { block_id: block_id.to_string(), evaluation }
    }

    /// Start a background save of the progress store
    pub fn save_now(&mut self) {
        self.pending_saves.retain(|handle| !handle.is_finished());
        self.pending_saves.push(spawn_save(self.store.clone()));
    }

    /// Wait for background saves started so far
    pub async fn flush_saves(&mut self) {
        for handle in self.pending_saves.drain(..) {
            match handle.await {
                Ok(outcome) => tracing::debug!("Background save finished: {:?}", outcome),
                Err(e) => tracing::error!("Background save failed: {}", e),
            }
        }
    }

    /// Apply code runs that finished since the last call
    pub async fn collect_runs(&mut self) -> Vec<Outcome> {
        let mut outcomes = Vec::new();
        while let Ok((block_id, result)) = self.runs_rx.try_recv() {
            outcomes.push(self.finish_run(&block_id, result).await);
        }
        outcomes
    }

    /// Wait for the next code run to finish
    pub async fn next_run(&mut self) -> Option<Outcome> {
        let (block_id, result) = self.runs_rx.recv().await?;
        Some(self.finish_run(&block_id, result).await)
    }

    async fn run_code(&mut self, block_id: &str) -> Outcome {
        let Some(block) = self.lesson.block(block_id) else {
            return Outcome::Ignored;
        };
        let BlockKind::Interactive(exercise) = &block.kind else {
            return Outcome::Ignored;
        };
        let language = exercise.language.clone().unwrap_or_else(|| self.default_language.clone());
        let code = self.editors.get(block_id).map_or_else(|| exercise.starter_code.clone(), |e| e.buffer.clone());

        let panel = self.panels.entry(block_id.to_string()).or_default();
        if panel.is_loading() {
            return Outcome::Ignored;
        }

        let Some(executor) = self.executor.clone() else {
            let message = "Code execution is not available offline.".to_string();
            panel.state = PanelState::Error { message: message.clone(), retryable: false };
            return Outcome::Failed { block_id: block_id.to_string(), message };
        };

        if code.trim().is_empty() {
            let message = "Write some code before running it.".to_string();
            panel.state = PanelState::Error { message: message.clone(), retryable: false };
            return Outcome::Failed { block_id: block_id.to_string(), message };
        }

        panel.loading();
        let request = ExecuteRequest::new(code, language);
        tracing::debug!("Running code for block {}", block_id);
        let runs = self.runs_tx.clone();
        let id = block_id.to_string();
        tokio::spawn(async move {
            let response = executor.execute(&request).await;
            if runs.send((id, response)).is_err() {
                tracing::debug!("Code run finished after the lesson closed");
            }
        });

        Outcome::Updated { block_id: block_id.to_string() }
    }

    /// Show a run's response and evaluate it
    async fn finish_run(&mut self, block_id: &str, response: Result<ExecutionResponse, ApiError>) -> Outcome {
        let Some(block) = self.lesson.block(block_id) else {
            return Outcome::Ignored;
        };
        let BlockKind::Interactive(exercise) = &block.kind else {
            return Outcome::Ignored;
        };
        let expected_output = exercise.expected_output.clone();
        let kind = AssessmentKind::for_block(block);

        let panel = self.panels.entry(block_id.to_string()).or_default();
        match response {
            Ok(response) => {
                panel.show_response(&response);
                let result = AssessmentResult::from_execution(kind, &response, expected_output.as_deref());
                let outcome = self.submit(block_id, Some(result)).await;
                if let Outcome::Evaluated { evaluation, .. } = &outcome {
                    if let Some(panel) = self.panels.get_mut(block_id) {
                        panel.feedback = Some(evaluation.feedback.clone());
                    }
                }
                outcome
            }
            Err(e) => {
                tracing::warn!("Code execution for {} failed: {}", block_id, e);
                panel.show_error(&e);
                Outcome::Failed { block_id: block_id.to_string(), message: e.user_message() }
            }
        }
    }

    fn reset(&mut self, block_id: &str) -> Outcome {
        let starter = self.lesson.block(block_id).and_then(|b| b.code()).map(str::to_string);
        match (self.editors.get_mut(block_id), starter) {
            (Some(editor), Some(starter)) => {
                editor.buffer = starter;
                editor.solution_shown = false;
                self.panels.remove(block_id);
                Outcome::Updated { block_id: block_id.to_string() }
            }
            _ => Outcome::Ignored,
        }
    }

    fn show_hint(&mut self, block_id: &str) -> Outcome {
        let total = match self.lesson.block(block_id).map(|b| &b.kind) {
            Some(BlockKind::Interactive(ex)) => ex.hints.len(),
            _ => 0,
        };
        match self.editors.get_mut(block_id) {
            Some(editor) if editor.hints_shown < total => {
                editor.hints_shown += 1;
                Outcome::Updated { block_id: block_id.to_string() }
            }
            _ => Outcome::Ignored,
        }
    }

    fn show_solution(&mut self, block_id: &str) -> Outcome {
        let solution = match self.lesson.block(block_id).map(|b| &b.kind) {
            Some(BlockKind::Interactive(ex)) => ex.solution.clone(),
            _ => None,
        };
        match (self.editors.get_mut(block_id), solution) {
            (Some(editor), Some(solution)) => {
                editor.buffer = solution;
                editor.solution_shown = true;
                Outcome::Updated { block_id: block_id.to_string() }
            }
            _ => Outcome::Ignored,
        }
    }

    fn copy(&mut self, block_id: &str) -> Outcome {
        let text = match self.editors.get(block_id) {
            Some(editor) => Some(editor.buffer.clone()),
            None => self.lesson.block(block_id).and_then(|b| b.code()).map(str::to_string),
        };
        let Some(text) = text else {
            return Outcome::Ignored;
        };

        match self.clipboard.copy(&text) {
            Ok(()) => Outcome::Copied { block_id: block_id.to_string() },
            Err(e) => {
                tracing::warn!("Copy failed for {}: {:#}", block_id, e);
                Outcome::Failed { block_id: block_id.to_string(), message: "Could not copy to the clipboard.".into() }
            }
        }
    }
}
