//! Learner interactions: events, code runs, clipboard

pub mod clipboard;
pub mod controller;
pub mod events;
pub mod panel;

pub use clipboard::{ClipboardSink, SystemClipboard};
pub use controller::{EditorState, InteractionController, Outcome};
pub use events::{Action, Target, UiEvent};
pub use panel::{OutputPanel, PanelState};

use futures_util::future::BoxFuture;

use crate::api::{ApiError, ExecuteRequest, ExecutionResponse};

/// Runs learner code
pub trait CodeExecutor: Send + Sync {
    fn execute<'a>(&'a self, request: &'a ExecuteRequest)
    -> BoxFuture<'a, Result<ExecutionResponse, ApiError>>;
}
