//! Inline output panel shown under a code editor

use crate::api::{ApiError, ExecutionResponse};

#[derive(Debug, Clone, Default, PartialEq)]
pub enum PanelState {
    #[default]
    Idle,
    Loading,
    Success { output: String, tests: Option<(u32, u32)> },
    Error { message: String, retryable: bool },
}

/// Output and feedback of the last run
#[derive(Debug, Clone, Default, PartialEq)]
pub struct OutputPanel {
    pub state: PanelState,
    /// Assessment feedback for the last attempt
    pub feedback: Option<String>,
}

impl OutputPanel {
    pub fn loading(&mut self) {
        self.state = PanelState::Loading;
        self.feedback = None;
    }

    /// Show a completed run. Errors reported by the runner are shown as errors.
    pub fn show_response(&mut self, response: &ExecutionResponse) {
        self.state = match response.error_message() {
            Some(message) => PanelState::Error { message: message.to_string(), retryable: false },
            None => PanelState::Success {
                output: response.output.clone(),
                tests: response.tests_passed.zip(response.total_tests),
            },
        };
    }

    pub fn show_error(&mut self, error: &ApiError) {
        self.state = PanelState::Error { message: error.user_message(), retryable: error.is_recoverable() };
    }

    pub fn is_loading(&self) -> bool {
        self.state == PanelState::Loading
    }

    pub fn can_retry(&self) -> bool {
        matches!(self.state, PanelState::Error { retryable: true, .. })
    }

    /// Data attribute value for the rendered panel
    pub fn state_name(&self) -> &'static str {
        match self.state {
            PanelState::Idle => "idle",
            PanelState::Loading => "loading",
            PanelState::Success { .. } => "success",
            PanelState::Error { .. } => "error",
        }
    }
}
