//! Request and response bodies for the platform API

use serde::{Deserialize, Serialize};

use super::error::ApiError;

/// Body of `POST /api/execute`
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct ExecuteRequest {
    /// Source code to run
    pub code: String,
    /// Language identifier understood by the execution service
    pub language: String,
}

impl ExecuteRequest {
    /// Create a new execution request
    pub fn new(code: impl Into<String>, language: impl Into<String>) -> Self {
        Self { code: code.into(), language: language.into() }
    }
}

/// Response of `POST /api/execute`
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct ExecutionResponse {
    /// Whether the program ran to completion
    #[serde(default)]
    pub success: bool,
    /// Captured stdout
    #[serde(default)]
    pub output: String,
    /// Captured stderr or runtime error message
    #[serde(default)]
    pub error: Option<String>,
    /// Tests passed, for code challenges
    #[serde(default)]
    pub tests_passed: Option<u32>,
    /// Tests run, for code challenges
    #[serde(default)]
    pub total_tests: Option<u32>,
}

impl ExecutionResponse {
    /// The runtime error, if the service reported a non-empty one
    pub fn error_message(&self) -> Option<&str> {
        self.error.as_deref().map(str::trim).filter(|e| !e.is_empty())
    }

    /// The runtime error as an [`ApiError::Execution`]
    pub fn runtime_error(&self) -> Option<ApiError> {
        self.error_message().map(|e| ApiError::Execution(e.to_string()))
    }

    /// Whether the run produced output without errors
    pub fn is_clean(&self) -> bool {
        self.success && self.error_message().is_none()
    }
}

/// A signed-in user's profile as cached by the web client
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(default)]
    pub id: Option<String>,
    #[serde(default, alias = "name", alias = "displayName")]
    pub username: Option<String>,
    #[serde(default)]
    pub email: Option<String>,
}

impl UserProfile {
    /// Best available name for greetings
    pub fn display_name(&self) -> &str {
        self.username
            .as_deref()
            .or(self.email.as_deref())
            .filter(|s| !s.is_empty())
            .unwrap_or("learner")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn execute_request_serializes_wire_fields() {
        let json = serde_json::to_value(ExecuteRequest::new("print(1)", "python")).unwrap();
        assert_eq!(json, serde_json::json!({ "code": "print(1)", "language": "python" }));
    }

    #[test]
    fn execution_response_tolerates_missing_fields() {
        let response: ExecutionResponse =
            serde_json::from_str(r#"{"success":true,"output":"1\n"}"#).unwrap();
        assert!(response.is_clean());
        assert_eq!(response.tests_passed, None);
    }

    #[test]
    fn blank_error_is_not_an_error() {
        let response = ExecutionResponse {
            success: true,
            output: "ok".into(),
            error: Some("  ".into()),
            ..Default::default()
        };
        assert!(response.error_message().is_none());
        assert!(response.is_clean());
    }

    #[test]
    fn runtime_error_carries_the_message() {
        let response = ExecutionResponse {
            error: Some("NameError: name 'x' is not defined\n".into()),
            ..Default::default()
        };
        let err = response.runtime_error().unwrap();
        assert!(matches!(&err, ApiError::Execution(message) if message == "NameError: name 'x' is not defined"));
        assert!(!err.is_recoverable());
        assert!(ExecutionResponse::default().runtime_error().is_none());
    }

    #[test]
    fn profile_display_name_prefers_username() {
        let profile: UserProfile = serde_json::from_str(r#"{"name":"Ana","email":"a@b.c"}"#).unwrap();
        assert_eq!(profile.display_name(), "Ana");
        assert_eq!(UserProfile::default().display_name(), "learner");
    }
}
