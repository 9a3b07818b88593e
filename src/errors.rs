use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};

use crate::models::CallState;

#[derive(Debug, thiserror::Error)]
pub enum CallError {
    #[error("could not start call: no session id after {attempts} attempts")]
    SessionStartFailure { attempts: u32 },

    #[error("failed to fetch call details: {0}")]
    DetailFetchFailure(String),

    #[error("failed to store call summary: {0}")]
    SummarySubmitFailure(String),

    #[error("failed to submit symptom analysis: {0}")]
    AnalysisSubmitFailure(String),

    #[error("health alert check failed: {0}")]
    AlertCheckFailure(String),

    #[error("missing auth token")]
    MissingAuthToken,

    #[error("cannot {action} while call is {}", .state.as_str())]
    InvalidState {
        action: &'static str,
        state: CallState,
    },

    #[error("no call summary to resubmit")]
    NoSummaryToRetry,

    #[error("configuration error: {0}")]
    Config(String),
}

impl IntoResponse for CallError {
    fn into_response(self) -> Response {
        let status = match &self {
            CallError::SessionStartFailure { .. } => StatusCode::BAD_GATEWAY,
            CallError::DetailFetchFailure(_) => StatusCode::BAD_GATEWAY,
            CallError::SummarySubmitFailure(_) => StatusCode::BAD_GATEWAY,
            CallError::AnalysisSubmitFailure(_) => StatusCode::BAD_GATEWAY,
            CallError::AlertCheckFailure(_) => StatusCode::BAD_GATEWAY,
            CallError::MissingAuthToken => StatusCode::UNAUTHORIZED,
            CallError::InvalidState { .. } => StatusCode::CONFLICT,
            CallError::NoSummaryToRetry => StatusCode::NOT_FOUND,
            CallError::Config(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };

        let body = serde_json::json!({ "error": self.to_string() });
        (status, axum::Json(body)).into_response()
    }
}
