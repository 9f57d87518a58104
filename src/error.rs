use serde::Serialize;
use thiserror::Error;

use crate::validate::FieldError;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ErrorKind {
    Validation,
    NotFound,
    Conflict,
    Transport,
    Unauthorized,
}

impl ErrorKind {
    pub fn code(self) -> &'static str {
        match self {
            ErrorKind::Validation => "validation",
            ErrorKind::NotFound => "not_found",
            ErrorKind::Conflict => "conflict",
            ErrorKind::Transport => "transport",
            ErrorKind::Unauthorized => "unauthorized",
        }
    }
}

#[derive(Debug, Error)]
pub enum StoreError {
    #[error("validation failed: {}", field_list(.0))]
    Validation(Vec<FieldError>),
    #[error("not found: {0}")]
    NotFound(String),
    #[error("conflict: {0}")]
    Conflict(String),
    #[error("request failed: {0}")]
    Transport(String),
    #[error("session is no longer valid")]
    Unauthorized,
}

fn field_list(errors: &[FieldError]) -> String {
    errors
        .iter()
        .map(|e| format!("{}: {}", e.field, e.message))
        .collect::<Vec<_>>()
        .join("; ")
}

impl StoreError {
    pub fn kind(&self) -> ErrorKind {
        match self {
            StoreError::Validation(_) => ErrorKind::Validation,
            StoreError::NotFound(_) => ErrorKind::NotFound,
            StoreError::Conflict(_) => ErrorKind::Conflict,
            StoreError::Transport(_) => ErrorKind::Transport,
            StoreError::Unauthorized => ErrorKind::Unauthorized,
        }
    }

    pub fn invalid(field: &str, message: impl Into<String>) -> Self {
        StoreError::Validation(vec![FieldError::new(field, message)])
    }

    /// Maps a non-success HTTP status onto the closed kind set.
    pub fn from_status(status: u16, message: String) -> Self {
        match status {
            400 | 422 => StoreError::Validation(vec![FieldError::new("request", message)]),
            401 => StoreError::Unauthorized,
            404 => StoreError::NotFound(message),
            409 => StoreError::Conflict(message),
            _ => StoreError::Transport(format!("HTTP {status}: {message}")),
        }
    }

    pub fn details(&self) -> Option<serde_json::Value> {
        match self {
            StoreError::Validation(fields) => Some(serde_json::json!({ "fields": fields })),
            _ => None,
        }
    }
}

impl From<reqwest::Error> for StoreError {
    fn from(e: reqwest::Error) -> Self {
        StoreError::Transport(e.to_string())
    }
}

pub type StoreResult<T> = Result<T, StoreError>;
