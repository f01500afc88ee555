//! Structured error types for client operations.

use serde::Serialize;

/// Error codes for programmatic error handling.
#[derive(Debug, Clone, Copy, Serialize, PartialEq, Eq)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorCode {
    // Transport and backend errors
    NetworkFailure,
    HttpError,
    DecodeError,

    // Credential errors
    NoRefreshToken,
    RefreshFailed,
    LoginFailed,

    // Local errors
    TaskNotFound,
    StorageError,
}

/// Errors raised by the gateway, the task API, and local storage.
///
/// Payloads are plain strings so the error stays `Clone`; a single in-flight
/// token refresh hands the same result to every caller awaiting it.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum ClientError {
    /// Transport-level failure (connection refused, timeout, TLS, ...).
    #[error("network failure: {0}")]
    NetworkFailure(String),

    /// The backend answered with a non-2xx status.
    #[error("HTTP {status}: {body}")]
    HttpError { status: u16, body: String },

    /// A refresh was needed but no refresh token is stored.
    #[error("no refresh token stored")]
    NoRefreshToken,

    /// The refresh endpoint rejected the refresh token or could not be reached.
    #[error("token refresh failed: {0}")]
    RefreshFailed(String),

    /// The token endpoint rejected the username/password pair.
    #[error("login failed: {0}")]
    LoginFailed(String),

    /// No task with this id is present in the local list.
    #[error("task not found: {0}")]
    TaskNotFound(String),

    /// A response body could not be decoded.
    #[error("invalid response body: {0}")]
    Decode(String),

    /// The persisted key/value storage could not be read or written.
    #[error("storage error: {0}")]
    Storage(String),
}

impl ClientError {
    pub fn code(&self) -> ErrorCode {
        match self {
            ClientError::NetworkFailure(_) => ErrorCode::NetworkFailure,
            ClientError::HttpError { .. } => ErrorCode::HttpError,
            ClientError::NoRefreshToken => ErrorCode::NoRefreshToken,
            ClientError::RefreshFailed(_) => ErrorCode::RefreshFailed,
            ClientError::LoginFailed(_) => ErrorCode::LoginFailed,
            ClientError::TaskNotFound(_) => ErrorCode::TaskNotFound,
            ClientError::Decode(_) => ErrorCode::DecodeError,
            ClientError::Storage(_) => ErrorCode::StorageError,
        }
    }

    /// Whether the stored credential is gone and the user has to log in again.
    ///
    /// A 401 that survives the gateway's refresh-and-retry also counts: the
    /// gateway clears the credential before handing that response back.
    pub fn requires_login(&self) -> bool {
        matches!(
            self,
            ClientError::NoRefreshToken
                | ClientError::RefreshFailed(_)
                | ClientError::HttpError { status: 401, .. }
        )
    }

    pub fn http(status: reqwest::StatusCode, body: impl Into<String>) -> Self {
        ClientError::HttpError {
            status: status.as_u16(),
            body: body.into(),
        }
    }

    pub fn task_not_found(id: impl std::fmt::Display) -> Self {
        ClientError::TaskNotFound(id.to_string())
    }

    pub fn storage(err: impl std::fmt::Display) -> Self {
        ClientError::Storage(err.to_string())
    }

    /// Serializable form used by the JSON output format.
    pub fn report(&self) -> ErrorReport {
        let report = ErrorReport::new(self.code(), self.to_string());
        match self {
            ClientError::HttpError { status, .. } => report.with_status(*status),
            _ => report,
        }
    }
}

impl From<reqwest::Error> for ClientError {
    fn from(err: reqwest::Error) -> Self {
        if err.is_decode() {
            ClientError::Decode(err.to_string())
        } else {
            ClientError::NetworkFailure(err.to_string())
        }
    }
}

impl From<serde_json::Error> for ClientError {
    fn from(err: serde_json::Error) -> Self {
        ClientError::Decode(err.to_string())
    }
}

impl From<std::io::Error> for ClientError {
    fn from(err: std::io::Error) -> Self {
        ClientError::Storage(err.to_string())
    }
}

/// Structured error for machine-readable output.
#[derive(Debug, Serialize)]
pub struct ErrorReport {
    pub code: ErrorCode,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<u16>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub hint: Option<String>,
}

impl ErrorReport {
    pub fn new(code: ErrorCode, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            status: None,
            hint: None,
        }
    }

    pub fn with_status(mut self, status: u16) -> Self {
        self.status = Some(status);
        self
    }

    pub fn with_hint(mut self, hint: impl Into<String>) -> Self {
        self.hint = Some(hint.into());
        self
    }
}

/// Result type for client operations.
pub type ClientResult<T> = std::result::Result<T, ClientError>;
