//! Error categories and the wire error object returned by every endpoint.

use serde::{Deserialize, Serialize};

/// Client-visible error categories.
///
/// Each category serializes as a stable `SCREAMING_SNAKE_CASE` code and maps
/// to one HTTP status. `PathEscape` is deliberately separate from `NotFound`
/// so that confinement breaches stay distinguishable in clients and logs.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "SCREAMING_SNAKE_CASE")]
pub enum ErrorKind {
    // Request shape
    MalformedIdentifier,
    InvalidParams,
    MethodNotFound,

    // Confinement and workspace lifecycle
    NoWorkspaceSelected,
    PathEscape,
    WorkspaceMissing,

    // Filesystem outcomes
    NotFound,
    AlreadyExists,
    NotADirectory,
    RootDeletionForbidden,
    CorruptDocument,

    // Server
    ServerNotReady,
    OperationFailed,
}

impl ErrorKind {
    /// The HTTP status this category is reported with.
    pub fn status(&self) -> u16 {
        match self {
            Self::MalformedIdentifier | Self::InvalidParams | Self::NotADirectory => 400,
            Self::PathEscape | Self::RootDeletionForbidden => 403,
            Self::NotFound | Self::MethodNotFound => 404,
            Self::NoWorkspaceSelected | Self::AlreadyExists => 409,
            Self::WorkspaceMissing => 410,
            Self::CorruptDocument => 422,
            Self::OperationFailed => 500,
            Self::ServerNotReady => 503,
        }
    }

    /// Wire code, identical to the serialized form.
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::MalformedIdentifier => "MALFORMED_IDENTIFIER",
            Self::InvalidParams => "INVALID_PARAMS",
            Self::MethodNotFound => "METHOD_NOT_FOUND",
            Self::NoWorkspaceSelected => "NO_WORKSPACE_SELECTED",
            Self::PathEscape => "PATH_ESCAPE",
            Self::WorkspaceMissing => "WORKSPACE_MISSING",
            Self::NotFound => "NOT_FOUND",
            Self::AlreadyExists => "ALREADY_EXISTS",
            Self::NotADirectory => "NOT_A_DIRECTORY",
            Self::RootDeletionForbidden => "ROOT_DELETION_FORBIDDEN",
            Self::CorruptDocument => "CORRUPT_DOCUMENT",
            Self::ServerNotReady => "SERVER_NOT_READY",
            Self::OperationFailed => "OPERATION_FAILED",
        }
    }

    /// True for server-side failures, as opposed to problems with the request.
    pub fn is_server_fault(&self) -> bool {
        self.status() >= 500
    }
}

impl std::fmt::Display for ErrorKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// Wire error object: category plus human-readable detail.
#[derive(Debug, Clone, Serialize, Deserialize, thiserror::Error)]
#[error("{code}: {message}")]
pub struct ApiError {
    pub code: ErrorKind,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub data: Option<serde_json::Value>,
}

impl ApiError {
    pub fn new(code: ErrorKind, message: impl Into<String>) -> Self {
        Self {
            code,
            message: message.into(),
            data: None,
        }
    }

    pub fn with_data(mut self, data: serde_json::Value) -> Self {
        self.data = Some(data);
        self
    }

    pub fn invalid_params(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::InvalidParams, message)
    }

    pub fn method_not_found(method: &str) -> Self {
        Self::new(ErrorKind::MethodNotFound, format!("Method not found: {method}"))
    }

    pub fn operation_failed(message: impl Into<String>) -> Self {
        Self::new(ErrorKind::OperationFailed, message)
    }

    pub fn not_ready() -> Self {
        Self::new(ErrorKind::ServerNotReady, "Server is not accepting requests")
    }

    pub fn kind(&self) -> ErrorKind {
        self.code
    }

    pub fn status(&self) -> u16 {
        self.code.status()
    }
}

/// Envelope for error responses: `{ "error": { "code", "message" } }`.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ErrorBody {
    pub error: ApiError,
}

impl From<ApiError> for ErrorBody {
    fn from(error: ApiError) -> Self {
        Self { error }
    }
}
