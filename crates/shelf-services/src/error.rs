//! Core error type for confinement and file operations.

use std::fmt;
use std::path::PathBuf;

use shelf_protocol::{ApiError, ErrorKind};

/// Which confinement boundary a path tried to leave.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Boundary {
    Workspace,
    DataRoot,
}

impl fmt::Display for Boundary {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            Self::Workspace => f.write_str("workspace root"),
            Self::DataRoot => f.write_str("data root"),
        }
    }
}

/// Failures of the path, tree, and file operations.
///
/// Messages name workspace-relative paths, never absolute server paths,
/// because they travel to the client verbatim.
#[derive(Debug, thiserror::Error)]
pub enum FileError {
    #[error("Malformed identifier: {0}")]
    MalformedIdentifier(String),

    #[error("No workspace selected")]
    NoWorkspaceSelected,

    #[error("Path escapes the {boundary}: {path}")]
    PathEscape { path: String, boundary: Boundary },

    #[error("Workspace directory no longer exists: {}", .0.display())]
    WorkspaceMissing(PathBuf),

    #[error("Not found: {0}")]
    NotFound(String),

    #[error("Already exists: {0}")]
    AlreadyExists(String),

    #[error("Not a directory: {0}")]
    NotADirectory(String),

    #[error("The workspace root folder cannot be deleted")]
    RootDeletionForbidden,

    #[error("Not a valid drawing document: {path}: {source}")]
    CorruptDocument {
        path: String,
        #[source]
        source: serde_json::Error,
    },

    #[error("{0}")]
    InvalidParams(String),

    #[error("{context}: {source}")]
    Io {
        context: String,
        #[source]
        source: std::io::Error,
    },
}

impl FileError {
    pub fn io(context: impl Into<String>, source: std::io::Error) -> Self {
        Self::Io {
            context: context.into(),
            source,
        }
    }

    pub fn escape(path: impl Into<String>, boundary: Boundary) -> Self {
        Self::PathEscape {
            path: path.into(),
            boundary,
        }
    }

    pub fn kind(&self) -> ErrorKind {
        match self {
            Self::MalformedIdentifier(_) => ErrorKind::MalformedIdentifier,
            Self::NoWorkspaceSelected => ErrorKind::NoWorkspaceSelected,
            Self::PathEscape { .. } => ErrorKind::PathEscape,
            Self::WorkspaceMissing(_) => ErrorKind::WorkspaceMissing,
            Self::NotFound(_) => ErrorKind::NotFound,
            Self::AlreadyExists(_) => ErrorKind::AlreadyExists,
            Self::NotADirectory(_) => ErrorKind::NotADirectory,
            Self::RootDeletionForbidden => ErrorKind::RootDeletionForbidden,
            Self::CorruptDocument { .. } => ErrorKind::CorruptDocument,
            Self::InvalidParams(_) => ErrorKind::InvalidParams,
            Self::Io { .. } => ErrorKind::OperationFailed,
        }
    }
}

impl From<FileError> for ApiError {
    fn from(err: FileError) -> Self {
        let data = match &err {
            FileError::PathEscape { boundary, .. } => Some(serde_json::json!({
                "boundary": match boundary {
                    Boundary::Workspace => "workspace",
                    Boundary::DataRoot => "dataRoot",
                },
            })),
            _ => None,
        };
        let api = ApiError::new(err.kind(), err.to_string());
        match data {
            Some(d) => api.with_data(d),
            None => api,
        }
    }
}

pub type FileResult<T> = Result<T, FileError>;
