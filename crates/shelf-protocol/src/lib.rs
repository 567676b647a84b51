//! SketchShelf protocol types
//!
//! The single source of truth for what crosses the wire: error categories,
//! method names, tree snapshot entities, the drawing document format, and the
//! client-visible configuration snapshot.

pub mod config;
pub mod document;
pub mod error;
pub mod methods;
pub mod tree;

pub use config::ConfigInfo;
pub use document::Drawing;
pub use error::{ApiError, ErrorBody, ErrorKind};
pub use methods::Methods;
pub use tree::{FileEntry, FolderEntry, TreeNode};

/// Result from a service handler.
pub type HandlerResult = Result<serde_json::Value, ApiError>;
