//! Drawing document format as stored on disk.

use serde::{Deserialize, Serialize};
use serde_json::{Map, Value, json};

/// File extension every eligible document carries.
pub const DOCUMENT_EXTENSION: &str = ".excalidraw";

/// Value of the `type` discriminator.
pub const DOCUMENT_TYPE: &str = "excalidraw";

/// Format version written into new documents.
pub const DOCUMENT_VERSION: u32 = 2;

/// Value of `source` written into new documents.
pub const DOCUMENT_SOURCE: &str = "sketchshelf";

/// A drawing document.
///
/// Elements, app state and embedded files are opaque to the server. Unknown
/// top-level fields are kept in `extra` so a read/write cycle through the
/// server never drops data written by a newer client.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Drawing {
    #[serde(rename = "type")]
    pub kind: String,
    pub version: u32,
    #[serde(default)]
    pub source: String,
    #[serde(default)]
    pub elements: Vec<Value>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub app_state: Option<Map<String, Value>>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub files: Option<Map<String, Value>>,
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

impl Drawing {
    /// The canonical empty document written by `file/create`.
    pub fn empty() -> Self {
        let app_state = json!({
            "gridSize": null,
            "viewBackgroundColor": "#ffffff",
        });

        Self {
            kind: DOCUMENT_TYPE.into(),
            version: DOCUMENT_VERSION,
            source: DOCUMENT_SOURCE.into(),
            elements: Vec::new(),
            app_state: app_state.as_object().cloned(),
            files: Some(Map::new()),
            extra: Map::new(),
        }
    }

    /// Parse document bytes.
    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Serialize for disk: pretty-printed, two-space indent.
    pub fn to_pretty_json(&self) -> Result<String, serde_json::Error> {
        serde_json::to_string_pretty(self)
    }
}

/// Append the document extension to `name` unless it already ends with it.
pub fn with_document_extension(name: &str) -> String {
    if name.ends_with(DOCUMENT_EXTENSION) {
        name.to_string()
    } else {
        format!("{name}{DOCUMENT_EXTENSION}")
    }
}

/// Strip the document extension, if present.
pub fn strip_document_extension(file_name: &str) -> &str {
    file_name.strip_suffix(DOCUMENT_EXTENSION).unwrap_or(file_name)
}

/// True for non-hidden file names carrying the document extension.
pub fn is_document_file_name(file_name: &str) -> bool {
    !file_name.starts_with('.')
        && file_name.len() > DOCUMENT_EXTENSION.len()
        && file_name.ends_with(DOCUMENT_EXTENSION)
}
