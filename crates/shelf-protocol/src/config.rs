//! Read-only server configuration as exposed to clients.

use serde::{Deserialize, Serialize};

/// Snapshot returned by `config/get`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfigInfo {
    /// Whether the data root was auto-selected as workspace at startup.
    pub default_workspace_enabled: bool,
    /// Outer confinement boundary, if one is configured.
    pub data_root: Option<String>,
}
