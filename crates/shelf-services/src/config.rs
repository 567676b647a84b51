//! Server configuration fixed at process start.

use std::path::PathBuf;

use shelf_protocol::ConfigInfo;

/// Settings read once at startup and never changed afterwards.
#[derive(Debug, Clone, Default)]
pub struct ServerConfig {
    /// Outer confinement boundary; canonical when set.
    pub data_root: Option<PathBuf>,
    /// Auto-select the data root as workspace at startup.
    pub default_workspace_enabled: bool,
}

impl ServerConfig {
    pub fn new(data_root: Option<PathBuf>, default_workspace_enabled: bool) -> Self {
        Self {
            data_root,
            default_workspace_enabled,
        }
    }

    /// The client-visible view of this configuration.
    pub fn info(&self) -> ConfigInfo {
        ConfigInfo {
            default_workspace_enabled: self.default_workspace_enabled,
            data_root: self
                .data_root
                .as_ref()
                .map(|p| p.to_string_lossy().into_owned()),
        }
    }
}
