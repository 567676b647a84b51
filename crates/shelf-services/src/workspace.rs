//! Workspace service: selection, tree snapshots, and the config query.
//!
//! Handles `workspace/*` and, through the router's fallback, `config/get`.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use shelf_protocol::{ApiError, HandlerResult};
use tracing::{info, warn};

use crate::config::ServerConfig;
use crate::ops::FileOps;
use crate::{Service, parse_params};

pub struct WorkspaceService {
    ops: Arc<FileOps>,
    config: ServerConfig,
}

impl WorkspaceService {
    pub fn new(ops: Arc<FileOps>, config: ServerConfig) -> Self {
        Self { ops, config }
    }
}

impl Service for WorkspaceService {
    fn namespace(&self) -> &str {
        "workspace"
    }

    /// Select the data root as workspace when the default workspace is enabled.
    async fn init(&self) -> Result<(), Box<dyn std::error::Error + Send + Sync>> {
        if !self.config.default_workspace_enabled || self.ops.state().is_selected() {
            return Ok(());
        }
        let Some(data_root) = &self.config.data_root else {
            warn!("Default workspace enabled but no data root configured; skipping");
            return Ok(());
        };

        let (root, _) = self.ops.select_workspace(&data_root.to_string_lossy()).await?;
        info!("Default workspace: {}", root.display());
        Ok(())
    }

    async fn handle(&self, method: &str, params: Option<serde_json::Value>) -> HandlerResult {
        match method {
            "workspace/select" => {
                let p: SelectParams = parse_params(params)?;
                info!("Workspace selection requested: {}", p.path);

                let (root, tree) = self.ops.select_workspace(&p.path).await?;
                Ok(json!({
                    "workspacePath": root.to_string_lossy(),
                    "rootFolder": tree,
                }))
            }

            "workspace/get" => {
                let root = self.ops.state().workspace_path();
                Ok(json!({
                    "workspacePath": root.map(|r| r.to_string_lossy().into_owned()),
                }))
            }

            "workspace/tree" => {
                let tree = self.ops.get_tree().await?;
                Ok(json!({ "rootFolder": tree }))
            }

            "config/get" => serde_json::to_value(self.config.info())
                .map_err(|e| ApiError::operation_failed(e.to_string())),

            _ => Err(ApiError::method_not_found(method)),
        }
    }
}

#[derive(Deserialize)]
struct SelectParams {
    path: String,
}
