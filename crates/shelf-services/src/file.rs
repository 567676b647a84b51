//! File service: document and folder CRUD addressed by opaque identifiers.

use std::sync::Arc;

use serde::Deserialize;
use serde_json::json;
use shelf_protocol::{ApiError, Drawing, HandlerResult};
use tracing::debug;

use crate::ops::FileOps;
use crate::{Service, codec, parse_params};

/// File service implementation.
///
/// Identifiers are decoded here, at the boundary; everything below works on
/// relative paths.
pub struct FileService {
    ops: Arc<FileOps>,
}

impl FileService {
    pub fn new(ops: Arc<FileOps>) -> Self {
        Self { ops }
    }
}

impl Service for FileService {
    fn namespace(&self) -> &str {
        "file"
    }

    async fn handle(&self, method: &str, params: Option<serde_json::Value>) -> HandlerResult {
        match method {
            "file/read" => {
                let p: IdParam = parse_params(params)?;
                let relative = codec::decode(&p.id)?;
                debug!("file/read {relative}");

                let content = self.ops.read_document(&relative).await?;
                Ok(json!({ "content": content }))
            }

            "file/write" => {
                let p: FileWriteParams = parse_params(params)?;
                let relative = codec::decode(&p.id)?;

                self.ops.write_document(&relative, &p.content).await?;
                Ok(json!({ "success": true }))
            }

            "file/create" => {
                let p: CreateParams = parse_params(params)?;
                let file = self.ops.create_document(&p.name, &p.parent_path).await?;
                Ok(json!({
                    "id": codec::encode(&file.path),
                    "file": file,
                }))
            }

            "file/delete" => {
                let p: IdParam = parse_params(params)?;
                let relative = codec::decode(&p.id)?;

                self.ops.delete_document(&relative).await?;
                Ok(json!({ "success": true }))
            }

            "file/rename" => {
                let p: RenameParams = parse_params(params)?;
                let relative = codec::decode(&p.id)?;

                let file = self.ops.rename_document(&relative, &p.new_name).await?;
                Ok(json!({
                    "id": codec::encode(&file.path),
                    "file": file,
                }))
            }

            "file/createDir" => {
                let p: CreateParams = parse_params(params)?;
                let folder = self.ops.create_folder(&p.name, &p.parent_path).await?;
                Ok(json!({ "folder": folder }))
            }

            "file/deleteDir" => {
                let p: IdParam = parse_params(params)?;
                let relative = codec::decode(&p.id)?;

                self.ops.delete_folder(&relative).await?;
                Ok(json!({ "success": true }))
            }

            _ => Err(ApiError::method_not_found(method)),
        }
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Parameter types
// ─────────────────────────────────────────────────────────────────────────────

#[derive(Deserialize)]
struct IdParam {
    id: String,
}

#[derive(Deserialize)]
struct FileWriteParams {
    id: String,
    content: Drawing,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct CreateParams {
    name: String,
    #[serde(default)]
    parent_path: String,
}

#[derive(Deserialize)]
#[serde(rename_all = "camelCase")]
struct RenameParams {
    id: String,
    new_name: String,
}
