//! Document and folder operations confined to the selected workspace.
//!
//! Every client-supplied path goes through [`resolver::resolve`] before any
//! filesystem call. Operations that change the tree return the affected
//! entity with canonical relative paths (always prefixed with the workspace
//! folder name, matching what [`crate::tree::build_tree`] produces).

use std::io::ErrorKind as IoErrorKind;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use shelf_protocol::document::{strip_document_extension, with_document_extension};
use shelf_protocol::{Drawing, FileEntry, FolderEntry};
use tokio::io::{AsyncWrite, AsyncWriteExt};
use tracing::{debug, info, warn};

use crate::error::{Boundary, FileError, FileResult};
use crate::resolver::{
    self, is_within, join_relative, normalize_path, parent_relative, strip_workspace_prefix,
};
use crate::state::WorkspaceState;
use crate::tree::build_tree;

/// File operations bound to a workspace state and an optional data root.
///
/// The data root is expected in canonical form (the binary canonicalizes it
/// at startup) so that it compares equal to canonicalized workspace roots.
pub struct FileOps {
    state: Arc<WorkspaceState>,
    data_root: Option<PathBuf>,
}

impl FileOps {
    pub fn new(state: Arc<WorkspaceState>, data_root: Option<PathBuf>) -> Self {
        Self { state, data_root }
    }

    pub fn state(&self) -> &Arc<WorkspaceState> {
        &self.state
    }

    pub fn data_root(&self) -> Option<&Path> {
        self.data_root.as_deref()
    }

    /// Resolve a relative path against the current workspace and data root.
    pub fn resolve(&self, relative: &str) -> FileResult<PathBuf> {
        let root = self.state.workspace_path();
        resolver::resolve(relative, root.as_deref(), self.data_root.as_deref())
    }

    /// [`resolve`](Self::resolve), then follow symlinks on the deepest
    /// existing ancestor of the result: it must still lie inside the real
    /// workspace root. Every document and folder operation goes through here.
    async fn resolve_on_disk(&self, relative: &str) -> FileResult<PathBuf> {
        let path = self.resolve(relative)?;
        let Some(root) = self.state.workspace_path() else {
            return Err(FileError::NoWorkspaceSelected);
        };
        let root = normalize_path(&root);
        let Ok(real_root) = tokio::fs::canonicalize(&root).await else {
            return Ok(path);
        };

        for ancestor in path.ancestors().take_while(|a| a.starts_with(&root)) {
            if let Ok(real) = tokio::fs::canonicalize(ancestor).await {
                if !is_within(&real, &real_root) {
                    warn!(
                        target: "security",
                        path = relative,
                        "symlink leads out of the workspace"
                    );
                    return Err(FileError::escape(relative, Boundary::Workspace));
                }
                break;
            }
        }
        Ok(path)
    }

    // ── Workspace ───────────────────────────────────────────────────────

    /// Select a new workspace root and return it with a fresh tree.
    ///
    /// Relative input is taken relative to the data root. A missing
    /// directory is created only when a data root bounds where it may go.
    pub async fn select_workspace(&self, path: &str) -> FileResult<(PathBuf, FolderEntry)> {
        let trimmed = path.trim();
        if trimmed.is_empty() {
            return Err(FileError::InvalidParams("Workspace path is required".into()));
        }

        let requested = PathBuf::from(trimmed);
        let absolute = if requested.is_absolute() {
            requested
        } else if let Some(data_root) = &self.data_root {
            data_root.join(requested)
        } else {
            return Err(FileError::InvalidParams(format!(
                "Workspace path must be absolute: {trimmed}"
            )));
        };

        let normalized = normalize_path(&absolute);
        if let Some(data_root) = &self.data_root {
            if !is_within(&normalized, data_root) {
                warn!(
                    target: "security",
                    path = trimmed,
                    "workspace selection outside the data root"
                );
                return Err(FileError::escape(trimmed, Boundary::DataRoot));
            }
        }

        match tokio::fs::metadata(&normalized).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(FileError::NotADirectory(trimmed.to_string())),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                if self.data_root.is_none() {
                    return Err(FileError::NotFound(trimmed.to_string()));
                }
                tokio::fs::create_dir_all(&normalized)
                    .await
                    .map_err(|e| {
                        FileError::io(format!("Failed to create workspace {trimmed}"), e)
                    })?;
                info!("Created workspace directory {}", normalized.display());
            }
            Err(e) => return Err(FileError::io(format!("Failed to open workspace {trimmed}"), e)),
        }

        let canonical = tokio::fs::canonicalize(&normalized)
            .await
            .map_err(|e| FileError::io(format!("Failed to resolve workspace {trimmed}"), e))?;

        // A symlink inside the data root must not carry the workspace out of it.
        if let Some(data_root) = &self.data_root {
            let canonical_root = tokio::fs::canonicalize(data_root)
                .await
                .unwrap_or_else(|_| normalize_path(data_root));
            if !is_within(&canonical, &canonical_root) {
                warn!(
                    target: "security",
                    path = trimmed,
                    "workspace resolves outside the data root"
                );
                return Err(FileError::escape(trimmed, Boundary::DataRoot));
            }
        }

        self.state.set_workspace_path(canonical.clone());
        info!("Workspace selected: {}", canonical.display());

        let tree = build_tree(&canonical, "").await?;
        Ok((canonical, tree))
    }

    /// Snapshot of the current workspace, or `None` before any selection.
    pub async fn get_tree(&self) -> FileResult<Option<FolderEntry>> {
        let Some(root) = self.state.workspace_path() else {
            return Ok(None);
        };

        if let Some(data_root) = &self.data_root {
            if !is_within(&root, data_root) {
                warn!(target: "security", "current workspace lies outside the data root");
                return Err(FileError::escape(root.display().to_string(), Boundary::DataRoot));
            }
        }

        build_tree(&root, "").await.map(Some)
    }

    // ── Documents ───────────────────────────────────────────────────────

    pub async fn read_document(&self, relative: &str) -> FileResult<Drawing> {
        let path = self.resolve_on_disk(relative).await?;

        let bytes = match tokio::fs::read(&path).await {
            Ok(bytes) => bytes,
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(FileError::NotFound(relative.to_string()));
            }
            Err(e) => return Err(FileError::io(format!("Failed to read {relative}"), e)),
        };

        Drawing::from_slice(&bytes).map_err(|source| FileError::CorruptDocument {
            path: relative.to_string(),
            source,
        })
    }

    /// Overwrite a document. The parent folder must already exist.
    pub async fn write_document(&self, relative: &str, content: &Drawing) -> FileResult<()> {
        let path = self.resolve_on_disk(relative).await?;

        let parent_exists = match path.parent() {
            Some(parent) => is_dir(parent).await,
            None => false,
        };
        if !parent_exists {
            return Err(FileError::NotFound(parent_relative(relative).to_string()));
        }

        let json = content.to_pretty_json().map_err(|e| {
            FileError::io(format!("Failed to serialize {relative}"), std::io::Error::other(e))
        })?;

        tokio::fs::write(&path, json)
            .await
            .map_err(|e| FileError::io(format!("Failed to write {relative}"), e))?;

        debug!("Saved {}", path.display());
        Ok(())
    }

    /// Create an empty document named `name` under `parent`.
    pub async fn create_document(&self, name: &str, parent: &str) -> FileResult<FileEntry> {
        let ws_name = self.workspace_name()?;
        let file_name = with_document_extension(validate_name(name)?);
        let relative = join_relative(&parent_or_root(&ws_name, parent), &file_name);
        let path = self.resolve_on_disk(&relative).await?;

        let json = Drawing::empty().to_pretty_json().map_err(|e| {
            FileError::io(format!("Failed to serialize {relative}"), std::io::Error::other(e))
        })?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| FileError::io(format!("Failed to create folder for {relative}"), e))?;
        }

        let file = match tokio::fs::OpenOptions::new()
            .write(true)
            .create_new(true)
            .open(&path)
            .await
        {
            Ok(file) => file,
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(FileError::AlreadyExists(relative));
            }
            Err(e) => return Err(FileError::io(format!("Failed to create {relative}"), e)),
        };

        fill_new_file(file, &path, json.as_bytes())
            .await
            .map_err(|e| FileError::io(format!("Failed to write {relative}"), e))?;

        let parent_path = canonical_relative(&ws_name, parent);
        info!("Created document {}", path.display());

        Ok(FileEntry {
            name: strip_document_extension(&file_name).to_string(),
            path: join_relative(&parent_path, &file_name),
            parent_path,
        })
    }

    pub async fn delete_document(&self, relative: &str) -> FileResult<()> {
        let path = self.resolve_on_disk(relative).await?;

        match tokio::fs::remove_file(&path).await {
            Ok(()) => {
                info!("Deleted document {}", path.display());
                Ok(())
            }
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                Err(FileError::NotFound(relative.to_string()))
            }
            Err(e) => Err(FileError::io(format!("Failed to delete {relative}"), e)),
        }
    }

    /// Rename a document within its folder.
    pub async fn rename_document(&self, relative: &str, new_name: &str) -> FileResult<FileEntry> {
        let ws_name = self.workspace_name()?;
        let old_path = self.resolve_on_disk(relative).await?;

        match tokio::fs::symlink_metadata(&old_path).await {
            Ok(meta) if meta.is_dir() => {
                return Err(FileError::InvalidParams(format!(
                    "{relative} is a folder; only documents can be renamed"
                )));
            }
            Ok(_) => {}
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(FileError::NotFound(relative.to_string()));
            }
            Err(e) => return Err(FileError::io(format!("Failed to open {relative}"), e)),
        }

        let file_name = with_document_extension(validate_name(new_name)?);
        let parent_path = parent_relative(&canonical_relative(&ws_name, relative)).to_string();
        let new_relative = join_relative(&parent_path, &file_name);
        let new_path = self.resolve_on_disk(&new_relative).await?;

        if new_path != old_path {
            if exists(&new_path).await && !same_file(&old_path, &new_path).await {
                return Err(FileError::AlreadyExists(new_relative));
            }
            tokio::fs::rename(&old_path, &new_path)
                .await
                .map_err(|e| FileError::io(format!("Failed to rename {relative}"), e))?;
            info!("Renamed {} -> {}", old_path.display(), new_path.display());
        }

        Ok(FileEntry {
            name: strip_document_extension(&file_name).to_string(),
            path: new_relative,
            parent_path,
        })
    }

    // ── Folders ─────────────────────────────────────────────────────────

    /// Create an empty folder named `name` under `parent`.
    pub async fn create_folder(&self, name: &str, parent: &str) -> FileResult<FolderEntry> {
        let ws_name = self.workspace_name()?;
        let folder_name = validate_name(name)?;
        let relative = join_relative(&parent_or_root(&ws_name, parent), folder_name);
        let path = self.resolve_on_disk(&relative).await?;

        if let Some(dir) = path.parent() {
            tokio::fs::create_dir_all(dir)
                .await
                .map_err(|e| FileError::io(format!("Failed to create folder for {relative}"), e))?;
        }

        match tokio::fs::create_dir(&path).await {
            Ok(()) => {}
            Err(e) if e.kind() == IoErrorKind::AlreadyExists => {
                return Err(FileError::AlreadyExists(relative));
            }
            Err(e) => return Err(FileError::io(format!("Failed to create folder {relative}"), e)),
        }

        let parent_path = canonical_relative(&ws_name, parent);
        info!("Created folder {}", path.display());

        Ok(FolderEntry::new(
            folder_name,
            join_relative(&parent_path, folder_name),
            parent_path,
        ))
    }

    /// Recursively delete a folder. The workspace root itself is protected.
    pub async fn delete_folder(&self, relative: &str) -> FileResult<()> {
        let trimmed = relative.trim_matches('/');
        if trimmed.is_empty() {
            return Err(FileError::RootDeletionForbidden);
        }

        let ws_name = self.workspace_name()?;
        if trimmed == ws_name {
            return Err(FileError::RootDeletionForbidden);
        }

        let path = self.resolve_on_disk(relative).await?;
        if let Some(root) = self.state.workspace_path() {
            if path == normalize_path(&root) {
                return Err(FileError::RootDeletionForbidden);
            }
        }

        match tokio::fs::symlink_metadata(&path).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(FileError::NotADirectory(relative.to_string())),
            Err(e) if e.kind() == IoErrorKind::NotFound => {
                return Err(FileError::NotFound(relative.to_string()));
            }
            Err(e) => return Err(FileError::io(format!("Failed to open {relative}"), e)),
        }

        tokio::fs::remove_dir_all(&path)
            .await
            .map_err(|e| FileError::io(format!("Failed to delete folder {relative}"), e))?;

        info!("Deleted folder {}", path.display());
        Ok(())
    }

    fn workspace_name(&self) -> FileResult<String> {
        self.state.workspace_name().ok_or(FileError::NoWorkspaceSelected)
    }
}

/// Trim a user-supplied name and reject anything that is not a single,
/// visible path segment.
fn validate_name(name: &str) -> FileResult<&str> {
    let trimmed = name.trim();
    if trimmed.is_empty() {
        return Err(FileError::InvalidParams("Name must not be empty".into()));
    }
    if trimmed.contains(['/', '\\']) || trimmed == "." || trimmed == ".." {
        return Err(FileError::InvalidParams(format!("Invalid name: {trimmed}")));
    }
    if trimmed.starts_with('.') {
        return Err(FileError::InvalidParams(format!(
            "Names starting with '.' are hidden: {trimmed}"
        )));
    }
    Ok(trimmed)
}

/// The parent a new entry goes under. An empty parent means the workspace
/// root, spelled with the workspace name so that a child sharing that name
/// is not mistaken for the root itself.
fn parent_or_root(ws_name: &str, parent: &str) -> String {
    if parent.trim_end_matches('/').is_empty() {
        ws_name.to_string()
    } else {
        parent.to_string()
    }
}

/// Write the initial bytes of a file just made with `create_new`. On failure
/// the partial file is removed, so it cannot block a retry.
pub async fn fill_new_file<W>(mut file: W, path: &Path, bytes: &[u8]) -> std::io::Result<()>
where
    W: AsyncWrite + Unpin,
{
    let written = async {
        file.write_all(bytes).await?;
        file.flush().await
    }
    .await;

    if written.is_err() {
        drop(file);
        if let Err(e) = tokio::fs::remove_file(path).await {
            warn!("Failed to remove partial file {}: {e}", path.display());
        }
    }
    written
}

/// Relative path in tree form: always led by the workspace folder name.
fn canonical_relative(ws_name: &str, relative: &str) -> String {
    let cleaned = relative.replace('\\', "/");
    let stripped = strip_workspace_prefix(cleaned.trim_matches('/'), ws_name);
    if stripped.is_empty() {
        ws_name.to_string()
    } else {
        join_relative(ws_name, stripped)
    }
}

async fn is_dir(path: &Path) -> bool {
    tokio::fs::metadata(path).await.map(|m| m.is_dir()).unwrap_or(false)
}

async fn exists(path: &Path) -> bool {
    tokio::fs::symlink_metadata(path).await.is_ok()
}

/// True when both paths name the same file, e.g. a case-only rename on a
/// case-insensitive filesystem.
async fn same_file(a: &Path, b: &Path) -> bool {
    match (tokio::fs::canonicalize(a).await, tokio::fs::canonicalize(b).await) {
        (Ok(a), Ok(b)) => a == b,
        _ => false,
    }
}
