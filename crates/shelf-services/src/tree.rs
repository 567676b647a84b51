//! Tree snapshots of the workspace: folders and eligible documents.

use std::cmp::Ordering;
use std::future::Future;
use std::path::{Path, PathBuf};
use std::pin::Pin;

use shelf_protocol::document::{is_document_file_name, strip_document_extension};
use shelf_protocol::{FileEntry, FolderEntry, TreeNode};
use tracing::{debug, warn};

use crate::error::{FileError, FileResult};
use crate::resolver::{join_relative, workspace_name};

/// Build a fresh snapshot of `directory`.
///
/// Children are ordered folders first, then documents, each group by
/// [`compare_names`], so two builds over an unchanged directory are
/// identical. Hidden entries, non-document files and symbolic links are
/// skipped; empty folders are kept. A root call (`parent_path == ""`) marks
/// the returned folder as expanded.
pub async fn build_tree(directory: &Path, parent_path: &str) -> FileResult<FolderEntry> {
    match tokio::fs::metadata(directory).await {
        Ok(meta) if meta.is_dir() => {}
        _ => return Err(FileError::WorkspaceMissing(directory.to_path_buf())),
    }

    let mut folder = walk(directory.to_path_buf(), parent_path.to_string()).await;
    folder.is_expanded = parent_path.is_empty();
    debug!(
        "Built tree for {} ({} top-level entries)",
        directory.display(),
        folder.children.len()
    );
    Ok(folder)
}

/// Locale-style, case-sensitive name order: letters compare case-folded, so
/// `apple < Banana < cherry`, and names differing only in case put the
/// lowercase form first (`a < A`).
pub fn compare_names(a: &str, b: &str) -> Ordering {
    a.to_lowercase()
        .cmp(&b.to_lowercase())
        .then_with(|| b.cmp(a))
}

fn walk(
    directory: PathBuf,
    parent_path: String,
) -> Pin<Box<dyn Future<Output = FolderEntry> + Send>> {
    Box::pin(async move {
        let name = workspace_name(&directory);
        let path = join_relative(&parent_path, &name);
        let mut folder = FolderEntry::new(name, path.clone(), parent_path);

        let mut entries = match tokio::fs::read_dir(&directory).await {
            Ok(entries) => entries,
            Err(e) => {
                warn!("Cannot list {}: {e}", directory.display());
                return folder;
            }
        };

        let mut folders = Vec::new();
        let mut files = Vec::new();

        loop {
            let entry = match entries.next_entry().await {
                Ok(Some(entry)) => entry,
                Ok(None) => break,
                Err(e) => {
                    warn!("Stopped listing {}: {e}", directory.display());
                    break;
                }
            };

            let file_name = entry.file_name().to_string_lossy().into_owned();
            if file_name.starts_with('.') {
                continue;
            }

            // DirEntry::file_type does not follow symlinks, so links are neither.
            let Ok(file_type) = entry.file_type().await else {
                continue;
            };

            if file_type.is_dir() {
                folders.push(walk(entry.path(), path.clone()).await);
            } else if file_type.is_file() && is_document_file_name(&file_name) {
                files.push(FileEntry {
                    name: strip_document_extension(&file_name).to_string(),
                    path: join_relative(&path, &file_name),
                    parent_path: path.clone(),
                });
            }
        }

        folders.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.path.cmp(&b.path)));
        files.sort_by(|a, b| compare_names(&a.name, &b.name).then_with(|| a.path.cmp(&b.path)));

        folder.children = folders
            .into_iter()
            .map(TreeNode::Folder)
            .chain(files.into_iter().map(TreeNode::File))
            .collect();
        folder
    })
}
