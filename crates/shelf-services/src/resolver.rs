//! Path confinement: turns client-supplied relative paths into absolute
//! paths that are guaranteed to stay inside the workspace root and, when one
//! is configured, the data root.
//!
//! Everything here is lexical: no function in this module touches the
//! filesystem. Existence and type checks belong to the callers.

use std::path::{Component, Path, PathBuf};

use tracing::{debug, warn};

use crate::error::{Boundary, FileError, FileResult};

/// Resolve a workspace-relative path to an absolute path.
///
/// The relative path may start with the workspace's own folder name (tree
/// snapshots produce paths that way); that segment is stripped first. Any
/// `..` segment or absolute root is rejected outright, and the joined result
/// must stay inside `workspace_root` and `data_root`.
///
/// The check is lexical only. A symlink inside the workspace can still point
/// elsewhere, so callers that touch the filesystem go through
/// `FileOps::resolve_on_disk`, which repeats the containment test on the
/// real path.
pub fn resolve(
    relative: &str,
    workspace_root: Option<&Path>,
    data_root: Option<&Path>,
) -> FileResult<PathBuf> {
    let root = normalize_path(workspace_root.ok_or(FileError::NoWorkspaceSelected)?);
    let name = workspace_name(&root);

    let cleaned = relative.replace('\\', "/");
    let stripped = strip_workspace_prefix(cleaned.trim_end_matches('/'), &name);
    let rel_path = Path::new(stripped);

    let traversal = rel_path
        .components()
        .any(|c| !matches!(c, Component::Normal(_) | Component::CurDir));
    if traversal {
        warn!(
            target: "security",
            path = relative,
            "rejected relative path with traversal or absolute root"
        );
        return Err(FileError::escape(relative, Boundary::Workspace));
    }

    let candidate = normalize_path(&root.join(rel_path));

    if !candidate.starts_with(&root) {
        warn!(target: "security", path = relative, "resolved path escapes the workspace root");
        return Err(FileError::escape(relative, Boundary::Workspace));
    }

    if let Some(data_root) = data_root {
        if !is_within(&candidate, data_root) {
            warn!(target: "security", path = relative, "resolved path escapes the data root");
            return Err(FileError::escape(relative, Boundary::DataRoot));
        }
    }

    debug!("Resolved {relative:?} to {}", candidate.display());
    Ok(candidate)
}

/// Component-wise containment: `path` equals `root` or lies below it.
///
/// `/data` contains `/data/x` but not `/data2`.
pub fn is_within(path: &Path, root: &Path) -> bool {
    normalize_path(path).starts_with(normalize_path(root))
}

/// Normalize a path by resolving `.` and `..` without touching the filesystem.
///
/// `..` never climbs above the root of an absolute path.
pub fn normalize_path(path: &Path) -> PathBuf {
    let mut components: Vec<Component> = Vec::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => match components.last() {
                Some(Component::Normal(_)) => {
                    components.pop();
                }
                Some(Component::RootDir) | Some(Component::Prefix(_)) => {}
                _ => components.push(component),
            },
            c => components.push(c),
        }
    }
    components.iter().collect()
}

/// Base name of a workspace root, used as the first segment of tree paths.
pub fn workspace_name(root: &Path) -> String {
    root.file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default()
}

/// Strip a leading `<workspace_name>/` segment; the bare name maps to `""`.
pub fn strip_workspace_prefix<'a>(relative: &'a str, workspace_name: &str) -> &'a str {
    if workspace_name.is_empty() {
        return relative;
    }
    if relative == workspace_name {
        return "";
    }
    relative
        .strip_prefix(workspace_name)
        .and_then(|rest| rest.strip_prefix('/'))
        .unwrap_or(relative)
}

/// Join a relative parent path and a child name with `/`.
pub fn join_relative(parent: &str, name: &str) -> String {
    let parent = parent.trim_end_matches('/');
    if parent.is_empty() {
        name.to_string()
    } else {
        format!("{parent}/{name}")
    }
}

/// Parent part of a relative path (`""` for top-level names).
pub fn parent_relative(relative: &str) -> &str {
    relative
        .trim_end_matches('/')
        .rsplit_once('/')
        .map(|(parent, _)| parent)
        .unwrap_or("")
}
