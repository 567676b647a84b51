//! The currently selected workspace root.

use std::path::PathBuf;

use parking_lot::RwLock;

use crate::resolver::workspace_name;

/// Holds the active workspace root, shared by every service through an `Arc`.
///
/// Unset at start, replaced wholesale by each selection (last write wins).
/// Readers take a copy of the path at call time; a selection racing with a
/// tree build can therefore yield a snapshot of the previous root.
#[derive(Debug, Default)]
pub struct WorkspaceState {
    root: RwLock<Option<PathBuf>>,
}

impl WorkspaceState {
    pub fn new() -> Self {
        Self::default()
    }

    /// Start with a root already selected.
    pub fn with_root(root: PathBuf) -> Self {
        Self {
            root: RwLock::new(Some(root)),
        }
    }

    /// Replace the current root. Existence is the caller's concern.
    pub fn set_workspace_path(&self, root: PathBuf) {
        *self.root.write() = Some(root);
    }

    pub fn workspace_path(&self) -> Option<PathBuf> {
        self.root.read().clone()
    }

    /// Base name of the current root (first segment of tree paths).
    pub fn workspace_name(&self) -> Option<String> {
        self.root.read().as_deref().map(workspace_name)
    }

    pub fn is_selected(&self) -> bool {
        self.root.read().is_some()
    }
}
