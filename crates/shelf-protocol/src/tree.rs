//! Tree snapshot entities: folders and documents under the workspace root.
//!
//! Paths carried here are workspace-relative, `/`-joined, and start with the
//! workspace's own folder name (e.g. `notes/sub/draw.excalidraw`).

use serde::{Deserialize, Serialize};

/// One drawing document. `name` is the file name without its extension.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FileEntry {
    pub name: String,
    pub path: String,
    pub parent_path: String,
}

/// One directory node. The root folder has an empty `parent_path`.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct FolderEntry {
    pub name: String,
    pub path: String,
    pub parent_path: String,
    #[serde(default)]
    pub children: Vec<TreeNode>,
    /// Presentation hint only; set on the root of a snapshot.
    #[serde(default)]
    pub is_expanded: bool,
}

/// A node of the tree: either a document or a folder.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(tag = "type", rename_all = "lowercase")]
pub enum TreeNode {
    File(FileEntry),
    Folder(FolderEntry),
}

impl TreeNode {
    pub fn name(&self) -> &str {
        match self {
            Self::File(f) => &f.name,
            Self::Folder(f) => &f.name,
        }
    }

    pub fn path(&self) -> &str {
        match self {
            Self::File(f) => &f.path,
            Self::Folder(f) => &f.path,
        }
    }

    pub fn is_folder(&self) -> bool {
        matches!(self, Self::Folder(_))
    }
}

impl FolderEntry {
    pub fn new(
        name: impl Into<String>,
        path: impl Into<String>,
        parent_path: impl Into<String>,
    ) -> Self {
        Self {
            name: name.into(),
            path: path.into(),
            parent_path: parent_path.into(),
            children: Vec::new(),
            is_expanded: false,
        }
    }

    /// Direct child folders, in snapshot order.
    pub fn folders(&self) -> impl Iterator<Item = &FolderEntry> {
        self.children.iter().filter_map(|c| match c {
            TreeNode::Folder(f) => Some(f),
            TreeNode::File(_) => None,
        })
    }

    /// Direct child documents, in snapshot order.
    pub fn files(&self) -> impl Iterator<Item = &FileEntry> {
        self.children.iter().filter_map(|c| match c {
            TreeNode::File(f) => Some(f),
            TreeNode::Folder(_) => None,
        })
    }

    /// Depth-first lookup of a node by its workspace-relative path.
    pub fn find(&self, path: &str) -> Option<&TreeNode> {
        for child in &self.children {
            if child.path() == path {
                return Some(child);
            }
            if let TreeNode::Folder(folder) = child {
                if path.starts_with(&format!("{}/", folder.path)) {
                    return folder.find(path);
                }
            }
        }
        None
    }
}
