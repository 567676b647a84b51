//! Directory browser used when choosing a workspace.
//!
//! Exposes `browse/list`, `browse/home` and `browse/common`. With a data root
//! configured, browsing never leaves it and the quick-access list is exactly
//! the data root; without one, the whole filesystem is browsable.

use std::path::{MAIN_SEPARATOR_STR, Path, PathBuf};

use serde::{Deserialize, Serialize};
use serde_json::json;
use shelf_protocol::{ApiError, HandlerResult};
use tracing::{debug, warn};

use crate::error::{Boundary, FileError, FileResult};
use crate::resolver::{is_within, normalize_path, workspace_name};
use crate::tree::compare_names;
use crate::{Service, parse_params_optional};

/// A subdirectory shown in the browser.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DirEntry {
    pub name: String,
    pub path: String,
    /// Whether the directory can be listed by the server process.
    pub accessible: bool,
}

/// Result of listing one directory.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Listing {
    pub current_path: String,
    /// `None` at the filesystem root or at the data root.
    pub parent_path: Option<String>,
    pub directories: Vec<DirEntry>,
}

/// Quick-access shortcut.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct QuickAccess {
    pub name: String,
    pub path: String,
}

pub struct DirectoryBrowser {
    data_root: Option<PathBuf>,
}

impl DirectoryBrowser {
    pub fn new(data_root: Option<PathBuf>) -> Self {
        Self { data_root }
    }

    /// Starting directory: the data root, else the user's home, else `/`.
    pub fn home(&self) -> PathBuf {
        self.data_root
            .clone()
            .or_else(dirs::home_dir)
            .unwrap_or_else(|| PathBuf::from(MAIN_SEPARATOR_STR))
    }

    /// Shortcuts offered next to the listing.
    pub fn common(&self) -> Vec<QuickAccess> {
        if let Some(data_root) = &self.data_root {
            let name = workspace_name(data_root);
            return vec![QuickAccess {
                name: if name.is_empty() { "Data".into() } else { name },
                path: data_root.to_string_lossy().into_owned(),
            }];
        }

        let candidates = [
            ("Home", dirs::home_dir()),
            ("Desktop", dirs::desktop_dir()),
            ("Documents", dirs::document_dir()),
            ("Downloads", dirs::download_dir()),
            ("Root", Some(PathBuf::from(MAIN_SEPARATOR_STR))),
        ];

        let mut shortcuts: Vec<QuickAccess> = Vec::new();
        for (name, dir) in candidates {
            let Some(dir) = dir else { continue };
            let path = dir.to_string_lossy().into_owned();
            if dir.is_dir() && !shortcuts.iter().any(|s| s.path == path) {
                shortcuts.push(QuickAccess {
                    name: name.into(),
                    path,
                });
            }
        }
        shortcuts
    }

    /// List the immediate, non-hidden subdirectories of `path` (default:
    /// [`Self::home`]), accessible ones first, then by name.
    pub async fn list(&self, path: Option<&str>) -> FileResult<Listing> {
        let requested = path.map(str::trim).filter(|p| !p.is_empty());
        let target = match requested {
            Some(p) if Path::new(p).is_absolute() => PathBuf::from(p),
            Some(p) => self.home().join(p),
            None => self.home(),
        };
        let target = normalize_path(&target);
        let shown = requested.unwrap_or_default().to_string();

        if let Some(data_root) = &self.data_root {
            if !is_within(&target, data_root) {
                warn!(target: "security", path = %target.display(), "browse outside the data root");
                return Err(FileError::escape(shown, Boundary::DataRoot));
            }
        }

        match tokio::fs::metadata(&target).await {
            Ok(meta) if meta.is_dir() => {}
            Ok(_) => return Err(FileError::NotADirectory(target.display().to_string())),
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => {
                return Err(FileError::NotFound(target.display().to_string()));
            }
            Err(e) => return Err(FileError::io(format!("Failed to open {}", target.display()), e)),
        }

        if let Some(data_root) = &self.data_root {
            let canonical = tokio::fs::canonicalize(&target)
                .await
                .unwrap_or_else(|_| target.clone());
            let canonical_root = tokio::fs::canonicalize(data_root)
                .await
                .unwrap_or_else(|_| normalize_path(data_root));
            if !is_within(&canonical, &canonical_root) {
                warn!(
                    target: "security",
                    path = %target.display(),
                    "browse target links outside the data root"
                );
                return Err(FileError::escape(shown, Boundary::DataRoot));
            }
        }

        let mut entries = tokio::fs::read_dir(&target)
            .await
            .map_err(|e| FileError::io(format!("Failed to list {}", target.display()), e))?;

        let mut directories = Vec::new();
        while let Some(entry) = entries
            .next_entry()
            .await
            .map_err(|e| FileError::io(format!("Failed to list {}", target.display()), e))?
        {
            let name = entry.file_name().to_string_lossy().into_owned();
            if name.starts_with('.') {
                continue;
            }

            let entry_path = entry.path();
            let is_dir = tokio::fs::metadata(&entry_path)
                .await
                .map(|m| m.is_dir())
                .unwrap_or(false);
            if !is_dir {
                continue;
            }

            let accessible = tokio::fs::read_dir(&entry_path).await.is_ok();
            directories.push(DirEntry {
                name,
                path: entry_path.to_string_lossy().into_owned(),
                accessible,
            });
        }

        directories.sort_by(|a, b| {
            b.accessible
                .cmp(&a.accessible)
                .then_with(|| compare_names(&a.name, &b.name))
        });

        let at_boundary = self
            .data_root
            .as_deref()
            .is_some_and(|root| normalize_path(root) == target);
        let parent_path = if at_boundary {
            None
        } else {
            target.parent().map(|p| p.to_string_lossy().into_owned())
        };

        debug!("Listed {} ({} directories)", target.display(), directories.len());
        Ok(Listing {
            current_path: target.to_string_lossy().into_owned(),
            parent_path,
            directories,
        })
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Service
// ─────────────────────────────────────────────────────────────────────────────

/// `browse/*` methods.
pub struct BrowseService {
    browser: DirectoryBrowser,
}

impl BrowseService {
    pub fn new(data_root: Option<PathBuf>) -> Self {
        Self {
            browser: DirectoryBrowser::new(data_root),
        }
    }
}

impl Service for BrowseService {
    fn namespace(&self) -> &str {
        "browse"
    }

    async fn handle(&self, method: &str, params: Option<serde_json::Value>) -> HandlerResult {
        match method {
            "browse/list" => {
                let p: BrowseListParams = parse_params_optional(params)?;
                let listing = self.browser.list(p.path.as_deref()).await?;
                serde_json::to_value(listing).map_err(|e| ApiError::operation_failed(e.to_string()))
            }

            "browse/home" => {
                let home = self.browser.home();
                Ok(json!({ "path": home.to_string_lossy() }))
            }

            "browse/common" => Ok(json!({ "directories": self.browser.common() })),

            _ => Err(ApiError::method_not_found(method)),
        }
    }
}

#[derive(Deserialize, Default)]
struct BrowseListParams {
    #[serde(default)]
    path: Option<String>,
}
