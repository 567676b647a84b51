//! Path confinement tests: identifiers, the resolver, and workspace selection
//! against a data root.

use std::path::{Path, PathBuf};
use std::sync::Arc;

use shelf_protocol::ErrorKind;
use shelf_services::resolver::{is_within, normalize_path, resolve};
use shelf_services::{Boundary, FileError, FileOps, WorkspaceState, codec};
use tempfile::TempDir;

fn canonical_tempdir() -> (TempDir, PathBuf) {
    let dir = TempDir::new().unwrap();
    let path = dir.path().canonicalize().unwrap();
    (dir, path)
}

// ─────────────────────────────────────────────────────────────────────────────
// Identifiers
// ─────────────────────────────────────────────────────────────────────────────

mod identifiers {
    use super::*;

    #[test]
    fn round_trip_preserves_paths() {
        for path in ["notes/a.excalidraw", "notes", "a b/ü ñ/δ.excalidraw", ""] {
            assert_eq!(codec::decode(&codec::encode(path)).unwrap(), path);
        }
    }

    #[test]
    fn encoded_form_is_url_path_safe() {
        let id = codec::encode("notes/sub/????>>>.excalidraw");
        assert!(!id.contains('/'));
        assert!(!id.contains('+'));
        assert!(!id.contains('='));
    }

    #[test]
    fn padded_input_is_tolerated() {
        // "ab" encodes to "YWI" unpadded, "YWI=" padded
        assert_eq!(codec::decode("YWI=").unwrap(), "ab");
        assert_eq!(codec::decode("YWI").unwrap(), "ab");
    }

    #[test]
    fn malformed_identifiers_rejected() {
        let err = codec::decode("not base64!").unwrap_err();
        assert!(matches!(err, FileError::MalformedIdentifier(_)));
        assert_eq!(err.kind(), ErrorKind::MalformedIdentifier);
    }

    #[test]
    fn non_utf8_payload_rejected() {
        // 0xff 0xfe is not valid UTF-8
        let err = codec::decode("__4").unwrap_err();
        assert!(matches!(err, FileError::MalformedIdentifier(_)));
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Resolver
// ─────────────────────────────────────────────────────────────────────────────

mod resolver {
    use super::*;

    fn escape_boundary(err: FileError) -> Boundary {
        match err {
            FileError::PathEscape { boundary, .. } => boundary,
            other => panic!("expected PathEscape, got {other:?}"),
        }
    }

    #[test]
    fn resolves_inside_workspace() {
        let root = Path::new("/data/notes");
        let resolved = resolve("sub/a.excalidraw", Some(root), None).unwrap();
        assert_eq!(resolved, PathBuf::from("/data/notes/sub/a.excalidraw"));
    }

    #[test]
    fn workspace_name_prefix_is_stripped() {
        let root = Path::new("/data/notes");
        assert_eq!(
            resolve("notes/a.excalidraw", Some(root), None).unwrap(),
            PathBuf::from("/data/notes/a.excalidraw")
        );
        assert_eq!(resolve("notes", Some(root), None).unwrap(), PathBuf::from("/data/notes"));
        assert_eq!(resolve("", Some(root), None).unwrap(), PathBuf::from("/data/notes"));
    }

    #[test]
    fn only_a_full_segment_prefix_is_stripped() {
        let root = Path::new("/data/notes");
        assert_eq!(
            resolve("notesx/a.excalidraw", Some(root), None).unwrap(),
            PathBuf::from("/data/notes/notesx/a.excalidraw")
        );
    }

    #[test]
    fn backslashes_are_separators() {
        let root = Path::new("/data/notes");
        assert_eq!(
            resolve("notes\\sub\\a.excalidraw", Some(root), None).unwrap(),
            PathBuf::from("/data/notes/sub/a.excalidraw")
        );
    }

    #[test]
    fn parent_segments_rejected() {
        let root = Path::new("/data/notes");
        for path in ["../etc/passwd", "notes/../../etc", "sub/../a.excalidraw", "..", "..\\x"] {
            let err = resolve(path, Some(root), None).unwrap_err();
            assert_eq!(escape_boundary(err), Boundary::Workspace, "{path}");
        }
    }

    #[test]
    fn absolute_paths_rejected() {
        let root = Path::new("/data/notes");
        let err = resolve("/etc/passwd", Some(root), None).unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape);
    }

    #[test]
    fn requires_a_workspace() {
        let err = resolve("a.excalidraw", None, None).unwrap_err();
        assert!(matches!(err, FileError::NoWorkspaceSelected));
    }

    #[test]
    fn workspace_outside_data_root_rejected() {
        let workspace = Path::new("/other/notes");
        let err = resolve("a.excalidraw", Some(workspace), Some(Path::new("/data"))).unwrap_err();
        assert_eq!(escape_boundary(err), Boundary::DataRoot);
    }

    #[test]
    fn containment_is_component_wise() {
        assert!(is_within(Path::new("/data"), Path::new("/data")));
        assert!(is_within(Path::new("/data/x"), Path::new("/data")));
        assert!(!is_within(Path::new("/data2"), Path::new("/data")));
        assert!(!is_within(Path::new("/data2/x"), Path::new("/data")));
        assert!(!is_within(Path::new("/data/../etc"), Path::new("/data")));
    }

    #[test]
    fn sibling_prefix_workspace_not_inside_data_root() {
        let workspace = Path::new("/data2/notes");
        let err = resolve("a.excalidraw", Some(workspace), Some(Path::new("/data"))).unwrap_err();
        assert_eq!(escape_boundary(err), Boundary::DataRoot);
    }

    #[test]
    fn normalize_is_lexical() {
        assert_eq!(normalize_path(Path::new("/a/./b/../c")), PathBuf::from("/a/c"));
        assert_eq!(normalize_path(Path::new("/../a")), PathBuf::from("/a"));
        assert_eq!(normalize_path(Path::new("a/../../b")), PathBuf::from("../b"));
    }

    #[test]
    fn escape_error_carries_boundary_data() {
        let err = resolve("../x", Some(Path::new("/data/notes")), None).unwrap_err();
        let api: shelf_protocol::ApiError = err.into();
        assert_eq!(api.code, ErrorKind::PathEscape);
        assert_eq!(api.data.unwrap()["boundary"], "workspace");
    }
}

// ─────────────────────────────────────────────────────────────────────────────
// Workspace selection against a data root
// ─────────────────────────────────────────────────────────────────────────────

mod selection {
    use super::*;

    fn ops(data_root: Option<PathBuf>) -> FileOps {
        FileOps::new(Arc::new(WorkspaceState::new()), data_root)
    }

    #[tokio::test]
    async fn traversal_out_of_data_root_rejected() {
        let (_dir, data) = canonical_tempdir();
        let ops = ops(Some(data.clone()));

        let attempt = format!("{}/../etc", data.display());
        let err = ops.select_workspace(&attempt).await.unwrap_err();
        assert!(matches!(err, FileError::PathEscape { boundary: Boundary::DataRoot, .. }));
        assert!(!ops.state().is_selected());
    }

    #[tokio::test]
    async fn sibling_directory_with_shared_prefix_rejected() {
        let (_dir, base) = canonical_tempdir();
        let data = base.join("data");
        let sibling = base.join("data2");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(&sibling).unwrap();

        let ops = ops(Some(data));
        let err = ops.select_workspace(&sibling.to_string_lossy()).await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape);
    }

    #[tokio::test]
    async fn relative_selection_joins_data_root_and_creates() {
        let (_dir, data) = canonical_tempdir();
        let ops = ops(Some(data.clone()));

        let (root, tree) = ops.select_workspace("team/sketches").await.unwrap();
        assert_eq!(root, data.join("team/sketches"));
        assert!(root.is_dir());
        assert_eq!(tree.name, "sketches");
        assert_eq!(tree.path, "sketches");
        assert!(tree.is_expanded);
        assert!(tree.children.is_empty());
    }

    #[tokio::test]
    async fn relative_selection_without_data_root_rejected() {
        let ops = ops(None);
        let err = ops.select_workspace("sketches").await.unwrap_err();
        assert!(matches!(err, FileError::InvalidParams(_)));
    }

    #[tokio::test]
    async fn missing_directory_without_data_root_not_created() {
        let (_dir, base) = canonical_tempdir();
        let ops = ops(None);
        let target = base.join("missing");

        let err = ops.select_workspace(&target.to_string_lossy()).await.unwrap_err();
        assert!(matches!(err, FileError::NotFound(_)));
        assert!(!target.exists());
    }

    #[tokio::test]
    async fn data_root_itself_is_selectable() {
        let (_dir, data) = canonical_tempdir();
        let ops = ops(Some(data.clone()));
        let (root, _) = ops.select_workspace(&data.to_string_lossy()).await.unwrap();
        assert_eq!(root, data);
    }

    #[cfg(unix)]
    #[tokio::test]
    async fn symlink_leading_out_of_data_root_rejected() {
        let (_dir, base) = canonical_tempdir();
        let data = base.join("data");
        let outside = base.join("outside");
        std::fs::create_dir_all(&data).unwrap();
        std::fs::create_dir_all(&outside).unwrap();
        std::os::unix::fs::symlink(&outside, data.join("link")).unwrap();

        let ops = ops(Some(data));
        let err = ops.select_workspace("link").await.unwrap_err();
        assert_eq!(err.kind(), ErrorKind::PathEscape);
        assert!(!ops.state().is_selected());
    }

    #[tokio::test]
    async fn empty_path_rejected() {
        let err = ops(None).select_workspace("   ").await.unwrap_err();
        assert!(matches!(err, FileError::InvalidParams(_)));
    }
}
