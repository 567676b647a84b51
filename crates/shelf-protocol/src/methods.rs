//! Method name constants: every operation the server dispatches, grouped by
//! service namespace.
//!
//! The HTTP transport maps each REST route onto one of these names; the
//! server router picks the owning service by the part before the `/`.

/// All method names, grouped by service namespace.
pub struct Methods;

impl Methods {
    // ── Config ──────────────────────────────────────────────────────────
    pub const CONFIG_GET: &str = "config/get";

    // ── Workspace ───────────────────────────────────────────────────────
    pub const WORKSPACE_GET: &str = "workspace/get";
    pub const WORKSPACE_SELECT: &str = "workspace/select";
    pub const WORKSPACE_TREE: &str = "workspace/tree";

    // ── File ────────────────────────────────────────────────────────────
    pub const FILE_READ: &str = "file/read";
    pub const FILE_WRITE: &str = "file/write";
    pub const FILE_CREATE: &str = "file/create";
    pub const FILE_DELETE: &str = "file/delete";
    pub const FILE_RENAME: &str = "file/rename";
    pub const FILE_CREATE_DIR: &str = "file/createDir";
    pub const FILE_DELETE_DIR: &str = "file/deleteDir";

    // ── Directory browser ───────────────────────────────────────────────
    pub const BROWSE_LIST: &str = "browse/list";
    pub const BROWSE_HOME: &str = "browse/home";
    pub const BROWSE_COMMON: &str = "browse/common";
}
