//! SketchShelf services
//!
//! The confinement core (`codec`, `resolver`, `state`, `tree`, `ops`) and the
//! services that expose it. Each service implements the `Service` trait and
//! handles a namespace of methods; the server router dispatches requests by
//! method prefix.

pub mod browse;
pub mod codec;
pub mod config;
pub mod error;
pub mod file;
pub mod ops;
pub mod resolver;
pub mod state;
pub mod tree;
pub mod workspace;

use std::error::Error;
use std::future::Future;

use serde::Deserialize;
use shelf_protocol::{ApiError, HandlerResult};

pub use config::ServerConfig;
pub use error::{Boundary, FileError, FileResult};
pub use ops::FileOps;
pub use state::WorkspaceState;

/// Trait implemented by all services.
///
/// Each service handles a namespace of methods (e.g. "file/*", "browse/*").
pub trait Service: Send + Sync {
    /// The namespace prefix this service handles (e.g. "file").
    fn namespace(&self) -> &str;

    /// Handle a request within this service's namespace.
    ///
    /// `method` is the full method string (e.g. "file/read").
    fn handle(
        &self,
        method: &str,
        params: Option<serde_json::Value>,
    ) -> impl Future<Output = HandlerResult> + Send;

    /// Initialize the service (called once at startup).
    fn init(&self) -> impl Future<Output = Result<(), Box<dyn Error + Send + Sync>>> + Send {
        async { Ok(()) }
    }

    /// Shutdown the service (called once at server shutdown).
    fn shutdown(&self) -> impl Future<Output = ()> + Send {
        async {}
    }
}

pub(crate) fn parse_params<T: for<'de> Deserialize<'de>>(
    params: Option<serde_json::Value>,
) -> Result<T, ApiError> {
    match params {
        Some(v) => serde_json::from_value(v)
            .map_err(|e| ApiError::invalid_params(format!("Invalid parameters: {e}"))),
        None => Err(ApiError::invalid_params("Parameters required")),
    }
}

/// Like [`parse_params`], but absent params mean `T::default()`. Params that
/// are present must still deserialize.
pub(crate) fn parse_params_optional<T: for<'de> Deserialize<'de> + Default>(
    params: Option<serde_json::Value>,
) -> Result<T, ApiError> {
    match params {
        None | Some(serde_json::Value::Null) => Ok(T::default()),
        Some(v) => serde_json::from_value(v)
            .map_err(|e| ApiError::invalid_params(format!("Invalid parameters: {e}"))),
    }
}
