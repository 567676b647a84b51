//! SketchShelf transport layer
//!
//! Serves the REST API over HTTP with axum. The transport handles:
//! - Mapping each route onto a method name plus JSON parameters
//! - Mapping error categories onto HTTP status codes
//! - Request tracing, body limits, optional CORS
//! - Serving the browser client from a static directory
//!
//! The transport is decoupled from the server logic via the `RequestHandler` trait.

pub mod server;

pub use server::{RequestHandler, TransportConfig, TransportServer};
