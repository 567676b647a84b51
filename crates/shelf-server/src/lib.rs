//! SketchShelf server: routes method calls to services.
//!
//! The server owns all services, tracks their lifecycle, and provides the
//! `RequestHandler` implementation for the HTTP transport.

pub mod router;

pub use router::ShelfServer;
