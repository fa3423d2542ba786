//! Steeple Web - JSON API Server

#![warn(missing_docs)]
#![warn(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
//!
//! HTTP edge of the church search core: decodes JSON bodies, delegates to
//! the search service and encodes results or structured errors.

pub mod handlers;
pub mod server;

// Re-export main types
pub use handlers::ApiError;
pub use server::{AppState, build_router, run_server};
