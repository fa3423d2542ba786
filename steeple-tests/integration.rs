//! Integration tests for Steeple
//!
//! Exercise the search pipeline across crate boundaries: the HTTP surface
//! over a recording backend, the demo directory's geometric contracts, and
//! the PostgREST client against a local fake gateway.

#[path = "integration/http_boundary.rs"]
mod http_boundary;

#[path = "integration/demo_directory.rs"]
mod demo_directory;

#[path = "integration/postgrest_gateway.rs"]
mod postgrest_gateway;
