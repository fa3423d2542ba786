//! HTTP request handlers organized by functionality

pub mod api;
pub mod error;
pub mod utils;

// Re-export handler functions
pub use api::{
    api_church, api_health, api_method_not_allowed, api_not_found, api_search,
    api_search_geojson,
};
pub use error::ApiError;
pub use utils::parse_payload;
