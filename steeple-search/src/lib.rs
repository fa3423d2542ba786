//! Steeple Search - Geospatial church search core
//!
//! Dispatches validated [`SearchQuery`](steeple_core::SearchQuery) values to
//! exactly one backend operation and shapes the returned rows into list
//! rows, map pins or a GeoJSON `FeatureCollection`.

#![deny(clippy::missing_errors_doc)]
#![deny(clippy::missing_panics_doc)]
#![warn(clippy::too_many_lines)]

pub mod backend;
pub mod dispatcher;
pub mod errors;
pub mod service;
pub mod shaper;

// Re-export main types
pub use backend::{
    BBoxParams, BackendCall, BackendOperation, DemoBackend, NearbyParams, PostgrestBackend,
    RadiusParams, SearchBackend, TextSearchParams,
};
pub use dispatcher::VariantDispatcher;
pub use errors::{BackendError, SearchError};
pub use service::SearchService;
pub use shaper::{ChurchPin, ResultPage, ShapedResults, shape};

/// Convenience type alias for Results with SearchError.
pub type Result<T> = std::result::Result<T, SearchError>;
