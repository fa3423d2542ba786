//! Steeple Core - Canonical search model for the church directory
//!
//! Holds the types every other Steeple crate speaks: the normalized
//! [`SearchQuery`], the read-only [`ChurchRecord`] projection, the query
//! normalizer that turns untyped JSON payloads into queries, plus the
//! configuration and tracing setup shared by the server and CLI.

#![deny(missing_docs)]
#![deny(clippy::missing_panics_doc)]

pub mod config;
pub mod errors;
pub mod mode;
pub mod query;
pub mod record;
pub mod tracing_setup;

// Re-export main types for convenient access
pub use config::{BackendConfig, QueryLimits, ServerConfig, SteepleConfig};
pub use errors::{ValidationError, ValidationErrorKind};
pub use mode::RuntimeMode;
pub use query::{
    BBoxCriteria, BoundingBox, GeoPoint, NearbyCriteria, OutputMode, QueryNormalizer,
    RadiusCriteria, SearchCriteria, SearchQuery, TextCriteria, TextFilters, Variant,
};
pub use record::{BeliefType, ChurchRecord};
