//! Detection and repair of missing app artifacts in the marketplace.

/// Role predicates over manifests and product models.
pub mod detector;

/// Walks `market/` and submits the repairs.
pub mod meta_json;

pub mod product;

/// Manifest records and project files for missing roles.
pub mod synthesizer;
