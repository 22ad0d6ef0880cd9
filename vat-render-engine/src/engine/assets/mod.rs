//! Asset types for VAT playback.
//!
//! Holds the manifest schema, the resolved asset bundle and the path rules
//! used to locate sub-resources relative to a manifest.

/// Resolved asset bundle tracking which sub-resources have finished loading.
pub mod bundle;

/// Manifest schema and baked texture metadata.
pub mod manifest;

/// Sub-resource path resolution and extension parsing.
pub mod paths;
