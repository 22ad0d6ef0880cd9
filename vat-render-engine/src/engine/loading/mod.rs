//! Asynchronous loading of VAT assets.
//!
//! A mount entity carrying [`manifest_loader::VatSource`] moves through three
//! stages: manifest requested, sub-resources requested, bundle complete. Each
//! stage is a polling system so nothing blocks the frame.

/// Load failure reasons.
pub mod error;

/// Manifest polling, sub-resource dispatch and completeness tracking.
pub mod manifest_loader;

/// Loader selection by file extension.
///
/// Mesh and texture loaders are picked once from the resolved path and kept as tagged unions.
pub mod sources;
