use thiserror::Error;

/// Fatal load failure for one VAT asset. Nothing is assembled once this is raised.
#[derive(Debug, Clone, Error, PartialEq, Eq)]
pub enum VatLoadError {
    #[error("manifest '{path}' could not be loaded: {reason}")]
    Manifest { path: String, reason: String },
    #[error("invalid VAT metadata: {0}")]
    InvalidMetadata(String),
    #[error("unsupported mesh format '{extension}' for '{path}'")]
    UnsupportedMeshFormat { path: String, extension: String },
    #[error("sub-resource '{path}' failed to load: {reason}")]
    SubResource { path: String, reason: String },
    #[error("position texture '{path}' decoded as {format}, expected a float format")]
    PositionTextureNotFloat { path: String, format: String },
}
