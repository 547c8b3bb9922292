//! Error types for the locator catalog.

use thiserror::Error;

/// Errors that can occur while building a locator catalog.
#[derive(Error, Debug)]
pub enum CatalogError {
    /// Catalog file names a role that does not exist
    #[error("unknown role in catalog: {name}")]
    UnknownRole {
        /// Role key as written in the file
        name: String,
    },

    /// A role has no candidate list after all overlays
    #[error("catalog has no candidate list for role {role}")]
    MissingRole {
        /// Role key
        role: String,
    },

    /// Failed to read a catalog file
    #[error("failed to load catalog from {path}: {source}")]
    LoadError {
        /// Path to the catalog file
        path: String,
        /// Underlying error
        source: Box<dyn std::error::Error + Send + Sync>,
    },

    /// Failed to parse catalog TOML
    #[error("failed to parse catalog TOML in {path}: {source}")]
    ParseError {
        /// Path to the catalog file
        path: String,
        /// TOML parse error
        #[source]
        source: toml::de::Error,
    },

    /// Invalid candidate list (validation failed)
    #[error("invalid candidate list for {role}: {reason}")]
    ValidationError {
        /// Role being validated
        role: String,
        /// Reason for validation failure
        reason: String,
    },

    /// Catalog path does not exist
    #[error("catalog path not found at {path}")]
    PathNotFound {
        /// Expected path
        path: String,
    },

    /// I/O error while accessing catalog files
    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

/// Result type for catalog operations.
pub type Result<T> = std::result::Result<T, CatalogError>;
