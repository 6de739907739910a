//! Error types for the dictionary manager
//!
//! Provides error handling for:
//! - Binding creation (runtime availability, unknown codes)
//! - Load failures carried by load tickets
//! - Catalog files

use std::path::PathBuf;

/// Main manager error type
#[derive(Debug, thiserror::Error)]
pub enum DictError {
    /// Bindings spawn their loads and need a tokio runtime
    #[error("dictionary '{0}' used outside of a tokio runtime")]
    NoRuntime(String),

    /// No dictionary registered under this code
    #[error("unknown dictionary code: '{0}'")]
    UnknownCode(String),

    /// Load ticket was rejected
    #[error("load failed: {0}")]
    Load(#[from] LoadError),

    /// Catalog could not be read or installed
    #[error("catalog error: {0}")]
    Catalog(#[from] CatalogError),
}

/// Load failure carried by a rejected load ticket
///
/// Cloneable so every holder of a ticket observes the same reason.
#[derive(Debug, Clone, PartialEq, Eq, thiserror::Error)]
pub enum LoadError {
    /// The fetcher returned an error
    #[error("fetch failed for '{code}': {message}")]
    FetchFailed {
        /// Code passed to the fetcher
        code: String,
        /// Rendered error chain
        message: String,
    },

    /// Remote dictionary without any fetcher configured
    #[error("remote dictionary '{0}' has no fetcher")]
    MissingFetcher(String),
}

impl LoadError {
    /// Create fetch failure from a fetcher error
    pub fn fetch_failed(code: impl Into<String>, error: &anyhow::Error) -> Self {
        Self::FetchFailed {
            code: code.into(),
            message: format!("{error:#}"),
        }
    }
}

/// Catalog file errors
#[derive(Debug, thiserror::Error)]
pub enum CatalogError {
    /// IO error reading the catalog
    #[error("io error reading {}: {source}", .path.display())]
    Io {
        /// Catalog path
        path: PathBuf,
        /// Underlying error
        #[source]
        source: std::io::Error,
    },

    /// File extension maps to no known format
    #[error("unsupported catalog format: '{0}'")]
    UnsupportedFormat(String),

    /// Catalog content could not be decoded
    #[error("invalid catalog: {0}")]
    Parse(String),

    /// Extension refers to a dictionary the catalog never defines
    #[error("dictionary '{code}' extends unknown dictionary '{base}'")]
    UnknownBase {
        /// Extending dictionary
        code: String,
        /// Missing base code
        base: String,
    },
}

impl CatalogError {
    /// Create IO error for path
    pub fn io_error(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        Self::Io {
            path: path.into(),
            source,
        }
    }
}
