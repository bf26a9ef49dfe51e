use std::path::PathBuf;

use thiserror::Error;

/// Result type for underpass detection
pub type Result<T> = std::result::Result<T, Error>;

/// Errors that can occur while reading a city model and detecting underpasses
#[derive(Error, Debug)]
pub enum Error {
    #[error("city object {object}: unsupported geometry type '{kind}'")]
    UnsupportedGeometryType { object: String, kind: String },

    #[error("city object {object}: malformed geometry: {reason}")]
    MalformedGeometry { object: String, reason: String },

    #[error("surface {surface}: vertex index {index} is not in the vertex table")]
    UnresolvedVertexIndex { surface: String, index: usize },

    #[error("vertex {index} has {len} component(s), expected at least 2")]
    MalformedVertex { index: usize, len: usize },

    #[error("failed to open input file {path:?}: {source}")]
    MissingInputFile {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse city model {path:?}: {source}")]
    Parse {
        path: PathBuf,
        #[source]
        source: serde_json::Error,
    },

    #[error("I/O error: {0}")]
    Io(#[from] std::io::Error),
}

impl Error {
    /// Whether the error only concerns a single city object, so the run can
    /// skip that object and carry on.
    pub fn is_local(&self) -> bool {
        matches!(
            self,
            Error::UnsupportedGeometryType { .. } | Error::MalformedGeometry { .. }
        )
    }

    pub(crate) fn malformed(object: &str, reason: impl Into<String>) -> Self {
        Error::MalformedGeometry {
            object: object.to_string(),
            reason: reason.into(),
        }
    }
}
