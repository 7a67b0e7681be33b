// THEORY:
// Failures in this crate live only at its edges: decoding image bytes, reading
// configuration, and writing into the shared results store. The analysis core
// itself (clustering, mapping, similarity, graph building) is total and degrades
// to empty or neutral values instead of failing, so nothing in here describes an
// "empty image" or a "zero vector". Those are ordinary values, not errors.

use std::path::PathBuf;
use thiserror::Error;

pub type Result<T> = std::result::Result<T, AnalysisError>;

#[derive(Debug, Error)]
pub enum AnalysisError {
    /// The image bytes could not be rasterized. Only this image is excluded.
    #[error("failed to decode image '{id}': {source}")]
    Decode {
        id: String,
        #[source]
        source: image::ImageError,
    },

    #[error("IO error on {path:?}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("invalid configuration: {0}")]
    Config(String),

    #[error("invalid emotion lexicon: {0}")]
    Lexicon(String),

    /// The results store accepts exactly one write per id.
    #[error("a result for '{0}' has already been recorded")]
    DuplicateResult(String),

    #[error("analysis worker pool is no longer accepting tasks")]
    WorkerUnavailable,
}

impl AnalysisError {
    pub fn io(path: impl Into<PathBuf>, source: std::io::Error) -> Self {
        AnalysisError::Io {
            path: path.into(),
            source,
        }
    }
}
