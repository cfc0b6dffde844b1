//! Error types for orchboard-core.

use std::path::PathBuf;

use thiserror::Error;

/// Errors from reading, writing or splicing the coordination file.
#[derive(Debug, Error)]
pub enum BoardError {
    /// An I/O error, with annotated path for context.
    #[error("I/O error at {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    /// A marker needed to locate the section being mutated is absent.
    #[error("section not found: {marker}")]
    SectionNotFound { marker: &'static str },
}

/// Convenience constructor for [`BoardError::Io`].
pub(crate) fn io_err(path: impl Into<PathBuf>, source: std::io::Error) -> BoardError {
    BoardError::Io {
        path: path.into(),
        source,
    }
}
