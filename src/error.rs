//! Errors the outer crate's loaders and server raise.
//!
//! `access-core` itself never surfaces errors past construction;
//! `LoadError` covers the "fatal to load, no partial Timetable
//! exposed" case assigned to the loader collaborator, e.g. an
//! out-of-range integer parse in a feed column.

use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LoadError {
    #[error("failed to open {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("failed to parse {file}: {source}")]
    Csv {
        file: String,
        #[source]
        source: csv::Error,
    },

    #[error("failed to parse {file}: {source}")]
    Json {
        file: PathBuf,
        #[source]
        source: serde_json::Error,
    },
}
