use std::path::PathBuf;

use thiserror::Error;

#[derive(Error, Debug)]
pub enum HistoryError {
    #[error("history I/O failed for {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("history line {line} in {path} is not a valid entry: {source}")]
    CorruptEntry {
        path: PathBuf,
        line: usize,
        #[source]
        source: serde_json::Error,
    },

    #[error("failed to serialize history: {0}")]
    Serialize(#[from] serde_json::Error),
}
