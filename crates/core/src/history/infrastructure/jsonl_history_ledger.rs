use std::fs::{self, OpenOptions};
use std::io::{BufRead, BufReader, Write};
use std::path::{Path, PathBuf};

use crate::history::domain::history_ledger::{HistoryEntry, HistoryLedger};
use crate::history::error::HistoryError;

/// File-backed ledger with one JSON object per line.
///
/// The file and its parent directories are created on the first append.
/// A missing file reads as an empty history.
pub struct JsonlHistoryLedger {
    path: PathBuf,
}

impl JsonlHistoryLedger {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn io_error(&self, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: self.path.clone(),
            source,
        }
    }
}

impl HistoryLedger for JsonlHistoryLedger {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), Box<dyn std::error::Error>> {
        if let Some(parent) = self.path.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| self.io_error(e))?;
        }
        let mut line = serde_json::to_string(entry).map_err(HistoryError::Serialize)?;
        line.push('\n');

        let mut file = OpenOptions::new()
            .create(true)
            .append(true)
            .open(&self.path)
            .map_err(|e| self.io_error(e))?;
        file.write_all(line.as_bytes())
            .map_err(|e| self.io_error(e))?;
        log::debug!("Recorded {} in {}", entry.filename, self.path.display());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<HistoryEntry>, Box<dyn std::error::Error>> {
        let file = match fs::File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(Vec::new()),
            Err(e) => return Err(Box::new(self.io_error(e))),
        };

        let mut entries = Vec::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line = line.map_err(|e| self.io_error(e))?;
            if line.trim().is_empty() {
                continue;
            }
            let entry = serde_json::from_str(&line).map_err(|source| HistoryError::CorruptEntry {
                path: self.path.clone(),
                line: index + 1,
                source,
            })?;
            entries.push(entry);
        }
        Ok(entries)
    }
}
