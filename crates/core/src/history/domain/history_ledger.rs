use std::path::Path;
use std::time::{SystemTime, UNIX_EPOCH};

use serde::{Deserialize, Serialize};

use crate::history::error::HistoryError;
use crate::shared::constants::{IMAGE_EXTENSIONS, VIDEO_EXTENSIONS};

/// Kind of input an evaluation ran on.
#[derive(Clone, Copy, Debug, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum MediaType {
    Image,
    Video,
}

impl MediaType {
    /// Classifies a path by extension (case-insensitive). `None` for anything
    /// outside the supported image and video extensions.
    pub fn from_path(path: &Path) -> Option<Self> {
        let ext = path.extension()?.to_str()?.to_lowercase();
        if IMAGE_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Image)
        } else if VIDEO_EXTENSIONS.contains(&ext.as_str()) {
            Some(Self::Video)
        } else {
            None
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Image => "image",
            Self::Video => "video",
        }
    }
}

/// One completed evaluation.
#[derive(Clone, Debug, PartialEq, Eq, Serialize, Deserialize)]
pub struct HistoryEntry {
    /// Seconds since the Unix epoch.
    pub timestamp: u64,
    pub filename: String,
    pub media_type: MediaType,
    pub count: usize,
}

impl HistoryEntry {
    /// Entry stamped with the current wall-clock time.
    pub fn now(filename: impl Into<String>, media_type: MediaType, count: usize) -> Self {
        Self {
            timestamp: unix_now(),
            filename: filename.into(),
            media_type,
            count,
        }
    }
}

fn unix_now() -> u64 {
    SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .map(|d| d.as_secs())
        .unwrap_or(0)
}

/// Append-only record of past evaluations.
pub trait HistoryLedger: Send {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), Box<dyn std::error::Error>>;

    /// Every entry, oldest first.
    fn entries(&self) -> Result<Vec<HistoryEntry>, Box<dyn std::error::Error>>;
}

#[derive(Debug, Default)]
pub struct InMemoryHistoryLedger {
    entries: Vec<HistoryEntry>,
}

impl InMemoryHistoryLedger {
    pub fn new() -> Self {
        Self::default()
    }
}

impl HistoryLedger for InMemoryHistoryLedger {
    fn append(&mut self, entry: &HistoryEntry) -> Result<(), Box<dyn std::error::Error>> {
        self.entries.push(entry.clone());
        Ok(())
    }

    fn entries(&self) -> Result<Vec<HistoryEntry>, Box<dyn std::error::Error>> {
        Ok(self.entries.clone())
    }
}

/// Writes the whole ledger to `path` as a pretty-printed JSON array.
/// Returns the number of entries written.
pub fn export_history(
    ledger: &dyn HistoryLedger,
    path: &Path,
) -> Result<usize, Box<dyn std::error::Error>> {
    let entries = ledger.entries()?;
    let json = serde_json::to_string_pretty(&entries).map_err(HistoryError::Serialize)?;
    std::fs::write(path, json).map_err(|source| HistoryError::Io {
        path: path.to_path_buf(),
        source,
    })?;
    Ok(entries.len())
}

#[cfg(test)]
mod tests {
    use super::*;
    use rstest::rstest;

    #[rstest]
    #[case::jpg("room.jpg", Some(MediaType::Image))]
    #[case::jpeg_upper("ROOM.JPEG", Some(MediaType::Image))]
    #[case::png("room.png", Some(MediaType::Image))]
    #[case::mp4("clip.mp4", Some(MediaType::Video))]
    #[case::mov("clip.mov", None)]
    #[case::gif("room.gif", None)]
    #[case::no_extension("README", None)]
    fn test_media_type_from_path(#[case] name: &str, #[case] expected: Option<MediaType>) {
        assert_eq!(MediaType::from_path(Path::new(name)), expected);
    }

    #[test]
    fn test_media_type_serializes_lowercase() {
        assert_eq!(serde_json::to_string(&MediaType::Video).unwrap(), "\"video\"");
        assert_eq!(MediaType::Image.as_str(), "image");
    }

    #[test]
    fn test_entry_now_is_stamped() {
        let entry = HistoryEntry::now("room.jpg", MediaType::Image, 2);
        assert!(entry.timestamp > 1_600_000_000);
        assert_eq!(entry.count, 2);
    }

    #[test]
    fn test_in_memory_ledger_keeps_order() {
        let mut ledger = InMemoryHistoryLedger::new();
        ledger
            .append(&HistoryEntry::now("a.jpg", MediaType::Image, 1))
            .unwrap();
        ledger
            .append(&HistoryEntry::now("b.mp4", MediaType::Video, 0))
            .unwrap();

        let names: Vec<String> = ledger
            .entries()
            .unwrap()
            .into_iter()
            .map(|e| e.filename)
            .collect();
        assert_eq!(names, vec!["a.jpg", "b.mp4"]);
    }

    #[test]
    fn test_export_writes_json_array() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        let mut ledger = InMemoryHistoryLedger::new();
        ledger
            .append(&HistoryEntry {
                timestamp: 100,
                filename: "clip.mp4".to_string(),
                media_type: MediaType::Video,
                count: 3,
            })
            .unwrap();

        assert_eq!(export_history(&ledger, &path).unwrap(), 1);
        let parsed: serde_json::Value =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(parsed[0]["media_type"], "video");
        assert_eq!(parsed[0]["count"], 3);
    }

    #[test]
    fn test_export_empty_ledger() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("history.json");
        assert_eq!(export_history(&InMemoryHistoryLedger::new(), &path).unwrap(), 0);
        assert_eq!(std::fs::read_to_string(&path).unwrap(), "[]");
    }

    #[test]
    fn test_export_to_missing_dir_fails() {
        let ledger = InMemoryHistoryLedger::new();
        assert!(export_history(&ledger, Path::new("/nonexistent/dir/history.json")).is_err());
    }
}
