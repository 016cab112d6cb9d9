use std::path::PathBuf;
use std::str::FromStr;

use serde::Serialize;

use crate::history::domain::history_ledger::MediaType;

#[derive(Clone, Copy, Debug, PartialEq, Eq)]
pub enum ReportFormat {
    Text,
    Json,
}

impl ReportFormat {
    pub fn extension(self) -> &'static str {
        match self {
            Self::Text => "txt",
            Self::Json => "json",
        }
    }
}

impl FromStr for ReportFormat {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_ascii_lowercase().as_str() {
            "text" | "txt" => Ok(Self::Text),
            "json" => Ok(Self::Json),
            other => Err(format!("Report format must be 'text' or 'json', got '{other}'")),
        }
    }
}

/// What a report states about one evaluation.
#[derive(Clone, Debug, PartialEq, Serialize)]
pub struct ReportData {
    pub filename: String,
    pub media_type: MediaType,
    pub people_sitting: usize,
    pub sitting_ids: Vec<u32>,
    /// Seconds since the Unix epoch.
    pub generated_at: u64,
}

/// Renders a [`ReportData`] to a file and returns where it went.
pub trait ReportGenerator: Send {
    fn generate(
        &self,
        data: &ReportData,
        format: ReportFormat,
    ) -> Result<PathBuf, Box<dyn std::error::Error>>;
}
