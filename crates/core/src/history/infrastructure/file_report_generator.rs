use std::fs::{self, OpenOptions};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::history::domain::report_generator::{ReportData, ReportFormat, ReportGenerator};
use crate::history::error::HistoryError;

const REPORT_TITLE: &str = "Sitting Detection Report";

/// Writes reports as `report_<generated_at>.<ext>` into one directory.
///
/// When that name is taken a numeric suffix is appended (`report_<t>_1.txt`,
/// `report_<t>_2.txt`, ...) so existing reports are never overwritten.
pub struct FileReportGenerator {
    output_dir: PathBuf,
}

impl FileReportGenerator {
    pub fn new(output_dir: impl Into<PathBuf>) -> Self {
        Self {
            output_dir: output_dir.into(),
        }
    }

    fn io_error(path: &Path, source: std::io::Error) -> HistoryError {
        HistoryError::Io {
            path: path.to_path_buf(),
            source,
        }
    }

    /// Creates the first free report file. `create_new` makes the check and
    /// the creation a single step.
    fn create_unique(
        &self,
        stem: &str,
        ext: &str,
    ) -> Result<(PathBuf, fs::File), HistoryError> {
        let mut n = 0usize;
        loop {
            let name = if n == 0 {
                format!("{stem}.{ext}")
            } else {
                format!("{stem}_{n}.{ext}")
            };
            let path = self.output_dir.join(name);
            match OpenOptions::new().write(true).create_new(true).open(&path) {
                Ok(file) => return Ok((path, file)),
                Err(e) if e.kind() == std::io::ErrorKind::AlreadyExists => n += 1,
                Err(e) => return Err(Self::io_error(&path, e)),
            }
        }
    }
}

/// Plain-text rendering: title, file, people sitting, generation time.
pub fn render_text(data: &ReportData) -> String {
    let ids = if data.sitting_ids.is_empty() {
        "-".to_string()
    } else {
        data.sitting_ids
            .iter()
            .map(|id| id.to_string())
            .collect::<Vec<_>>()
            .join(", ")
    };
    format!(
        "{REPORT_TITLE}\n\
         {underline}\n\
         File: {file}\n\
         Media type: {media}\n\
         People sitting: {count}\n\
         Track ids: {ids}\n\
         Generated at: {at} (unix seconds)\n",
        underline = "=".repeat(REPORT_TITLE.len()),
        file = data.filename,
        media = data.media_type.as_str(),
        count = data.people_sitting,
        at = data.generated_at,
    )
}

impl ReportGenerator for FileReportGenerator {
    fn generate(
        &self,
        data: &ReportData,
        format: ReportFormat,
    ) -> Result<PathBuf, Box<dyn std::error::Error>> {
        fs::create_dir_all(&self.output_dir)
            .map_err(|e| Self::io_error(&self.output_dir, e))?;

        let body = match format {
            ReportFormat::Text => render_text(data),
            ReportFormat::Json => {
                serde_json::to_string_pretty(data).map_err(HistoryError::Serialize)?
            }
        };

        let stem = format!("report_{}", data.generated_at);
        let (path, mut file) = self.create_unique(&stem, format.extension())?;
        file.write_all(body.as_bytes())
            .map_err(|e| Self::io_error(&path, e))?;
        log::info!("Report written to {}", path.display());
        Ok(path)
    }
}
