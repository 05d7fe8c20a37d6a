//! CSV export of aggregated papers.
//!
//! The file is written to a temporary sibling first and renamed into place, so
//! a failed export never leaves a truncated file behind.

use serde::{Deserialize, Serialize};
use std::io::Write;
use std::path::{Path, PathBuf};

use crate::models::Paper;

/// Columns written by [`ExportLayout::Basic`]
const BASIC_HEADERS: [&str; 6] = ["Title", "Authors", "Abstract", "Date", "Source", "QualityScore"];

/// Columns written by [`ExportLayout::Extended`]
const EXTENDED_HEADERS: [&str; 13] = [
    "Title",
    "Authors",
    "Abstract",
    "Date",
    "Source",
    "QualityScore",
    "JournalName",
    "ISSN",
    "eISSN",
    "DOI",
    "URL",
    "Citations",
    "Quartile",
];

/// Which columns to export
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum ExportLayout {
    /// The six core bibliographic columns
    Basic,
    /// Core columns plus journal, identifier and citation columns
    #[default]
    Extended,
}

impl ExportLayout {
    pub fn headers(&self) -> &'static [&'static str] {
        match self {
            ExportLayout::Basic => &BASIC_HEADERS,
            ExportLayout::Extended => &EXTENDED_HEADERS,
        }
    }
}

impl std::str::FromStr for ExportLayout {
    type Err = String;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.to_lowercase().as_str() {
            "basic" => Ok(ExportLayout::Basic),
            "extended" => Ok(ExportLayout::Extended),
            other => Err(format!("Unknown export layout: {}", other)),
        }
    }
}

/// Export settings
#[derive(Debug, Clone, Copy)]
pub struct ExportOptions {
    pub layout: ExportLayout,
    pub delimiter: u8,
}

impl Default for ExportOptions {
    fn default() -> Self {
        Self {
            layout: ExportLayout::default(),
            delimiter: b',',
        }
    }
}

impl ExportOptions {
    pub fn new(layout: ExportLayout) -> Self {
        Self {
            layout,
            ..Default::default()
        }
    }

    pub fn with_delimiter(mut self, delimiter: u8) -> Self {
        self.delimiter = delimiter;
        self
    }
}

/// Export errors
#[derive(Debug, thiserror::Error)]
pub enum ExportError {
    #[error("Failed to write {path}: {source}")]
    Io {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("Failed to move export into place at {path}: {source}")]
    Persist {
        path: PathBuf,
        #[source]
        source: std::io::Error,
    },
}

/// Write the header row and one row per paper; returns the number of rows.
pub fn write_csv<W: Write>(
    writer: W,
    papers: &[Paper],
    options: &ExportOptions,
) -> Result<usize, ExportError> {
    let headers = options.layout.headers();
    let mut wtr = csv::WriterBuilder::new()
        .delimiter(options.delimiter)
        .from_writer(writer);

    wtr.write_record(headers)?;
    for paper in papers {
        let record = paper.to_record();
        wtr.write_record(record.iter().take(headers.len()).map(|(_, value)| value.as_str()))?;
    }
    wtr.flush().map_err(csv::Error::from)?;

    Ok(papers.len())
}

/// Export papers to a CSV file, replacing it atomically.
///
/// An empty slice still produces a file with just the header row.
pub fn export_csv(
    path: impl AsRef<Path>,
    papers: &[Paper],
    options: &ExportOptions,
) -> Result<usize, ExportError> {
    let path = path.as_ref();
    let parent = match path.parent() {
        Some(dir) if !dir.as_os_str().is_empty() => dir,
        _ => Path::new("."),
    };

    let io_err = |source| ExportError::Io {
        path: path.to_path_buf(),
        source,
    };

    let mut tmp = tempfile::NamedTempFile::new_in(parent).map_err(io_err)?;
    let rows = write_csv(tmp.as_file_mut(), papers, options)?;
    tmp.as_file().sync_all().map_err(io_err)?;

    tmp.persist(path).map_err(|e| ExportError::Persist {
        path: path.to_path_buf(),
        source: e.error,
    })?;

    tracing::info!(path = %path.display(), rows, layout = ?options.layout, "exported papers");
    Ok(rows)
}
