use chrono::Utc;
use csv::{ReaderBuilder, WriterBuilder};
use serde::{Deserialize, Serialize};
use std::fs;
use std::io::{Read, Write};
use std::path::Path;
use tracing::debug;

use super::Result;

/// One row of a per-church CSV; field order is the column order
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct SermonEntry {
    pub date: String,
    pub status: String,
    pub speaker: String,
    pub title: String,
    pub url: String,
    pub last_checked: String,
    pub language: String,
    #[serde(rename = "type")]
    pub kind: String,
    pub description: String,
}

impl SermonEntry {
    /// Stamp `last_checked` with today's UTC date
    pub fn touch(&mut self) {
        self.last_checked = Utc::now().format("%Y-%m-%d").to_string();
    }
}

/// Read every row; missing columns come back as empty strings
pub fn read_entries<P: AsRef<Path>>(path: P) -> Result<Vec<SermonEntry>> {
    let path = path.as_ref();
    let entries = read_entries_from(fs::File::open(path)?)?;
    debug!("Read {} rows from {}", entries.len(), path.display());
    Ok(entries)
}

pub fn read_entries_from<R: Read>(reader: R) -> Result<Vec<SermonEntry>> {
    let mut reader = ReaderBuilder::new()
        .has_headers(true)
        .flexible(true)
        .from_reader(reader);

    let mut entries = Vec::new();
    for row in reader.deserialize() {
        entries.push(row?);
    }
    Ok(entries)
}

/// Write rows with a header, replacing the file
pub fn write_entries<P: AsRef<Path>>(path: P, entries: &[SermonEntry]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        fs::create_dir_all(parent)?;
    }
    write_entries_to(fs::File::create(path)?, entries)?;
    debug!("Wrote {} rows to {}", entries.len(), path.display());
    Ok(())
}

pub fn write_entries_to<W: Write>(writer: W, entries: &[SermonEntry]) -> Result<()> {
    let mut writer = WriterBuilder::new().has_headers(true).from_writer(writer);
    if entries.is_empty() {
        writer.write_record(COLUMNS)?;
    }
    for entry in entries {
        writer.serialize(entry)?;
    }
    writer.flush()?;
    Ok(())
}

/// Column header, in file order
pub const COLUMNS: [&str; 9] = [
    "date",
    "status",
    "speaker",
    "title",
    "url",
    "last_checked",
    "language",
    "type",
    "description",
];
