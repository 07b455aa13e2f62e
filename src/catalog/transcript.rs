use std::fs;
use std::path::{Path, PathBuf};
use tracing::debug;

use super::{CatalogError, Result};

/// Line separating the header block from the transcript text
pub const TRANSCRIPT_MARKER: &str = "--- TRANSCRIPT ---";

/// Known header keys, in the order they are written
const KNOWN_KEYS: [&str; 9] = [
    "Date", "Title", "Speaker", "Venue", "Location", "Duration", "URL", "Language", "Type",
];

/// Header block of a per-sermon transcript file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct TranscriptHeader {
    pub date: Option<String>,
    pub title: Option<String>,
    pub speaker: Option<String>,
    pub venue: Option<String>,
    pub location: Option<String>,
    pub duration: Option<String>,
    pub url: Option<String>,
    pub language: Option<String>,
    pub kind: Option<String>,

    /// Unrecognized `Key: Value` lines, kept in file order
    pub extras: Vec<(String, String)>,
}

impl TranscriptHeader {
    /// Parse header lines; blank lines are ignored, anything else must be `Key: Value`
    pub fn parse(path: &Path, lines: &[&str]) -> Result<Self> {
        let mut header = Self::default();

        for (index, line) in lines.iter().enumerate() {
            if line.trim().is_empty() {
                continue;
            }

            let Some((key, value)) = line.split_once(':') else {
                return Err(CatalogError::MalformedHeader {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                });
            };

            let key = key.trim();
            if key.is_empty() {
                return Err(CatalogError::MalformedHeader {
                    path: path.to_path_buf(),
                    line: index + 1,
                    content: line.to_string(),
                });
            }
            header.set(key, value.trim());
        }

        Ok(header)
    }

    /// Set a field by header key (case-insensitive for known keys)
    pub fn set(&mut self, key: &str, value: &str) {
        let value = value.to_string();
        match key.to_ascii_lowercase().as_str() {
            "date" => self.date = Some(value),
            "title" => self.title = Some(value),
            "speaker" => self.speaker = Some(value),
            "venue" => self.venue = Some(value),
            "location" => self.location = Some(value),
            "duration" => self.duration = Some(value),
            "url" => self.url = Some(value),
            "language" => self.language = Some(value),
            "type" => self.kind = Some(value),
            _ => {
                if let Some(extra) = self.extras.iter_mut().find(|(k, _)| k == key) {
                    extra.1 = value;
                } else {
                    self.extras.push((key.to_string(), value));
                }
            }
        }
    }

    fn known(&self, key: &str) -> Option<&str> {
        let field = match key {
            "Date" => &self.date,
            "Title" => &self.title,
            "Speaker" => &self.speaker,
            "Venue" => &self.venue,
            "Location" => &self.location,
            "Duration" => &self.duration,
            "URL" => &self.url,
            "Language" => &self.language,
            "Type" => &self.kind,
            _ => return None,
        };
        field.as_deref()
    }

    /// Header lines: present known fields in fixed order, then extras
    pub fn to_lines(&self) -> Vec<String> {
        let mut lines: Vec<String> = KNOWN_KEYS
            .iter()
            .filter_map(|key| self.known(key).map(|value| format!("{}: {}", key, value)))
            .collect();

        lines.extend(self.extras.iter().map(|(k, v)| format!("{}: {}", k, v)));
        lines
    }
}

/// A transcript file on disk: header plus free text
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct TranscriptFile {
    pub path: PathBuf,
    pub header: TranscriptHeader,
    pub body: String,
}

impl TranscriptFile {
    pub fn read<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = fs::read_to_string(path)?;
        Self::parse(path, &content)
    }

    pub fn parse(path: &Path, content: &str) -> Result<Self> {
        let mut header_lines = Vec::new();
        let mut rest = content;

        loop {
            let (line, remainder) = match rest.split_once('\n') {
                Some((line, remainder)) => (line, remainder),
                None => (rest, ""),
            };
            let line = line.strip_suffix('\r').unwrap_or(line);

            if line.trim() == TRANSCRIPT_MARKER {
                let header = TranscriptHeader::parse(path, &header_lines)?;
                debug!("Parsed transcript header of {}", path.display());
                return Ok(Self {
                    path: path.to_path_buf(),
                    header,
                    body: remainder.to_string(),
                });
            }

            if remainder.is_empty() && !rest.contains('\n') {
                return Err(CatalogError::MissingMarker(path.to_path_buf()));
            }

            header_lines.push(line);
            rest = remainder;
        }
    }

    /// Serialized file contents
    pub fn render(&self) -> String {
        let mut out = self.header.to_lines().join("\n");
        if !out.is_empty() {
            out.push('\n');
        }
        out.push_str(TRANSCRIPT_MARKER);
        out.push('\n');
        out.push_str(&self.body);
        out
    }

    /// Overwrite the file at `self.path`
    pub fn write(&self) -> Result<()> {
        fs::write(&self.path, self.render())?;
        Ok(())
    }
}
