use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::LazyLock;
use tracing::debug;

use super::csv_store::SermonEntry;
use super::transcript::TranscriptHeader;

static YOUTUBE_ID: LazyLock<Regex> = LazyLock::new(|| {
    Regex::new(r"(?:[?&]v=|youtu\.be/|/shorts/|/live/)([A-Za-z0-9_-]{6,})")
        .expect("YouTube id regex is valid")
});

/// Store-independent view of one sermon
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct SermonRecord {
    pub date: String,
    pub title: String,
    pub speaker: String,
    pub url: String,
    pub status: String,
    pub description: String,
    pub venue: String,
    pub location: String,
    pub duration: String,
}

impl SermonRecord {
    /// Stable key for deduplication: the YouTube video id when the URL has
    /// one, else an md5 digest of the URL, else of `date|title`
    pub fn identifier(&self) -> String {
        let url = self.url.trim();
        if let Some(id) = youtube_id(url) {
            return id.to_string();
        }

        let source = if url.is_empty() {
            format!("{}|{}", self.date.trim(), self.title.trim())
        } else {
            url.to_string()
        };
        format!("{:x}", md5::compute(source.as_bytes()))
    }
}

/// Merge rows read from several catalogs, keeping the first row of each
/// sermon. Returns the kept rows and how many were dropped.
pub fn dedup_entries<I>(entries: I) -> (Vec<SermonEntry>, usize)
where
    I: IntoIterator<Item = SermonEntry>,
{
    let mut seen = HashSet::new();
    let mut kept = Vec::new();
    let mut dropped = 0;

    for entry in entries {
        if seen.insert(SermonRecord::from(&entry).identifier()) {
            kept.push(entry);
        } else {
            debug!("Duplicate sermon '{}' ({})", entry.title, entry.date);
            dropped += 1;
        }
    }

    (kept, dropped)
}

/// Video id from a YouTube watch, short, or live URL
fn youtube_id(url: &str) -> Option<&str> {
    YOUTUBE_ID
        .captures(url)
        .and_then(|c| c.get(1))
        .map(|m| m.as_str())
}

impl From<&SermonEntry> for SermonRecord {
    fn from(entry: &SermonEntry) -> Self {
        Self {
            date: entry.date.clone(),
            title: entry.title.clone(),
            speaker: entry.speaker.clone(),
            url: entry.url.clone(),
            status: entry.status.clone(),
            description: entry.description.clone(),
            ..Self::default()
        }
    }
}

impl From<&TranscriptHeader> for SermonRecord {
    fn from(header: &TranscriptHeader) -> Self {
        let field = |value: &Option<String>| value.clone().unwrap_or_default();
        Self {
            date: field(&header.date),
            title: field(&header.title),
            speaker: field(&header.speaker),
            url: field(&header.url),
            venue: field(&header.venue),
            location: field(&header.location),
            duration: field(&header.duration),
            ..Self::default()
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_identifier_prefers_youtube_id() {
        let record = SermonRecord {
            url: "https://www.youtube.com/watch?v=dQw4w9WgXcQ&t=42".to_string(),
            ..Default::default()
        };
        assert_eq!(record.identifier(), "dQw4w9WgXcQ");

        let short = SermonRecord {
            url: "https://youtu.be/dQw4w9WgXcQ".to_string(),
            ..Default::default()
        };
        assert_eq!(short.identifier(), "dQw4w9WgXcQ");
    }

    #[test]
    fn test_identifier_falls_back_to_digest() {
        let by_url = SermonRecord {
            url: "https://example.org/sermons/42".to_string(),
            ..Default::default()
        };
        let id = by_url.identifier();
        assert_eq!(id.len(), 32);
        assert_eq!(id, by_url.clone().identifier());

        let a = SermonRecord {
            date: "2024-01-07".to_string(),
            title: "Faith".to_string(),
            ..Default::default()
        };
        let b = SermonRecord {
            date: "2024-01-14".to_string(),
            title: "Faith".to_string(),
            ..Default::default()
        };
        assert_ne!(a.identifier(), b.identifier());
    }

    #[test]
    fn test_from_transcript_header() {
        let header = TranscriptHeader {
            title: Some("Title".to_string()),
            venue: Some("Hall".to_string()),
            ..Default::default()
        };
        let record = SermonRecord::from(&header);
        assert_eq!(record.title, "Title");
        assert_eq!(record.venue, "Hall");
    }

    #[test]
    fn test_dedup_entries_keeps_first_row() {
        let row = |date: &str, title: &str, url: &str, speaker: &str| SermonEntry {
            date: date.to_string(),
            title: title.to_string(),
            url: url.to_string(),
            speaker: speaker.to_string(),
            ..Default::default()
        };

        let (kept, dropped) = dedup_entries(vec![
            row("2024-01-07", "Faith", "https://youtu.be/abcdef123", "David Mayeur"),
            row("2024-01-07", "Faith (re-upload)", "https://www.youtube.com/watch?v=abcdef123", ""),
            row("2024-01-14", "Hope", "", "Chad Lamb"),
            row("2024-01-14", "Hope", "", "Unknown Speaker"),
            row("2024-01-21", "Hope", "", ""),
        ]);

        assert_eq!(dropped, 2);
        let speakers: Vec<&str> = kept.iter().map(|e| e.speaker.as_str()).collect();
        assert_eq!(speakers, vec!["David Mayeur", "Chad Lamb", ""]);
    }
}
