//! Sermon catalog storage formats
//!
//! Two stores describe the same sermons: one transcript text file per sermon
//! (a `Key: Value` header block followed by the transcript) and one CSV per
//! church. Both convert into [`SermonRecord`].

pub mod csv_store;
pub mod record;
pub mod transcript;

pub use csv_store::{read_entries, write_entries, SermonEntry};
pub use record::{dedup_entries, SermonRecord};
pub use transcript::{TranscriptFile, TranscriptHeader, TRANSCRIPT_MARKER};

use std::path::PathBuf;

/// Result type for catalog operations
pub type Result<T> = std::result::Result<T, CatalogError>;

/// Error types for catalog operations
#[derive(thiserror::Error, Debug)]
pub enum CatalogError {
    #[error("IO error: {0}")]
    Io(#[from] std::io::Error),

    #[error("CSV error: {0}")]
    Csv(#[from] csv::Error),

    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    #[error("Transcript marker missing in {0}")]
    MissingMarker(PathBuf),

    #[error("Malformed header line {line} in {path}: {content}")]
    MalformedHeader {
        path: PathBuf,
        line: usize,
        content: String,
    },
}
