/// Sermon Analyzer - Rust Implementation
///
/// Speaker-name identification and cleanup for sermon catalogs: regex
/// templates propose names from video titles and descriptions, a fixed rule
/// set validates them, and normalization collapses variants.

pub mod speakers;
pub mod catalog;
pub mod audit;
pub mod processing;
pub mod config;

// Re-export main types for easy access
pub use crate::config::{Config, ConfigBuilder};
pub use crate::processing::{BatchProcessor, ScanResult, ScanStatus};
pub use crate::speakers::{
    SpeakerIdentifier, SpeakerLexicon, SpeakerMatch, SpeakerRegistry, TermCategory, Verdict,
    UNKNOWN_SPEAKER,
};
pub use crate::catalog::{CatalogError, SermonEntry, SermonRecord, TranscriptFile};
pub use crate::audit::{AuditFinding, AuditIssue, Correction, RunSummary};
