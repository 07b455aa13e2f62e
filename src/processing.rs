use anyhow::{Context, Result};
use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use std::sync::Arc;
use std::time::{Duration, Instant};
use tokio::sync::{mpsc, Semaphore};
use tracing::{debug, error, info, warn};
use walkdir::WalkDir;

use crate::audit::RunSummary;
use crate::catalog::{SermonRecord, TranscriptFile};
use crate::config::Config;
use crate::speakers::{SpeakerIdentifier, SpeakerLexicon, SpeakerRegistry, UNKNOWN_SPEAKER};

/// File name of persisted scan results inside the reports directory
pub const SCAN_RESULTS_FILE: &str = "scan_results.json";

/// Scan outcome for a single transcript file
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TranscriptScanResult {
    pub path: PathBuf,
    /// Sermon identifier derived from the header (video id or digest)
    pub record_id: Option<String>,
    pub title: String,
    pub previous: Option<String>,
    pub speaker: String,
    pub processing_time: Duration,
    pub status: ScanStatus,
    pub error_message: Option<String>,
}

/// Overall batch scan results
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ScanResult {
    pub total: usize,
    pub corrected: usize,
    pub unchanged: usize,
    pub unresolved: usize,
    pub failed: usize,
    pub scanned_at: DateTime<Utc>,
    pub total_time: Duration,
    pub results: Vec<TranscriptScanResult>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum ScanStatus {
    /// Stored speaker is already valid and normalized
    Unchanged,
    /// A different speaker should be written
    Corrected,
    /// Nothing plausible found and the file already says so
    Unresolved,
    Failed,
}

/// Bounded worker pool that re-identifies transcript speakers in parallel
pub struct BatchProcessor {
    identifier: Arc<SpeakerIdentifier>,
    registry: Arc<SpeakerRegistry>,
    extensions: Vec<String>,
    worker_semaphore: Arc<Semaphore>,
    max_concurrent: usize,
}

impl BatchProcessor {
    pub fn new(config: &Config, identifier: SpeakerIdentifier, registry: SpeakerRegistry) -> Self {
        let max_workers = config.performance.max_workers.max(1);
        info!("🔧 Initializing BatchProcessor with {} workers", max_workers);

        Self {
            identifier: Arc::new(identifier),
            registry: Arc::new(registry),
            extensions: config
                .storage
                .transcript_extensions
                .iter()
                .map(|e| e.trim_start_matches('.').to_lowercase())
                .collect(),
            worker_semaphore: Arc::new(Semaphore::new(max_workers)),
            max_concurrent: max_workers,
        }
    }

    /// Load the lexicon and registry named by the config
    pub fn from_config(config: &Config) -> Result<Self> {
        let lexicon = SpeakerLexicon::load_or_default(config.heuristics.rules_file.as_deref())?;
        let stats = lexicon.get_stats();
        info!(
            "📚 Speaker lexicon loaded: {} terms, {} rules",
            stats.total_terms, stats.total_rules
        );

        let identifier = SpeakerIdentifier::new(Arc::new(lexicon))?
            .with_descriptions(config.heuristics.use_descriptions);
        let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;

        Ok(Self::new(config, identifier, registry))
    }

    /// Transcript files under `dir`, sorted by path
    pub fn discover_transcripts(&self, dir: &Path) -> Result<Vec<PathBuf>> {
        if !dir.is_dir() {
            anyhow::bail!("Transcript directory not found: {}", dir.display());
        }

        let mut paths = Vec::new();
        for entry in WalkDir::new(dir).follow_links(true) {
            let entry = match entry {
                Ok(entry) => entry,
                Err(e) => {
                    warn!("Skipping unreadable entry: {}", e);
                    continue;
                }
            };

            let matches = entry.file_type().is_file()
                && entry
                    .path()
                    .extension()
                    .map(|ext| ext.to_string_lossy().to_lowercase())
                    .is_some_and(|ext| self.extensions.contains(&ext));
            if matches {
                paths.push(entry.into_path());
            }
        }

        paths.sort();
        Ok(paths)
    }

    /// Scan every transcript in a directory
    pub async fn scan_directory(&self, input_dir: &Path) -> Result<ScanResult> {
        let start_time = Instant::now();

        info!("🚀 Starting transcript scan...");
        info!("📁 Input: {}", input_dir.display());

        info!("🔍 Discovering transcripts...");
        let paths = self.discover_transcripts(input_dir)?;

        if paths.is_empty() {
            warn!("No transcripts found in {}", input_dir.display());
        } else {
            info!("📄 Found {} transcripts to scan", paths.len());
        }

        let mut results = self.scan_parallel(paths).await;
        results.sort_by(|a, b| a.path.cmp(&b.path));

        let count = |status: ScanStatus| results.iter().filter(|r| r.status == status).count();
        let (corrected, unchanged, unresolved, failed) = (
            count(ScanStatus::Corrected),
            count(ScanStatus::Unchanged),
            count(ScanStatus::Unresolved),
            count(ScanStatus::Failed),
        );

        Ok(ScanResult {
            total: results.len(),
            corrected,
            unchanged,
            unresolved,
            failed,
            scanned_at: Utc::now(),
            total_time: start_time.elapsed(),
            results,
        })
    }

    /// Scan files in parallel with controlled concurrency; results arrive in completion order
    async fn scan_parallel(&self, paths: Vec<PathBuf>) -> Vec<TranscriptScanResult> {
        let (tx, mut rx) = mpsc::channel(self.max_concurrent);
        let total_files = paths.len();

        for (index, path) in paths.into_iter().enumerate() {
            let identifier = Arc::clone(&self.identifier);
            let registry = Arc::clone(&self.registry);
            let tx = tx.clone();
            let semaphore = Arc::clone(&self.worker_semaphore);

            tokio::spawn(async move {
                let Ok(_permit) = semaphore.acquire().await else {
                    error!("Worker pool closed before {}", path.display());
                    return;
                };

                debug!("📄 Scanning transcript {}/{}: {}", index + 1, total_files, path.display());
                let result = scan_file(&identifier, &registry, &path).await;

                if let Err(e) = tx.send(result).await {
                    error!("Failed to send result: {}", e);
                }
            });
        }

        // Drop the original sender to close the channel when all tasks complete
        drop(tx);

        let mut results = Vec::with_capacity(total_files);
        while let Some(result) = rx.recv().await {
            match result.status {
                ScanStatus::Corrected => info!(
                    "✏️ {}: '{}' -> '{}'",
                    result.path.display(),
                    result.previous.as_deref().unwrap_or(""),
                    result.speaker
                ),
                ScanStatus::Failed => warn!(
                    "❌ Failed: {} - {}",
                    result.path.display(),
                    result.error_message.as_deref().unwrap_or("Unknown error")
                ),
                _ => {}
            }
            results.push(result);
        }

        results
    }

    /// Write corrected speakers back, one file at a time
    pub async fn apply_corrections(&self, scan: &ScanResult) -> RunSummary {
        let mut summary = RunSummary {
            unchanged: scan.unchanged + scan.unresolved,
            skipped: scan.failed,
            ..RunSummary::default()
        };

        for result in scan.results.iter().filter(|r| r.status == ScanStatus::Corrected) {
            match write_speaker(&result.path, &result.speaker).await {
                Ok(()) => summary.fixed += 1,
                Err(e) => {
                    warn!("Failed to update {}: {:#}", result.path.display(), e);
                    summary.errors += 1;
                }
            }
        }

        summary
    }

    /// Persist scan results as pretty JSON
    pub async fn save_results(&self, scan: &ScanResult, output_dir: &Path) -> Result<PathBuf> {
        tokio::fs::create_dir_all(output_dir).await?;
        let results_path = output_dir.join(SCAN_RESULTS_FILE);

        let json_data = serde_json::to_string_pretty(scan)?;
        tokio::fs::write(&results_path, json_data).await?;

        info!("💾 Results saved to: {}", results_path.display());
        Ok(results_path)
    }

    /// Get processing statistics
    pub fn get_stats(&self) -> ProcessingStats {
        ProcessingStats {
            max_workers: self.max_concurrent,
            available_permits: self.worker_semaphore.available_permits(),
            known_speakers: self.registry.len(),
        }
    }
}

/// Re-identify one transcript's speaker; errors become a `Failed` result
async fn scan_file(
    identifier: &SpeakerIdentifier,
    registry: &SpeakerRegistry,
    path: &Path,
) -> TranscriptScanResult {
    let start_time = Instant::now();
    let mut result = TranscriptScanResult {
        path: path.to_path_buf(),
        record_id: None,
        title: String::new(),
        previous: None,
        speaker: String::new(),
        processing_time: Duration::from_secs(0),
        status: ScanStatus::Failed,
        error_message: None,
    };

    let file = match read_transcript(path).await {
        Ok(file) => file,
        Err(e) => {
            result.error_message = Some(format!("{:#}", e));
            result.processing_time = start_time.elapsed();
            return result;
        }
    };

    let header = file.header;
    let current = header.speaker.clone().unwrap_or_default();
    let title = header.title.clone().unwrap_or_default();

    let cleaned = if current.trim().is_empty() || current == UNKNOWN_SPEAKER {
        None
    } else {
        identifier.clean_speaker(&current, registry)
    };
    let speaker = match cleaned {
        Some(name) => name,
        None => identifier.identify(&title, None, registry).speaker,
    };

    result.status = if speaker == current {
        if speaker == UNKNOWN_SPEAKER {
            ScanStatus::Unresolved
        } else {
            ScanStatus::Unchanged
        }
    } else {
        ScanStatus::Corrected
    };
    result.record_id = Some(SermonRecord::from(&header).identifier());
    result.title = title;
    result.previous = header.speaker;
    result.speaker = speaker;
    result.processing_time = start_time.elapsed();
    result
}

async fn read_transcript(path: &Path) -> Result<TranscriptFile> {
    let content = tokio::fs::read_to_string(path)
        .await
        .with_context(|| format!("Failed to read {}", path.display()))?;
    Ok(TranscriptFile::parse(path, &content)?)
}

async fn write_speaker(path: &Path, speaker: &str) -> Result<()> {
    let mut file = read_transcript(path).await?;
    file.header.speaker = Some(speaker.to_string());
    tokio::fs::write(path, file.render())
        .await
        .with_context(|| format!("Failed to write {}", path.display()))?;
    Ok(())
}

#[derive(Debug, Clone)]
pub struct ProcessingStats {
    pub max_workers: usize,
    pub available_permits: usize,
    pub known_speakers: usize,
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::ConfigBuilder;
    use tempfile::TempDir;

    fn transcript(title: &str, speaker: &str) -> String {
        format!(
            "Date: 2024-01-07\nTitle: {}\nSpeaker: {}\n--- TRANSCRIPT ---\nText.\n",
            title, speaker
        )
    }

    fn processor(registry: SpeakerRegistry) -> BatchProcessor {
        let config = ConfigBuilder::new().with_workers(2).build();
        BatchProcessor::new(&config, SpeakerIdentifier::with_defaults().unwrap(), registry)
    }

    fn fixture() -> TempDir {
        let temp_dir = TempDir::new().unwrap();
        let dir = temp_dir.path();
        std::fs::create_dir_all(dir.join("grace")).unwrap();

        std::fs::write(
            dir.join("a.txt"),
            transcript("Bro David Mayeur — Sunday Morning Service", "Unknown Speaker"),
        )
        .unwrap();
        std::fs::write(dir.join("b.txt"), transcript("Faith", "Chad Lamb")).unwrap();
        std::fs::write(
            dir.join("grace").join("c.txt"),
            transcript("Evening Service", "Unknown Speaker"),
        )
        .unwrap();
        std::fs::write(dir.join("grace").join("d.txt"), "no header marker\n").unwrap();
        std::fs::write(dir.join("notes.md"), "ignored").unwrap();

        temp_dir
    }

    #[tokio::test]
    async fn test_scan_directory() {
        let temp_dir = fixture();
        let processor = processor(SpeakerRegistry::from_names(["Chad Lamb"]));

        let scan = processor.scan_directory(temp_dir.path()).await.unwrap();

        assert_eq!(scan.total, 4);
        assert_eq!(scan.corrected, 1);
        assert_eq!(scan.unchanged, 1);
        assert_eq!(scan.unresolved, 1);
        assert_eq!(scan.failed, 1);

        let paths: Vec<&PathBuf> = scan.results.iter().map(|r| &r.path).collect();
        let mut sorted = paths.clone();
        sorted.sort();
        assert_eq!(paths, sorted);

        let corrected = &scan.results[0];
        assert_eq!(corrected.status, ScanStatus::Corrected);
        assert_eq!(corrected.speaker, "David Mayeur");
        assert!(corrected.record_id.is_some());

        let failed: Vec<&TranscriptScanResult> =
            scan.results.iter().filter(|r| r.record_id.is_none()).collect();
        assert_eq!(failed.len(), 1);
        assert_eq!(failed[0].status, ScanStatus::Failed);
    }

    #[tokio::test]
    async fn test_apply_corrections_writes_files() {
        let temp_dir = fixture();
        let processor = processor(SpeakerRegistry::from_names(["Chad Lamb"]));

        let scan = processor.scan_directory(temp_dir.path()).await.unwrap();
        let summary = processor.apply_corrections(&scan).await;
        assert_eq!(summary, RunSummary { fixed: 1, unchanged: 2, skipped: 1, errors: 0 });

        let file = TranscriptFile::read(temp_dir.path().join("a.txt")).unwrap();
        assert_eq!(file.header.speaker.as_deref(), Some("David Mayeur"));
        assert_eq!(file.body, "Text.\n");

        let rescan = processor.scan_directory(temp_dir.path()).await.unwrap();
        assert_eq!(rescan.corrected, 0);
    }

    #[tokio::test]
    async fn test_save_results_and_stats() {
        let temp_dir = fixture();
        let processor = processor(SpeakerRegistry::new());
        let scan = processor.scan_directory(temp_dir.path()).await.unwrap();

        let path = processor
            .save_results(&scan, &temp_dir.path().join("reports"))
            .await
            .unwrap();
        let saved: ScanResult =
            serde_json::from_str(&std::fs::read_to_string(path).unwrap()).unwrap();
        assert_eq!(saved.total, scan.total);

        let stats = processor.get_stats();
        assert_eq!(stats.max_workers, 2);
        assert_eq!(stats.available_permits, 2);
    }

    #[tokio::test]
    async fn test_missing_directory_is_error() {
        let temp_dir = TempDir::new().unwrap();
        let processor = processor(SpeakerRegistry::new());
        assert!(processor
            .scan_directory(&temp_dir.path().join("missing"))
            .await
            .is_err());
    }
}
