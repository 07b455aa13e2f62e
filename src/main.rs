use anyhow::{Context, Result};
use clap::{Parser, Subcommand};
use sermon_analyzer::audit::{
    apply_corrections, apply_registry_fixes, audit_registry, collect_registry_additions,
    reconcile_catalog, write_report, RunSummary,
};
use sermon_analyzer::catalog::{dedup_entries, read_entries, write_entries};
use sermon_analyzer::{
    BatchProcessor, Config, SermonRecord, SpeakerIdentifier, SpeakerLexicon, SpeakerRegistry,
};
use std::collections::HashSet;
use std::path::{Path, PathBuf};
use std::sync::Arc;
use tracing::{error, info, warn};
use tracing_subscriber::{fmt, prelude::*, reload, EnvFilter};
use walkdir::WalkDir;

#[derive(Parser)]
#[command(name = "sermon-analyzer")]
#[command(version, author = "TigreRoll")]
#[command(about = "Speaker-name identification and cleanup for sermon catalogs")]
struct Cli {
    #[command(subcommand)]
    command: Commands,

    /// Config file (default: sermon-analyzer.toml or config/sermon-analyzer.toml)
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// JSON rule file overriding the built-in word lists
    #[arg(long, global = true)]
    rules: Option<PathBuf>,

    /// Speaker registry JSON file
    #[arg(long, global = true)]
    registry: Option<PathBuf>,

    /// Enable verbose logging
    #[arg(short, long, global = true)]
    verbose: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Identify the speaker of a single title
    Identify {
        /// Video title
        title: String,
        /// Video description
        #[arg(short, long)]
        description: Option<String>,
        /// Print the full match as JSON
        #[arg(long)]
        json: bool,
    },
    /// Validate and normalize speaker names
    Check {
        /// Names to check
        #[arg(required = true)]
        names: Vec<String>,
    },
    /// Report suspicious registry entries
    AuditRegistry {
        /// Remove, rename, and deduplicate entries in place
        #[arg(long)]
        apply: bool,
    },
    /// Re-derive speakers in church CSV files
    ReconcileCsv {
        /// CSV file or directory (default: storage.csv_dir)
        input: Option<PathBuf>,
        /// Write corrected speakers back
        #[arg(long)]
        apply: bool,
    },
    /// Re-identify speakers in transcript files with a worker pool
    ScanTranscripts {
        /// Transcript directory (default: storage.transcripts_dir)
        dir: Option<PathBuf>,
        /// Number of parallel workers
        #[arg(short, long)]
        workers: Option<usize>,
        /// Write corrected speakers back
        #[arg(long)]
        apply: bool,
    },
    /// Add validated catalog speakers missing from the registry
    RebuildRegistry {
        /// CSV file or directory (default: storage.csv_dir)
        input: Option<PathBuf>,
        /// Save the extended registry
        #[arg(long)]
        apply: bool,
    },
    /// Show lexicon, registry, and configuration statistics
    Stats,
}

#[tokio::main]
async fn main() -> Result<()> {
    let cli = Cli::parse();

    // Initialize logging; the configured level replaces the default once loaded
    let (filter, filter_handle) =
        reload::Layer::new(log_filter(if cli.verbose { "debug" } else { "info" }));
    tracing_subscriber::registry().with(filter).with(fmt::layer()).init();

    let mut config = match &cli.config {
        Some(path) => Config::load_from(path)?,
        None => Config::load().unwrap_or_else(|e| {
            warn!("Failed to load config, using defaults: {}", e);
            Config::default()
        }),
    };
    if let Some(registry) = &cli.registry {
        config.storage.registry_path = registry.clone();
    }
    if let Some(rules) = &cli.rules {
        config.heuristics.rules_file = Some(rules.clone());
    }

    if !cli.verbose {
        if let Err(e) = filter_handle.reload(log_filter(&config.output.log_level)) {
            warn!("Failed to apply log level '{}': {}", config.output.log_level, e);
        }
    }

    match cli.command {
        Commands::Identify { title, description, json } => {
            let identifier = load_identifier(&config)?;
            let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;
            let found = identifier.identify(&title, description.as_deref(), &registry);

            if json {
                println!("{}", serde_json::to_string_pretty(&found)?);
            } else {
                println!("{}", found.speaker);
                for (candidate, reason) in &found.rejected {
                    info!("  rejected '{}': {}", candidate, reason);
                }
            }
        }

        Commands::Check { names } => {
            let identifier = load_identifier(&config)?;
            let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;

            for name in names {
                let check = identifier.check_name(&name, &registry);
                match (check.valid, check.normalized, check.reason) {
                    (true, Some(normalized), _) => println!("✅ {} -> {}", name, normalized),
                    (_, _, reason) => {
                        println!("❌ {} ({})", name, reason.unwrap_or_default())
                    }
                }
            }
        }

        Commands::AuditRegistry { apply } => {
            let identifier = load_identifier(&config)?;
            let mut registry = SpeakerRegistry::load(&config.storage.registry_path)?;

            info!("🔍 Auditing {} registry entries...", registry.len());
            let findings = audit_registry(&identifier, &registry);
            write_report(config.output.reports_dir.join("registry_audit.csv"), &findings)?;

            if apply {
                let summary = apply_registry_fixes(&mut registry, &findings);
                registry.save(&config.storage.registry_path)?;
                summary.log("Registry audit");
            } else {
                info!("📋 {} findings; rerun with --apply to fix", findings.len());
            }
        }

        Commands::ReconcileCsv { input, apply } => {
            let identifier = load_identifier(&config)?;
            let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;
            let input = input.unwrap_or_else(|| config.storage.csv_dir.clone());

            let mut summary = RunSummary::default();
            let mut findings = Vec::new();
            let mut reported = HashSet::new();

            for path in csv_files(&input)? {
                let mut entries = match read_entries(&path) {
                    Ok(entries) => entries,
                    Err(e) => {
                        warn!("Skipping {}: {}", path.display(), e);
                        summary.errors += 1;
                        continue;
                    }
                };

                let (corrections, file_summary) = reconcile_catalog(&identifier, &registry, &entries);
                let source = path.file_name().map(|n| n.to_string_lossy().to_string()).unwrap_or_default();
                // a sermon listed in several catalogs is reported once
                findings.extend(
                    corrections
                        .iter()
                        .filter(|c| {
                            entries
                                .get(c.row)
                                .map_or(true, |e| reported.insert(SermonRecord::from(e).identifier()))
                        })
                        .map(|c| c.to_finding(&source)),
                );
                summary.merge(&file_summary);

                if apply && !corrections.is_empty() {
                    apply_corrections(&mut entries, &corrections);
                    if let Err(e) = write_entries(&path, &entries) {
                        error!("Failed to write {}: {}", path.display(), e);
                        summary.errors += 1;
                    }
                }
            }

            write_report(config.output.reports_dir.join("catalog_reconcile.csv"), &findings)?;
            summary.log(if apply { "Catalog reconcile" } else { "Catalog reconcile (dry run)" });
        }

        Commands::ScanTranscripts { dir, workers, apply } => {
            if let Some(workers) = workers {
                config.performance.max_workers = workers;
            }
            let dir = dir.unwrap_or_else(|| config.storage.transcripts_dir.clone());

            let processor = BatchProcessor::from_config(&config)?;
            let scan = processor.scan_directory(&dir).await?;

            info!(
                "✅ Scanned {} transcripts in {:.2}s: {} to correct, {} unchanged, {} unresolved, {} failed",
                scan.total,
                scan.total_time.as_secs_f64(),
                scan.corrected,
                scan.unchanged,
                scan.unresolved,
                scan.failed
            );

            if config.output.save_results {
                processor.save_results(&scan, &config.output.reports_dir).await?;
            }

            if apply {
                processor.apply_corrections(&scan).await.log("Transcript scan");
            }
        }

        Commands::RebuildRegistry { input, apply } => {
            let identifier = load_identifier(&config)?;
            let mut registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;
            let input = input.unwrap_or_else(|| config.storage.csv_dir.clone());

            let mut entries = Vec::new();
            for path in csv_files(&input)? {
                match read_entries(&path) {
                    Ok(rows) => entries.extend(rows),
                    Err(e) => warn!("Skipping {}: {}", path.display(), e),
                }
            }

            let (entries, duplicates) = dedup_entries(entries);
            if duplicates > 0 {
                info!("🔁 Skipped {} rows duplicated across catalogs", duplicates);
            }

            let additions = collect_registry_additions(&identifier, &registry, &entries);
            for name in &additions {
                println!("+ {}", name);
            }

            if apply && !additions.is_empty() {
                for name in &additions {
                    registry.insert(name);
                }
                registry.save(&config.storage.registry_path)?;
            }
            info!("👥 {} new speakers found in {} rows", additions.len(), entries.len());
        }

        Commands::Stats => {
            let identifier = load_identifier(&config)?;
            let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;

            println!("{}", identifier.lexicon().get_stats().summary());
            println!("Registry: {} speakers", registry.len());
            println!("{}", config.summary());
        }
    }

    Ok(())
}

fn log_filter(level: &str) -> EnvFilter {
    EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(format!("sermon_analyzer={},warn", level)))
}

fn load_identifier(config: &Config) -> Result<SpeakerIdentifier> {
    let lexicon = SpeakerLexicon::load_or_default(config.heuristics.rules_file.as_deref())?;
    Ok(SpeakerIdentifier::new(Arc::new(lexicon))?
        .with_descriptions(config.heuristics.use_descriptions))
}

/// A single CSV file, or every CSV under a directory, sorted
fn csv_files(input: &Path) -> Result<Vec<PathBuf>> {
    if input.is_file() {
        return Ok(vec![input.to_path_buf()]);
    }
    if !input.is_dir() {
        anyhow::bail!("Input not found: {}", input.display());
    }

    let mut files = Vec::new();
    for entry in WalkDir::new(input) {
        let entry = entry.with_context(|| format!("Failed to walk {}", input.display()))?;
        let is_csv = entry
            .path()
            .extension()
            .is_some_and(|ext| ext.eq_ignore_ascii_case("csv"));
        if entry.file_type().is_file() && is_csv {
            files.push(entry.into_path());
        }
    }

    files.sort();
    Ok(files)
}
