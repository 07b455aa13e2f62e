use anyhow::Result;
use sermon_analyzer::{Config, SpeakerIdentifier, SpeakerLexicon, SpeakerRegistry};
use std::io::BufRead;
use std::sync::Arc;
use tracing::{info, warn};

/// Validate and normalize names given as arguments, or one per stdin line
fn main() -> Result<()> {
    // Initialize logging
    tracing_subscriber::fmt()
        .with_env_filter("check_speaker=info,sermon_analyzer=info")
        .init();

    let config = Config::load().unwrap_or_else(|e| {
        warn!("Failed to load config, using defaults: {}", e);
        Config::default()
    });
    let lexicon = SpeakerLexicon::load_or_default(config.heuristics.rules_file.as_deref())?;
    let registry = SpeakerRegistry::load_or_empty(&config.storage.registry_path)?;

    let stats = lexicon.get_stats();
    info!("📚 {} terms, {} rules, {} known speakers", stats.total_terms, stats.total_rules, registry.len());
    let identifier = SpeakerIdentifier::new(Arc::new(lexicon))?;

    let mut names: Vec<String> = std::env::args().skip(1).collect();
    if names.is_empty() {
        for line in std::io::stdin().lock().lines() {
            let line = line?;
            if !line.trim().is_empty() {
                names.push(line);
            }
        }
    }

    for name in &names {
        let check = identifier.check_name(name, &registry);
        match (check.normalized, check.reason) {
            (Some(normalized), _) if check.rewrites.is_empty() => {
                info!("✅ {} -> {}", name, normalized);
            }
            (Some(normalized), _) => {
                info!("✅ {} -> {} (via {:?})", name, normalized, check.rewrites);
            }
            (None, reason) => {
                info!("❌ {}: {}", name, reason.unwrap_or_default());
            }
        }
    }

    Ok(())
}
