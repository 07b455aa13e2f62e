use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;
use std::fmt;
use std::path::Path;
use tracing::{debug, info};

use crate::catalog::SermonEntry;
use crate::speakers::{validate, SpeakerIdentifier, SpeakerRegistry, Verdict, UNKNOWN_SPEAKER};

/// Kind of problem found in stored speaker data
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditIssue {
    /// Fails validation outright
    Invalid,
    /// Honorific or punctuation cleanup changes the name
    Rename,
    /// Normalization maps the name to another spelling
    Normalize,
    /// Another entry differs only by letter case
    CaseDuplicate,
    /// Missing or invalid speaker re-identified from the title/description
    Reidentify,
}

impl fmt::Display for AuditIssue {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{:?}", self)
    }
}

/// One row of a report CSV
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuditFinding {
    /// What was checked: `registry` or `<file>:<line>`
    pub subject: String,
    pub issue: AuditIssue,
    pub current: String,
    pub suggestion: Option<String>,
    pub detail: String,
}

/// Counts for one batch run
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct RunSummary {
    pub fixed: usize,
    pub unchanged: usize,
    pub skipped: usize,
    pub errors: usize,
}

impl RunSummary {
    pub fn merge(&mut self, other: &RunSummary) {
        self.fixed += other.fixed;
        self.unchanged += other.unchanged;
        self.skipped += other.skipped;
        self.errors += other.errors;
    }

    pub fn log(&self, label: &str) {
        info!(
            "📊 {}: {} fixed, {} unchanged, {} skipped, {} errors",
            label, self.fixed, self.unchanged, self.skipped, self.errors
        );
    }
}

/// At most one finding per registry entry, in registry order
pub fn audit_registry(identifier: &SpeakerIdentifier, registry: &SpeakerRegistry) -> Vec<AuditFinding> {
    let lexicon = identifier.lexicon();
    let mut findings = Vec::new();

    for name in registry.iter() {
        // a lone token is exempt from the token count here, as in `validate`,
        // but still checked against the word lists
        let finding = match validate(lexicon, registry, name) {
            Verdict::Rejected(reason) => Some((AuditIssue::Invalid, None, reason.to_string())),
            Verdict::Accepted(cleaned) => {
                let target = identifier.normalize(&cleaned, registry);
                if cleaned != name {
                    Some((AuditIssue::Rename, Some(target), format!("cleaned to '{}'", cleaned)))
                } else if target != name {
                    Some((AuditIssue::Normalize, Some(target), "normalization rule or prefix collapse".to_string()))
                } else {
                    case_duplicate_of(registry, name).map(|first| {
                        (
                            AuditIssue::CaseDuplicate,
                            Some(first.to_string()),
                            format!("same as '{}' ignoring case", first),
                        )
                    })
                }
            }
        };

        if let Some((issue, suggestion, detail)) = finding {
            debug!("Registry entry '{}': {}", name, issue);
            findings.push(AuditFinding {
                subject: "registry".to_string(),
                issue,
                current: name.to_string(),
                suggestion,
                detail,
            });
        }
    }

    findings
}

/// First stored spelling sharing `name`'s case fold, when it is not `name` itself
fn case_duplicate_of<'r>(registry: &'r SpeakerRegistry, name: &str) -> Option<&'r str> {
    registry
        .case_variants(name)
        .into_iter()
        .next()
        .filter(|first| *first != name)
}

/// Apply registry findings in place
pub fn apply_registry_fixes(registry: &mut SpeakerRegistry, findings: &[AuditFinding]) -> RunSummary {
    let total = registry.len();
    let mut summary = RunSummary::default();

    for finding in findings {
        let applied = match (finding.issue, finding.suggestion.as_deref()) {
            (AuditIssue::Invalid | AuditIssue::CaseDuplicate, _) => registry.remove(&finding.current),
            (AuditIssue::Rename | AuditIssue::Normalize, Some(target)) => {
                registry.rename(&finding.current, target)
            }
            _ => false,
        };

        if applied {
            info!("🔧 {} '{}' -> {}", finding.issue, finding.current, finding.suggestion.as_deref().unwrap_or("removed"));
            summary.fixed += 1;
        } else {
            summary.skipped += 1;
        }
    }

    summary.unchanged = total.saturating_sub(summary.fixed + summary.skipped);
    summary
}

/// Proposed speaker change for one catalog row
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Correction {
    /// Zero-based row index (header excluded)
    pub row: usize,
    pub title: String,
    pub previous: String,
    pub corrected: String,
    pub issue: AuditIssue,
}

impl Correction {
    /// Report row; `source` is the CSV name, line numbers count the header
    pub fn to_finding(&self, source: &str) -> AuditFinding {
        AuditFinding {
            subject: format!("{}:{}", source, self.row + 2),
            issue: self.issue,
            current: self.previous.clone(),
            suggestion: Some(self.corrected.clone()),
            detail: self.title.clone(),
        }
    }
}

/// Re-derive each row's speaker: missing, unknown or invalid speakers are
/// re-identified from title and description, valid ones are normalized
pub fn reconcile_catalog(
    identifier: &SpeakerIdentifier,
    registry: &SpeakerRegistry,
    entries: &[SermonEntry],
) -> (Vec<Correction>, RunSummary) {
    let mut corrections = Vec::new();
    let mut summary = RunSummary::default();

    for (row, entry) in entries.iter().enumerate() {
        let current = entry.speaker.trim();

        if entry.title.trim().is_empty() && current.is_empty() {
            summary.skipped += 1;
            continue;
        }

        let cleaned = if current == UNKNOWN_SPEAKER {
            None
        } else {
            identifier.clean_speaker(current, registry)
        };

        let (corrected, issue) = match cleaned {
            Some(name) => (name, AuditIssue::Normalize),
            None => {
                let description = Some(entry.description.as_str()).filter(|d| !d.trim().is_empty());
                let found = identifier.identify(&entry.title, description, registry);
                (found.speaker, AuditIssue::Reidentify)
            }
        };

        if corrected == entry.speaker {
            summary.unchanged += 1;
            continue;
        }

        debug!("Row {}: '{}' -> '{}'", row, entry.speaker, corrected);
        corrections.push(Correction {
            row,
            title: entry.title.clone(),
            previous: entry.speaker.clone(),
            corrected,
            issue,
        });
        summary.fixed += 1;
    }

    (corrections, summary)
}

/// Write corrected speakers back into the rows and stamp them
pub fn apply_corrections(entries: &mut [SermonEntry], corrections: &[Correction]) -> usize {
    let mut applied = 0;
    for correction in corrections {
        if let Some(entry) = entries.get_mut(correction.row) {
            entry.speaker = correction.corrected.clone();
            entry.touch();
            applied += 1;
        }
    }
    applied
}

/// Validated catalog speakers the registry does not know (case-insensitively),
/// co-speakers split into individual names
pub fn collect_registry_additions<'a, I>(
    identifier: &SpeakerIdentifier,
    registry: &SpeakerRegistry,
    entries: I,
) -> Vec<String>
where
    I: IntoIterator<Item = &'a SermonEntry>,
{
    let mut additions = BTreeSet::new();

    for entry in entries {
        let Some(cleaned) = identifier.clean_speaker(entry.speaker.trim(), registry) else {
            continue;
        };

        for name in cleaned.split(" & ") {
            if registry.find_case_insensitive(name).is_none() {
                additions.insert(name.to_string());
            }
        }
    }

    // keep the first spelling when catalogs disagree on case
    let mut seen = BTreeSet::new();
    additions
        .into_iter()
        .filter(|name| seen.insert(name.to_lowercase()))
        .collect()
}

/// Write findings as `subject,issue,current,suggestion,detail`
pub fn write_report<P: AsRef<Path>>(path: P, findings: &[AuditFinding]) -> Result<()> {
    let path = path.as_ref();
    if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
        std::fs::create_dir_all(parent)?;
    }

    let mut writer = csv::Writer::from_path(path)
        .with_context(|| format!("Failed to create report: {}", path.display()))?;
    if findings.is_empty() {
        writer.write_record(["subject", "issue", "current", "suggestion", "detail"])?;
    }
    for finding in findings {
        writer.serialize(finding)?;
    }
    writer.flush()?;

    info!("📝 Wrote {} findings to {}", findings.len(), path.display());
    Ok(())
}
