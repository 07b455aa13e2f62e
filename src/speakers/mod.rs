/// Speaker identification for sermon titles and descriptions
///
/// Candidates are proposed by ordered regex templates, filtered by a fixed
/// rule set, and collapsed to a canonical spelling. Anything that cannot be
/// established resolves to [`UNKNOWN_SPEAKER`].

pub mod extraction;
pub mod lexicon;
pub mod normalization;
pub mod registry;
pub mod validation;

pub use extraction::{Candidate, CandidateExtractor, TemplateKind};
pub use lexicon::{LexiconFile, LexiconStats, PatternSpec, SpeakerLexicon, TermCategory};
pub use normalization::{normalize, normalize_with_trace, NormalizationSource};
pub use registry::SpeakerRegistry;
pub use validation::{validate, RejectReason, Verdict, UNKNOWN_SPEAKER};

use anyhow::Result;
use serde::{Deserialize, Serialize};
use std::sync::Arc;
use tracing::debug;

/// Result of identifying the speaker of one sermon
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SpeakerMatch {
    /// Normalized speaker, or the unknown sentinel
    pub speaker: String,
    /// Candidate that produced `speaker`
    pub candidate: Option<Candidate>,
    /// Candidates that failed validation, with the reason
    pub rejected: Vec<(String, RejectReason)>,
}

impl SpeakerMatch {
    pub fn unknown(rejected: Vec<(String, RejectReason)>) -> Self {
        Self {
            speaker: UNKNOWN_SPEAKER.to_string(),
            candidate: None,
            rejected,
        }
    }

    pub fn is_unknown(&self) -> bool {
        self.candidate.is_none()
    }
}

/// Validation and normalization of a single name, as shown by `check-speaker`
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct NameCheck {
    pub input: String,
    pub valid: bool,
    pub cleaned: Option<String>,
    pub normalized: Option<String>,
    /// Rewrites that produced `normalized`
    pub rewrites: Vec<NormalizationSource>,
    pub reason: Option<String>,
}

/// Extract, validate and normalize in one pass
#[derive(Debug, Clone)]
pub struct SpeakerIdentifier {
    lexicon: Arc<SpeakerLexicon>,
    extractor: CandidateExtractor,
    use_descriptions: bool,
}

impl SpeakerIdentifier {
    pub fn new(lexicon: Arc<SpeakerLexicon>) -> Result<Self> {
        let extractor = CandidateExtractor::new(Arc::clone(&lexicon))?;
        Ok(Self {
            lexicon,
            extractor,
            use_descriptions: true,
        })
    }

    /// Whether descriptions are searched after the title
    pub fn with_descriptions(mut self, enable: bool) -> Self {
        self.use_descriptions = enable;
        self
    }

    /// Identifier over the built-in lexicon
    pub fn with_defaults() -> Result<Self> {
        Self::new(Arc::new(SpeakerLexicon::new()))
    }

    pub fn lexicon(&self) -> &SpeakerLexicon {
        &self.lexicon
    }

    /// First candidate (title before description, template order) that
    /// validates, normalized; the sentinel when none does
    pub fn identify(
        &self,
        title: &str,
        description: Option<&str>,
        registry: &SpeakerRegistry,
    ) -> SpeakerMatch {
        let mut rejected = Vec::new();
        let description = description.filter(|_| self.use_descriptions);

        for candidate in self.extractor.extract(title, description, registry) {
            match validate(&self.lexicon, registry, &candidate.text) {
                Verdict::Accepted(name) => {
                    let speaker = normalize(&self.lexicon, registry, &name);
                    debug!(
                        "Identified '{}' via {:?} in '{}'",
                        speaker, candidate.template, title
                    );
                    return SpeakerMatch {
                        speaker,
                        candidate: Some(candidate),
                        rejected,
                    };
                }
                Verdict::Rejected(reason) => {
                    debug!("Rejected candidate '{}': {}", candidate.text, reason);
                    rejected.push((candidate.text, reason));
                }
            }
        }

        SpeakerMatch::unknown(rejected)
    }

    /// Validate an existing speaker value and return its normalized form.
    /// Stored co-speakers (`A & B`) need no honorific only when every side is
    /// already registered; otherwise the usual conjunction rule applies.
    pub fn clean_speaker(&self, name: &str, registry: &SpeakerRegistry) -> Option<String> {
        if !name.contains(" & ") {
            return self.clean_single(name, registry);
        }

        let registered = name
            .split(" & ")
            .all(|side| registry.find_case_insensitive(side.trim()).is_some());
        if !registered {
            let joined = validate(&self.lexicon, registry, name);
            return joined.accepted().map(|joined| self.normalize_sides(joined, registry));
        }

        let sides: Option<Vec<String>> = name
            .split(" & ")
            .map(|side| self.clean_single(side, registry))
            .collect();
        sides.map(|sides| sides.join(" & "))
    }

    fn normalize_sides(&self, joined: &str, registry: &SpeakerRegistry) -> String {
        joined
            .split(" & ")
            .map(|side| normalize(&self.lexicon, registry, side))
            .collect::<Vec<_>>()
            .join(" & ")
    }

    /// A rejected value gets one more chance after normalization, so
    /// `Chad Lamb Access` collapses to a registered `Chad Lamb`
    fn clean_single(&self, name: &str, registry: &SpeakerRegistry) -> Option<String> {
        if let Verdict::Accepted(cleaned) = validate(&self.lexicon, registry, name) {
            return Some(normalize(&self.lexicon, registry, &cleaned));
        }

        let normalized = normalize(&self.lexicon, registry, name);
        if normalized == name.trim() {
            return None;
        }
        validate(&self.lexicon, registry, &normalized)
            .accepted()
            .map(|cleaned| normalize(&self.lexicon, registry, cleaned))
    }

    pub fn normalize(&self, name: &str, registry: &SpeakerRegistry) -> String {
        normalize(&self.lexicon, registry, name)
    }

    pub fn check_name(&self, name: &str, registry: &SpeakerRegistry) -> NameCheck {
        match validate(&self.lexicon, registry, name) {
            Verdict::Accepted(cleaned) => {
                let (normalized, rewrites) = normalize_with_trace(&self.lexicon, registry, &cleaned);
                NameCheck {
                    input: name.to_string(),
                    valid: true,
                    cleaned: Some(cleaned),
                    normalized: Some(normalized),
                    rewrites,
                    reason: None,
                }
            }
            Verdict::Rejected(reason) => NameCheck {
                input: name.to_string(),
                valid: false,
                cleaned: None,
                normalized: None,
                rewrites: Vec::new(),
                reason: Some(reason.to_string()),
            },
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn identifier() -> SpeakerIdentifier {
        SpeakerIdentifier::with_defaults().unwrap()
    }

    #[test]
    fn test_identify_title_examples() {
        let id = identifier();
        let registry = SpeakerRegistry::new();

        let m = id.identify("Bro David Mayeur — Sunday Morning Service", None, &registry);
        assert_eq!(m.speaker, "David Mayeur");
        assert!(!m.is_unknown());

        let m = id.identify("2025 Annual Meeting Bro. Darrell Ward 71925", None, &registry);
        assert_eq!(m.speaker, "Darrell Ward");
    }

    #[test]
    fn test_identify_normalizes_against_registry() {
        let registry = SpeakerRegistry::from_names(["Chad Lamb"]);
        let m = identifier().identify("Bro. Chad Lamb Access Granted", None, &registry);
        assert_eq!(m.speaker, "Chad Lamb");
    }

    #[test]
    fn test_identify_unknown_keeps_rejections() {
        let id = identifier();

        let m = id.identify("Word And Spirit - Faith Hope", None, &SpeakerRegistry::new());
        assert!(m.is_unknown());
        assert_eq!(m.speaker, UNKNOWN_SPEAKER);

        let m = id.identify("Bro. Branham", None, &SpeakerRegistry::new());
        assert!(m.is_unknown());
        assert_eq!(m.rejected, vec![("Branham".to_string(), RejectReason::SingleToken)]);

        let known = SpeakerRegistry::from_names(["Branham"]);
        assert_eq!(id.identify("Bro. Branham", None, &known).speaker, "Branham");
    }

    #[test]
    fn test_identify_falls_back_to_description() {
        let m = identifier().identify(
            "Sunday Evening Service",
            Some("Preached by Pastor Ray Jones"),
            &SpeakerRegistry::new(),
        );
        assert_eq!(m.speaker, "Ray Jones");
        assert!(m.candidate.map(|c| c.from_description).unwrap_or(false));

        let title_only = identifier().with_descriptions(false).identify(
            "Sunday Evening Service",
            Some("Preached by Pastor Ray Jones"),
            &SpeakerRegistry::new(),
        );
        assert!(title_only.is_unknown());
    }

    #[test]
    fn test_clean_speaker_co_speakers() {
        let id = identifier();
        let registry = SpeakerRegistry::new();

        // unregistered sides without an honorific fall under the conjunction rule
        assert_eq!(id.clean_speaker("Rock Solid & Still Standing", &registry), None);
        assert_eq!(id.clean_speaker("John Smith & Jane Doe", &registry), None);
        assert_eq!(
            id.clean_speaker("Bro. John Smith & Sis. Jane Doe", &registry).as_deref(),
            Some("John Smith & Jane Doe")
        );

        let known = SpeakerRegistry::from_names(["John Smith", "Jane Doe"]);
        assert_eq!(
            id.clean_speaker("John Smith & Jane Doe", &known).as_deref(),
            Some("John Smith & Jane Doe")
        );
        assert_eq!(id.clean_speaker("John Smith & Revival", &known), None);
    }

    #[test]
    fn test_clean_speaker_single_values() {
        let id = identifier();
        let registry = SpeakerRegistry::new();

        let known = SpeakerRegistry::from_names(["Chad Lamb"]);
        assert_eq!(
            id.clean_speaker("Chad Lamb Access", &known).as_deref(),
            Some("Chad Lamb")
        );
        assert_eq!(id.clean_speaker("Chad Lamb Access", &registry), None);
        assert_eq!(
            id.clean_speaker("Bro. Darrell Ward", &registry).as_deref(),
            Some("Darrell Ward")
        );
    }

    #[test]
    fn test_identify_titles_with_initials() {
        let id = identifier();
        let registry = SpeakerRegistry::new();

        assert_eq!(id.identify("Bro. A. Smith - Faith", None, &registry).speaker, "A. Smith");
        assert_eq!(id.identify("Pastor I. Jones", None, &registry).speaker, "I. Jones");
        assert_eq!(id.identify("Bro. J.R. Smith - Faith", None, &registry).speaker, "J.R. Smith");
    }

    #[test]
    fn test_check_name() {
        let id = identifier();
        let registry = SpeakerRegistry::new();

        let ok = id.check_name("Bro. Darrell Ward", &registry);
        assert!(ok.valid);
        assert_eq!(ok.cleaned.as_deref(), Some("Darrell Ward"));
        assert!(ok.rewrites.is_empty());

        let mut lexicon = SpeakerLexicon::new();
        lexicon.add_rule("Dave Mayeur", "David Mayeur");
        let with_rule = SpeakerIdentifier::new(Arc::new(lexicon)).unwrap();
        let renamed = with_rule.check_name("Bro. Dave Mayeur", &registry);
        assert_eq!(renamed.normalized.as_deref(), Some("David Mayeur"));
        assert_eq!(renamed.rewrites, vec![NormalizationSource::Rule]);

        let bad = id.check_name("Word And Spirit", &registry);
        assert!(!bad.valid);
        assert!(bad.reason.is_some());
    }
}
