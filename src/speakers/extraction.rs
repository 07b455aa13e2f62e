use anyhow::{Context, Result};
use regex::Regex;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::sync::Arc;
use tracing::{debug, warn};

use super::lexicon::{SpeakerLexicon, TermCategory};
use super::registry::SpeakerRegistry;

/// One capitalized name token, or a run of initials (`J.R.`)
const NAME_TOKEN: &str = r"(?:(?:\p{Lu}\.)+|\p{Lu}[\p{L}'’\-]*\.?)";

/// Separators between a name and a sermon title
const SEPARATOR: &str = r"[-–—|:]";

/// Matches nothing; stands in for an empty honorific list
const NEVER: &str = r"[^\s\S]";

/// Extraction templates in priority order
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum TemplateKind {
    /// A multi-word registry name found verbatim (case-insensitive)
    KnownSpeaker,
    /// `Bro. First Last`
    HonorificName,
    /// `First Last - Title`
    NameDashTitle,
    /// `Title by First Last`
    ByName,
    /// `First Last, First Last`
    CoSpeakers,
    /// `Title - First Last`
    TitleDashName,
    /// Pattern supplied by the rule file
    Custom,
}

/// Substring proposed as a possible speaker name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Candidate {
    pub text: String,
    pub template: TemplateKind,
    /// True when found in the description rather than the title
    pub from_description: bool,
}

/// Compiled extraction templates for one lexicon snapshot
#[derive(Debug, Clone)]
pub struct CandidateExtractor {
    lexicon: Arc<SpeakerLexicon>,
    honorific_name: Option<Regex>,
    name_dash_title: Regex,
    by_name: Regex,
    co_speakers: Regex,
    title_dash_name: Regex,
    custom: Vec<(String, Regex)>,
}

impl CandidateExtractor {
    pub fn new(lexicon: Arc<SpeakerLexicon>) -> Result<Self> {
        // one to four name tokens; digits end the span
        let name = format!(r"{NAME_TOKEN}(?:[ \t]+{NAME_TOKEN}){{0,3}}");
        let honorifics = lexicon.get_terms(TermCategory::Honorifics);
        let hon = honorific_pattern(&honorifics);
        let prefix = format!(r"(?:{hon}[ \t]+)*");

        let honorific_name = if honorifics.is_empty() {
            None
        } else {
            Some(compile(&format!(r"(?:{hon}[ \t]+)+({name})"))?)
        };
        let name_dash_title = compile(&format!(r"^[ \t]*{prefix}({name})[ \t]*{SEPARATOR}"))?;
        let by_name = compile(&format!(r"(?i:\bby)[ \t]+{prefix}({name})"))?;
        let co_speakers = compile(&format!(r"{prefix}({name})[ \t]*,[ \t]*{prefix}({name})"))?;
        let title_dash_name = compile(&format!(r"{SEPARATOR}[ \t]*{prefix}({name})[ \t]*$"))?;

        let mut custom = Vec::new();
        for spec in lexicon.patterns() {
            match Regex::new(&spec.regex) {
                Ok(re) => custom.push((spec.name.clone(), re)),
                Err(e) => warn!("Skipping invalid pattern '{}': {}", spec.name, e),
            }
        }

        Ok(Self {
            lexicon,
            honorific_name,
            name_dash_title,
            by_name,
            co_speakers,
            title_dash_name,
            custom,
        })
    }

    /// Candidates from the title, then from the description, deduplicated
    /// case-insensitively with the first occurrence kept
    pub fn extract(
        &self,
        title: &str,
        description: Option<&str>,
        registry: &SpeakerRegistry,
    ) -> Vec<Candidate> {
        let mut candidates = self.extract_from(title, registry, false);
        if let Some(description) = description.filter(|d| !d.trim().is_empty()) {
            candidates.extend(self.extract_from(description, registry, true));
        }

        let mut seen = HashSet::new();
        candidates.retain(|c| seen.insert(c.text.to_lowercase()));

        debug!("Extracted {} candidates from '{}'", candidates.len(), title);
        candidates
    }

    /// Every template once over `text`, in priority order
    fn extract_from(
        &self,
        text: &str,
        registry: &SpeakerRegistry,
        from_description: bool,
    ) -> Vec<Candidate> {
        let mut spans: Vec<(String, TemplateKind)> = Vec::new();

        if let Some(known) = find_known_speaker(text, registry) {
            spans.push((known.to_string(), TemplateKind::KnownSpeaker));
        }

        if let Some(re) = &self.honorific_name {
            if let Some(span) = first_group(re, text, 1) {
                spans.push((span, TemplateKind::HonorificName));
            }
        }

        if let Some(span) = first_group(&self.name_dash_title, text, 1) {
            spans.push((span, TemplateKind::NameDashTitle));
        }

        if let Some(span) = first_group(&self.by_name, text, 1) {
            spans.push((span, TemplateKind::ByName));
        }

        if let Some(captures) = self.co_speakers.captures(text) {
            for group in [1, 2] {
                if let Some(m) = captures.get(group) {
                    spans.push((m.as_str().to_string(), TemplateKind::CoSpeakers));
                }
            }
        }

        if let Some(span) = first_group(&self.title_dash_name, text, 1) {
            spans.push((span, TemplateKind::TitleDashName));
        }

        for (name, re) in &self.custom {
            if let Some(captures) = re.captures(text) {
                if let Some(m) = captures.get(1).or_else(|| captures.get(0)) {
                    debug!("Custom pattern '{}' matched '{}'", name, m.as_str());
                    spans.push((m.as_str().to_string(), TemplateKind::Custom));
                }
            }
        }

        spans
            .into_iter()
            .filter_map(|(span, template)| {
                let text = if template == TemplateKind::KnownSpeaker {
                    Some(span)
                } else {
                    self.trim_span(&span)
                };
                text.map(|text| Candidate {
                    text,
                    template,
                    from_description,
                })
            })
            .collect()
    }

    /// Cut a raw span at the first word that cannot be part of a name
    /// (stop word, month, topic keyword, honorific), after skipping leading honorifics
    pub fn trim_span(&self, span: &str) -> Option<String> {
        let kept: Vec<&str> = span
            .split_whitespace()
            .skip_while(|t| self.lexicon.is_honorific(t))
            .take_while(|t| !self.lexicon.is_name_breaker(t))
            .collect();

        if kept.is_empty() {
            None
        } else {
            Some(kept.join(" "))
        }
    }
}

fn compile(pattern: &str) -> Result<Regex> {
    Regex::new(pattern).with_context(|| format!("Invalid extraction template: {}", pattern))
}

/// Case-insensitive alternation of honorific tokens, longest first, optional trailing period
fn honorific_pattern(honorifics: &[String]) -> String {
    if honorifics.is_empty() {
        return NEVER.to_string();
    }

    let mut sorted: Vec<&String> = honorifics.iter().collect();
    sorted.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
    let alternation = sorted
        .iter()
        .map(|h| regex::escape(h))
        .collect::<Vec<_>>()
        .join("|");

    format!(r"(?i:\b(?:{alternation})\b)\.?")
}

fn first_group(re: &Regex, text: &str, group: usize) -> Option<String> {
    re.captures(text)
        .and_then(|c| c.get(group))
        .map(|m| m.as_str().to_string())
}

/// Longest multi-word registry name occurring in `text` on word boundaries
fn find_known_speaker<'r>(text: &str, registry: &'r SpeakerRegistry) -> Option<&'r str> {
    let haystack = text.to_lowercase();

    registry.multi_word_names().into_iter().find(|name| {
        let needle = name.to_lowercase();
        haystack.match_indices(&needle).any(|(start, _)| {
            let before = haystack[..start].chars().next_back();
            let after = haystack[start + needle.len()..].chars().next();
            !before.is_some_and(char::is_alphanumeric) && !after.is_some_and(char::is_alphanumeric)
        })
    })
}
