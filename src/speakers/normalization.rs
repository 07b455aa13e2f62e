use serde::{Deserialize, Serialize};
use tracing::debug;

use super::lexicon::{collapse_whitespace, SpeakerLexicon};
use super::registry::SpeakerRegistry;

/// Which rewrite produced a normalization step
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NormalizationSource {
    /// variant -> canonical mapping from the rule set
    Rule,
    /// `<known name> <topic/month/book words>` collapsed to the known name
    PrefixCollapse,
}

/// Apply one rewrite: rule lookup first, then prefix-contamination collapse.
/// `None` when the name is already in normal form for this snapshot.
pub fn normalize_step(
    lexicon: &SpeakerLexicon,
    registry: &SpeakerRegistry,
    name: &str,
) -> Option<(String, NormalizationSource)> {
    let name = collapse_whitespace(name);

    if let Some(canonical) = lexicon.normalization_rule(&name) {
        if canonical != name {
            return Some((canonical.to_string(), NormalizationSource::Rule));
        }
        return None;
    }

    collapse_prefix_contamination(lexicon, registry, &name)
        .filter(|base| *base != name)
        .map(|base| (base, NormalizationSource::PrefixCollapse))
}

/// Rewrite to a fixed point. A rule cycle resolves to its lexicographically
/// smallest member, so the result is stable under re-application.
pub fn normalize(lexicon: &SpeakerLexicon, registry: &SpeakerRegistry, name: &str) -> String {
    normalize_with_trace(lexicon, registry, name).0
}

/// `normalize`, also reporting every rewrite applied
pub fn normalize_with_trace(
    lexicon: &SpeakerLexicon,
    registry: &SpeakerRegistry,
    name: &str,
) -> (String, Vec<NormalizationSource>) {
    let mut seen = vec![collapse_whitespace(name)];
    let mut trace = Vec::new();

    // each step yields an unseen rule target or registry spelling, so this ends
    loop {
        let current = &seen[seen.len() - 1];
        let Some((next, source)) = normalize_step(lexicon, registry, current) else {
            break;
        };

        if let Some(pos) = seen.iter().position(|s| *s == next) {
            debug!("Normalization cycle detected at '{}'", next);
            let smallest = seen[pos..].iter().min().cloned().unwrap_or(next);
            return (smallest, trace);
        }

        trace.push(source);
        seen.push(next);
    }

    let result = seen.pop().unwrap_or_default();
    (result, trace)
}

/// `<base> <extra...>` -> registry spelling of `<base>`, for 3- then 2-token
/// bases, when every extra token is contamination-like
fn collapse_prefix_contamination(
    lexicon: &SpeakerLexicon,
    registry: &SpeakerRegistry,
    name: &str,
) -> Option<String> {
    let tokens: Vec<&str> = name.split_whitespace().collect();

    for base_len in [3usize, 2] {
        if tokens.len() <= base_len {
            continue;
        }

        let base = tokens[..base_len].join(" ");
        let Some(known) = registry.find_case_insensitive(&base) else {
            continue;
        };

        if tokens[base_len..]
            .iter()
            .all(|t| is_contamination_token(lexicon, t))
        {
            return Some(known.to_string());
        }
    }

    None
}

fn is_contamination_token(lexicon: &SpeakerLexicon, token: &str) -> bool {
    token.chars().all(|c| !c.is_alphabetic())
        || lexicon.is_topic_keyword(token)
        || lexicon.is_month(token)
        || lexicon.is_bible_book(token)
        || lexicon.is_stop_word(token)
}
