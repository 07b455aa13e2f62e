use serde::{Deserialize, Serialize};
use std::fmt;

use super::lexicon::{collapse_whitespace, is_initials, term_key, SpeakerLexicon};
use super::registry::SpeakerRegistry;

/// Returned wherever no plausible speaker could be established
pub const UNKNOWN_SPEAKER: &str = "Unknown Speaker";

/// Why a candidate is not a plausible person name
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub enum RejectReason {
    Empty,
    ContainsDigit,
    Blocklisted,
    Conjunction,
    HonorificOnly,
    NotNameShaped(String),
    SingleToken,
    TooManyTokens(usize),
    StartsWithStopWord(String),
    ContainsMonth(String),
    TopicKeyword(String),
}

impl fmt::Display for RejectReason {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        match self {
            RejectReason::Empty => write!(f, "empty"),
            RejectReason::ContainsDigit => write!(f, "contains a digit"),
            RejectReason::Blocklisted => write!(f, "blocklisted"),
            RejectReason::Conjunction => write!(f, "conjunction without valid honorific co-speakers"),
            RejectReason::HonorificOnly => write!(f, "honorific only"),
            RejectReason::NotNameShaped(token) => write!(f, "token '{}' is not name-shaped", token),
            RejectReason::SingleToken => write!(f, "single token not in registry"),
            RejectReason::TooManyTokens(n) => write!(f, "{} tokens", n),
            RejectReason::StartsWithStopWord(word) => write!(f, "starts with stop word '{}'", word),
            RejectReason::ContainsMonth(month) => write!(f, "contains month '{}'", month),
            RejectReason::TopicKeyword(word) => write!(f, "contains topic keyword '{}'", word),
        }
    }
}

/// Outcome of validating a candidate
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Verdict {
    /// Cleaned display name (honorifics and stray punctuation removed)
    Accepted(String),
    Rejected(RejectReason),
}

impl Verdict {
    pub fn is_accepted(&self) -> bool {
        matches!(self, Verdict::Accepted(_))
    }

    pub fn accepted(&self) -> Option<&str> {
        match self {
            Verdict::Accepted(name) => Some(name),
            Verdict::Rejected(_) => None,
        }
    }
}

const MIN_NAME_TOKENS: usize = 2;
const MAX_NAME_TOKENS: usize = 4;

/// Decide whether `candidate` is a plausible person name.
///
/// Rules, checked in order (the first failure is reported):
/// 1. no digits anywhere in the raw candidate
/// 2. not blocklisted (raw or honorific-stripped)
/// 3. `and`/`&` only between honorific-bearing co-speakers that each pass on their own
/// 4. 2..=4 tokens after honorific stripping; a lone token must already be in the registry verbatim
/// 5. does not start with a stop word
/// 6. no month names
/// 7. no topic keywords
pub fn validate(lexicon: &SpeakerLexicon, registry: &SpeakerRegistry, candidate: &str) -> Verdict {
    let raw = collapse_whitespace(candidate);
    if raw.is_empty() {
        return Verdict::Rejected(RejectReason::Empty);
    }

    if raw.chars().any(char::is_numeric) {
        return Verdict::Rejected(RejectReason::ContainsDigit);
    }

    if lexicon.is_blocklisted(&raw) {
        return Verdict::Rejected(RejectReason::Blocklisted);
    }

    let tokens: Vec<&str> = raw.split_whitespace().collect();
    if tokens.iter().any(|t| is_conjunction(t)) {
        return validate_co_speakers(lexicon, registry, &tokens);
    }

    validate_tokens(lexicon, registry, &tokens)
}

/// Drop honorific tokens from both ends
pub fn strip_honorifics<'a>(lexicon: &SpeakerLexicon, tokens: &[&'a str]) -> Vec<&'a str> {
    let start = tokens
        .iter()
        .position(|t| !lexicon.is_honorific(t))
        .unwrap_or(tokens.len());
    let end = tokens
        .iter()
        .rposition(|t| !lexicon.is_honorific(t))
        .map_or(start, |i| i + 1);

    if start >= end {
        Vec::new()
    } else {
        tokens[start..end].to_vec()
    }
}

fn validate_co_speakers(
    lexicon: &SpeakerLexicon,
    registry: &SpeakerRegistry,
    tokens: &[&str],
) -> Verdict {
    if !tokens.iter().any(|t| lexicon.is_honorific(t)) {
        return Verdict::Rejected(RejectReason::Conjunction);
    }

    let sides: Vec<&[&str]> = tokens.split(|t| is_conjunction(t)).collect();
    if sides.len() < 2 || sides.iter().any(|side| side.is_empty()) {
        return Verdict::Rejected(RejectReason::Conjunction);
    }

    let mut names = Vec::with_capacity(sides.len());
    for side in sides {
        match validate_tokens(lexicon, registry, side) {
            Verdict::Accepted(name) => names.push(name),
            Verdict::Rejected(_) => return Verdict::Rejected(RejectReason::Conjunction),
        }
    }

    Verdict::Accepted(names.join(" & "))
}

fn validate_tokens(lexicon: &SpeakerLexicon, registry: &SpeakerRegistry, tokens: &[&str]) -> Verdict {
    let stripped = strip_honorifics(lexicon, tokens);
    if stripped.is_empty() {
        return Verdict::Rejected(RejectReason::HonorificOnly);
    }

    let mut cleaned = Vec::with_capacity(stripped.len());
    for token in &stripped {
        match clean_token(token) {
            Some(token) => cleaned.push(token),
            None => return Verdict::Rejected(RejectReason::NotNameShaped((*token).to_string())),
        }
    }
    let name = cleaned.join(" ");

    if lexicon.is_blocklisted(&name) {
        return Verdict::Rejected(RejectReason::Blocklisted);
    }

    let count = cleaned.len();
    if count < MIN_NAME_TOKENS && !registry.contains(&name) {
        return Verdict::Rejected(RejectReason::SingleToken);
    }
    if count > MAX_NAME_TOKENS {
        return Verdict::Rejected(RejectReason::TooManyTokens(count));
    }

    if lexicon.is_stop_word(&cleaned[0]) {
        return Verdict::Rejected(RejectReason::StartsWithStopWord(term_key(&cleaned[0])));
    }

    if let Some(month) = cleaned.iter().find(|t| lexicon.is_month(t)) {
        return Verdict::Rejected(RejectReason::ContainsMonth(term_key(month)));
    }

    if let Some(topic) = cleaned.iter().find(|t| lexicon.is_topic_keyword(t)) {
        return Verdict::Rejected(RejectReason::TopicKeyword(term_key(topic)));
    }

    Verdict::Accepted(name)
}

fn is_conjunction(token: &str) -> bool {
    token == "&" || token.eq_ignore_ascii_case("and")
}

/// Strip stray punctuation; `None` when the token is not made of name characters.
/// Initials keep their periods (`J.`, `J.R.`), longer tokens lose a trailing one.
fn clean_token(token: &str) -> Option<String> {
    let trimmed = token
        .trim_start_matches(|c: char| !c.is_alphabetic())
        .trim_end_matches(|c: char| !c.is_alphabetic() && c != '.');

    if trimmed.is_empty() || !trimmed.chars().all(is_name_char) {
        return None;
    }
    if is_initials(trimmed) {
        return Some(trimmed.to_string());
    }

    let core = trimmed.trim_end_matches('.');
    if core.is_empty() || !core.starts_with(char::is_alphabetic) {
        return None;
    }

    if core.chars().count() == 1 {
        Some(format!("{}.", core))
    } else {
        Some(core.to_string())
    }
}

fn is_name_char(c: char) -> bool {
    c.is_alphabetic() || matches!(c, '\'' | '’' | '-' | '.')
}
