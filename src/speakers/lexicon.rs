use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::collections::{HashMap, HashSet};
use std::path::Path;
use tracing::{info, warn};

/// Word lists the speaker heuristics consult
#[derive(Debug, Clone, Copy, Serialize, Deserialize, PartialEq, Eq, Hash)]
pub enum TermCategory {
    Honorifics,
    StopWords,
    Months,
    TopicKeywords,
    BibleBooks,
    Blocklist,
}

/// Extra extraction template supplied through the rule file
#[derive(Debug, Clone, Serialize, Deserialize, PartialEq)]
pub struct PatternSpec {
    pub name: String,
    pub regex: String,
}

/// On-disk rule file. Every field is optional; a present field replaces the
/// built-in list for that category.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct LexiconFile {
    #[serde(default)]
    pub honorifics: Option<Vec<String>>,
    #[serde(default)]
    pub stop_words: Option<Vec<String>>,
    #[serde(default)]
    pub months: Option<Vec<String>>,
    #[serde(default)]
    pub topic_keywords: Option<Vec<String>>,
    #[serde(default)]
    pub bible_books: Option<Vec<String>>,
    #[serde(default)]
    pub blocklist: Option<Vec<String>>,
    #[serde(default)]
    pub normalization_rules: Option<HashMap<String, String>>,
    #[serde(default)]
    pub patterns: Option<Vec<PatternSpec>>,
}

/// Consolidated rule data for speaker identification
#[derive(Debug, Clone)]
pub struct SpeakerLexicon {
    /// Lower-cased terms per category
    terms: HashMap<TermCategory, HashSet<String>>,

    /// Variant -> canonical, keyed by `phrase_key(variant)`
    normalization_rules: HashMap<String, String>,

    /// Extra extraction templates, tried after the built-in ones
    patterns: Vec<PatternSpec>,
}

impl SpeakerLexicon {
    /// Create a lexicon with the built-in rule set
    pub fn new() -> Self {
        let mut lexicon = Self {
            terms: HashMap::new(),
            normalization_rules: HashMap::new(),
            patterns: Vec::new(),
        };

        lexicon.load_default_terms();
        lexicon
    }

    /// Create a lexicon with no terms at all
    pub fn empty() -> Self {
        Self {
            terms: HashMap::new(),
            normalization_rules: HashMap::new(),
            patterns: Vec::new(),
        }
    }

    /// Load a JSON rule file on top of the defaults
    pub fn from_file<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read rule file: {}", path.display()))?;
        let lexicon = Self::from_json(&content)
            .with_context(|| format!("Failed to parse rule file: {}", path.display()))?;
        info!("📚 Loaded speaker rules from: {}", path.display());
        Ok(lexicon)
    }

    /// Parse a rule file body
    pub fn from_json(content: &str) -> Result<Self> {
        let file: LexiconFile = serde_json::from_str(content)?;
        Ok(Self::from_rule_file(file))
    }

    /// Apply a parsed rule file over the defaults
    pub fn from_rule_file(file: LexiconFile) -> Self {
        let mut lexicon = Self::new();

        let overrides = [
            (TermCategory::Honorifics, file.honorifics),
            (TermCategory::StopWords, file.stop_words),
            (TermCategory::Months, file.months),
            (TermCategory::TopicKeywords, file.topic_keywords),
            (TermCategory::BibleBooks, file.bible_books),
            (TermCategory::Blocklist, file.blocklist),
        ];

        for (category, replacement) in overrides {
            if let Some(list) = replacement {
                lexicon.set_terms(category, list);
            }
        }

        if let Some(rules) = file.normalization_rules {
            for (variant, canonical) in rules {
                lexicon.add_rule(&variant, &canonical);
            }
        }

        if let Some(patterns) = file.patterns {
            lexicon.patterns = patterns;
        }

        lexicon
    }

    /// Load from an optional path, falling back to the defaults when the file is absent
    pub fn load_or_default(path: Option<&Path>) -> Result<Self> {
        match path {
            Some(path) if path.exists() => Self::from_file(path),
            Some(path) => {
                warn!("Rule file not found: {}, using built-in rules", path.display());
                Ok(Self::new())
            }
            None => Ok(Self::new()),
        }
    }

    /// Replace every term of a category
    pub fn set_terms<I, S>(&mut self, category: TermCategory, terms: I)
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let set = terms
            .into_iter()
            .map(|t| category_key(category, t.as_ref()))
            .filter(|t| !t.is_empty())
            .collect();
        self.terms.insert(category, set);
    }

    /// Add a normalization rule (variant -> canonical)
    pub fn add_rule(&mut self, variant: &str, canonical: &str) {
        let key = phrase_key(variant);
        if key.is_empty() || canonical.trim().is_empty() {
            return;
        }
        self.normalization_rules
            .insert(key, collapse_whitespace(canonical));
    }

    /// Add an extraction template
    pub fn add_pattern(&mut self, name: &str, regex: &str) {
        self.patterns.push(PatternSpec {
            name: name.to_string(),
            regex: regex.to_string(),
        });
    }

    /// Whether a single token belongs to a category (punctuation and case ignored).
    /// Initials (`A.`, `J.R.`) never do, so `A.` is not the stop word `a`.
    pub fn contains(&self, category: TermCategory, token: &str) -> bool {
        if is_initials(token) {
            return false;
        }
        let key = term_key(token);
        !key.is_empty()
            && self
                .terms
                .get(&category)
                .is_some_and(|set| set.contains(&key))
    }

    pub fn is_honorific(&self, token: &str) -> bool {
        self.contains(TermCategory::Honorifics, token)
    }

    pub fn is_stop_word(&self, token: &str) -> bool {
        self.contains(TermCategory::StopWords, token)
    }

    pub fn is_month(&self, token: &str) -> bool {
        self.contains(TermCategory::Months, token)
    }

    pub fn is_topic_keyword(&self, token: &str) -> bool {
        self.contains(TermCategory::TopicKeywords, token)
    }

    pub fn is_bible_book(&self, token: &str) -> bool {
        self.contains(TermCategory::BibleBooks, token)
    }

    /// Whole-phrase, case-insensitive blocklist match
    pub fn is_blocklisted(&self, phrase: &str) -> bool {
        let key = phrase_key(phrase);
        !key.is_empty()
            && self
                .terms
                .get(&TermCategory::Blocklist)
                .is_some_and(|set| set.contains(&key))
    }

    /// Token that can never belong inside a person name span
    pub fn is_name_breaker(&self, token: &str) -> bool {
        self.is_stop_word(token)
            || self.is_month(token)
            || self.is_topic_keyword(token)
            || self.is_honorific(token)
    }

    /// Canonical form for a known variant
    pub fn normalization_rule(&self, name: &str) -> Option<&str> {
        self.normalization_rules
            .get(&phrase_key(name))
            .map(String::as_str)
    }

    pub fn normalization_rules(&self) -> &HashMap<String, String> {
        &self.normalization_rules
    }

    /// Terms of a category, sorted
    pub fn get_terms(&self, category: TermCategory) -> Vec<String> {
        let mut terms: Vec<String> = self
            .terms
            .get(&category)
            .map(|set| set.iter().cloned().collect())
            .unwrap_or_default();
        terms.sort();
        terms
    }

    pub fn patterns(&self) -> &[PatternSpec] {
        &self.patterns
    }

    /// Built-in word lists
    fn load_default_terms(&mut self) {
        let honorifics = [
            "bro", "bros", "brother", "sis", "sister", "pastor", "pstr", "pst", "rev",
            "reverend", "dr", "doctor", "elder", "evangelist", "evang", "bishop", "apostle",
            "prophet", "minister", "deacon", "fr", "mr", "mrs", "ms",
        ];

        let stop_words = [
            "the", "a", "an", "in", "on", "at", "to", "for", "by", "with", "of", "from",
            "into", "unto", "upon", "about", "after", "before", "through", "and", "or",
            "but", "nor", "so", "as", "if", "is", "are", "was", "were", "be", "been", "it",
            "its", "this", "that", "these", "those", "our", "my", "your", "his", "her",
            "their", "we", "you", "he", "she", "they", "i", "me", "us", "them", "who",
            "what", "when", "where", "why", "how", "which", "there", "here", "not", "no",
            "do", "does", "did", "let", "can", "will", "shall", "must", "all", "every",
        ];

        let months = [
            "january", "february", "march", "april", "may", "june", "july", "august",
            "september", "october", "november", "december",
        ];

        // Service, calendar, ministry and topic words seen glued to names in titles
        let topic_keywords = [
            // services and events
            "service", "services", "meeting", "meetings", "message", "messages", "sermon",
            "sermons", "preaching", "teaching", "teachings", "study", "studies", "lesson",
            "lessons", "class", "school", "seminar", "conference", "convention", "camp",
            "campmeeting", "retreat", "revival", "revivals", "crusade", "rally",
            "fellowship", "gathering", "homecoming", "anniversary", "dedication",
            "ordination", "installation", "graduation", "wedding", "funeral", "memorial",
            "baptism", "baptismal", "communion", "supper", "footwashing", "prayer",
            "prayers", "praise", "worship", "choir", "song", "songs", "singing", "hymn",
            "hymns", "music", "musical", "special", "testimony", "testimonies", "devotion",
            "devotional", "devotions", "vespers", "vigil", "watchnight", "broadcast",
            "livestream", "stream", "streamed", "live", "replay", "video", "audio",
            "recording", "podcast", "episode", "series", "part", "pt", "vol", "volume",
            "session", "sessions", "chapter", "verse", "verses", "scripture", "scriptures",
            "reading", "readings", "question", "questions", "answers", "announcement",
            "announcements", "update", "introduction", "intro", "opening", "closing",
            "welcome", "offering", "tithes", "tithe", "benediction", "invocation", "altar",
            "outreach", "mission", "missions", "missionary", "report", "annual", "business",
            "program", "concert", "cantata", "drama", "pageant", "picnic", "banquet",
            "dinner", "breakfast", "potluck", "access",
            // days and times
            "sunday", "monday", "tuesday", "wednesday", "thursday", "friday", "saturday",
            "morning", "afternoon", "evening", "night", "midweek", "weekend", "week",
            "weekly", "daily", "today", "tonight", "am", "pm", "noon", "midnight", "year",
            "years", "day", "days", "eve", "season",
            // holidays
            "christmas", "easter", "thanksgiving", "pentecost", "passover", "resurrection",
            "advent", "lent", "mother's", "father's", "mothers", "fathers", "independence",
            "valentine's", "holiday", "holidays", "harvest", "jubilee",
            // groups
            "youth", "teens", "teen", "children", "childrens", "children's", "kids",
            "ladies", "women", "women's", "men", "men's", "sisters", "couples", "family",
            "families", "seniors", "singles", "congregation", "saints", "believers",
            "members", "ministry", "ministries", "team", "staff", "band", "orchestra",
            "quartet", "trio", "duet", "ensemble", "group", "guests", "guest", "visitors",
            // places
            "church", "churches", "tabernacle", "chapel", "sanctuary", "auditorium",
            "center", "centre", "campus", "building", "assembly", "online", "zoom",
            "radio",
            // theology and sermon topics
            "god", "god's", "lord", "lord's", "jesus", "christ", "christ's", "christians",
            "holy", "spirit", "ghost", "gospel", "bible", "word", "faith", "salvation",
            "redemption", "restoration", "revelation", "prophecy", "prophecies", "rapture",
            "tribulation", "millennium", "kingdom", "heaven", "heavenly", "hell", "eternal",
            "eternity", "sin", "sins", "repentance", "righteousness", "holiness",
            "sanctification", "justification", "atonement", "covenant", "blood", "calvary",
            "throne", "glory", "victory", "deliverance", "healing", "miracle", "miracles",
            "signs", "wonders", "seals", "seal", "trumpet", "trumpets", "bride",
            "bridegroom", "age", "ages", "end", "time", "times", "last", "latter", "rain",
            "fire", "water", "light", "darkness", "truth", "life", "living", "death",
            "overcomer", "overcomers", "overcoming", "overcomes", "promise", "promises",
            "blessing", "blessings", "blessed", "anointing", "anointed", "vision",
            "visions", "dream", "dreams", "wisdom", "knowledge", "understanding",
            "obedience", "sacrifice", "servant", "servants", "sheep", "seed", "seeds",
            "vine", "tree", "fruit", "fruits", "gift", "gifts", "calling", "purpose",
            "destiny", "walk", "walking", "journey", "path", "way", "door", "gate", "veil",
            "ark", "zion", "jerusalem", "babylon", "egypt", "canaan", "wilderness", "battle",
            "war", "warfare", "armor", "sword", "shield", "soldier", "soldiers", "army",
            "enemy", "satan", "devil", "demons", "spirits", "angels", "messiah", "saviour",
            "savior", "redeemer", "lion", "baptized", "born", "again", "rebirth", "unity",
            "peace", "kindness", "forgiveness", "compassion", "humility", "pride", "fear",
            "courage", "strength", "rest", "sabbath", "trust", "believe", "believing",
            "belief", "fasting", "fast", "hunger", "thirst", "thirsty", "feast", "feasts",
            "tabernacles", "leaven", "bread", "wine", "oil", "lamp", "lamps",
            "candlestick", "marriage", "husband", "wife", "wives", "husbands", "parents",
            "son", "sons", "daughter", "daughters", "home", "homes", "heart", "hearts",
            "mind", "soul", "souls", "body", "flesh", "spiritual", "natural",
            "supernatural", "divine", "perfect", "perfection", "mature", "maturity",
            "growth", "growing", "change", "changed", "changing", "new", "old", "first",
            "second", "third", "final", "great", "mighty", "true", "real", "hidden",
            "mystery", "mysteries", "secret", "secrets",
        ];

        let bible_books = [
            "genesis", "exodus", "leviticus", "numbers", "deuteronomy", "joshua", "judges",
            "ruth", "samuel", "kings", "chronicles", "ezra", "nehemiah", "esther", "job",
            "psalms", "psalm", "proverbs", "ecclesiastes", "song", "solomon", "isaiah",
            "jeremiah", "lamentations", "ezekiel", "daniel", "hosea", "joel", "amos",
            "obadiah", "jonah", "micah", "nahum", "habakkuk", "zephaniah", "haggai",
            "zechariah", "malachi", "matthew", "mark", "luke", "john", "acts", "romans",
            "corinthians", "galatians", "ephesians", "philippians", "colossians",
            "thessalonians", "timothy", "titus", "philemon", "hebrews", "james", "peter",
            "jude", "revelation", "revelations",
        ];

        let blocklist = [
            "unknown speaker", "unknown", "various speakers", "various", "guest speaker",
            "guest minister", "multiple speakers", "speaker", "church", "the church",
            "sunday school", "live stream", "youtube", "special music", "song service",
            "n/a", "na", "none", "tbd", "tba",
        ];

        self.set_terms(TermCategory::Honorifics, honorifics);
        self.set_terms(TermCategory::StopWords, stop_words);
        self.set_terms(TermCategory::Months, months);
        self.set_terms(TermCategory::TopicKeywords, topic_keywords);
        self.set_terms(TermCategory::BibleBooks, bible_books);
        self.set_terms(TermCategory::Blocklist, blocklist);
    }

    /// Get statistics about the lexicon
    pub fn get_stats(&self) -> LexiconStats {
        let category_counts: HashMap<TermCategory, usize> = self
            .terms
            .iter()
            .map(|(k, v)| (*k, v.len()))
            .collect();

        LexiconStats {
            total_terms: category_counts.values().sum(),
            total_rules: self.normalization_rules.len(),
            total_patterns: self.patterns.len(),
            category_counts,
        }
    }
}

impl Default for SpeakerLexicon {
    fn default() -> Self {
        Self::new()
    }
}

/// Statistics about the lexicon
#[derive(Debug, Clone)]
pub struct LexiconStats {
    pub total_terms: usize,
    pub total_rules: usize,
    pub total_patterns: usize,
    pub category_counts: HashMap<TermCategory, usize>,
}

impl LexiconStats {
    /// Generate a summary string
    pub fn summary(&self) -> String {
        let mut categories: Vec<String> = self
            .category_counts
            .iter()
            .map(|(k, v)| format!("{:?}={}", k, v))
            .collect();
        categories.sort();

        format!(
            "Speaker Lexicon Stats:\n\
            - Total terms: {}\n\
            - Normalization rules: {}\n\
            - Extra patterns: {}\n\
            - Categories: {}",
            self.total_terms,
            self.total_rules,
            self.total_patterns,
            categories.join(", ")
        )
    }
}

/// Lookup key for a single token: outer punctuation stripped, lower-cased
pub fn term_key(token: &str) -> String {
    token
        .trim_matches(|c: char| !c.is_alphanumeric())
        .to_lowercase()
}

/// One or more `letter.` pairs, e.g. `A.` or `J.R.`; surrounding punctuation ignored
pub fn is_initials(token: &str) -> bool {
    let chars: Vec<char> = token
        .trim_matches(|c: char| !c.is_alphanumeric() && c != '.')
        .chars()
        .collect();
    !chars.is_empty()
        && chars.len() % 2 == 0
        && chars.chunks(2).all(|pair| pair[0].is_alphabetic() && pair[1] == '.')
}

/// Lookup key for a phrase: lower-cased, whitespace collapsed
pub fn phrase_key(phrase: &str) -> String {
    phrase
        .split_whitespace()
        .collect::<Vec<_>>()
        .join(" ")
        .to_lowercase()
}

fn category_key(category: TermCategory, term: &str) -> String {
    match category {
        TermCategory::Blocklist => phrase_key(term),
        _ => term_key(term),
    }
}

pub(crate) fn collapse_whitespace(text: &str) -> String {
    text.split_whitespace().collect::<Vec<_>>().join(" ")
}
