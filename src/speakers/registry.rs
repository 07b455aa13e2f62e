use anyhow::{anyhow, Context, Result};
use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use tracing::{debug, info};

use super::lexicon::collapse_whitespace;

/// Known speaker names, persisted as a sorted JSON array of strings
#[derive(Debug, Clone, Default)]
pub struct SpeakerRegistry {
    names: BTreeSet<String>,

    /// lower-cased name -> stored spelling (first one wins)
    folded: HashMap<String, String>,
}

impl SpeakerRegistry {
    pub fn new() -> Self {
        Self::default()
    }

    /// Build from any list of names; blanks are dropped
    pub fn from_names<I, S>(names: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let mut registry = Self::new();
        for name in names {
            registry.insert(name.as_ref());
        }
        registry
    }

    /// Load the registry file; a missing file is an error
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        if !path.exists() {
            return Err(anyhow!("Speaker registry not found: {}", path.display()));
        }

        let content = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read registry: {}", path.display()))?;
        let names: Vec<String> = serde_json::from_str(&content)
            .with_context(|| format!("Registry is not a JSON array of strings: {}", path.display()))?;

        let registry = Self::from_names(names);
        info!("👥 Loaded {} known speakers from {}", registry.len(), path.display());
        Ok(registry)
    }

    /// Load the registry if present, else start empty
    pub fn load_or_empty<P: AsRef<Path>>(path: P) -> Result<Self> {
        if path.as_ref().exists() {
            Self::load(path)
        } else {
            debug!("No registry at {}, starting empty", path.as_ref().display());
            Ok(Self::new())
        }
    }

    /// Write the registry as a sorted, pretty-printed JSON array
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let path = path.as_ref();
        if let Some(parent) = path.parent().filter(|p| !p.as_os_str().is_empty()) {
            std::fs::create_dir_all(parent)?;
        }

        let names: Vec<&String> = self.names.iter().collect();
        let json = serde_json::to_string_pretty(&names)?;
        std::fs::write(path, json)
            .with_context(|| format!("Failed to write registry: {}", path.display()))?;

        info!("💾 Saved {} speakers to {}", self.names.len(), path.display());
        Ok(())
    }

    /// Insert a name; returns false for blanks and exact duplicates
    pub fn insert(&mut self, name: &str) -> bool {
        let name = collapse_whitespace(name);
        if name.is_empty() {
            return false;
        }

        self.folded
            .entry(name.to_lowercase())
            .or_insert_with(|| name.clone());
        self.names.insert(name)
    }

    /// Remove an exact name
    pub fn remove(&mut self, name: &str) -> bool {
        let removed = self.names.remove(name);
        if removed {
            self.rebuild_folded();
        }
        removed
    }

    /// Replace `from` with `to`; returns false when `from` is absent
    pub fn rename(&mut self, from: &str, to: &str) -> bool {
        if !self.names.remove(from) {
            return false;
        }
        let to = collapse_whitespace(to);
        if !to.is_empty() {
            self.names.insert(to);
        }
        self.rebuild_folded();
        true
    }

    /// Exact (verbatim) membership
    pub fn contains(&self, name: &str) -> bool {
        self.names.contains(name)
    }

    /// Case-folded lookup returning the stored spelling
    pub fn find_case_insensitive(&self, name: &str) -> Option<&str> {
        self.folded
            .get(&collapse_whitespace(name).to_lowercase())
            .map(String::as_str)
    }

    /// Every stored name that folds to the same key as `name`
    pub fn case_variants(&self, name: &str) -> Vec<&str> {
        let key = name.to_lowercase();
        self.names
            .iter()
            .filter(|n| n.to_lowercase() == key)
            .map(String::as_str)
            .collect()
    }

    /// Names in sorted order
    pub fn iter(&self) -> impl Iterator<Item = &str> {
        self.names.iter().map(String::as_str)
    }

    /// Multi-word names, longest first; used for known-speaker matching
    pub fn multi_word_names(&self) -> Vec<&str> {
        let mut names: Vec<&str> = self
            .names
            .iter()
            .map(String::as_str)
            .filter(|n| n.split_whitespace().count() >= 2)
            .collect();
        names.sort_by(|a, b| b.len().cmp(&a.len()).then_with(|| a.cmp(b)));
        names
    }

    pub fn len(&self) -> usize {
        self.names.len()
    }

    pub fn is_empty(&self) -> bool {
        self.names.is_empty()
    }

    fn rebuild_folded(&mut self) {
        self.folded.clear();
        for name in &self.names {
            self.folded
                .entry(name.to_lowercase())
                .or_insert_with(|| name.clone());
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_lookup_modes() {
        let registry = SpeakerRegistry::from_names(["David Mayeur", "Chad Lamb"]);

        assert!(registry.contains("David Mayeur"));
        assert!(!registry.contains("david mayeur"));
        assert_eq!(
            registry.find_case_insensitive("david  MAYEUR"),
            Some("David Mayeur")
        );
        assert_eq!(registry.find_case_insensitive("Nobody"), None);
    }

    #[test]
    fn test_save_is_sorted_json_array() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("speakers.json");

        let registry = SpeakerRegistry::from_names(["Zed Last", "Amy First", "Amy First"]);
        registry.save(&path).unwrap();

        let names: Vec<String> =
            serde_json::from_str(&std::fs::read_to_string(&path).unwrap()).unwrap();
        assert_eq!(names, vec!["Amy First".to_string(), "Zed Last".to_string()]);

        let reloaded = SpeakerRegistry::load(&path).unwrap();
        assert_eq!(reloaded.len(), 2);
    }

    #[test]
    fn test_missing_registry_is_error() {
        let temp_dir = TempDir::new().unwrap();
        assert!(SpeakerRegistry::load(temp_dir.path().join("missing.json")).is_err());
        assert!(SpeakerRegistry::load_or_empty(temp_dir.path().join("missing.json"))
            .unwrap()
            .is_empty());
    }

    #[test]
    fn test_rename_and_remove() {
        let mut registry = SpeakerRegistry::from_names(["Bro. John Smith", "Jane Doe"]);

        assert!(registry.rename("Bro. John Smith", "John Smith"));
        assert!(registry.contains("John Smith"));
        assert_eq!(registry.find_case_insensitive("bro. john smith"), None);

        assert!(registry.remove("Jane Doe"));
        assert!(!registry.remove("Jane Doe"));
        assert_eq!(registry.len(), 1);
    }

    #[test]
    fn test_multi_word_names_longest_first() {
        let registry = SpeakerRegistry::from_names(["Branham", "Joe Bo", "William Marrion Branham"]);
        assert_eq!(
            registry.multi_word_names(),
            vec!["William Marrion Branham", "Joe Bo"]
        );
    }
}
