use anyhow::{anyhow, Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

/// Configuration for the sermon analyzer
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    /// Where catalog data lives
    pub storage: StorageConfig,

    /// Speaker heuristic settings
    pub heuristics: HeuristicsConfig,

    /// Performance and resource settings
    pub performance: PerformanceConfig,

    /// Output and logging settings
    pub output: OutputConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct StorageConfig {
    /// Speaker registry (JSON array of names)
    pub registry_path: PathBuf,

    /// Directory of per-sermon transcript files
    pub transcripts_dir: PathBuf,

    /// Directory of per-church CSV files
    pub csv_dir: PathBuf,

    /// Transcript file extensions
    pub transcript_extensions: Vec<String>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct HeuristicsConfig {
    /// JSON rule file overriding the built-in word lists
    pub rules_file: Option<PathBuf>,

    /// Fall back to the description when the title yields no speaker
    pub use_descriptions: bool,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct PerformanceConfig {
    /// Maximum number of concurrent workers
    pub max_workers: usize,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for report CSVs and scan results
    pub reports_dir: PathBuf,

    /// Log level
    pub log_level: String,

    /// Save per-file scan results as JSON
    pub save_results: bool,
}

const LOG_LEVELS: [&str; 5] = ["trace", "debug", "info", "warn", "error"];

impl Config {
    /// Load configuration from the first readable config file, then apply
    /// environment overrides
    pub fn load() -> Result<Self> {
        let config_paths = ["sermon-analyzer.toml", "config/sermon-analyzer.toml"];

        for path in &config_paths {
            if let Ok(config_str) = std::fs::read_to_string(path) {
                match toml::from_str::<Config>(&config_str) {
                    Ok(mut config) => {
                        tracing::info!("📄 Loaded configuration from: {}", path);
                        config.apply_env_overrides();
                        return Ok(config);
                    }
                    Err(e) => {
                        tracing::warn!("Failed to parse config file {}: {}", path, e);
                    }
                }
            }
        }

        Self::from_env()
    }

    /// Load configuration from an explicit file; a bad file is an error
    pub fn load_from<P: AsRef<Path>>(path: P) -> Result<Self> {
        let path = path.as_ref();
        let config_str = std::fs::read_to_string(path)
            .with_context(|| format!("Failed to read config: {}", path.display()))?;
        let mut config: Config = toml::from_str(&config_str)
            .with_context(|| format!("Failed to parse config: {}", path.display()))?;

        tracing::info!("📄 Loaded configuration from: {}", path.display());
        config.apply_env_overrides();
        Ok(config)
    }

    /// Defaults with environment overrides
    pub fn from_env() -> Result<Self> {
        let mut config = Self::default();
        config.apply_env_overrides();
        Ok(config)
    }

    fn apply_env_overrides(&mut self) {
        if let Ok(workers) = std::env::var("SERMON_ANALYZER_WORKERS") {
            self.performance.max_workers = workers.parse().unwrap_or(4);
        }

        if let Ok(registry) = std::env::var("SERMON_ANALYZER_REGISTRY") {
            self.storage.registry_path = PathBuf::from(registry);
        }

        if let Ok(rules) = std::env::var("SERMON_ANALYZER_RULES") {
            self.heuristics.rules_file = Some(PathBuf::from(rules));
        }

        if let Ok(log_level) = std::env::var("SERMON_ANALYZER_LOG_LEVEL") {
            self.output.log_level = log_level;
        }
    }

    /// Save configuration to file
    pub fn save<P: AsRef<Path>>(&self, path: P) -> Result<()> {
        let config_str = toml::to_string_pretty(self)?;
        std::fs::write(path.as_ref(), config_str)?;
        tracing::info!("💾 Configuration saved to: {}", path.as_ref().display());
        Ok(())
    }

    /// Validate configuration
    pub fn validate(&self) -> Result<()> {
        if self.performance.max_workers == 0 {
            return Err(anyhow!("max_workers must be greater than 0"));
        }

        if !LOG_LEVELS.contains(&self.output.log_level.to_lowercase().as_str()) {
            return Err(anyhow!("Unknown log level: {}", self.output.log_level));
        }

        if self.storage.transcript_extensions.is_empty() {
            return Err(anyhow!("transcript_extensions must not be empty"));
        }

        if let Some(rules) = &self.heuristics.rules_file {
            if !rules.exists() {
                return Err(anyhow!("Rule file not found: {}", rules.display()));
            }
        }

        if !self.output.reports_dir.exists() {
            if let Err(e) = std::fs::create_dir_all(&self.output.reports_dir) {
                return Err(anyhow!("Cannot create reports directory: {}", e));
            }
        }

        tracing::info!("✅ Configuration validation passed");
        Ok(())
    }

    /// Get runtime configuration summary
    pub fn summary(&self) -> String {
        format!(
            "Sermon Analyzer Configuration:\n\
            - Workers: {}\n\
            - Registry: {}\n\
            - Rule File: {}\n\
            - Transcripts: {}\n\
            - Church CSVs: {}\n\
            - Reports: {}\n\
            - Use Descriptions: {}",
            self.performance.max_workers,
            self.storage.registry_path.display(),
            self.heuristics
                .rules_file
                .as_ref()
                .map(|p| p.display().to_string())
                .unwrap_or_else(|| "built-in".to_string()),
            self.storage.transcripts_dir.display(),
            self.storage.csv_dir.display(),
            self.output.reports_dir.display(),
            self.heuristics.use_descriptions
        )
    }
}

impl Default for Config {
    fn default() -> Self {
        Self {
            storage: StorageConfig {
                registry_path: PathBuf::from("data/speakers.json"),
                transcripts_dir: PathBuf::from("data/transcripts"),
                csv_dir: PathBuf::from("data/churches"),
                transcript_extensions: vec!["txt".to_string()],
            },
            heuristics: HeuristicsConfig {
                rules_file: None,
                use_descriptions: true,
            },
            performance: PerformanceConfig {
                max_workers: num_cpus::get().min(8), // Use available cores, max 8
            },
            output: OutputConfig {
                reports_dir: PathBuf::from("./reports"),
                log_level: "info".to_string(),
                save_results: true,
            },
        }
    }
}

/// Configuration builder for programmatic config creation
pub struct ConfigBuilder {
    config: Config,
}

impl ConfigBuilder {
    pub fn new() -> Self {
        Self {
            config: Config::default(),
        }
    }

    pub fn with_workers(mut self, workers: usize) -> Self {
        self.config.performance.max_workers = workers;
        self
    }

    pub fn with_registry(mut self, path: PathBuf) -> Self {
        self.config.storage.registry_path = path;
        self
    }

    pub fn with_rules_file(mut self, path: PathBuf) -> Self {
        self.config.heuristics.rules_file = Some(path);
        self
    }

    pub fn with_transcripts_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.transcripts_dir = dir;
        self
    }

    pub fn with_csv_dir(mut self, dir: PathBuf) -> Self {
        self.config.storage.csv_dir = dir;
        self
    }

    pub fn with_reports_dir(mut self, dir: PathBuf) -> Self {
        self.config.output.reports_dir = dir;
        self
    }

    pub fn use_descriptions(mut self, enable: bool) -> Self {
        self.config.heuristics.use_descriptions = enable;
        self
    }

    pub fn save_results(mut self, enable: bool) -> Self {
        self.config.output.save_results = enable;
        self
    }

    pub fn build(self) -> Config {
        self.config
    }
}

impl Default for ConfigBuilder {
    fn default() -> Self {
        Self::new()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_default_config() {
        let config = Config::default();
        assert!(config.performance.max_workers >= 1);
        assert!(config.performance.max_workers <= 8);
        assert!(config.heuristics.use_descriptions);
        assert_eq!(config.storage.transcript_extensions, vec!["txt".to_string()]);
    }

    #[test]
    fn test_config_builder() {
        let config = ConfigBuilder::new()
            .with_workers(3)
            .with_registry(PathBuf::from("speakers.json"))
            .use_descriptions(false)
            .build();

        assert_eq!(config.performance.max_workers, 3);
        assert_eq!(config.storage.registry_path, PathBuf::from("speakers.json"));
        assert!(!config.heuristics.use_descriptions);
    }

    #[test]
    fn test_config_validation() {
        let temp_dir = TempDir::new().unwrap();
        let config = ConfigBuilder::new()
            .with_reports_dir(temp_dir.path().join("reports"))
            .build();
        assert!(config.validate().is_ok());
        assert!(temp_dir.path().join("reports").exists());

        let no_workers = ConfigBuilder::new()
            .with_workers(0)
            .with_reports_dir(temp_dir.path().join("reports"))
            .build();
        assert!(no_workers.validate().is_err());

        let missing_rules = ConfigBuilder::new()
            .with_rules_file(temp_dir.path().join("missing.json"))
            .with_reports_dir(temp_dir.path().join("reports"))
            .build();
        assert!(missing_rules.validate().is_err());
    }

    #[test]
    fn test_save_and_load_from() {
        let temp_dir = TempDir::new().unwrap();
        let path = temp_dir.path().join("sermon-analyzer.toml");

        let config = ConfigBuilder::new()
            .with_workers(2)
            .with_csv_dir(PathBuf::from("csv"))
            .save_results(false)
            .build();
        config.save(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.storage.csv_dir, PathBuf::from("csv"));
        assert!(!loaded.output.save_results);
        assert!(loaded.summary().contains("Church CSVs: csv"));
    }
}
