use crate::experience::StoreConfig;
use crate::patterns::AnalyzerConfig;
use crate::selector::SelectorConfig;
use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::{Path, PathBuf};

/// Settings for every learning component, persisted as TOML
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub selector: SelectorConfig,
    #[serde(default)]
    pub analyzer: AnalyzerConfig,
    #[serde(default)]
    pub store: StoreConfig,
}

impl Config {
    /// Load configuration from the default path, creating it if missing
    pub fn load() -> Result<Self> {
        let config_path = Self::config_path()?;

        if !config_path.exists() {
            let config = Config::default();
            config.save_to(&config_path)?;
            return Ok(config);
        }

        Self::load_from(&config_path)
    }

    /// Load configuration from an explicit file
    pub fn load_from(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("Failed to read config file {}", path.display()))?;

        let config: Config = toml::from_str(&contents).context("Failed to parse config file")?;

        Ok(config.normalized())
    }

    /// Save configuration to the default path
    pub fn save(&self) -> Result<()> {
        self.save_to(&Self::config_path()?)
    }

    /// Save configuration to an explicit file
    pub fn save_to(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent).context("Failed to create config directory")?;
        }

        let toml_string = toml::to_string_pretty(self).context("Failed to serialize config")?;

        fs::write(path, toml_string).context("Failed to write config file")?;

        Ok(())
    }

    /// Get the configuration file path
    pub fn config_path() -> Result<PathBuf> {
        let home = dirs::home_dir().context("Could not determine home directory")?;

        Ok(home.join(".toolsage").join("config.toml"))
    }

    /// Clamp out-of-range values
    pub fn normalized(self) -> Self {
        Self {
            selector: self.selector.normalized(),
            analyzer: self.analyzer.normalized(),
            store: self.store,
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use tempfile::TempDir;

    #[test]
    fn test_config_default() {
        let config = Config::default();
        assert_eq!(config.selector.exploration_rate, 0.1);
        assert_eq!(config.analyzer.min_cluster_size, 3);
        assert!(config.store.query_timeout_ms.is_none());
    }

    #[test]
    fn test_config_roundtrip() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("nested").join("config.toml");

        let mut config = Config::default();
        config.selector.exploration_rate = 0.25;
        config.selector.seed = Some(42);
        config.analyzer.max_patterns = 10;
        config.save_to(&path).unwrap();

        let loaded = Config::load_from(&path).unwrap();
        assert_eq!(loaded.selector.exploration_rate, 0.25);
        assert_eq!(loaded.selector.seed, Some(42));
        assert_eq!(loaded.analyzer.max_patterns, 10);
    }

    #[test]
    fn test_partial_file_uses_defaults() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[selector]\nmin_sample_size = 5\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.selector.min_sample_size, 5);
        assert_eq!(config.selector.min_confidence, 0.6);
        assert_eq!(config.analyzer.similarity_threshold, 0.75);
    }

    #[test]
    fn test_out_of_range_values_clamped() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "[selector]\nexploration_rate = 3.0\n").unwrap();

        let config = Config::load_from(&path).unwrap();
        assert_eq!(config.selector.exploration_rate, 1.0);
    }

    #[test]
    fn test_malformed_file_is_error() {
        let dir = TempDir::new().unwrap();
        let path = dir.path().join("config.toml");
        fs::write(&path, "selector = [").unwrap();

        assert!(Config::load_from(&path).is_err());
    }
}
