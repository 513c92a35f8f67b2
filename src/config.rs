//! Configuration management
//!
//! Manages where the knowledge base lives, how strict question matching is,
//! and the session's quit command.

use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};

use crate::matcher::{Matcher, DEFAULT_THRESHOLD};

/// Main configuration structure
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct Config {
    /// Knowledge base location
    #[serde(default)]
    pub knowledge: KnowledgeConfig,
    /// Fuzzy matching settings
    #[serde(default)]
    pub matching: MatchingConfig,
    /// Interactive session settings
    #[serde(default)]
    pub session: SessionConfig,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct KnowledgeConfig {
    /// Path to the knowledge base JSON file
    #[serde(default = "default_knowledge_path")]
    pub path: PathBuf,
}

fn default_knowledge_path() -> PathBuf {
    data_dir()
        .map(|dir| dir.join("knowledge_base.json"))
        .unwrap_or_else(|_| PathBuf::from("knowledge_base.json"))
}

impl Default for KnowledgeConfig {
    fn default() -> Self {
        Self {
            path: default_knowledge_path(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct MatchingConfig {
    /// Minimum similarity (0, 1] for a known question to count as a match
    #[serde(default = "default_threshold")]
    pub threshold: f64,
    /// How many ranked candidates `ask` lists; a chat turn answers with the best one
    #[serde(default = "default_limit")]
    pub limit: usize,
}

fn default_threshold() -> f64 {
    DEFAULT_THRESHOLD
}

fn default_limit() -> usize {
    1
}

impl Default for MatchingConfig {
    fn default() -> Self {
        Self {
            threshold: default_threshold(),
            limit: default_limit(),
        }
    }
}

impl MatchingConfig {
    pub fn matcher(&self) -> Result<Matcher> {
        Matcher::with_limit(self.threshold, self.limit).context("Invalid matching configuration")
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct SessionConfig {
    /// Input that ends the session, compared case-insensitively
    #[serde(default = "default_quit_command")]
    pub quit_command: String,
}

fn default_quit_command() -> String {
    "quit".to_string()
}

impl Default for SessionConfig {
    fn default() -> Self {
        Self {
            quit_command: default_quit_command(),
        }
    }
}

impl Config {
    /// Load configuration from the default file, creating it if missing
    pub fn load() -> Result<Self> {
        Self::load_from(&config_path()?)
    }

    /// Load configuration from `path`, writing defaults there if it does not exist.
    ///
    /// Values are not validated here; callers apply command-line overrides
    /// first and then call [`Config::validate`].
    pub fn load_from(path: &Path) -> Result<Self> {
        if path.exists() {
            let contents = std::fs::read_to_string(path)
                .context("Failed to read config file")?;
            let config: Config = toml::from_str(&contents)
                .context("Failed to parse config file")?;
            Ok(config)
        } else {
            let config = Config::default();
            config.save_to(path)?;
            Ok(config)
        }
    }

    /// Save configuration to the default file
    pub fn save(&self) -> Result<()> {
        self.save_to(&config_path()?)
    }

    /// Save configuration to `path`
    pub fn save_to(&self, path: &Path) -> Result<()> {
        let parent = path.parent()
            .context("Config path has no parent")?;

        std::fs::create_dir_all(parent)
            .context("Failed to create config directory")?;

        let contents = toml::to_string_pretty(self)
            .context("Failed to serialize config")?;

        std::fs::write(path, contents)
            .context("Failed to write config file")?;

        Ok(())
    }

    /// Reject settings the session cannot run with
    pub fn validate(&self) -> Result<()> {
        self.matching.matcher()?;
        if self.session.quit_command.trim().is_empty() {
            anyhow::bail!("Quit command must not be empty");
        }
        Ok(())
    }
}

fn project_dirs() -> Result<directories::ProjectDirs> {
    directories::ProjectDirs::from("com", "teachbot", "teachbot")
        .context("Failed to get project directories")
}

/// Get the configuration file path
pub fn config_path() -> Result<PathBuf> {
    Ok(project_dirs()?.config_dir().join("config.toml"))
}

/// Get the data directory path
pub fn data_dir() -> Result<PathBuf> {
    Ok(project_dirs()?.data_dir().to_path_buf())
}

/// Show current configuration
pub fn show_config() -> Result<()> {
    let config = Config::load()?;

    println!("Configuration ({})", config_path()?.display());
    println!("  knowledge base:  {}", config.knowledge.path.display());
    println!("  threshold:       {}", config.matching.threshold);
    println!("  limit:           {}", config.matching.limit);
    println!("  quit command:    {}", config.session.quit_command);

    Ok(())
}

/// Set the similarity threshold
pub fn set_threshold(threshold: f64) -> Result<()> {
    let mut config = Config::load()?;
    config.matching.threshold = threshold;
    config.validate()?;
    config.save()?;
    println!("Similarity threshold set to {}", threshold);
    Ok(())
}

/// Set the knowledge base path
pub fn set_knowledge_path(path: &str) -> Result<()> {
    let mut config = Config::load()?;
    config.knowledge.path = PathBuf::from(path);
    config.save()?;
    println!("Knowledge base path set to {}", path);
    Ok(())
}

/// Reset configuration to defaults
pub fn reset_config() -> Result<()> {
    let config = Config::default();
    config.save()?;
    println!("Configuration reset to defaults.");
    Ok(())
}
