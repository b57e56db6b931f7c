use colored::Colorize;
use serde::Deserialize;
use std::fs;
use std::path::{Path, PathBuf};

use crate::constants::{CONFIG_FILENAME, DEFAULT_EXTENSIONS};
use crate::rules::{InjectionRule, Strategy};

#[derive(Debug, Deserialize, Default, Clone)]
/// Top-level configuration struct.
pub struct Config {
    #[serde(default)]
    /// The main configuration section.
    pub callsplice: CallspliceConfig,
    /// The path to the configuration file this was loaded from.
    /// Set during `load_from_path`, `None` if using defaults or programmatic config.
    #[serde(skip)]
    pub config_file_path: Option<PathBuf>,
}

#[derive(Debug, Deserialize, Default, Clone)]
/// Configuration options for callsplice.
pub struct CallspliceConfig {
    /// Identifiers known to be in scope at every injection point.
    #[serde(default)]
    pub in_scope: Vec<String>,
    /// File extensions scanned when a directory is given.
    pub extensions: Option<Vec<String>>,
    /// List of folders to exclude when walking directories.
    #[serde(default)]
    pub exclude_folders: Vec<String>,
    /// Default matching strategy.
    pub strategy: Option<Strategy>,
    /// Injection rules; the built-in rule applies when empty.
    #[serde(default)]
    pub rules: Vec<InjectionRule>,
}

impl CallspliceConfig {
    /// Extensions in effect.
    #[must_use]
    pub fn extensions(&self) -> Vec<String> {
        self.extensions.clone().unwrap_or_else(|| {
            DEFAULT_EXTENSIONS
                .iter()
                .map(|&e| e.to_owned())
                .collect()
        })
    }

    /// Rules in effect.
    #[must_use]
    pub fn effective_rules(&self) -> Vec<InjectionRule> {
        if self.rules.is_empty() {
            vec![InjectionRule::default()]
        } else {
            self.rules.clone()
        }
    }
}

impl Config {
    /// Loads configuration starting from a specific path and traversing up.
    ///
    /// Unreadable or malformed files are reported on stderr with a `[WARN]`
    /// line and skipped; the search continues in the parent directory.
    #[must_use]
    pub fn load_from_path(path: &Path) -> Self {
        let mut current = path.to_path_buf();
        if current.is_file() {
            current.pop();
        }

        loop {
            let candidate = current.join(CONFIG_FILENAME);
            if candidate.exists() {
                match Self::load_file(&candidate) {
                    Ok(config) => return config,
                    Err(e) => eprintln!("{} {e}, ignoring it", "[WARN]".yellow().bold()),
                }
            }

            if !current.pop() {
                break;
            }
        }

        Config::default()
    }

    /// Loads a specific configuration file.
    ///
    /// # Errors
    ///
    /// Returns an error if the file cannot be read or parsed.
    pub fn load_file(path: &Path) -> anyhow::Result<Self> {
        let content = fs::read_to_string(path)
            .map_err(|e| anyhow::anyhow!("Failed to read config {}: {}", path.display(), e))?;
        let mut config = toml::from_str::<Config>(&content)
            .map_err(|e| anyhow::anyhow!("Invalid config {}: {}", path.display(), e))?;
        config.config_file_path = Some(path.to_path_buf());
        Ok(config)
    }
}
