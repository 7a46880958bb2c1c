use std::fs;
use std::path::PathBuf;

use anyhow::Result;
use serde::{Deserialize, Serialize};

use crate::session::quiz::DEFAULT_QUESTION_COUNT;
use crate::store::json_store::JsonStore;
use crate::words::LevelFilter;

const MAX_QUESTION_COUNT: usize = 50;

#[derive(Clone, Debug, Serialize, Deserialize)]
pub struct Config {
    #[serde(default = "default_data_dir")]
    pub data_dir: String,
    #[serde(default = "default_question_count")]
    pub default_question_count: usize,
    #[serde(default = "default_level")]
    pub default_level: String,
    #[serde(default = "default_log_level")]
    pub log_level: String,
}

fn default_data_dir() -> String {
    JsonStore::default_dir().to_string_lossy().to_string()
}
fn default_question_count() -> usize {
    DEFAULT_QUESTION_COUNT
}
fn default_level() -> String {
    "all".to_string()
}
fn default_log_level() -> String {
    "info".to_string()
}

impl Default for Config {
    fn default() -> Self {
        Self {
            data_dir: default_data_dir(),
            default_question_count: default_question_count(),
            default_level: default_level(),
            log_level: default_log_level(),
        }
    }
}

impl Config {
    pub fn load() -> Result<Self> {
        let path = Self::config_path();
        if path.exists() {
            let content = fs::read_to_string(&path)?;
            let mut config: Config = toml::from_str(&content)?;
            config.validate();
            Ok(config)
        } else {
            Ok(Config::default())
        }
    }

    pub fn save(&self) -> Result<()> {
        let path = Self::config_path();
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)?;
        }
        let content = toml::to_string_pretty(self)?;
        fs::write(&path, content)?;
        Ok(())
    }

    pub fn config_path() -> PathBuf {
        dirs::config_dir()
            .unwrap_or_else(|| PathBuf::from("."))
            .join("wordbook")
            .join("config.toml")
    }

    /// Clamp out-of-range values and reset unknown ones to their defaults.
    pub fn validate(&mut self) {
        self.default_question_count = self.default_question_count.clamp(1, MAX_QUESTION_COUNT);
        if self.default_level.parse::<LevelFilter>().is_err() {
            self.default_level = default_level();
        }
        if self.data_dir.trim().is_empty() {
            self.data_dir = default_data_dir();
        }
    }

    pub fn level(&self) -> LevelFilter {
        self.default_level.parse().unwrap_or_default()
    }
}
