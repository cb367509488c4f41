//! Process settings, loaded from a TOML file.

use crate::core::error::FaqError;
use rustc_hash::FxHashMap;
use serde::{Deserialize, Serialize};
use std::collections::HashSet;
use std::fs;
use std::path::{Path, PathBuf};
use std::time::Duration;

pub const CONFIG_ENV: &str = "FAQLEDGER_CONFIG";
pub const DEFAULT_CONFIG_FILE: &str = "faqledger.toml";

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, Default)]
#[serde(rename_all = "lowercase")]
pub enum LogFormat {
    #[default]
    Compact,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(default)]
pub struct Settings {
    pub data_dir: PathBuf,
    /// Name used by `-grpcfg enable|disable <name>`.
    pub group_name: String,
    pub default_enabled: bool,
    pub busy_timeout_secs: u64,
    pub history_limit: usize,
    /// Where rendered cards go; `<data_dir>/render` when unset.
    pub render_dir: Option<PathBuf>,
    pub log_level: String,
    pub log_format: LogFormat,
    /// Namespace id -> admin user ids.
    pub admins: FxHashMap<String, HashSet<String>>,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            data_dir: PathBuf::from(".faqledger"),
            group_name: "faq".to_string(),
            default_enabled: false,
            busy_timeout_secs: 5,
            history_limit: 20,
            render_dir: None,
            log_level: "info".to_string(),
            log_format: LogFormat::Compact,
            admins: FxHashMap::default(),
        }
    }
}

impl Settings {
    pub fn busy_timeout(&self) -> Duration {
        Duration::from_secs(self.busy_timeout_secs.max(1))
    }

    pub fn render_dir(&self) -> PathBuf {
        self.render_dir
            .clone()
            .unwrap_or_else(|| self.data_dir.join("render"))
    }

    pub fn from_toml(content: &str) -> Result<Self, FaqError> {
        let settings: Settings =
            toml::from_str(content).map_err(|e| FaqError::ConfigError(e.to_string()))?;
        if settings.group_name.trim().is_empty() || settings.group_name.contains(' ') {
            return Err(FaqError::ConfigError(format!(
                "group_name must be a single word, got {:?}",
                settings.group_name
            )));
        }
        if settings.history_limit == 0 {
            return Err(FaqError::ConfigError("history_limit must be positive".to_string()));
        }
        Ok(settings)
    }
}

/// Load settings from `explicit`, else `$FAQLEDGER_CONFIG`, else `./faqledger.toml`.
/// A missing default file is not an error; built-in defaults apply.
pub fn load_settings(explicit: Option<&Path>) -> Result<Settings, FaqError> {
    let (path, required) = match explicit {
        Some(p) => (p.to_path_buf(), true),
        None => match std::env::var_os(CONFIG_ENV) {
            Some(p) => (PathBuf::from(p), true),
            None => (PathBuf::from(DEFAULT_CONFIG_FILE), false),
        },
    };

    if !path.exists() {
        if required {
            return Err(FaqError::ConfigError(format!(
                "config file not found: {}",
                path.display()
            )));
        }
        return Ok(Settings::default());
    }

    let content = fs::read_to_string(&path).map_err(FaqError::IoError)?;
    Settings::from_toml(&content)
}
