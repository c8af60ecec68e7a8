use anyhow::{Context, Result};
use serde::{Deserialize, Serialize};
use std::fs;
use std::path::PathBuf;

pub const APP_NAME: &str = "setup-fargate";
pub const CACHE_DIR_NAME: &str = "tool-cache";
pub const CONFIG_FILE_NAME: &str = "config.json";

#[derive(Debug, Clone, Serialize, Deserialize, PartialEq, Eq)]
pub struct Settings {
    #[serde(default = "default_cache_dir")]
    pub cache_dir: PathBuf,
    #[serde(default = "default_temp_dir")]
    pub temp_dir: PathBuf,
    #[serde(default = "default_progress")]
    pub progress: bool,
}

fn default_cache_dir() -> PathBuf {
    dirs::data_dir()
        .unwrap_or_else(|| PathBuf::from("."))
        .join(APP_NAME)
        .join(CACHE_DIR_NAME)
}

fn default_temp_dir() -> PathBuf {
    std::env::temp_dir().join(APP_NAME)
}

fn default_progress() -> bool {
    true
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            cache_dir: default_cache_dir(),
            temp_dir: default_temp_dir(),
            progress: default_progress(),
        }
    }
}

pub fn config_file_path() -> Option<PathBuf> {
    if let Some(path) = std::env::var_os("SETUP_FARGATE_CONFIG") {
        return Some(PathBuf::from(path));
    }
    dirs::config_dir().map(|dir| dir.join(APP_NAME).join(CONFIG_FILE_NAME))
}

/// Defaults, then the config file, then environment overrides.
pub fn load_settings() -> Result<Settings> {
    let mut settings = match config_file_path() {
        Some(path) if path.exists() => {
            tracing::debug!("Loading settings from {}", path.display());
            let content = fs::read_to_string(&path)
                .with_context(|| format!("Could not read config file at {}", path.display()))?;
            serde_json::from_str(&content)
                .with_context(|| format!("Could not parse {} as JSON", path.display()))?
        }
        _ => Settings::default(),
    };

    apply_env_overrides(&mut settings, |key| std::env::var(key).ok());
    Ok(settings)
}

/// Later keys in each list win over earlier ones.
pub fn apply_env_overrides<F>(settings: &mut Settings, lookup: F)
where
    F: Fn(&str) -> Option<String>,
{
    let non_empty = |key: &str| lookup(key).filter(|v| !v.trim().is_empty());

    for key in ["RUNNER_TOOL_CACHE", "SETUP_FARGATE_CACHE_DIR"] {
        if let Some(dir) = non_empty(key) {
            settings.cache_dir = PathBuf::from(dir);
        }
    }

    for key in ["RUNNER_TEMP", "SETUP_FARGATE_TEMP_DIR"] {
        if let Some(dir) = non_empty(key) {
            settings.temp_dir = PathBuf::from(dir);
        }
    }

    if let Some(progress) = non_empty("SETUP_FARGATE_PROGRESS") {
        settings.progress = progress.to_lowercase() == "true" || progress == "1";
    }
}
