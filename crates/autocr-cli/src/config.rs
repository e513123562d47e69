//! On-disk configuration and ignore-file loading.
//!
//! Loads `autocr.toml` into the engine's pre-parsed configuration types.
//! A broken or unknown-shaped config never fails the run: the scan
//! proceeds with defaults and a warn notification.

use std::collections::HashSet;
use std::path::{Path, PathBuf};

use serde::Deserialize;

use autocr_core::config::{IgnoreConfig, RuleSettings};
use autocr_core::reporter::Notification;

pub const CONFIG_FILENAME: &str = "autocr.toml";
pub const IGNORE_FILENAME: &str = ".autocrignore";

const KNOWN_TOP_LEVEL_KEYS: &[&str] = &["ignore", "rules"];

#[derive(Debug, thiserror::Error)]
pub enum ConfigError {
    #[error("failed to read config file '{path}': {source}")]
    Read {
        path: PathBuf,
        source: std::io::Error,
    },
    #[error("invalid TOML in '{path}': {message}")]
    Parse { path: PathBuf, message: String },
}

#[derive(Debug, Clone, Default, Deserialize, PartialEq)]
#[serde(default)]
pub struct Config {
    pub ignore: Vec<String>,
    pub rules: RuleSettings,
}

#[derive(Debug, Default)]
pub struct ConfigResult {
    pub config: Config,
    pub warnings: Vec<Notification>,
}

pub fn find_config_file(start_dir: &Path) -> Option<PathBuf> {
    let mut current = start_dir.to_path_buf();
    loop {
        let candidate = current.join(CONFIG_FILENAME);
        if candidate.exists() {
            return Some(candidate);
        }
        if !current.pop() {
            return None;
        }
    }
}

pub fn load_config(path: &Path) -> Result<(Config, Vec<String>), ConfigError> {
    let content = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;
    let config: Config = toml::from_str(&content).map_err(|err| ConfigError::Parse {
        path: path.to_path_buf(),
        message: err.message().to_string(),
    })?;
    Ok((config, detect_unknown_keys(&content)))
}

fn detect_unknown_keys(content: &str) -> Vec<String> {
    let mut warnings = Vec::new();
    let table: toml::Table = match content.parse() {
        Ok(table) => table,
        Err(_) => return warnings,
    };
    let known: HashSet<&str> = KNOWN_TOP_LEVEL_KEYS.iter().copied().collect();
    for key in table.keys() {
        if !known.contains(key.as_str()) {
            warnings.push(format!("unknown config option: '{key}'"));
        }
    }
    warnings
}

/// Load the effective configuration: an explicit `--config` path or the
/// nearest `autocr.toml` above the working directory. Failures downgrade
/// to warnings and defaults.
pub fn load(explicit: Option<&Path>, cwd: &Path) -> ConfigResult {
    let path = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => find_config_file(cwd),
    };
    let Some(path) = path else {
        return ConfigResult::default();
    };
    match load_config(&path) {
        Ok((config, unknown_keys)) => ConfigResult {
            config,
            warnings: unknown_keys
                .into_iter()
                .map(Notification::warn)
                .collect(),
        },
        Err(err) => ConfigResult {
            config: Config::default(),
            warnings: vec![
                Notification::warn("config load failed, continuing with defaults")
                    .with_detail(err.to_string()),
            ],
        },
    }
}

/// Read an ignore file: one glob per line, `#` comments and blanks
/// dropped.
pub fn load_ignore_file(path: &Path) -> std::io::Result<Vec<String>> {
    let content = std::fs::read_to_string(path)?;
    Ok(content
        .lines()
        .map(str::trim)
        .filter(|line| !line.is_empty() && !line.starts_with('#'))
        .map(str::to_string)
        .collect())
}

/// Combine config-declared patterns with the ignore file (explicit path or
/// the default `.autocrignore`).
pub fn resolve_ignore(explicit: Option<&Path>, cwd: &Path, config: &Config) -> IgnoreConfig {
    let mut patterns = config.ignore.clone();
    let mut base_dir = cwd.to_path_buf();

    let file = match explicit {
        Some(path) => Some(path.to_path_buf()),
        None => {
            let default = cwd.join(IGNORE_FILENAME);
            default.exists().then_some(default)
        }
    };
    if let Some(file) = file {
        if let Ok(loaded) = load_ignore_file(&file) {
            patterns.extend(loaded);
        }
        if let Some(parent) = file.parent() {
            base_dir = parent.to_path_buf();
        }
    }
    IgnoreConfig::new(patterns, base_dir)
}
