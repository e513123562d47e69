//! Pre-parsed configuration values consumed by the scan pipeline.
//!
//! On-disk loading (TOML parsing, ignore-file reading) belongs to the CLI;
//! the engine only ever sees these types.

use std::collections::HashMap;
use std::path::PathBuf;

use serde::Deserialize;

use crate::reporter::Severity;

/// A per-rule setting as it appears in configuration. Accepts the shapes
/// users actually write: booleans, numeric levels, and named severities.
#[derive(Debug, Clone, PartialEq, Deserialize)]
#[serde(untagged)]
pub enum RuleSetting {
    Enabled(bool),
    Level(i64),
    Named(String),
}

/// Map of rule name to its configured setting.
pub type RuleSettings = HashMap<String, RuleSetting>;

/// Outcome of interpreting a [`RuleSetting`] against a rule's default.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum SettingOutcome {
    /// Keep the rule with its default severity.
    Default,
    /// Drop the rule from the run.
    Off,
    /// Keep the rule, overriding its severity.
    Override(Severity),
    /// Unrecognised value; keep the default and warn.
    Invalid,
}

impl RuleSetting {
    pub fn interpret(&self) -> SettingOutcome {
        match self {
            RuleSetting::Enabled(true) => SettingOutcome::Default,
            RuleSetting::Enabled(false) => SettingOutcome::Off,
            RuleSetting::Level(0) => SettingOutcome::Off,
            RuleSetting::Level(1) => SettingOutcome::Override(Severity::Warning),
            RuleSetting::Level(2) => SettingOutcome::Override(Severity::Error),
            RuleSetting::Level(_) => SettingOutcome::Invalid,
            RuleSetting::Named(name) => match name.as_str() {
                "off" => SettingOutcome::Off,
                "warn" | "warning" => SettingOutcome::Override(Severity::Warning),
                "error" => SettingOutcome::Override(Severity::Error),
                "optimizing" => SettingOutcome::Override(Severity::Optimizing),
                _ => SettingOutcome::Invalid,
            },
        }
    }
}

/// Ordered ignore patterns plus the directory they were loaded from.
/// Candidates are matched both as absolute paths and relative to `base_dir`.
#[derive(Debug, Clone, Default)]
pub struct IgnoreConfig {
    pub patterns: Vec<String>,
    pub base_dir: PathBuf,
}

impl IgnoreConfig {
    pub fn new(patterns: Vec<String>, base_dir: PathBuf) -> Self {
        Self { patterns, base_dir }
    }

    pub fn is_empty(&self) -> bool {
        self.patterns.is_empty()
    }
}
