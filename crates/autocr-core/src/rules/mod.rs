//! Rule system: the rule contract, the built-in set, and severity
//! overrides from configuration.

pub mod base;
pub mod helpers;
pub mod performance;

use std::sync::Arc;

use crate::config::{RuleSettings, SettingOutcome};
use crate::context::RuleContext;
use crate::reporter::{Notification, ScopedReporter, Severity};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RuleTag {
    Base,
    Performance,
    Untagged,
}

impl RuleTag {
    pub fn as_str(self) -> &'static str {
        match self {
            RuleTag::Base => "base",
            RuleTag::Performance => "performance",
            RuleTag::Untagged => "untagged",
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RuleMetadata {
    pub name: &'static str,
    pub tag: RuleTag,
    pub severity: Severity,
    pub description: &'static str,
}

#[derive(Debug, thiserror::Error)]
pub enum RuleError {
    #[error(transparent)]
    Io(#[from] std::io::Error),
    #[error("{0}")]
    Failed(String),
}

/// A detector over the shared rule context. Rules are pure over the
/// context and emit findings only through the scoped reporter.
pub trait Rule: Send + Sync {
    fn metadata(&self) -> &RuleMetadata;
    fn run(
        &self,
        ctx: &RuleContext<'_>,
        reporter: &mut ScopedReporter<'_>,
    ) -> Result<(), RuleError>;
}

/// A rule with its effective severity after configuration overrides.
#[derive(Clone)]
pub struct PreparedRule {
    pub rule: Arc<dyn Rule>,
    pub severity: Severity,
}

#[macro_export]
macro_rules! declare_rule {
    (
        $name:ident,
        name = $rule_name:literal,
        tag = $tag:ident,
        severity = $sev:ident,
        description = $desc:literal
    ) => {
        pub struct $name {
            metadata: $crate::rules::RuleMetadata,
        }

        impl $name {
            pub fn new() -> Self {
                Self {
                    metadata: $crate::rules::RuleMetadata {
                        name: $rule_name,
                        tag: $crate::rules::RuleTag::$tag,
                        severity: $crate::reporter::Severity::$sev,
                        description: $desc,
                    },
                }
            }
        }

        impl Default for $name {
            fn default() -> Self {
                Self::new()
            }
        }
    };
}

/// The built-in rule set, in execution order.
pub fn builtin_rules() -> Vec<Arc<dyn Rule>> {
    vec![
        Arc::new(base::deep_relative_imports::DeepRelativeImports::new()),
        Arc::new(base::circular_dependencies::CircularDependencies::new()),
        Arc::new(base::swallowed_errors::SwallowedErrors::new()),
        Arc::new(performance::catastrophic_regex::CatastrophicRegex::new()),
        Arc::new(performance::deep_clone_in_loop::DeepCloneInLoop::new()),
        Arc::new(performance::n2_array_lookup::N2ArrayLookup::new()),
    ]
}

/// Merge built-in rules with externally supplied ones and apply per-rule
/// settings. `off` drops a rule; an unrecognised setting keeps the default
/// severity and emits a warn notification.
pub fn prepare_rules(
    extra: &[Arc<dyn Rule>],
    settings: &RuleSettings,
    notifications: &mut Vec<Notification>,
) -> Vec<PreparedRule> {
    let mut all = builtin_rules();
    all.extend(extra.iter().cloned());

    let mut prepared = Vec::new();
    for rule in all {
        let meta = rule.metadata();
        let mut severity = meta.severity;
        if let Some(setting) = settings.get(meta.name) {
            match setting.interpret() {
                SettingOutcome::Off => continue,
                SettingOutcome::Default => {}
                SettingOutcome::Override(overridden) => severity = overridden,
                SettingOutcome::Invalid => {
                    notifications.push(Notification::warn(format!(
                        "invalid setting for rule '{}', keeping default severity",
                        meta.name
                    )));
                }
            }
        }
        prepared.push(PreparedRule { rule, severity });
    }
    prepared
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::config::RuleSetting;

    #[test]
    fn builtin_set_contains_the_six_rules() {
        let names: Vec<_> = builtin_rules()
            .iter()
            .map(|r| r.metadata().name)
            .collect();
        assert_eq!(
            names,
            vec![
                "no-deep-relative-imports",
                "no-circular-dependencies",
                "no-swallowed-errors",
                "no-catastrophic-regex",
                "no-deep-clone-in-loop",
                "no-n2-array-lookup",
            ]
        );
    }

    #[test]
    fn base_rules_warn_and_performance_rules_optimize_by_default() {
        for rule in builtin_rules() {
            let meta = rule.metadata();
            match meta.tag {
                RuleTag::Base => assert_eq!(meta.severity, Severity::Warning),
                RuleTag::Performance => assert_eq!(meta.severity, Severity::Optimizing),
                RuleTag::Untagged => panic!("built-in rules must be tagged"),
            }
        }
    }

    #[test]
    fn off_setting_drops_the_rule() {
        let mut settings = RuleSettings::new();
        settings.insert(
            "no-swallowed-errors".to_string(),
            RuleSetting::Named("off".into()),
        );
        let mut notifications = Vec::new();
        let prepared = prepare_rules(&[], &settings, &mut notifications);
        assert!(notifications.is_empty());
        assert!(
            prepared
                .iter()
                .all(|p| p.rule.metadata().name != "no-swallowed-errors")
        );
        assert_eq!(prepared.len(), builtin_rules().len() - 1);
    }

    #[test]
    fn severity_override_applies() {
        let mut settings = RuleSettings::new();
        settings.insert(
            "no-deep-relative-imports".to_string(),
            RuleSetting::Named("error".into()),
        );
        let mut notifications = Vec::new();
        let prepared = prepare_rules(&[], &settings, &mut notifications);
        let rule = prepared
            .iter()
            .find(|p| p.rule.metadata().name == "no-deep-relative-imports")
            .unwrap();
        assert_eq!(rule.severity, Severity::Error);
    }

    #[test]
    fn invalid_setting_warns_and_keeps_default() {
        let mut settings = RuleSettings::new();
        settings.insert(
            "no-catastrophic-regex".to_string(),
            RuleSetting::Named("shouty".into()),
        );
        let mut notifications = Vec::new();
        let prepared = prepare_rules(&[], &settings, &mut notifications);
        assert_eq!(notifications.len(), 1);
        assert!(notifications[0].message.contains("no-catastrophic-regex"));
        let rule = prepared
            .iter()
            .find(|p| p.rule.metadata().name == "no-catastrophic-regex")
            .unwrap();
        assert_eq!(rule.severity, Severity::Optimizing);
    }
}
