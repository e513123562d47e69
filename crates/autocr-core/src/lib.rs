//! Autocr Core - Static code-review engine for JavaScript/TypeScript
//!
//! This crate provides the scan pipeline and its collaborators:
//! - Parser integration with SWC
//! - Shared per-file analysis (imports, loops, hot paths, try blocks)
//! - Rule runtime and the built-in rule set
//! - Module resolution over tsconfig aliases and workspace packages
//! - Violation reporting (text and structured)
//! - Scan orchestration across a worker pool

pub mod analysis;
pub mod config;
pub mod context;
pub mod messages;
pub mod parser;
pub mod reporter;
pub mod resolver;
pub mod rules;
pub mod scan;
pub mod source_index;

pub use config::{IgnoreConfig, RuleSetting, RuleSettings};
pub use messages::{Locale, MessageCatalog};
pub use reporter::{
    FileScanResult, Notification, NotificationLevel, OutputMode, Severity, SeverityCounts,
    Suggestion, Violation,
};
pub use scan::{ScanRequest, ScanSummary, run_scan};
