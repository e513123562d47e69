//! Per-file violation collection and rendering.
//!
//! A [`FileReporter`] accumulates violations while rules run, then
//! [`FileReporter::flush`] snapshots them into an immutable
//! [`FileScanResult`]. Text rendering is a separate step so the scan
//! orchestrator can emit files strictly in input order regardless of which
//! worker finished first.

use std::io::Write;

use colored::Colorize;
use serde::Serialize;
use swc_common::Span;

use crate::messages::MessageCatalog;
use crate::source_index::SourceIndex;

/// Violation severity. Ordering of variants matches reporting priority.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum Severity {
    Error,
    Warning,
    Optimizing,
}

impl Severity {
    pub fn as_str(self) -> &'static str {
        match self {
            Severity::Error => "error",
            Severity::Warning => "warning",
            Severity::Optimizing => "optimizing",
        }
    }

    fn icon(self) -> &'static str {
        match self {
            Severity::Error => "✖",
            Severity::Warning => "⚠",
            Severity::Optimizing => "⚡",
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum OutputMode {
    Text,
    Json,
}

#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Suggestion {
    pub text: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub link: Option<String>,
}

impl Suggestion {
    pub fn new(text: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: None,
        }
    }

    pub fn with_link(text: impl Into<String>, link: impl Into<String>) -> Self {
        Self {
            text: text.into(),
            link: Some(link.into()),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct Violation {
    pub tag: String,
    pub rule_name: String,
    pub severity: Severity,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub line: Option<usize>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub code: Option<String>,
    pub suggestions: Vec<Suggestion>,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize)]
pub struct SeverityCounts {
    pub error: usize,
    pub warning: usize,
    pub optimizing: usize,
}

impl SeverityCounts {
    pub fn bump(&mut self, severity: Severity) {
        match severity {
            Severity::Error => self.error += 1,
            Severity::Warning => self.warning += 1,
            Severity::Optimizing => self.optimizing += 1,
        }
    }

    pub fn total(&self) -> usize {
        self.error + self.warning + self.optimizing
    }
}

#[derive(Debug, Clone, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct FileScanResult {
    pub file_path: String,
    pub severity_counts: SeverityCounts,
    pub total_violations: usize,
    pub error_violations: usize,
    pub violations: Vec<Violation>,
}

impl FileScanResult {
    /// Result shape for a file whose parse (or read) failed: one
    /// error-severity outcome with no fabricated violation.
    pub fn parse_failure(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            severity_counts: SeverityCounts {
                error: 1,
                ..Default::default()
            },
            total_violations: 1,
            error_violations: 1,
            violations: Vec::new(),
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum NotificationLevel {
    Info,
    Warn,
    Error,
}

impl NotificationLevel {
    pub fn as_str(self) -> &'static str {
        match self {
            NotificationLevel::Info => "info",
            NotificationLevel::Warn => "warn",
            NotificationLevel::Error => "error",
        }
    }
}

/// Non-fatal diagnostic captured during a scan.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub level: NotificationLevel,
    pub message: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
}

impl Notification {
    pub fn info(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Info,
            message: message.into(),
            detail: None,
        }
    }

    pub fn warn(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Warn,
            message: message.into(),
            detail: None,
        }
    }

    pub fn error(message: impl Into<String>) -> Self {
        Self {
            level: NotificationLevel::Error,
            message: message.into(),
            detail: None,
        }
    }

    pub fn with_detail(mut self, detail: impl Into<String>) -> Self {
        self.detail = Some(detail.into());
        self
    }
}

/// Structured violation input accepted from rules. A bare message carries
/// only text; a record may pin a code excerpt, suggestions, and a location.
#[derive(Debug, Clone, Default)]
pub struct ViolationDetails {
    pub description: String,
    pub code: Option<String>,
    pub suggestions: Vec<Suggestion>,
    pub span: Option<Span>,
    pub line: Option<usize>,
}

#[derive(Debug, Clone)]
pub enum ViolationInput {
    Message(String),
    Record(ViolationDetails),
}

impl From<String> for ViolationInput {
    fn from(message: String) -> Self {
        ViolationInput::Message(message)
    }
}

impl From<&str> for ViolationInput {
    fn from(message: &str) -> Self {
        ViolationInput::Message(message.to_string())
    }
}

impl From<ViolationDetails> for ViolationInput {
    fn from(details: ViolationDetails) -> Self {
        ViolationInput::Record(details)
    }
}

const UNTAGGED: &str = "untagged";
const GENERAL_RULE: &str = "general";

/// Collects violations for a single file.
#[derive(Debug)]
pub struct FileReporter {
    file_path: String,
    violations: Vec<Violation>,
    counts: SeverityCounts,
}

impl FileReporter {
    pub fn new(file_path: impl Into<String>) -> Self {
        Self {
            file_path: file_path.into(),
            violations: Vec::new(),
            counts: SeverityCounts::default(),
        }
    }

    pub fn file_path(&self) -> &str {
        &self.file_path
    }

    /// File-level error with no location.
    pub fn error(&mut self, message: impl Into<String>) {
        self.error_at_line(None, message);
    }

    pub fn error_at_line(&mut self, line: Option<usize>, message: impl Into<String>) {
        self.push(Violation {
            tag: UNTAGGED.to_string(),
            rule_name: GENERAL_RULE.to_string(),
            severity: Severity::Error,
            message: message.into(),
            line,
            code: None,
            suggestions: Vec::new(),
        });
    }

    pub fn error_at_span(
        &mut self,
        span: Option<Span>,
        index: &SourceIndex,
        message: impl Into<String>,
    ) {
        let line = span.map(|s| index.line_of_byte(s.lo.0));
        self.error_at_line(line, message);
    }

    /// Derive a reporter scoped to one rule. Emissions through the scoped
    /// view are tagged with the rule's name, tag, and effective severity.
    pub fn for_rule<'a>(
        &'a mut self,
        rule_name: &'a str,
        tag: &'a str,
        severity: Severity,
        index: &'a SourceIndex,
    ) -> ScopedReporter<'a> {
        ScopedReporter {
            reporter: self,
            rule_name,
            tag,
            severity,
            index,
        }
    }

    fn push(&mut self, violation: Violation) {
        self.counts.bump(violation.severity);
        self.violations.push(violation);
    }

    /// Snapshot the collected violations and reset internal state.
    ///
    /// Violations are ordered by source line (file-level entries first),
    /// ties broken by emission order.
    pub fn flush(&mut self) -> FileScanResult {
        let mut violations = std::mem::take(&mut self.violations);
        violations.sort_by_key(|v| v.line.unwrap_or(0));
        let counts = std::mem::take(&mut self.counts);
        FileScanResult {
            file_path: self.file_path.clone(),
            severity_counts: counts,
            total_violations: counts.total(),
            error_violations: counts.error,
            violations,
        }
    }
}

/// Rule-scoped view over a [`FileReporter`].
pub struct ScopedReporter<'a> {
    reporter: &'a mut FileReporter,
    rule_name: &'a str,
    tag: &'a str,
    severity: Severity,
    index: &'a SourceIndex,
}

impl ScopedReporter<'_> {
    /// Record a violation. The effective line is the explicit `line` when
    /// given, otherwise derived from `span` via the source index.
    pub fn report(&mut self, input: impl Into<ViolationInput>) {
        let details = match input.into() {
            ViolationInput::Message(message) => ViolationDetails {
                description: message,
                ..Default::default()
            },
            ViolationInput::Record(details) => details,
        };
        let line = details
            .line
            .or_else(|| details.span.map(|s| self.index.line_of_byte(s.lo.0)));
        self.reporter.push(Violation {
            tag: self.tag.to_string(),
            rule_name: self.rule_name.to_string(),
            severity: self.severity,
            message: details.description,
            line,
            code: details.code,
            suggestions: details.suggestions,
        });
    }

    pub fn line_of_span(&self, span: Span) -> usize {
        self.index.line_of_byte(span.lo.0)
    }
}

fn tag_label(tag: &str, catalog: &MessageCatalog) -> String {
    match tag {
        "base" => catalog.get("report.tag.base").to_string(),
        "performance" => catalog.get("report.tag.performance").to_string(),
        UNTAGGED => catalog.get("report.tag.untagged").to_string(),
        other => other.to_string(),
    }
}

/// Render one file's violations in the human-readable format.
pub fn render_text(
    result: &FileScanResult,
    catalog: &MessageCatalog,
    out: &mut impl Write,
) -> std::io::Result<()> {
    for violation in &result.violations {
        let clock = chrono::Local::now().format("%H:%M:%S");
        let header = format!(
            "[{clock}] {} [{}]: {}",
            violation.severity.icon(),
            tag_label(&violation.tag, catalog),
            violation.rule_name
        );
        let header = match violation.severity {
            Severity::Error => header.red().bold(),
            Severity::Warning => header.yellow().bold(),
            Severity::Optimizing => header.cyan().bold(),
        };
        writeln!(out, "{header}")?;

        let location = match violation.line {
            Some(line) => format!("{}:{line}", result.file_path),
            None => result.file_path.clone(),
        };
        writeln!(out, "  {}: {location}", catalog.get("report.file"))?;
        writeln!(
            out,
            "  {}: {}",
            catalog.get("report.description"),
            violation.message
        )?;
        if let Some(code) = &violation.code {
            writeln!(out, "  {}: {code}", catalog.get("report.code"))?;
        }
        if !violation.suggestions.is_empty() {
            let joined = violation
                .suggestions
                .iter()
                .map(|s| match &s.link {
                    Some(link) => format!("{} ({link})", s.text),
                    None => s.text.clone(),
                })
                .collect::<Vec<_>>()
                .join(catalog.get("report.suggestion_separator"));
            writeln!(out, "  {}: {joined}", catalog.get("report.suggestion"))?;
        }
    }
    Ok(())
}

/// Render a notification as a single stderr-style line.
pub fn render_notification(
    notification: &Notification,
    out: &mut impl Write,
) -> std::io::Result<()> {
    let level = match notification.level {
        NotificationLevel::Info => "info".blue().bold(),
        NotificationLevel::Warn => "warn".yellow().bold(),
        NotificationLevel::Error => "error".red().bold(),
    };
    match &notification.detail {
        Some(detail) => writeln!(out, "{level}: {} ({detail})", notification.message),
        None => writeln!(out, "{level}: {}", notification.message),
    }
}
