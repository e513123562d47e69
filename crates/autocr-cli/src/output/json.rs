//! Structured JSON output: one document on stdout.

use serde::Serialize;

use autocr_core::reporter::{FileScanResult, Notification};
use autocr_core::scan::{ScanSummary, ViolationTotals};

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct Document<'a> {
    summary: SummaryBlock,
    files: &'a [FileScanResult],
    notifications: Vec<&'a Notification>,
}

#[derive(Serialize)]
#[serde(rename_all = "camelCase")]
struct SummaryBlock {
    scanned_files: usize,
    files_with_errors: usize,
    files_with_warnings: usize,
    files_with_optimizing: usize,
    violation_totals: ViolationTotals,
}

/// Serialize the scan outcome. CLI-level warnings (config load issues)
/// precede the scan's own notifications.
pub fn render(summary: &ScanSummary, pre_notifications: &[Notification]) -> String {
    let document = Document {
        summary: SummaryBlock {
            scanned_files: summary.scanned_files(),
            files_with_errors: summary.files_with_errors(),
            files_with_warnings: summary.files_with_warnings(),
            files_with_optimizing: summary.files_with_optimizing(),
            violation_totals: summary.violation_totals(),
        },
        files: &summary.files,
        notifications: pre_notifications
            .iter()
            .chain(summary.notifications.iter())
            .collect(),
    };
    serde_json::to_string(&document).unwrap_or_else(|_| "{}".to_string())
}
