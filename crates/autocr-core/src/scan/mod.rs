//! Scan orchestration: path expansion, filtering, worker dispatch, and
//! ordered result assembly.
//!
//! Results are emitted strictly in input order whatever the completion
//! order, and the worker count is an optimisation only: any N produces the
//! same summary as a sequential run.

pub mod ignore;
pub mod worker;

use std::collections::{HashMap, HashSet};
use std::path::{Path, PathBuf};
use std::sync::Arc;

use serde::Serialize;
use walkdir::WalkDir;

use crate::analysis::analyze;
use crate::config::{IgnoreConfig, RuleSettings};
use crate::context::{RuleContext, run_rules};
use crate::messages::{Locale, MessageCatalog};
use crate::parser::parse_source;
use crate::reporter::{
    FileReporter, FileScanResult, Notification, OutputMode, render_notification, render_text,
};
use crate::resolver::{Resolver, normalize_lexically};
use crate::rules::{PreparedRule, Rule, prepare_rules};
use crate::source_index::SourceIndex;
use ignore::IgnoreMatcher;
use worker::{Task, TaskResponse, WorkerInit, WorkerPool};

/// Environment variable overriding the worker count.
pub const WORKERS_ENV: &str = "AUTO_CR_WORKERS";

/// Scans below this size stay on one worker.
const SMALL_SCAN_THRESHOLD: usize = 20;

const SCANNABLE_EXTENSIONS: &[&str] = &["ts", "tsx", "js", "jsx"];

/// One scan invocation. Built by the CLI from pre-parsed configuration.
pub struct ScanRequest {
    pub paths: Vec<PathBuf>,
    pub project_root: PathBuf,
    pub rule_settings: RuleSettings,
    /// Externally supplied rules, merged after the built-ins.
    pub extra_rules: Vec<Arc<dyn Rule>>,
    pub ignore: IgnoreConfig,
    pub locale: Locale,
    pub output: OutputMode,
    pub tsconfig_path: Option<PathBuf>,
    /// Explicit worker count; `None` consults `AUTO_CR_WORKERS` and the
    /// file-count heuristic.
    pub workers: Option<usize>,
}

impl ScanRequest {
    pub fn new(paths: Vec<PathBuf>, project_root: PathBuf) -> Self {
        Self {
            paths,
            project_root,
            rule_settings: RuleSettings::new(),
            extra_rules: Vec::new(),
            ignore: IgnoreConfig::default(),
            locale: Locale::default(),
            output: OutputMode::Text,
            tsconfig_path: None,
            workers: None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct ViolationTotals {
    pub total: usize,
    pub error: usize,
    pub warning: usize,
    pub optimizing: usize,
}

/// Aggregate over all scanned files plus the non-fatal diagnostics.
#[derive(Debug, Default)]
pub struct ScanSummary {
    pub files: Vec<FileScanResult>,
    pub notifications: Vec<Notification>,
    /// Set when the scan aborted (all paths missing, worker failure).
    pub fatal: bool,
}

impl ScanSummary {
    pub fn scanned_files(&self) -> usize {
        self.files.len()
    }

    pub fn files_with_errors(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.severity_counts.error > 0)
            .count()
    }

    pub fn files_with_warnings(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.severity_counts.warning > 0)
            .count()
    }

    pub fn files_with_optimizing(&self) -> usize {
        self.files
            .iter()
            .filter(|f| f.severity_counts.optimizing > 0)
            .count()
    }

    pub fn violation_totals(&self) -> ViolationTotals {
        let mut totals = ViolationTotals {
            total: 0,
            error: 0,
            warning: 0,
            optimizing: 0,
        };
        for file in &self.files {
            totals.total += file.total_violations;
            totals.error += file.severity_counts.error;
            totals.warning += file.severity_counts.warning;
            totals.optimizing += file.severity_counts.optimizing;
        }
        totals
    }

    /// The sole programmatic failure signal.
    pub fn exit_code(&self) -> i32 {
        if self.fatal || self.files_with_errors() > 0 {
            1
        } else {
            0
        }
    }
}

pub fn run_scan(request: &ScanRequest) -> ScanSummary {
    let mut summary = ScanSummary::default();
    let text = request.output == OutputMode::Text;
    let catalog = MessageCatalog::for_locale(request.locale);

    if request.paths.is_empty() {
        note(&mut summary, text, Notification::info("no input paths provided"));
        return summary;
    }

    let mut existing = Vec::new();
    for path in &request.paths {
        if path.exists() {
            existing.push(path.clone());
        } else {
            note(
                &mut summary,
                text,
                Notification::error(format!("input path does not exist: {}", path.display())),
            );
        }
    }
    if existing.is_empty() {
        note(
            &mut summary,
            text,
            Notification::error("all input paths are missing"),
        );
        summary.fatal = true;
        return summary;
    }

    let (matcher, pattern_warnings) = IgnoreMatcher::build(&request.ignore);
    for warning in pattern_warnings {
        note(&mut summary, text, warning);
    }

    let files = expand_paths(&existing, &matcher);
    if files.is_empty() {
        note(&mut summary, text, Notification::info("no scannable files found"));
        return summary;
    }

    let mut setting_warnings = Vec::new();
    let prepared = prepare_rules(
        &request.extra_rules,
        &request.rule_settings,
        &mut setting_warnings,
    );
    for warning in setting_warnings {
        note(&mut summary, text, warning);
    }
    if prepared.is_empty() {
        note(&mut summary, text, Notification::warn("no rules enabled"));
        return summary;
    }

    let worker_count = select_worker_count(files.len(), request.workers);
    tracing::debug!(files = files.len(), workers = worker_count, "dispatching scan");

    if worker_count <= 1 {
        run_sequential(request, &files, &prepared, &catalog, text, &mut summary);
    } else {
        run_pooled(
            request,
            &files,
            &prepared,
            &catalog,
            text,
            worker_count,
            &mut summary,
        );
    }
    summary
}

fn note(summary: &mut ScanSummary, text: bool, notification: Notification) {
    if text {
        let _ = render_notification(&notification, &mut std::io::stderr().lock());
    }
    summary.notifications.push(notification);
}

/// Render one file occurrence; fold it into the summary only on its first
/// occurrence so duplicate input paths collapse.
fn emit_file(
    summary: &mut ScanSummary,
    text: bool,
    catalog: &MessageCatalog,
    result: &FileScanResult,
    logs: &[Notification],
    first_occurrence: bool,
) {
    if text {
        let mut stderr = std::io::stderr().lock();
        for log in logs {
            let _ = render_notification(log, &mut stderr);
        }
        let _ = render_text(result, catalog, &mut stderr);
    }
    if first_occurrence {
        summary.notifications.extend(logs.iter().cloned());
        summary.files.push(result.clone());
    }
}

fn run_sequential(
    request: &ScanRequest,
    files: &[PathBuf],
    prepared: &[PreparedRule],
    catalog: &MessageCatalog,
    text: bool,
    summary: &mut ScanSummary,
) {
    let resolver = Resolver::new(&request.project_root, request.tsconfig_path.clone());
    let mut memo: HashMap<PathBuf, (FileScanResult, Vec<Notification>)> = HashMap::new();
    for path in files {
        let first = !memo.contains_key(path);
        if first {
            let produced = analyze_file(path, prepared, catalog, &resolver);
            memo.insert(path.clone(), produced);
        }
        let (result, logs) = &memo[path];
        emit_file(summary, text, catalog, result, logs, first);
    }
}

fn run_pooled(
    request: &ScanRequest,
    files: &[PathBuf],
    prepared: &[PreparedRule],
    catalog: &MessageCatalog,
    text: bool,
    worker_count: usize,
    summary: &mut ScanSummary,
) {
    let mut unique: Vec<PathBuf> = Vec::new();
    let mut unique_index: HashMap<PathBuf, usize> = HashMap::new();
    let input_to_unique: Vec<usize> = files
        .iter()
        .map(|path| {
            *unique_index.entry(path.clone()).or_insert_with(|| {
                unique.push(path.clone());
                unique.len() - 1
            })
        })
        .collect();

    let init = WorkerInit {
        rules: Arc::new(prepared.to_vec()),
        locale: request.locale,
        project_root: request.project_root.clone(),
        tsconfig_path: request.tsconfig_path.clone(),
    };
    let pool = WorkerPool::start(worker_count.min(unique.len()), &init);

    let mut next_task = 0usize;
    for worker in 0..worker_count.min(unique.len()) {
        let _ = pool.send(worker, Task::Analyze {
            id: next_task,
            path: unique[next_task].clone(),
        });
        next_task += 1;
    }

    let mut results: Vec<Option<(FileScanResult, Vec<Notification>)>> = vec![None; unique.len()];
    let mut accumulated: HashSet<usize> = HashSet::new();
    let mut cursor = 0usize;
    let mut completed = 0usize;

    while completed < unique.len() {
        let response = match pool.responses().recv() {
            Ok(response) => response,
            Err(_) => {
                note(
                    summary,
                    text,
                    Notification::error("worker pool terminated unexpectedly"),
                );
                summary.fatal = true;
                break;
            }
        };
        match response {
            TaskResponse::Result {
                worker,
                id,
                result,
                logs,
            } => {
                results[id] = Some((result, logs));
                completed += 1;
                send_next(&pool, worker, &unique, &mut next_task);
            }
            TaskResponse::Error {
                worker,
                id,
                path,
                message,
            } => {
                let logs = vec![
                    Notification::error(format!("analysis failed for {}", path.display()))
                        .with_detail(message),
                ];
                results[id] = Some((
                    FileScanResult::parse_failure(path.display().to_string()),
                    logs,
                ));
                completed += 1;
                send_next(&pool, worker, &unique, &mut next_task);
            }
            TaskResponse::Fatal { message, .. } => {
                note(
                    summary,
                    text,
                    Notification::error(format!("fatal worker error: {message}")),
                );
                summary.fatal = true;
                pool.shutdown_all();
                break;
            }
        }

        while cursor < files.len() {
            let unique_id = input_to_unique[cursor];
            let Some((result, logs)) = &results[unique_id] else {
                break;
            };
            let first = accumulated.insert(unique_id);
            emit_file(summary, text, catalog, result, logs, first);
            cursor += 1;
        }
    }

    pool.shutdown_all();
    pool.join();
}

fn send_next(pool: &WorkerPool, worker: usize, unique: &[PathBuf], next_task: &mut usize) {
    if *next_task < unique.len() {
        let _ = pool.send(worker, Task::Analyze {
            id: *next_task,
            path: unique[*next_task].clone(),
        });
        *next_task += 1;
    } else {
        let _ = pool.send(worker, Task::Shutdown);
    }
}

/// Parse and analyse one file, running every prepared rule.
pub(crate) fn analyze_file(
    path: &Path,
    rules: &[PreparedRule],
    catalog: &MessageCatalog,
    resolver: &Resolver,
) -> (FileScanResult, Vec<Notification>) {
    let mut notifications = Vec::new();
    let display = path.display().to_string();

    let source = match std::fs::read_to_string(path) {
        Ok(source) => source,
        Err(err) => {
            notifications.push(
                Notification::error(format!("failed to read {display}"))
                    .with_detail(err.to_string()),
            );
            return (FileScanResult::parse_failure(display), notifications);
        }
    };
    let parsed = match parse_source(&display, &source) {
        Ok(parsed) => parsed,
        Err(err) => {
            notifications.push(
                Notification::error(format!("parser failed for {display}"))
                    .with_detail(err.to_string()),
            );
            return (FileScanResult::parse_failure(display), notifications);
        }
    };

    let source_index = SourceIndex::new(&parsed.source, parsed.module_start);
    let analysis = analyze(&parsed.module);
    let ctx = RuleContext {
        module: &parsed.module,
        file_path: path,
        source: &parsed.source,
        analysis: &analysis,
        source_index: &source_index,
        messages: catalog,
        resolver,
    };
    let mut reporter = FileReporter::new(display);
    run_rules(&ctx, rules, &mut reporter, &mut notifications);
    (reporter.flush(), notifications)
}

fn select_worker_count(file_count: usize, requested: Option<usize>) -> usize {
    if file_count == 0 {
        return 1;
    }
    if let Some(explicit) = requested {
        return explicit.min(file_count);
    }
    if let Some(from_env) = std::env::var(WORKERS_ENV)
        .ok()
        .and_then(|value| value.trim().parse::<i64>().ok())
        .filter(|value| *value >= 0)
    {
        return (from_env as usize).min(file_count);
    }
    if file_count < SMALL_SCAN_THRESHOLD {
        1
    } else {
        num_cpus::get().saturating_sub(1).max(1).min(file_count)
    }
}

fn scannable_extension(path: &Path) -> bool {
    if path
        .file_name()
        .and_then(|n| n.to_str())
        .is_some_and(|n| n.ends_with(".d.ts"))
    {
        return false;
    }
    path.extension()
        .and_then(|ext| ext.to_str())
        .map(|ext| SCANNABLE_EXTENSIONS.contains(&ext))
        .unwrap_or(false)
}

fn absolutize(path: &Path) -> PathBuf {
    let absolute = std::path::absolute(path).unwrap_or_else(|_| path.to_path_buf());
    normalize_lexically(&absolute)
}

/// Expand input paths into scannable files, honouring the ignore matcher
/// and always skipping node_modules.
fn expand_paths(paths: &[PathBuf], matcher: &IgnoreMatcher) -> Vec<PathBuf> {
    let mut files = Vec::new();
    for path in paths {
        let absolute = absolutize(path);
        if matcher.is_ignored(&absolute) {
            continue;
        }
        if absolute.is_file() {
            if scannable_extension(&absolute) {
                files.push(absolute);
            }
            continue;
        }
        if !absolute.is_dir() {
            continue;
        }
        let walker = WalkDir::new(&absolute)
            .sort_by_file_name()
            .into_iter()
            .filter_entry(|entry| {
                if entry.file_type().is_dir() {
                    let name = entry.file_name().to_string_lossy();
                    if name == "node_modules" {
                        return false;
                    }
                    return !matcher.is_ignored(entry.path());
                }
                true
            });
        for entry in walker.filter_map(Result::ok) {
            if !entry.file_type().is_file() {
                continue;
            }
            let file = entry.path();
            if scannable_extension(file) && !matcher.is_ignored(file) {
                files.push(file.to_path_buf());
            }
        }
    }
    files
}
