//! Worker pool and the typed messages exchanged with it.
//!
//! Workers are OS threads sharing the process, so the init message carries
//! the prepared (read-only) rule table directly instead of a rule
//! directory to reload. Each worker owns its resolver and its caches;
//! exactly one response is produced per analyze task.

use std::panic::{AssertUnwindSafe, catch_unwind};
use std::path::PathBuf;
use std::sync::Arc;
use std::thread::JoinHandle;

use crossbeam_channel::{Receiver, Sender, unbounded};

use crate::messages::{Locale, MessageCatalog};
use crate::reporter::{FileScanResult, Notification};
use crate::resolver::Resolver;
use crate::rules::PreparedRule;

/// One-time worker configuration.
#[derive(Clone)]
pub struct WorkerInit {
    pub rules: Arc<Vec<PreparedRule>>,
    pub locale: Locale,
    pub project_root: PathBuf,
    pub tsconfig_path: Option<PathBuf>,
}

/// Orchestrator -> worker.
#[derive(Debug)]
pub enum Task {
    Analyze { id: usize, path: PathBuf },
    Shutdown,
}

/// Worker -> orchestrator.
pub enum TaskResponse {
    Result {
        worker: usize,
        id: usize,
        result: FileScanResult,
        logs: Vec<Notification>,
    },
    Error {
        worker: usize,
        id: usize,
        path: PathBuf,
        message: String,
    },
    /// The worker died before draining its queue.
    Fatal { worker: usize, message: String },
}

pub struct WorkerPool {
    senders: Vec<Sender<Task>>,
    responses: Receiver<TaskResponse>,
    handles: Vec<JoinHandle<()>>,
}

impl WorkerPool {
    pub fn start(count: usize, init: &WorkerInit) -> Self {
        let (response_tx, responses) = unbounded();
        let mut senders = Vec::with_capacity(count);
        let mut handles = Vec::with_capacity(count);
        for worker in 0..count {
            let (task_tx, task_rx) = unbounded();
            let response_tx = response_tx.clone();
            let init = init.clone();
            handles.push(std::thread::spawn(move || {
                worker_main(worker, init, task_rx, response_tx);
            }));
            senders.push(task_tx);
        }
        Self {
            senders,
            responses,
            handles,
        }
    }

    pub fn send(&self, worker: usize, task: Task) -> Result<(), ()> {
        self.senders[worker].send(task).map_err(|_| ())
    }

    pub fn responses(&self) -> &Receiver<TaskResponse> {
        &self.responses
    }

    /// Ask every worker to exit; used for both normal drain and fatal
    /// cancellation (send failures to dead workers are expected then).
    pub fn shutdown_all(&self) {
        for sender in &self.senders {
            let _ = sender.send(Task::Shutdown);
        }
    }

    pub fn join(self) {
        drop(self.senders);
        for handle in self.handles {
            let _ = handle.join();
        }
    }
}

fn worker_main(
    worker: usize,
    init: WorkerInit,
    tasks: Receiver<Task>,
    responses: Sender<TaskResponse>,
) {
    let outcome = catch_unwind(AssertUnwindSafe(|| {
        worker_loop(worker, &init, &tasks, &responses);
    }));
    if outcome.is_err() {
        let _ = responses.send(TaskResponse::Fatal {
            worker,
            message: "worker terminated unexpectedly".to_string(),
        });
    }
}

fn worker_loop(
    worker: usize,
    init: &WorkerInit,
    tasks: &Receiver<Task>,
    responses: &Sender<TaskResponse>,
) {
    let catalog = MessageCatalog::for_locale(init.locale);
    let resolver = Resolver::new(&init.project_root, init.tsconfig_path.clone());

    while let Ok(task) = tasks.recv() {
        match task {
            Task::Analyze { id, path } => {
                tracing::trace!(worker, id, path = %path.display(), "analyzing");
                let analyzed = catch_unwind(AssertUnwindSafe(|| {
                    super::analyze_file(&path, &init.rules, &catalog, &resolver)
                }));
                let response = match analyzed {
                    Ok((result, logs)) => TaskResponse::Result {
                        worker,
                        id,
                        result,
                        logs,
                    },
                    Err(_) => TaskResponse::Error {
                        worker,
                        id,
                        path,
                        message: "analysis panicked".to_string(),
                    },
                };
                if responses.send(response).is_err() {
                    break;
                }
            }
            Task::Shutdown => break,
        }
    }
}
