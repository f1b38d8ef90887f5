use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::sync::atomic::{AtomicBool, AtomicI64, AtomicUsize, Ordering};
use std::sync::OnceLock;

const NO_EXIT_CODE: i64 = i64::MIN;

/// Snapshot of one worker's activity
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct WorkerStats {
    /// Source name
    pub name: String,

    /// `direct` or `relay`
    pub mode: String,

    /// When the worker first got a pool slot, if it has
    pub started_at: Option<DateTime<Utc>>,

    /// Whether the supervise loop is currently running
    pub running: bool,

    /// Number of cycles begun so far
    pub cycles: usize,

    /// Cycles where the external tool could not be started
    pub launch_failures: usize,

    /// Cycles where the output directory could not be created
    pub directory_failures: usize,

    /// Exit code of the most recent process, when it exited normally
    pub last_exit_code: Option<i32>,
}

/// Live counters shared between a worker and whoever reports on it
#[derive(Debug)]
pub struct WorkerStatus {
    name: String,
    mode: &'static str,
    started_at: OnceLock<DateTime<Utc>>,
    running: AtomicBool,
    cycles: AtomicUsize,
    launch_failures: AtomicUsize,
    directory_failures: AtomicUsize,
    last_exit_code: AtomicI64,
}

impl WorkerStatus {
    pub fn new(name: impl Into<String>, mode: &'static str) -> Self {
        Self {
            name: name.into(),
            mode,
            started_at: OnceLock::new(),
            running: AtomicBool::new(false),
            cycles: AtomicUsize::new(0),
            launch_failures: AtomicUsize::new(0),
            directory_failures: AtomicUsize::new(0),
            last_exit_code: AtomicI64::new(NO_EXIT_CODE),
        }
    }

    pub fn mark_started(&self) {
        let _ = self.started_at.set(Utc::now());
        self.running.store(true, Ordering::SeqCst);
    }

    pub fn mark_stopped(&self) {
        self.running.store(false, Ordering::SeqCst);
    }

    pub fn begin_cycle(&self) -> usize {
        self.cycles.fetch_add(1, Ordering::SeqCst) + 1
    }

    pub fn record_launch_failure(&self) {
        self.launch_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_directory_failure(&self) {
        self.directory_failures.fetch_add(1, Ordering::SeqCst);
    }

    pub fn record_exit(&self, code: Option<i32>) {
        let code = code.map(i64::from).unwrap_or(NO_EXIT_CODE);
        self.last_exit_code.store(code, Ordering::SeqCst);
    }

    pub fn is_running(&self) -> bool {
        self.running.load(Ordering::SeqCst)
    }

    pub fn cycles(&self) -> usize {
        self.cycles.load(Ordering::SeqCst)
    }

    pub fn snapshot(&self) -> WorkerStats {
        let code = self.last_exit_code.load(Ordering::SeqCst);
        WorkerStats {
            name: self.name.clone(),
            mode: self.mode.to_string(),
            started_at: self.started_at.get().copied(),
            running: self.running.load(Ordering::SeqCst),
            cycles: self.cycles.load(Ordering::SeqCst),
            launch_failures: self.launch_failures.load(Ordering::SeqCst),
            directory_failures: self.directory_failures.load(Ordering::SeqCst),
            last_exit_code: (code != NO_EXIT_CODE).then(|| code as i32),
        }
    }
}
