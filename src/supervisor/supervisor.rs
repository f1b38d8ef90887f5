use super::pool::WorkerPool;
use crate::error::Result;
use crate::recording::{RecordingWorker, WorkerStats, WorkerStatus, DEFAULT_PROGRAM};
use crate::relay::{RelayBootstrap, RelayStatus, DEFAULT_RELAY_SCRIPT};
use crate::source::{validate_sources, SourceConfig};
use std::path::PathBuf;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::sync::watch;
use tracing::{info, warn};

/// How the supervisor launches its tasks
#[derive(Debug, Clone)]
pub struct SupervisorSettings {
    /// Recording tool, resolved from PATH
    pub program: String,

    /// Directory the per-source output directories live in
    pub working_dir: PathBuf,

    /// Script that starts the relay server
    pub relay_script: PathBuf,

    /// Give the relay bootstrap a slot of its own instead of letting it
    /// compete with the recording workers
    pub reserve_relay_slot: bool,
}

impl Default for SupervisorSettings {
    fn default() -> Self {
        Self {
            program: DEFAULT_PROGRAM.to_string(),
            working_dir: PathBuf::from("."),
            relay_script: PathBuf::from(DEFAULT_RELAY_SCRIPT),
            reserve_relay_slot: false,
        }
    }
}

/// Owns the worker pool and the tasks submitted to it
///
/// The pool has one slot per source. When a source asks for duplication the
/// relay bootstrap is queued ahead of the recorders in that same pool, so
/// unless `reserve_relay_slot` is set the last recorder waits for a slot that
/// only frees up once the relay process exits.
pub struct Supervisor {
    pool: WorkerPool,
    sources: Vec<SourceConfig>,
    keep_running: Arc<AtomicBool>,
    workers: Vec<Arc<WorkerStatus>>,
    relay_status: Option<watch::Receiver<RelayStatus>>,
}

impl Supervisor {
    /// Validate the sources, size the pool and submit every task
    ///
    /// Must be called from within a tokio runtime.
    pub fn initialize(sources: Vec<SourceConfig>, settings: SupervisorSettings) -> Result<Self> {
        validate_sources(&sources)?;

        let needs_relay = sources.iter().any(SourceConfig::has_relay_target);
        let slots = sources.len() + usize::from(needs_relay && settings.reserve_relay_slot);
        let pool = WorkerPool::new(slots);
        let keep_running = Arc::new(AtomicBool::new(true));

        let relay_status = if needs_relay {
            if !settings.reserve_relay_slot {
                warn!(
                    "Relay bootstrap shares the {} recorder slot(s); one recorder will wait until it exits",
                    slots
                );
            }
            let relay = RelayBootstrap::new(settings.relay_script.clone());
            let status = relay.subscribe();
            pool.submit(Box::new(relay))?;
            Some(status)
        } else {
            None
        };

        let mut workers = Vec::with_capacity(sources.len());
        for source in &sources {
            let worker = RecordingWorker::new(source.clone())
                .with_program(settings.program.clone())
                .with_working_dir(settings.working_dir.clone())
                .with_keep_running(Arc::clone(&keep_running));
            workers.push(worker.status());
            pool.submit(Box::new(worker))?;
        }

        info!(
            "Supervisor started: {} source(s), {} slot(s), relay {}",
            sources.len(),
            slots,
            if needs_relay { "requested" } else { "not needed" }
        );

        Ok(Self {
            pool,
            sources,
            keep_running,
            workers,
            relay_status,
        })
    }

    /// Stop accepting work and let workers finish their current cycle
    ///
    /// Returns immediately. Running external processes are not killed and a
    /// worker waiting on one keeps waiting.
    pub fn shutdown(&mut self) {
        self.keep_running.store(false, Ordering::SeqCst);
        self.pool.shutdown();
        info!("Supervisor shut down");
    }

    pub fn sources(&self) -> &[SourceConfig] {
        &self.sources
    }

    pub fn pool(&self) -> &WorkerPool {
        &self.pool
    }

    /// Statistics for every recorder, in source order
    pub fn stats(&self) -> Vec<WorkerStats> {
        self.workers.iter().map(|status| status.snapshot()).collect()
    }

    /// Relay liveness, if any source requested duplication
    pub fn relay_status(&self) -> Option<watch::Receiver<RelayStatus>> {
        self.relay_status.clone()
    }

    /// Wait for every pool slot to wind down after `shutdown`
    pub async fn join(&mut self) {
        self.pool.join().await;
    }
}
