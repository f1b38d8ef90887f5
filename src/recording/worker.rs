use super::command::{ProcessInvocation, RecordingMode};
use super::output::forward_merged;
use super::stats::WorkerStatus;
use crate::error::{CamsyncError, Result};
use crate::source::SourceConfig;
use crate::supervisor::PoolTask;
use std::io::ErrorKind;
use std::path::{Path, PathBuf};
use std::process::Stdio;
use std::sync::atomic::{AtomicBool, Ordering};
use std::sync::Arc;
use tokio::process::Command;
use tracing::{error, info, warn};

/// Tool used to record when nothing else is configured
pub const DEFAULT_PROGRAM: &str = "ffmpeg";

/// Records one source forever
///
/// Each cycle makes sure the output directory exists, launches the external
/// tool, forwards its output to the log and waits for it to exit. Whatever the
/// outcome (clean exit, crash, or a tool that never started) the next cycle
/// begins immediately. The loop only ends when the shared stop flag is
/// lowered, and that is checked between cycles, never during one.
pub struct RecordingWorker {
    source: SourceConfig,
    mode: RecordingMode,
    program: String,
    working_dir: PathBuf,
    keep_running: Arc<AtomicBool>,
    status: Arc<WorkerStatus>,
}

impl RecordingWorker {
    pub fn new(source: SourceConfig) -> Self {
        let mode = RecordingMode::from_source(&source);
        let status = Arc::new(WorkerStatus::new(source.name.clone(), mode.label()));

        Self {
            source,
            mode,
            program: DEFAULT_PROGRAM.to_string(),
            working_dir: PathBuf::from("."),
            keep_running: Arc::new(AtomicBool::new(true)),
            status,
        }
    }

    /// Use a different recording tool (must be on PATH or a full path)
    pub fn with_program(mut self, program: impl Into<String>) -> Self {
        self.program = program.into();
        self
    }

    /// Directory the per-source output directory is created in
    pub fn with_working_dir(mut self, dir: impl Into<PathBuf>) -> Self {
        self.working_dir = dir.into();
        self
    }

    /// Share a stop flag; lowering it ends the loop after the current cycle
    pub fn with_keep_running(mut self, keep_running: Arc<AtomicBool>) -> Self {
        self.keep_running = keep_running;
        self
    }

    pub fn source(&self) -> &SourceConfig {
        &self.source
    }

    pub fn mode(&self) -> &RecordingMode {
        &self.mode
    }

    pub fn status(&self) -> Arc<WorkerStatus> {
        Arc::clone(&self.status)
    }

    pub fn output_dir(&self) -> PathBuf {
        self.working_dir.join(&self.source.name)
    }

    /// Command line for one cycle
    pub fn invocation(&self) -> ProcessInvocation {
        ProcessInvocation::recording(&self.program, &self.source, &self.mode)
    }

    /// Create the output directory if needed. Returns whether it was created.
    pub async fn ensure_output_dir(&self) -> Result<bool> {
        ensure_dir(&self.output_dir()).await
    }

    /// Run one launch-to-exit cycle and return the exit code, if any
    pub async fn run_cycle(&self) -> Result<Option<i32>> {
        if self.ensure_output_dir().await? {
            info!(source = %self.source.name, "Created output directory {}", self.output_dir().display());
        }

        let invocation = self.invocation();
        info!(source = %self.source.name, "Launching: {}", invocation);

        let mut child = Command::new(&invocation.program)
            .args(&invocation.args)
            .current_dir(&self.working_dir)
            .stdin(Stdio::null())
            .stdout(Stdio::piped())
            .stderr(Stdio::piped())
            .spawn()
            .map_err(|source| CamsyncError::ProcessLaunch {
                program: invocation.program.clone(),
                source,
            })?;

        let forwarded = match (child.stdout.take(), child.stderr.take()) {
            (Some(stdout), Some(stderr)) => forward_merged(&self.source.name, stdout, stderr).await,
            _ => Ok(0),
        };

        // Always reap the child, even if reading its output failed
        let status = child.wait().await.map_err(|source| CamsyncError::ProcessIo {
            program: invocation.program.clone(),
            source,
        })?;

        let code = status.code();
        self.status.record_exit(code);

        match code {
            Some(code) => info!(source = %self.source.name, "{} exited with code {}", invocation.program, code),
            None => warn!(source = %self.source.name, "{} was terminated by a signal", invocation.program),
        }

        forwarded.map_err(|source| CamsyncError::ProcessIo {
            program: invocation.program,
            source,
        })?;

        Ok(code)
    }

    /// Supervise the source until the stop flag is lowered
    pub async fn supervise(self) {
        self.status.mark_started();
        info!(
            source = %self.source.name,
            mode = self.mode.label(),
            "Recording worker started"
        );

        while self.keep_running.load(Ordering::SeqCst) {
            let cycle = self.status.begin_cycle();

            if let Err(e) = self.run_cycle().await {
                match &e {
                    CamsyncError::Directory { .. } => self.status.record_directory_failure(),
                    CamsyncError::ProcessLaunch { .. } => self.status.record_launch_failure(),
                    _ => {}
                }
                error!(source = %self.source.name, cycle, "Recording cycle failed: {}", e);
            }

            // No delay between cycles; yield so a fast-failing source cannot
            // monopolise a runtime thread
            tokio::task::yield_now().await;
        }

        self.status.mark_stopped();
        info!(source = %self.source.name, "Recording worker stopped");
    }
}

#[async_trait::async_trait]
impl PoolTask for RecordingWorker {
    fn name(&self) -> String {
        format!("recorder:{}", self.source.name)
    }

    async fn run(self: Box<Self>) {
        (*self).supervise().await
    }
}

/// Idempotent directory creation; "already exists" is success
pub async fn ensure_dir(path: &Path) -> Result<bool> {
    match tokio::fs::create_dir(path).await {
        Ok(()) => Ok(true),
        Err(e) if e.kind() == ErrorKind::AlreadyExists => Ok(false),
        Err(source) => Err(CamsyncError::Directory {
            path: path.to_path_buf(),
            source,
        }),
    }
}
