//! Relay server bootstrap
//!
//! When any source duplicates its stream, a local RTSP relay server has to be
//! up to receive the relay legs. It is started once per run from a local
//! script and then only watched: its stdout goes to the log and its state is
//! published on a watch channel.

use crate::error::{CamsyncError, Result};
use crate::supervisor::PoolTask;
use serde::Serialize;
use std::path::PathBuf;
use std::process::Stdio;
use tokio::io::{AsyncBufReadExt, BufReader};
use tokio::process::Command;
use tokio::sync::watch;
use tracing::{error, info, warn};

/// Script that installs and starts the relay server
pub const DEFAULT_RELAY_SCRIPT: &str = "./install-mediamtx.sh";

/// Liveness of the relay process
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub enum RelayStatus {
    /// Not started yet (or still waiting for a pool slot)
    Pending,
    Running { pid: Option<u32> },
    Exited { code: Option<i32> },
    Failed { reason: String },
}

pub struct RelayBootstrap {
    script: PathBuf,
    status: watch::Sender<RelayStatus>,
}

impl RelayBootstrap {
    pub fn new(script: impl Into<PathBuf>) -> Self {
        let (status, _) = watch::channel(RelayStatus::Pending);
        Self {
            script: script.into(),
            status,
        }
    }

    pub fn script(&self) -> &PathBuf {
        &self.script
    }

    /// Follow the relay's state
    pub fn subscribe(&self) -> watch::Receiver<RelayStatus> {
        self.status.subscribe()
    }

    /// Launch the script and follow it until it exits
    ///
    /// Stdin and stderr stay attached to the console. Returns the exit code.
    pub async fn start(&self) -> Result<Option<i32>> {
        let program = self.script.display().to_string();
        info!("Starting relay server via {}", program);

        let mut child = Command::new(&self.script)
            .stdin(Stdio::inherit())
            .stdout(Stdio::piped())
            .stderr(Stdio::inherit())
            .spawn()
            .map_err(|e| CamsyncError::RelayBootstrap(format!("cannot launch {}: {}", program, e)))?;

        self.status.send_replace(RelayStatus::Running { pid: child.id() });

        // Keep draining until the relay closes stdout; stopping early would
        // close the pipe and kill the relay on its next write
        let mut lines_read = Ok(());
        if let Some(stdout) = child.stdout.take() {
            let mut segments = BufReader::new(stdout).split(b'\n');
            loop {
                match segments.next_segment().await {
                    Ok(Some(bytes)) => {
                        let line = String::from_utf8_lossy(&bytes);
                        let line = line.trim_end_matches('\r');
                        if !line.is_empty() {
                            info!(relay = %program, "{}", line);
                        }
                    }
                    Ok(None) => break,
                    Err(e) => {
                        lines_read = Err(e);
                        break;
                    }
                }
            }
        }

        let status = child.wait().await.map_err(|source| CamsyncError::ProcessIo {
            program: program.clone(),
            source,
        })?;
        self.status.send_replace(RelayStatus::Exited {
            code: status.code(),
        });

        if let Err(e) = lines_read {
            warn!("Lost relay output from {}: {}", program, e);
        }

        Ok(status.code())
    }

    /// Run the bootstrap, containing every failure
    pub async fn supervise(self) {
        match self.start().await {
            Ok(Some(0)) => info!("Relay bootstrap script finished"),
            Ok(code) => warn!("Relay bootstrap script exited with {:?}", code),
            Err(e) => {
                error!("Relay server unavailable, duplication will not work: {}", e);
                self.status.send_replace(RelayStatus::Failed {
                    reason: e.to_string(),
                });
            }
        }
    }
}

#[async_trait::async_trait]
impl PoolTask for RelayBootstrap {
    fn name(&self) -> String {
        "relay-bootstrap".to_string()
    }

    async fn run(self: Box<Self>) {
        (*self).supervise().await
    }
}
