pub mod config;
pub mod error;
pub mod recording;
pub mod relay;
pub mod source;
pub mod supervisor;

pub use config::Config;
pub use error::{CamsyncError, ConfigError, Result};
pub use recording::{ProcessInvocation, RecordingMode, RecordingWorker, WorkerStats};
pub use relay::{RelayBootstrap, RelayStatus};
pub use source::{
    load_sources, parse_sources, Address, Credentials, RelayTarget, SourceConfig, StreamQuality,
};
pub use supervisor::{PoolTask, Supervisor, SupervisorSettings, WorkerPool};
