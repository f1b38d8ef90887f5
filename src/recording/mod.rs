//! Per-source recording
//!
//! This module provides the `RecordingWorker` abstraction that manages:
//! - Output directory creation
//! - Command line assembly (direct recording or relay duplication)
//! - Launching the external tool and forwarding its output to the log
//! - Restarting the cycle whenever the tool exits or fails to start

mod command;
mod output;
mod stats;
mod worker;

pub use command::{
    output_pattern, ProcessInvocation, RecordingMode, AUDIO_CODEC_FLAG, COPY_CODEC,
    COPY_CODEC_FLAG, FORMAT_FLAG, INPUT_FLAG, RESET_TIMESTAMPS_FLAG, RTSP_TRANSPORT_FLAG,
    SEGMENT_TIME_FLAG, VIDEO_CODEC_FLAG,
};
pub use output::forward_merged;
pub use stats::{WorkerStats, WorkerStatus};
pub use worker::{ensure_dir, RecordingWorker, DEFAULT_PROGRAM};
