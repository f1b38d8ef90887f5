//! Video source configuration
//!
//! This module provides:
//! - `SourceConfig`, the immutable per-camera record
//! - the JSON loader for the source list, with validation

mod config;
mod loader;

pub use config::{
    Address, Credentials, RelayTarget, SourceConfig, StreamQuality, DEFAULT_AUDIO_CODEC,
    DEFAULT_CONTAINER_FORMAT, DEFAULT_RESET_TIMESTAMPS, DEFAULT_SEGMENT_SECS, DEFAULT_TRANSPORT,
    DEFAULT_VIDEO_CODEC,
};
pub use loader::{load_sources, parse_sources, validate_sources};
