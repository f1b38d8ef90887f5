use crate::recording::DEFAULT_PROGRAM;
use crate::relay::DEFAULT_RELAY_SCRIPT;
use crate::supervisor::SupervisorSettings;
use anyhow::Result;
use serde::Deserialize;
use std::path::PathBuf;

#[derive(Debug, Default, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub recorder: RecorderConfig,
    #[serde(default)]
    pub relay: RelayConfig,
    #[serde(default)]
    pub sources: SourcesConfig,
}

#[derive(Debug, Deserialize)]
pub struct RecorderConfig {
    #[serde(default = "default_program")]
    pub program: String,
    #[serde(default = "default_working_dir")]
    pub working_dir: PathBuf,
    #[serde(default)]
    pub reserve_relay_slot: bool,
}

#[derive(Debug, Deserialize)]
pub struct RelayConfig {
    #[serde(default = "default_relay_script")]
    pub script: PathBuf,
}

#[derive(Debug, Deserialize)]
pub struct SourcesConfig {
    #[serde(default = "default_sources_path")]
    pub path: PathBuf,
}

impl Default for RecorderConfig {
    fn default() -> Self {
        Self {
            program: default_program(),
            working_dir: default_working_dir(),
            reserve_relay_slot: false,
        }
    }
}

impl Default for RelayConfig {
    fn default() -> Self {
        Self {
            script: default_relay_script(),
        }
    }
}

impl Default for SourcesConfig {
    fn default() -> Self {
        Self {
            path: default_sources_path(),
        }
    }
}

fn default_program() -> String {
    DEFAULT_PROGRAM.to_string()
}

fn default_working_dir() -> PathBuf {
    PathBuf::from(".")
}

fn default_relay_script() -> PathBuf {
    PathBuf::from(DEFAULT_RELAY_SCRIPT)
}

fn default_sources_path() -> PathBuf {
    PathBuf::from("info.json")
}

impl Config {
    /// Load settings from `path` (extension optional, file may be absent),
    /// then apply `CAMSYNC__SECTION__KEY` environment overrides
    pub fn load(path: &str) -> Result<Self> {
        let settings = config::Config::builder()
            .add_source(config::File::with_name(path).required(false))
            .add_source(config::Environment::with_prefix("CAMSYNC").separator("__"))
            .build()?;

        Ok(settings.try_deserialize()?)
    }

    pub fn supervisor_settings(&self) -> SupervisorSettings {
        SupervisorSettings {
            program: self.recorder.program.clone(),
            working_dir: self.recorder.working_dir.clone(),
            relay_script: self.relay.script.clone(),
            reserve_relay_slot: self.recorder.reserve_relay_slot,
        }
    }
}
