use super::config::{
    Address, Credentials, RelayTarget, SourceConfig, StreamQuality, DEFAULT_TRANSPORT,
};
use crate::error::ConfigError;
use serde::Deserialize;
use std::collections::HashSet;
use std::path::Path;
use tracing::info;

/// A source record exactly as it appears in `info.json`
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawSource {
    name: String,
    user: String,
    password: String,
    ip: String,
    port: i64,
    stream: String,
    video_codec: Option<String>,
    audio_codec: Option<String>,
    format: Option<String>,
    segment_time: Option<Scalar>,
    #[serde(rename = "resetTimeStamps")]
    reset_timestamps: Option<Scalar>,
    #[serde(rename = "RTSPTransport")]
    rtsp_transport: Option<String>,
    #[serde(rename = "cloneRTSPStream", alias = "relayTarget")]
    relay_target: Option<RawRelayTarget>,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
struct RawRelayTarget {
    #[serde(default)]
    output_endpoints: Vec<String>,
    clone_transport: Option<String>,
}

/// Numeric settings show up both quoted and unquoted in the wild
#[derive(Debug, Deserialize)]
#[serde(untagged)]
enum Scalar {
    Bool(bool),
    Int(i64),
    Text(String),
}

/// Read and validate the source list at `path`
pub fn load_sources(path: impl AsRef<Path>) -> Result<Vec<SourceConfig>, ConfigError> {
    let path = path.as_ref();
    let json = std::fs::read_to_string(path).map_err(|source| ConfigError::Read {
        path: path.to_path_buf(),
        source,
    })?;

    let sources = parse_sources(&json)?;
    info!("Loaded {} source(s) from {}", sources.len(), path.display());
    Ok(sources)
}

/// Parse and validate a JSON array of source records
pub fn parse_sources(json: &str) -> Result<Vec<SourceConfig>, ConfigError> {
    let raw: Vec<RawSource> = serde_json::from_str(json)?;

    let sources = raw
        .into_iter()
        .enumerate()
        .map(|(index, raw)| convert(index, raw))
        .collect::<Result<Vec<_>, _>>()?;

    validate_sources(&sources)?;
    Ok(sources)
}

/// Set-level checks: at least one source and no shared names
pub fn validate_sources(sources: &[SourceConfig]) -> Result<(), ConfigError> {
    if sources.is_empty() {
        return Err(ConfigError::NoSources);
    }

    let mut seen = HashSet::new();
    for source in sources {
        if !seen.insert(source.name.as_str()) {
            return Err(ConfigError::DuplicateName(source.name.clone()));
        }
    }

    Ok(())
}

fn convert(index: usize, raw: RawSource) -> Result<SourceConfig, ConfigError> {
    require(index, "name", &raw.name)?;
    require(index, "user", &raw.user)?;
    require(index, "password", &raw.password)?;
    require(index, "ip", &raw.ip)?;

    let name = raw.name;
    if name.contains(['/', '\\']) || name == "." || name == ".." {
        return Err(ConfigError::InvalidValue {
            name,
            reason: "name must be a single directory name".to_string(),
        });
    }

    let port = match u16::try_from(raw.port) {
        Ok(port) if port > 0 => port,
        _ => return Err(ConfigError::InvalidPort { name }),
    };

    let quality: StreamQuality = raw
        .stream
        .parse()
        .map_err(|value| ConfigError::InvalidStream {
            name: name.clone(),
            value,
        })?;

    let mut source = SourceConfig::new(
        name,
        Credentials {
            user: raw.user,
            password: raw.password,
        },
        Address {
            host: raw.ip,
            port,
        },
        quality,
    );

    if let Some(codec) = raw.video_codec {
        source.video_codec = codec;
    }
    if let Some(codec) = raw.audio_codec {
        source.audio_codec = codec;
    }
    if let Some(format) = raw.format {
        source.container_format = format;
    }
    if let Some(transport) = raw.rtsp_transport {
        source.transport = transport;
    }
    if let Some(segment) = raw.segment_time {
        source.segment_duration_secs = segment_secs(&source.name, segment)?;
    }
    if let Some(reset) = raw.reset_timestamps {
        source.reset_timestamps = reset_flag(&source.name, reset)?;
    }

    if let Some(relay) = raw.relay_target {
        if relay.output_endpoints.is_empty() {
            return Err(ConfigError::EmptyEndpoints { name: source.name });
        }
        if relay.output_endpoints.iter().any(|e| e.trim().is_empty()) {
            return Err(ConfigError::InvalidValue {
                name: source.name,
                reason: "relay output endpoints must not be empty".to_string(),
            });
        }
        source.relay_target = Some(RelayTarget {
            output_endpoints: relay.output_endpoints,
            transport: relay
                .clone_transport
                .unwrap_or_else(|| DEFAULT_TRANSPORT.to_string()),
        });
    }

    Ok(source)
}

fn require(index: usize, field: &'static str, value: &str) -> Result<(), ConfigError> {
    if value.trim().is_empty() {
        return Err(ConfigError::EmptyField { index, field });
    }
    Ok(())
}

fn segment_secs(name: &str, value: Scalar) -> Result<u32, ConfigError> {
    let secs = match value {
        Scalar::Int(n) => u32::try_from(n).ok(),
        Scalar::Text(s) => s.trim().parse::<u32>().ok(),
        Scalar::Bool(_) => None,
    };

    match secs {
        Some(secs) if secs > 0 => Ok(secs),
        _ => Err(ConfigError::InvalidValue {
            name: name.to_string(),
            reason: "segmentTime must be a positive number of seconds".to_string(),
        }),
    }
}

fn reset_flag(name: &str, value: Scalar) -> Result<bool, ConfigError> {
    match value {
        Scalar::Bool(b) => Ok(b),
        Scalar::Int(0) => Ok(false),
        Scalar::Int(1) => Ok(true),
        Scalar::Text(s) => match s.trim() {
            "0" | "false" => Ok(false),
            "1" | "true" => Ok(true),
            _ => Err(invalid_reset(name)),
        },
        Scalar::Int(_) => Err(invalid_reset(name)),
    }
}

fn invalid_reset(name: &str) -> ConfigError {
    ConfigError::InvalidValue {
        name: name.to_string(),
        reason: "resetTimeStamps must be 0 or 1".to_string(),
    }
}
