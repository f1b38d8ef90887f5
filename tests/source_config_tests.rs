// Tests for loading the camera source list
//
// These tests verify that info.json records are turned into validated
// SourceConfig values, with defaults applied and bad input rejected before
// anything is launched.

use anyhow::Result;
use camsync::source::{
    load_sources, parse_sources, validate_sources, Address, Credentials, SourceConfig,
    StreamQuality,
};
use camsync::ConfigError;
use std::fs;
use tempfile::TempDir;

fn camera(name: &str) -> SourceConfig {
    SourceConfig::new(
        name,
        Credentials {
            user: "admin".to_string(),
            password: "secret".to_string(),
        },
        Address {
            host: "192.168.1.50".to_string(),
            port: 554,
        },
        StreamQuality::High,
    )
}

#[test]
fn test_minimal_record_gets_defaults() -> Result<()> {
    let json = r#"[
        {
            "name": "jardin-trasero",
            "user": "admin",
            "password": "xxxxxx",
            "ip": "192.168.1.50",
            "port": 554,
            "stream": "stream1"
        }
    ]"#;

    let sources = parse_sources(json)?;
    assert_eq!(sources.len(), 1);

    let source = &sources[0];
    assert_eq!(source.name, "jardin-trasero");
    assert_eq!(source.quality, StreamQuality::High);
    assert_eq!(source.video_codec, "libx264");
    assert_eq!(source.audio_codec, "aac");
    assert_eq!(source.container_format, "segment");
    assert_eq!(source.segment_duration_secs, 300);
    assert!(source.reset_timestamps);
    assert_eq!(source.transport, "tcp");
    assert!(source.relay_target.is_none());

    Ok(())
}

#[test]
fn test_optional_fields_override_defaults() -> Result<()> {
    let json = r#"[
        {
            "name": "porch",
            "user": "u",
            "password": "p",
            "ip": "10.0.0.7",
            "port": 8554,
            "stream": "STREAM2",
            "videoCodec": "copy",
            "audioCodec": "libopus",
            "format": "segment",
            "segmentTime": 5,
            "resetTimeStamps": "0",
            "RTSPTransport": "udp"
        }
    ]"#;

    let source = &parse_sources(json)?[0];

    assert_eq!(source.quality, StreamQuality::Low, "stream match is case-insensitive");
    assert_eq!(source.video_codec, "copy");
    assert_eq!(source.audio_codec, "libopus");
    assert_eq!(source.segment_duration_secs, 5);
    assert!(!source.reset_timestamps);
    assert_eq!(source.transport, "udp");

    Ok(())
}

#[test]
fn test_clone_block_becomes_relay_target() -> Result<()> {
    let json = r#"[
        {
            "name": "garage",
            "user": "u",
            "password": "p",
            "ip": "10.0.0.8",
            "port": 554,
            "stream": "stream1",
            "cloneRTSPStream": {
                "outputEndpoints": ["cam1", "cam2"],
                "cloneTransport": "udp"
            }
        }
    ]"#;

    let source = &parse_sources(json)?[0];
    let relay = source.relay_target.as_ref().expect("relay target should be set");

    assert_eq!(relay.output_endpoints, vec!["cam1", "cam2"]);
    assert_eq!(relay.transport, "udp");

    Ok(())
}

#[test]
fn test_relay_target_alias_and_default_transport() -> Result<()> {
    let json = r#"[
        {
            "name": "garage",
            "user": "u",
            "password": "p",
            "ip": "10.0.0.8",
            "port": 554,
            "stream": "stream1",
            "relayTarget": { "outputEndpoints": ["mirror"] }
        }
    ]"#;

    let relay = parse_sources(json)?[0].relay_target.clone().unwrap();
    assert_eq!(relay.transport, "tcp");

    Ok(())
}

#[test]
fn test_empty_relay_endpoints_rejected() {
    let json = r#"[
        {
            "name": "garage", "user": "u", "password": "p",
            "ip": "10.0.0.8", "port": 554, "stream": "stream1",
            "cloneRTSPStream": { "outputEndpoints": [] }
        }
    ]"#;

    assert!(matches!(
        parse_sources(json),
        Err(ConfigError::EmptyEndpoints { .. })
    ));
}

#[test]
fn test_missing_required_field_rejected() {
    let json = r#"[{ "name": "porch", "user": "u", "ip": "10.0.0.7", "port": 554, "stream": "stream1" }]"#;

    assert!(matches!(parse_sources(json), Err(ConfigError::Parse(_))));
}

#[test]
fn test_blank_credentials_rejected() {
    let json = r#"[{ "name": "porch", "user": "  ", "password": "p", "ip": "10.0.0.7", "port": 554, "stream": "stream1" }]"#;

    match parse_sources(json) {
        Err(ConfigError::EmptyField { index, field }) => {
            assert_eq!(index, 0);
            assert_eq!(field, "user");
        }
        other => panic!("expected EmptyField, got {:?}", other),
    }
}

#[test]
fn test_invalid_port_rejected() {
    for port in ["0", "-1", "70000"] {
        let json = format!(
            r#"[{{ "name": "porch", "user": "u", "password": "p", "ip": "10.0.0.7", "port": {}, "stream": "stream1" }}]"#,
            port
        );
        assert!(
            matches!(parse_sources(&json), Err(ConfigError::InvalidPort { .. })),
            "port {} should be rejected",
            port
        );
    }
}

#[test]
fn test_unknown_stream_rejected() {
    let json = r#"[{ "name": "porch", "user": "u", "password": "p", "ip": "10.0.0.7", "port": 554, "stream": "stream3" }]"#;

    assert!(matches!(
        parse_sources(json),
        Err(ConfigError::InvalidStream { .. })
    ));
}

#[test]
fn test_name_must_be_a_directory_name() {
    let json = r#"[{ "name": "../etc", "user": "u", "password": "p", "ip": "10.0.0.7", "port": 554, "stream": "stream1" }]"#;

    assert!(matches!(
        parse_sources(json),
        Err(ConfigError::InvalidValue { .. })
    ));
}

#[test]
fn test_duplicate_names_rejected() {
    let json = r#"[
        { "name": "porch", "user": "u", "password": "p", "ip": "10.0.0.7", "port": 554, "stream": "stream1" },
        { "name": "porch", "user": "u", "password": "p", "ip": "10.0.0.9", "port": 554, "stream": "stream2" }
    ]"#;

    match parse_sources(json) {
        Err(ConfigError::DuplicateName(name)) => assert_eq!(name, "porch"),
        other => panic!("expected DuplicateName, got {:?}", other),
    }
}

#[test]
fn test_validate_sources_set_rules() {
    assert!(matches!(validate_sources(&[]), Err(ConfigError::NoSources)));
    assert!(validate_sources(&[camera("a"), camera("b")]).is_ok());
    assert!(matches!(
        validate_sources(&[camera("a"), camera("a")]),
        Err(ConfigError::DuplicateName(_))
    ));
}

#[test]
fn test_load_sources_from_file() -> Result<()> {
    let temp_dir = TempDir::new()?;
    let path = temp_dir.path().join("info.json");
    fs::write(
        &path,
        r#"[{ "name": "porch", "user": "u", "password": "p", "ip": "10.0.0.7", "port": 554, "stream": "stream2", "segmentTime": "60" }]"#,
    )?;

    let sources = load_sources(&path)?;
    assert_eq!(sources[0].segment_duration_secs, 60);

    Ok(())
}

#[test]
fn test_load_sources_missing_file() {
    let result = load_sources("/definitely/not/here/info.json");
    assert!(matches!(result, Err(ConfigError::Read { .. })));
}

#[test]
fn test_stream_quality_paths() {
    assert_eq!(StreamQuality::High.path(), "stream1");
    assert_eq!(StreamQuality::Low.path(), "stream2");
    assert_eq!("Stream1".parse::<StreamQuality>(), Ok(StreamQuality::High));
    assert!("high".parse::<StreamQuality>().is_err());
}
