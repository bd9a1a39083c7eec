#![forbid(unsafe_code)]

//! Loading `ReflowConfig` from files on disk.
//!
//! Run:
//!   cargo test -p tilegrid-runtime --features reflow-config --test reflow_config_files

use std::io::Write;
use std::time::Duration;

use tilegrid_core::style::Easing;
use tilegrid_runtime::{ReflowConfig, ReflowConfigError};

fn write_temp(suffix: &str, contents: &str) -> tempfile::NamedTempFile {
    let mut file = tempfile::Builder::new()
        .suffix(suffix)
        .tempfile()
        .expect("create temp file");
    file.write_all(contents.as_bytes()).expect("write temp file");
    file
}

#[test]
fn toml_file_overrides_defaults() {
    let file = write_temp(
        ".toml",
        r#"
long_press_ms = 450
move_duration_ms = 250
easing = "ease-out"
"#,
    );
    let config = ReflowConfig::from_toml_file(file.path()).unwrap();
    assert_eq!(config.long_press(), Duration::from_millis(450));
    assert_eq!(config.move_duration(), Duration::from_millis(250));
    assert_eq!(config.easing, Easing::EaseOut);
}

#[test]
fn json_file_overrides_defaults() {
    let file = write_temp(".json", r#"{ "long_press_ms": 300, "easing": "linear" }"#);
    let config = ReflowConfig::from_json_file(file.path()).unwrap();
    assert_eq!(config.long_press_ms, 300);
    assert_eq!(config.move_duration_ms, 300);
    assert_eq!(config.easing, Easing::Linear);
}

#[test]
fn empty_toml_is_default() {
    let file = write_temp(".toml", "");
    assert_eq!(
        ReflowConfig::from_toml_file(file.path()).unwrap(),
        ReflowConfig::default()
    );
}

#[test]
fn missing_file_is_io_error() {
    let dir = tempfile::tempdir().unwrap();
    let err = ReflowConfig::from_toml_file(dir.path().join("absent.toml")).unwrap_err();
    assert!(matches!(err, ReflowConfigError::Io(_)));
}

#[test]
fn malformed_toml_is_parse_error() {
    let file = write_temp(".toml", "long_press_ms = \"soon\"\n");
    let err = ReflowConfig::from_toml_file(file.path()).unwrap_err();
    assert!(matches!(err, ReflowConfigError::Parse { format: "TOML", .. }));
    assert!(err.to_string().starts_with("TOML parse error"));
}

#[test]
fn invalid_values_fail_validation() {
    let file = write_temp(".json", r#"{ "move_duration_ms": 0 }"#);
    let err = ReflowConfig::from_json_file(file.path()).unwrap_err();
    match err {
        ReflowConfigError::Validation(problems) => {
            assert_eq!(problems, vec!["move_duration_ms must be > 0".to_string()]);
        }
        other => panic!("expected validation error, got {other:?}"),
    }
}

#[test]
fn config_round_trips_through_toml() {
    let config = ReflowConfig::default()
        .with_long_press(Duration::from_millis(700))
        .with_easing(Easing::EaseIn);
    let text = toml::to_string(&config).unwrap();
    assert!(text.contains("easing = \"ease-in\""));
    assert_eq!(ReflowConfig::from_toml_str(&text).unwrap(), config);
}
