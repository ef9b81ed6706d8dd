// tests/logging_filter.rs

use torchbear::cli::LogLevel;
use torchbear::logging::build_filter;

#[test]
fn cli_level_wins_over_environment() {
    assert!(build_filter(Some(LogLevel::Debug), Some("torchbear=nonsense")).is_ok());
}

#[test]
fn environment_accepts_directive_lists() {
    assert!(build_filter(None, Some("info,torchbear::event=trace")).is_ok());
    assert!(build_filter(None, Some("  ")).is_ok());
    assert!(build_filter(None, None).is_ok());
}

#[test]
fn invalid_environment_value_is_reported() {
    let err = build_filter(None, Some("torchbear=nonsense")).unwrap_err();
    assert!(err.to_string().contains("TORCHBEAR_LOG"));
}

#[test]
fn levels_map_to_directives() {
    assert_eq!(LogLevel::Warn.as_directive(), "warn");
    assert_eq!(LogLevel::Trace.as_directive(), "trace");
}
