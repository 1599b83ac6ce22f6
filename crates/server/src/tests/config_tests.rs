use super::*;

use std::collections::HashMap;

fn env(pairs: &[(&str, &str)]) -> impl Fn(&str) -> Option<String> {
    let map: HashMap<String, String> = pairs
        .iter()
        .map(|(k, v)| (k.to_string(), v.to_string()))
        .collect();
    move |key: &str| map.get(key).cloned()
}

#[test]
fn defaults_match_relay_base_url() {
    let settings = Settings::default();
    assert_eq!(settings.server_bind, "127.0.0.1:8080");
    assert_eq!(settings.logseq_bin, "logseq");
    assert_eq!(settings.command_timeout_seconds, 30);
}

#[test]
fn file_values_override_defaults() {
    let mut settings = Settings::default();
    settings
        .apply_file(
            r#"
bind_addr = "0.0.0.0:9000"
logseq_bin = "/opt/homebrew/bin/logseq"
command_timeout_seconds = 10
"#,
        )
        .expect("toml");
    assert_eq!(settings.server_bind, "0.0.0.0:9000");
    assert_eq!(settings.logseq_bin, "/opt/homebrew/bin/logseq");
    assert_eq!(settings.jet_bin, "jet");
    assert_eq!(settings.command_timeout_seconds, 10);
}

#[test]
fn invalid_file_is_an_error() {
    let mut settings = Settings::default();
    assert!(settings.apply_file("bind_addr = ").is_err());
}

#[test]
fn prefixed_env_wins_over_short_names() {
    let mut settings = Settings::default();
    settings.apply_env(env(&[
        ("SERVER_BIND", "127.0.0.1:9001"),
        ("APP__BIND_ADDR", "127.0.0.1:9002"),
        ("JET_BIN", "/usr/local/bin/jet"),
        ("APP__COMMAND_TIMEOUT_SECONDS", "5"),
    ]));
    assert_eq!(settings.server_bind, "127.0.0.1:9002");
    assert_eq!(settings.jet_bin, "/usr/local/bin/jet");
    assert_eq!(settings.command_timeout_seconds, 5);
}

#[test]
fn unparsable_timeout_is_ignored() {
    let mut settings = Settings::default();
    settings.apply_env(env(&[("APP__COMMAND_TIMEOUT_SECONDS", "soon")]));
    assert_eq!(settings.command_timeout_seconds, 30);
}

#[test]
fn cli_host_and_port_replace_bind_parts() {
    let settings = Settings::default();
    assert_eq!(settings.bind_addr(None, None), "127.0.0.1:8080");
    assert_eq!(settings.bind_addr(Some("localhost"), None), "localhost:8080");
    assert_eq!(settings.bind_addr(None, Some(8765)), "127.0.0.1:8765");
    assert_eq!(
        settings.bind_addr(Some("0.0.0.0"), Some(1)),
        "0.0.0.0:1"
    );
}

#[test]
fn runner_uses_configured_binaries() {
    let mut settings = Settings::default();
    settings.command_timeout_seconds = 7;
    let runner = settings.runner();
    assert_eq!(runner.logseq_bin, std::path::PathBuf::from("logseq"));
    assert_eq!(runner.timeout, Duration::from_secs(7));
}
