use std::{fs, path::Path, time::Duration};

use anyhow::Context;
use serde::Deserialize;

use crate::api::LogseqCli;

#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct Settings {
    pub server_bind: String,
    pub logseq_bin: String,
    pub jet_bin: String,
    pub command_timeout_seconds: u64,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:8080".into(),
            logseq_bin: "logseq".into(),
            jet_bin: "jet".into(),
            command_timeout_seconds: 30,
        }
    }
}

pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = Path::new("server.toml");
    if path.exists() {
        let raw = fs::read_to_string(path)
            .with_context(|| format!("failed to read '{}'", path.display()))?;
        settings.apply_file(&raw)?;
    }
    settings.apply_env(|key| std::env::var(key).ok());

    Ok(settings)
}

impl Settings {
    pub(crate) fn apply_file(&mut self, raw: &str) -> anyhow::Result<()> {
        let table: toml::Table = toml::from_str(raw).context("server.toml is not valid TOML")?;

        if let Some(v) = table.get("bind_addr").and_then(|v| v.as_str()) {
            self.server_bind = v.to_string();
        }
        if let Some(v) = table.get("logseq_bin").and_then(|v| v.as_str()) {
            self.logseq_bin = v.to_string();
        }
        if let Some(v) = table.get("jet_bin").and_then(|v| v.as_str()) {
            self.jet_bin = v.to_string();
        }
        if let Some(v) = table
            .get("command_timeout_seconds")
            .and_then(|v| v.as_integer())
            .and_then(|v| u64::try_from(v).ok())
        {
            self.command_timeout_seconds = v;
        }
        Ok(())
    }

    /// Environment overrides; `APP__*` names win over the short names.
    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["SERVER_BIND", "APP__BIND_ADDR"] {
            if let Some(v) = lookup(key) {
                self.server_bind = v;
            }
        }
        for key in ["LOGSEQ_BIN", "APP__LOGSEQ_BIN"] {
            if let Some(v) = lookup(key) {
                self.logseq_bin = v;
            }
        }
        for key in ["JET_BIN", "APP__JET_BIN"] {
            if let Some(v) = lookup(key) {
                self.jet_bin = v;
            }
        }
        if let Some(parsed) = lookup("APP__COMMAND_TIMEOUT_SECONDS").and_then(|v| v.parse().ok()) {
            self.command_timeout_seconds = parsed;
        }
    }

    /// Bind address after `--host` / `--port` overrides.
    pub fn bind_addr(&self, host: Option<&str>, port: Option<u16>) -> String {
        let (default_host, default_port) = match self.server_bind.rsplit_once(':') {
            Some((host, port)) => (host, port.to_string()),
            None => (self.server_bind.as_str(), String::from("8080")),
        };
        let host = host.unwrap_or(default_host);
        let port = port.map(|p| p.to_string()).unwrap_or(default_port);
        format!("{host}:{port}")
    }

    pub fn runner(&self) -> LogseqCli {
        LogseqCli {
            logseq_bin: self.logseq_bin.clone().into(),
            jet_bin: self.jet_bin.clone().into(),
            timeout: Duration::from_secs(self.command_timeout_seconds),
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
