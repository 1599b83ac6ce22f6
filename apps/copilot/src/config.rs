use std::{fs, path::Path};

use anyhow::Context;
use relay::DEFAULT_BASE_URL;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_BASE_URL.into(),
        }
    }
}

/// Defaults, then `copilot.toml`, then environment; `--server-url` is applied
/// by the caller.
pub fn load_settings() -> anyhow::Result<Settings> {
    let mut settings = Settings::default();

    let path = Path::new("copilot.toml");
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
        let table: toml::Table = toml::from_str(raw).context("copilot.toml is not valid TOML")?;
        if let Some(v) = table.get("server_url").and_then(|v| v.as_str()) {
            self.server_url = v.to_string();
        }
        Ok(())
    }

    pub(crate) fn apply_env(&mut self, lookup: impl Fn(&str) -> Option<String>) {
        for key in ["COPILOT_SERVER_URL", "APP__SERVER_URL"] {
            if let Some(v) = lookup(key).filter(|v| !v.trim().is_empty()) {
                self.server_url = v;
            }
        }
    }
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
