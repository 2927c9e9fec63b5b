use std::{fs, path::Path};

use client_core::{AskMode, DEFAULT_BACKEND_URL};
use shared::domain::clamp_temperature;
use tracing::warn;

pub const DEFAULT_CONFIG_FILE: &str = "qa-chat.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub mode: AskMode,
    pub temperature: u8,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: DEFAULT_BACKEND_URL.into(),
            mode: AskMode::SourceScoped,
            temperature: 0,
        }
    }
}

/// Defaults, then the config file (if readable), then the process
/// environment. CLI flags are applied by the caller on top.
pub fn load_settings(config_path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(config_path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let table = match raw.parse::<toml::Table>() {
        Ok(table) => table,
        Err(err) => {
            warn!(error = %err, "ignoring unparseable config file");
            return;
        }
    };

    let get = |key: &str| -> Option<String> {
        match table.get(key)? {
            toml::Value::String(v) => Some(v.clone()),
            toml::Value::Integer(v) => Some(v.to_string()),
            _ => None,
        }
    };

    if let Some(v) = get("server_url") {
        settings.server_url = v;
    }
    if let Some(mode) = get("mode").as_deref().and_then(parse_mode) {
        settings.mode = mode;
    }
    if let Some(temperature) = get("temperature").as_deref().and_then(parse_temperature) {
        settings.temperature = temperature;
    }
}

fn apply_env(settings: &mut Settings, lookup: impl Fn(&str) -> Option<String>) {
    if let Some(v) = lookup("QA_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = lookup("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(mode) = lookup("APP__MODE").as_deref().and_then(parse_mode) {
        settings.mode = mode;
    }

    if let Some(temperature) = lookup("APP__TEMPERATURE")
        .as_deref()
        .and_then(parse_temperature)
    {
        settings.temperature = temperature;
    }
}

pub fn parse_mode(raw: &str) -> Option<AskMode> {
    match raw.trim().to_ascii_lowercase().as_str() {
        "single" | "single_question" => Some(AskMode::SingleQuestion),
        "sources" | "source_scoped" => Some(AskMode::SourceScoped),
        _ => None,
    }
}

pub fn parse_temperature(raw: &str) -> Option<u8> {
    raw.trim().parse::<i64>().ok().map(clamp_temperature)
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
