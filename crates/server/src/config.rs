use std::{collections::HashMap, fs};

use toml::Value;
use tracing::warn;

pub const DEFAULT_CORS_ORIGINS: &str =
    "https://leoprolder.github.io,http://localhost,http://127.0.0.1";

#[derive(Debug, Clone)]
pub struct Settings {
    pub server_bind: String,
    pub universe_size: usize,
    pub cors_origins: Vec<String>,
    pub max_body_bytes: usize,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_bind: "127.0.0.1:5000".into(),
            universe_size: 1_000_000,
            cors_origins: split_origins(DEFAULT_CORS_ORIGINS),
            max_body_bytes: 16 * 1024 * 1024,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `server.toml`, then environment variables.
pub fn load_settings() -> Settings {
    let file = fs::read_to_string("server.toml").ok();
    load_settings_from(file.as_deref(), |name| std::env::var(name).ok())
}

pub(crate) fn load_settings_from(
    file: Option<&str>,
    env: impl Fn(&str) -> Option<String>,
) -> Settings {
    let mut settings = Settings::default();

    if let Some(raw) = file {
        match toml::from_str::<HashMap<String, Value>>(raw) {
            Ok(file_cfg) => apply_file(&mut settings, &file_cfg),
            Err(error) => warn!(%error, "ignoring malformed server.toml"),
        }
    }

    if let Some(port) = env("PORT") {
        settings.server_bind = format!("0.0.0.0:{}", port.trim());
    }
    if let Some(v) = env("SERVER_BIND") {
        settings.server_bind = v;
    }
    if let Some(v) = env("APP__BIND_ADDR") {
        settings.server_bind = v;
    }

    if let Some(v) = env("APP__UNIVERSE_SIZE") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.universe_size = parsed;
        }
    }

    if let Some(v) = env("APP__CORS_ORIGINS") {
        settings.cors_origins = split_origins(&v);
    }

    if let Some(v) = env("APP__MAX_BODY_BYTES") {
        if let Ok(parsed) = v.trim().parse::<usize>() {
            settings.max_body_bytes = parsed;
        }
    }

    if let Some(v) = env("APP__LOG_FILTER") {
        settings.log_filter = v;
    }

    settings
}

fn apply_file(settings: &mut Settings, file_cfg: &HashMap<String, Value>) {
    if let Some(v) = file_cfg.get("bind_addr").and_then(Value::as_str) {
        settings.server_bind = v.to_string();
    }
    if let Some(v) = file_cfg.get("universe_size").and_then(as_usize) {
        settings.universe_size = v;
    }
    if let Some(v) = file_cfg.get("cors_origins").and_then(Value::as_str) {
        settings.cors_origins = split_origins(v);
    }
    if let Some(v) = file_cfg.get("max_body_bytes").and_then(as_usize) {
        settings.max_body_bytes = v;
    }
    if let Some(v) = file_cfg.get("log_filter").and_then(Value::as_str) {
        settings.log_filter = v.to_string();
    }
}

/// Accepts both `key = 10` and `key = "10"`.
fn as_usize(value: &Value) -> Option<usize> {
    match value {
        Value::Integer(n) => usize::try_from(*n).ok(),
        Value::String(s) => s.trim().parse().ok(),
        _ => None,
    }
}

fn split_origins(raw: &str) -> Vec<String> {
    raw.split(',')
        .map(str::trim)
        .filter(|origin| !origin.is_empty())
        .map(str::to_string)
        .collect()
}

#[cfg(test)]
#[path = "tests/config_tests.rs"]
mod tests;
