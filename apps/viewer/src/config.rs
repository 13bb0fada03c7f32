use std::{fs, path::Path};

use client_core::{controller::DEFAULT_PAGE_SIZE, query::DEFAULT_MAX_QUERY_SIZE};
use tracing::warn;

pub const DEFAULT_CONFIG_PATH: &str = "viewer.toml";

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Settings {
    pub server_url: String,
    pub endpoint: String,
    pub max_query_size: u64,
    pub page_size: u64,
    pub log_filter: String,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            server_url: "http://localhost:8001".into(),
            endpoint: "v6/Default".into(),
            max_query_size: DEFAULT_MAX_QUERY_SIZE,
            page_size: DEFAULT_PAGE_SIZE,
            log_filter: "info".into(),
        }
    }
}

/// Defaults, then `path` if it exists, then the environment.
pub fn load_settings(path: &Path) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string(path) {
        apply_file(&mut settings, &raw);
    }
    apply_env(&mut settings, |key| std::env::var(key).ok());

    settings
}

fn apply_file(settings: &mut Settings, raw: &str) {
    let table = match toml::from_str::<toml::Table>(raw) {
        Ok(table) => table,
        Err(err) => {
            warn!(%err, "ignoring unreadable settings file");
            return;
        }
    };
    let value = |key: &str| match table.get(key)? {
        toml::Value::String(v) => Some(v.clone()),
        toml::Value::Integer(v) => Some(v.to_string()),
        _ => None,
    };

    if let Some(v) = value("server_url") {
        settings.server_url = v;
    }
    if let Some(v) = value("endpoint") {
        settings.endpoint = v;
    }
    if let Some(v) = value("max_query_size").and_then(|v| v.parse().ok()) {
        settings.max_query_size = v;
    }
    if let Some(v) = value("page_size").and_then(|v| v.parse().ok()) {
        settings.page_size = v;
    }
    if let Some(v) = value("log_filter") {
        settings.log_filter = v;
    }
}

fn apply_env(settings: &mut Settings, var: impl Fn(&str) -> Option<String>) {
    if let Some(v) = var("VIEWER_SERVER_URL") {
        settings.server_url = v;
    }
    if let Some(v) = var("APP__SERVER_URL") {
        settings.server_url = v;
    }

    if let Some(v) = var("APP__ENDPOINT") {
        settings.endpoint = v;
    }

    if let Some(v) = var("APP__MAX_QUERY_SIZE") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.max_query_size = parsed;
        }
    }
    if let Some(v) = var("APP__PAGE_SIZE") {
        if let Ok(parsed) = v.parse::<u64>() {
            settings.page_size = parsed;
        }
    }

    if let Some(v) = var("RUST_LOG") {
        settings.log_filter = v;
    }
}
