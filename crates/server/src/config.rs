use std::collections::HashMap;
use std::fs;
use std::path::PathBuf;

use clap::Parser;

/// Effective server configuration: defaults, overridden by `server.toml`,
/// overridden by environment, overridden by CLI flags.
#[derive(Debug, Clone)]
pub struct Settings {
    pub bind_addr: String,
    pub database_url: String,
    /// Adds a fixed 500ms of latency to every request so the loading
    /// indicator and the send-error toast can be watched by hand.
    pub debug_delay: bool,
}

impl Default for Settings {
    fn default() -> Self {
        Self {
            bind_addr: "[::1]:3000".into(),
            database_url: "sqlite://./data/items.db".into(),
            debug_delay: false,
        }
    }
}

#[derive(Debug, Parser)]
#[command(author, version, about, long_about = None)]
pub struct Opts {
    #[arg(long, short)]
    pub listen: Option<String>,

    #[arg(long)]
    pub db: Option<PathBuf>,

    #[arg(long)]
    pub debug_delay: bool,
}

pub fn load_settings(opts: &Opts) -> Settings {
    let mut settings = Settings::default();

    if let Ok(raw) = fs::read_to_string("server.toml") {
        if let Ok(file_cfg) = toml::from_str::<HashMap<String, String>>(&raw) {
            if let Some(v) = file_cfg.get("bind_addr") {
                settings.bind_addr = v.clone();
            }
            if let Some(v) = file_cfg.get("database_url") {
                settings.database_url = v.clone();
            }
        }
    }

    if let Ok(v) = std::env::var("SERVER_BIND") {
        settings.bind_addr = v;
    }
    if let Ok(v) = std::env::var("APP__BIND_ADDR") {
        settings.bind_addr = v;
    }

    if let Ok(v) = std::env::var("DATABASE_URL") {
        settings.database_url = v;
    }
    if let Ok(v) = std::env::var("APP__DATABASE_URL") {
        settings.database_url = v;
    }

    if std::env::var("APP__DEBUG_DELAY").is_ok_and(|v| v == "1" || v == "true") {
        settings.debug_delay = true;
    }

    if let Some(listen) = &opts.listen {
        settings.bind_addr = listen.clone();
    }
    if let Some(db) = &opts.db {
        settings.database_url = db.to_string_lossy().into_owned();
    }
    if opts.debug_delay {
        settings.debug_delay = true;
    }

    settings.database_url = normalize_database_url(&settings.database_url);

    settings
}

pub fn normalize_database_url(raw_database_url: &str) -> String {
    let raw_database_url = raw_database_url.trim();

    if raw_database_url.is_empty() {
        return Settings::default().database_url;
    }

    if raw_database_url.starts_with("sqlite::memory:")
        || raw_database_url.starts_with("sqlite://")
        || raw_database_url.contains("://")
    {
        return raw_database_url.to_string();
    }

    if let Some(path) = raw_database_url.strip_prefix("sqlite:") {
        let path = path.replace('\\', "/");
        return format!("sqlite://{path}");
    }

    format!("sqlite://{}", raw_database_url.replace('\\', "/"))
}
