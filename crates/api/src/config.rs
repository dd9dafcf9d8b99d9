use std::path::PathBuf;

/// Server configuration loaded from environment variables.
///
/// All fields have defaults suitable for local development.
#[derive(Debug, Clone)]
pub struct ServerConfig {
    /// Bind address (default: `0.0.0.0`).
    pub host: String,
    /// Bind port (default: `5000`).
    pub port: u16,
    /// Allowed CORS origins, parsed from comma-separated `CORS_ORIGINS` env var.
    pub cors_origins: Vec<String>,
    /// HTTP request timeout in seconds (default: `30`).
    pub request_timeout_secs: u64,
    pub database_url: String,
    /// Directory holding `categories.json`, `fields.json`, `ui.json`.
    pub config_dir: PathBuf,
    pub csv_path: PathBuf,
    /// Persisted validation rules document.
    pub validation_schema_path: PathBuf,
    pub backup_dir: PathBuf,
    /// Refuse to persist a batch with validation errors.
    pub strict_validation: bool,
    /// Back up the CSV before every load.
    pub backup_before_load: bool,
}

impl ServerConfig {
    /// Load configuration from environment variables with defaults.
    ///
    /// | Env Var                  | Default                  |
    /// |--------------------------|--------------------------|
    /// | `HOST`                   | `0.0.0.0`                |
    /// | `PORT`                   | `5000`                   |
    /// | `CORS_ORIGINS`           | `http://localhost:5000`  |
    /// | `REQUEST_TIMEOUT_SECS`   | `30`                     |
    /// | `DATABASE_URL`           | `sqlite://database.db`   |
    /// | `CONFIG_DIR`             | `config`                 |
    /// | `CSV_PATH`               | `data/items.csv`         |
    /// | `VALIDATION_SCHEMA_PATH` | `data/validation.json`   |
    /// | `BACKUP_DIR`             | `backups`                |
    /// | `STRICT_VALIDATION`      | `false`                  |
    /// | `BACKUP_BEFORE_LOAD`     | `true`                   |
    pub fn from_env() -> Self {
        let host = env_or("HOST", "0.0.0.0");

        let port: u16 = env_or("PORT", "5000")
            .parse()
            .expect("PORT must be a valid u16");

        let cors_origins: Vec<String> = env_or("CORS_ORIGINS", "http://localhost:5000")
            .split(',')
            .map(|s| s.trim().to_string())
            .filter(|s| !s.is_empty())
            .collect();

        let request_timeout_secs: u64 = env_or("REQUEST_TIMEOUT_SECS", "30")
            .parse()
            .expect("REQUEST_TIMEOUT_SECS must be a valid u64");

        Self {
            host,
            port,
            cors_origins,
            request_timeout_secs,
            database_url: env_or("DATABASE_URL", "sqlite://database.db"),
            config_dir: env_or("CONFIG_DIR", "config").into(),
            csv_path: env_or("CSV_PATH", "data/items.csv").into(),
            validation_schema_path: env_or("VALIDATION_SCHEMA_PATH", "data/validation.json").into(),
            backup_dir: env_or("BACKUP_DIR", "backups").into(),
            strict_validation: env_flag("STRICT_VALIDATION", false),
            backup_before_load: env_flag("BACKUP_BEFORE_LOAD", true),
        }
    }
}

fn env_or(key: &str, default: &str) -> String {
    std::env::var(key).unwrap_or_else(|_| default.into())
}

/// `1`, `true`, `yes` and `on` (any case) are true; anything else set is
/// false; unset uses `default`.
fn env_flag(key: &str, default: bool) -> bool {
    match std::env::var(key) {
        Ok(value) => matches!(
            value.trim().to_ascii_lowercase().as_str(),
            "1" | "true" | "yes" | "on"
        ),
        Err(_) => default,
    }
}
