//! Configuration health check.

use std::fs;

use indexmap::IndexMap;
use serde::Serialize;

use super::{ConfigKind, ConfigManager};

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum HealthStatus {
    Healthy,
    Degraded,
    Unhealthy,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize)]
#[serde(rename_all = "lowercase")]
pub enum CheckStatus {
    Ok,
    Warning,
    Error,
}

#[derive(Debug, Clone, Serialize)]
pub struct HealthCheck {
    pub status: CheckStatus,
    pub message: String,
}

#[derive(Debug, Clone, Serialize)]
pub struct ConfigHealth {
    pub overall_status: HealthStatus,
    pub checks: IndexMap<String, HealthCheck>,
    pub issues: Vec<String>,
}

impl ConfigHealth {
    fn push(&mut self, name: impl Into<String>, status: CheckStatus, message: impl Into<String>) {
        let message = message.into();
        if status != CheckStatus::Ok {
            self.issues.push(message.clone());
        }
        self.checks.insert(name.into(), HealthCheck { status, message });
    }

    fn finish(mut self) -> Self {
        let worst = self.checks.values().map(|c| c.status).max().unwrap_or(CheckStatus::Ok);
        self.overall_status = match worst {
            CheckStatus::Error => HealthStatus::Unhealthy,
            CheckStatus::Warning => HealthStatus::Degraded,
            CheckStatus::Ok => HealthStatus::Healthy,
        };
        self
    }
}

impl ConfigManager {
    /// Inspect the configuration directory without touching the cache.
    ///
    /// A missing directory or a malformed document is an error; a missing
    /// document or a missing `schemas/` or `examples/` directory is a warning.
    pub fn health_check(&self) -> ConfigHealth {
        let mut health = ConfigHealth {
            overall_status: HealthStatus::Healthy,
            checks: IndexMap::new(),
            issues: Vec::new(),
        };

        let dir = self.config_dir();
        if !dir.is_dir() {
            health.push(
                "config_directory",
                CheckStatus::Error,
                format!("Configuration directory {} does not exist", dir.display()),
            );
            return health.finish();
        }
        health.push("config_directory", CheckStatus::Ok, "Configuration directory exists");

        for kind in ConfigKind::ALL {
            let path = dir.join(kind.file_name());
            let check = format!("{kind}_config");
            match fs::read_to_string(&path) {
                Err(_) if !path.exists() => health.push(
                    check,
                    CheckStatus::Warning,
                    format!("{} is missing, defaults are in use", kind.file_name()),
                ),
                Err(e) => health.push(
                    check,
                    CheckStatus::Error,
                    format!("{} cannot be read: {e}", kind.file_name()),
                ),
                Ok(text) => match serde_json::from_str::<serde_json::Value>(&text) {
                    Ok(_) => health.push(check, CheckStatus::Ok, format!("{} is valid", kind.file_name())),
                    Err(e) => health.push(
                        check,
                        CheckStatus::Error,
                        format!("{} is malformed: {e}", kind.file_name()),
                    ),
                },
            }
        }

        for (check, path) in [
            ("schemas_directory", self.schemas_dir()),
            ("examples_directory", self.examples_dir()),
        ] {
            if path.is_dir() {
                health.push(check, CheckStatus::Ok, format!("{} exists", path.display()));
            } else {
                health.push(check, CheckStatus::Warning, format!("{} is missing", path.display()));
            }
        }

        health.finish()
    }
}
