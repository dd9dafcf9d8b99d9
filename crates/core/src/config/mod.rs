//! Configuration loader for the three JSON documents that drive the
//! system: category metadata, field mappings, and UI settings.
//!
//! Loading never fails. A missing, malformed, or schema-invalid document
//! is replaced wholesale by its built-in default, and the reason is kept
//! as a diagnostic on the returned [`Loaded`] value.

pub mod defaults;
mod health;
mod loader;
pub mod model;

pub use health::{CheckStatus, ConfigHealth, HealthCheck, HealthStatus};
pub use loader::{ConfigManager, ConfigSource, DocumentStatus, Loaded};
pub use model::{CategoryConfig, CategorySet, FieldDefinition, FieldsConfig, UiConfig};

/// The three configuration documents.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum ConfigKind {
    Categories,
    Fields,
    Ui,
}

impl ConfigKind {
    pub const ALL: [ConfigKind; 3] = [Self::Categories, Self::Fields, Self::Ui];

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Categories => "categories",
            Self::Fields => "fields",
            Self::Ui => "ui",
        }
    }

    /// File name inside the configuration directory.
    pub fn file_name(self) -> String {
        format!("{}.json", self.as_str())
    }

    /// File name of the optional JSON Schema inside `schemas/`.
    pub fn schema_file_name(self) -> String {
        format!("{}-schema.json", self.as_str())
    }

    /// Built-in document used as the fallback, in its on-disk shape.
    pub fn default_document(self) -> serde_json::Value {
        match self {
            Self::Categories => serde_json::json!({ "categories": defaults::categories() }),
            Self::Fields => serde_json::json!(defaults::fields()),
            Self::Ui => serde_json::json!({ "ui": defaults::ui() }),
        }
    }
}

impl std::fmt::Display for ConfigKind {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}
