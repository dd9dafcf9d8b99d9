//! Backup records, index, and report types.

use std::path::PathBuf;
use std::str::FromStr;

use chrono::{Datelike, NaiveDate, Weekday};
use indexmap::IndexMap;
use serde::{Deserialize, Serialize};

use crate::error::CoreError;
use crate::types::Timestamp;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BackupType {
    Data,
    Config,
    Database,
    FullSystem,
}

impl BackupType {
    pub const ALL: [BackupType; 4] = [Self::Data, Self::Config, Self::Database, Self::FullSystem];

    /// Also the subdirectory name under the backup root.
    pub fn as_str(self) -> &'static str {
        match self {
            Self::Data => "data",
            Self::Config => "config",
            Self::Database => "database",
            Self::FullSystem => "full_system",
        }
    }
}

impl FromStr for BackupType {
    type Err = CoreError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        Self::ALL
            .into_iter()
            .find(|t| t.as_str() == s)
            .ok_or_else(|| {
                CoreError::Validation(format!(
                    "Invalid backup type '{s}'. Must be one of: data, config, database, full_system"
                ))
            })
    }
}

impl std::fmt::Display for BackupType {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum FileKind {
    File,
    Directory,
}

/// Bucket that decides how long a backup is kept.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum RetentionCategory {
    Daily,
    Weekly,
    Monthly,
}

impl RetentionCategory {
    /// The 1st of the month is monthly, a Sunday is weekly, anything else
    /// is daily.
    pub fn for_date(date: NaiveDate) -> Self {
        if date.day() == 1 {
            Self::Monthly
        } else if date.weekday() == Weekday::Sun {
            Self::Weekly
        } else {
            Self::Daily
        }
    }

    pub fn as_str(self) -> &'static str {
        match self {
            Self::Daily => "daily",
            Self::Weekly => "weekly",
            Self::Monthly => "monthly",
        }
    }
}

/// Metadata for one backup, stored both as a sidecar file and in the index.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct BackupRecord {
    pub backup_id: String,
    pub source_path: PathBuf,
    pub backup_path: PathBuf,
    pub backup_type: BackupType,
    pub file_type: FileKind,
    pub created_at: Timestamp,
    pub size_bytes: u64,
    pub size_mb: f64,
    pub description: String,
    pub retention_category: RetentionCategory,
    /// SHA-256 of the payload; directories have none.
    pub checksum: Option<String>,
}

impl BackupRecord {
    /// Path of the `<name>_metadata.json` sidecar next to the payload.
    pub fn metadata_path(&self) -> PathBuf {
        metadata_path_for(&self.backup_path)
    }
}

pub(crate) fn metadata_path_for(backup_path: &std::path::Path) -> PathBuf {
    let name = backup_path
        .file_name()
        .map(|n| n.to_string_lossy().into_owned())
        .unwrap_or_default();
    backup_path.with_file_name(format!("{name}_metadata.json"))
}

/// `backup_index.json`: all known backups, newest first.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
pub struct BackupIndex {
    #[serde(default)]
    pub backups: Vec<BackupRecord>,
    #[serde(default)]
    pub last_updated: Option<Timestamp>,
}

impl BackupIndex {
    pub fn sort_newest_first(&mut self) {
        self.backups.sort_by(|a, b| b.created_at.cmp(&a.created_at));
    }
}

/// Outcome of a retention run.
#[derive(Debug, Clone, Default, PartialEq, Serialize)]
pub struct CleanupReport {
    pub files_removed: usize,
    /// Bytes of the removed payloads, as recorded in the index.
    pub space_freed: u64,
    pub errors: Vec<String>,
}

#[derive(Debug, Clone, Default, Serialize)]
pub struct BackupStatistics {
    pub total_backups: usize,
    pub total_size_bytes: u64,
    pub total_size_mb: f64,
    pub backup_types: IndexMap<String, usize>,
    pub retention_categories: IndexMap<String, usize>,
    pub oldest_backup: Option<Timestamp>,
    pub newest_backup: Option<Timestamp>,
    pub last_cleanup: Option<Timestamp>,
}

/// Megabytes rounded to two decimals.
pub fn bytes_to_mb(bytes: u64) -> f64 {
    (bytes as f64 / (1024.0 * 1024.0) * 100.0).round() / 100.0
}

/// Human-readable byte formatting.
pub fn format_bytes(bytes: u64) -> String {
    const KB: f64 = 1024.0;
    const MB: f64 = KB * 1024.0;
    const GB: f64 = MB * 1024.0;

    let b = bytes as f64;
    if b >= GB {
        format!("{:.2} GB", b / GB)
    } else if b >= MB {
        format!("{:.2} MB", b / MB)
    } else if b >= KB {
        format!("{:.2} KB", b / KB)
    } else {
        format!("{bytes} B")
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn retention_category_from_date() {
        let first = NaiveDate::from_ymd_opt(2024, 9, 1).unwrap(); // a Sunday
        let sunday = NaiveDate::from_ymd_opt(2024, 9, 8).unwrap();
        let monday = NaiveDate::from_ymd_opt(2024, 9, 9).unwrap();
        assert_eq!(RetentionCategory::for_date(first), RetentionCategory::Monthly);
        assert_eq!(RetentionCategory::for_date(sunday), RetentionCategory::Weekly);
        assert_eq!(RetentionCategory::for_date(monday), RetentionCategory::Daily);
    }

    #[test]
    fn backup_type_parses_known_names() {
        assert_eq!("full_system".parse::<BackupType>().unwrap(), BackupType::FullSystem);
        assert!("snapshot".parse::<BackupType>().is_err());
    }

    #[test]
    fn metadata_path_sits_next_to_payload() {
        let path = metadata_path_for(std::path::Path::new("/b/data/data_items.csv_20240101"));
        assert_eq!(path, PathBuf::from("/b/data/data_items.csv_20240101_metadata.json"));
    }

    #[test]
    fn byte_formatting() {
        assert_eq!(format_bytes(512), "512 B");
        assert_eq!(format_bytes(1_048_576), "1.00 MB");
        assert_eq!(bytes_to_mb(1_572_864), 1.5);
    }
}
