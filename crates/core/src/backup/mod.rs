//! Backup and retention management.
//!
//! Layout under the backup root:
//!
//! ```text
//! <root>/
//!   data/ config/ database/ full_system/   payloads + <name>_metadata.json
//!   backup_index.json                      every record, newest first
//!   retention_policy.json
//!   .last_cleanup                          mtime = last retention run
//! ```
//!
//! The index is read-modify-written without cross-process locking; two
//! processes backing up at once can lose an index update.

pub mod policy;
pub mod record;

use std::fs;
use std::io;
use std::path::{Path, PathBuf};

use chrono::{DateTime, Utc};

pub use policy::RetentionPolicy;
pub use record::{
    BackupIndex, BackupRecord, BackupStatistics, BackupType, CleanupReport, FileKind,
    RetentionCategory,
};

use crate::error::CoreError;
use crate::hashing::sha256_file;
use crate::types::Timestamp;
use record::{bytes_to_mb, format_bytes, metadata_path_for};

const INDEX_FILE: &str = "backup_index.json";
const POLICY_FILE: &str = "retention_policy.json";
const CLEANUP_MARKER: &str = ".last_cleanup";

/// Minimum time between automatic retention runs.
const AUTO_CLEANUP_INTERVAL_DAYS: i64 = 1;

pub struct BackupManager {
    backup_dir: PathBuf,
}

impl BackupManager {
    pub fn new(backup_dir: impl Into<PathBuf>) -> Self {
        Self {
            backup_dir: backup_dir.into(),
        }
    }

    pub fn backup_dir(&self) -> &Path {
        &self.backup_dir
    }

    fn index_path(&self) -> PathBuf {
        self.backup_dir.join(INDEX_FILE)
    }

    fn policy_path(&self) -> PathBuf {
        self.backup_dir.join(POLICY_FILE)
    }

    fn marker_path(&self) -> PathBuf {
        self.backup_dir.join(CLEANUP_MARKER)
    }

    /// Create the directory layout and a default retention policy if none
    /// exists. Safe to call repeatedly.
    pub fn setup(&self) -> Result<(), CoreError> {
        for backup_type in BackupType::ALL {
            let dir = self.backup_dir.join(backup_type.as_str());
            fs::create_dir_all(&dir).map_err(|e| CoreError::io(&dir, e))?;
        }

        let policy_path = self.policy_path();
        if !policy_path.exists() {
            write_json(&policy_path, &RetentionPolicy::default())?;
            tracing::info!(path = %policy_path.display(), "Created default retention policy");
        }
        Ok(())
    }

    /// The persisted policy, or the default when there is none.
    pub fn policy(&self) -> Result<RetentionPolicy, CoreError> {
        let path = self.policy_path();
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                CoreError::Validation(format!("Invalid retention policy {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(RetentionPolicy::default()),
            Err(e) => Err(CoreError::io(path, e)),
        }
    }

    // -----------------------------------------------------------------------
    // Creating backups
    // -----------------------------------------------------------------------

    pub fn backup(
        &self,
        source: &Path,
        backup_type: BackupType,
        description: Option<&str>,
    ) -> Result<PathBuf, CoreError> {
        self.backup_at(source, backup_type, description, Utc::now())
    }

    /// Copy `source` into the `backup_type` subdirectory as of `now`.
    ///
    /// Fails with [`CoreError::NotFound`] when `source` does not exist. An
    /// automatic retention run afterwards is logged on failure and never
    /// fails the backup.
    pub fn backup_at(
        &self,
        source: &Path,
        backup_type: BackupType,
        description: Option<&str>,
        now: Timestamp,
    ) -> Result<PathBuf, CoreError> {
        if !source.exists() {
            return Err(CoreError::NotFound {
                entity: "BackupSource",
                id: source.display().to_string(),
            });
        }
        self.setup()?;

        let stamp = now.format("%Y%m%d_%H%M%S_%6f").to_string();
        let source_name = source
            .file_name()
            .map(|n| n.to_string_lossy().into_owned())
            .unwrap_or_else(|| "root".to_string());
        let backup_name = format!("{backup_type}_{source_name}_{stamp}");
        let backup_path = self.backup_dir.join(backup_type.as_str()).join(&backup_name);

        let (file_type, size_bytes, checksum) = if source.is_file() {
            fs::copy(source, &backup_path).map_err(|e| CoreError::io(source, e))?;
            let size = fs::metadata(&backup_path)
                .map_err(|e| CoreError::io(&backup_path, e))?
                .len();
            let checksum = sha256_file(&backup_path).map_err(|e| CoreError::io(&backup_path, e))?;
            (FileKind::File, size, Some(checksum))
        } else {
            copy_dir_all(source, &backup_path)?;
            (FileKind::Directory, dir_size(&backup_path), None)
        };

        let record = BackupRecord {
            backup_id: format!("{backup_type}_{stamp}"),
            source_path: fs::canonicalize(source).unwrap_or_else(|_| source.to_path_buf()),
            backup_path: backup_path.clone(),
            backup_type,
            file_type,
            created_at: now,
            size_bytes,
            size_mb: bytes_to_mb(size_bytes),
            description: description
                .map(str::to_string)
                .unwrap_or_else(|| format!("Automatic {backup_type} backup")),
            retention_category: RetentionCategory::for_date(now.date_naive()),
            checksum,
        };

        write_json(&record.metadata_path(), &record)?;
        self.append_to_index(record, now)?;

        tracing::info!(
            path = %backup_path.display(),
            size = %format_bytes(size_bytes),
            "Created backup"
        );

        // The backup is already indexed; retention problems must not fail it.
        match self.auto_cleanup(now) {
            Ok(Some(report)) => {
                tracing::info!(removed = report.files_removed, "Automatic backup cleanup ran");
            }
            Ok(None) => {}
            Err(e) => tracing::warn!(error = %e, "Automatic backup cleanup failed"),
        }
        Ok(backup_path)
    }

    /// A `data` backup taken before `path` is replaced.
    pub fn pre_update_backup(&self, path: &Path, description: Option<&str>) -> Result<PathBuf, CoreError> {
        let default_description;
        let description = match description {
            Some(d) => d,
            None => {
                let name = path
                    .file_name()
                    .map(|n| n.to_string_lossy().into_owned())
                    .unwrap_or_default();
                default_description = format!("Pre-update backup of {name}");
                &default_description
            }
        };
        self.backup(path, BackupType::Data, Some(description))
    }

    // -----------------------------------------------------------------------
    // Index
    // -----------------------------------------------------------------------

    fn read_index(&self) -> Result<BackupIndex, CoreError> {
        let path = self.index_path();
        match fs::read_to_string(&path) {
            Ok(text) => serde_json::from_str(&text).map_err(|e| {
                CoreError::Validation(format!("Invalid backup index {}: {e}", path.display()))
            }),
            Err(e) if e.kind() == io::ErrorKind::NotFound => Ok(BackupIndex::default()),
            Err(e) => Err(CoreError::io(path, e)),
        }
    }

    fn write_index(&self, index: &BackupIndex) -> Result<(), CoreError> {
        write_json(&self.index_path(), index)
    }

    fn append_to_index(&self, record: BackupRecord, now: Timestamp) -> Result<(), CoreError> {
        let mut index = self.read_index()?;
        index.backups.push(record);
        index.last_updated = Some(now);
        index.sort_newest_first();
        self.write_index(&index)
    }

    /// All indexed backups, newest first.
    pub fn list(&self) -> Result<Vec<BackupRecord>, CoreError> {
        let mut index = self.read_index()?;
        index.sort_newest_first();
        Ok(index.backups)
    }

    // -----------------------------------------------------------------------
    // Retention
    // -----------------------------------------------------------------------

    fn last_cleanup(&self) -> Option<Timestamp> {
        fs::metadata(self.marker_path())
            .and_then(|m| m.modified())
            .ok()
            .map(DateTime::<Utc>::from)
    }

    fn should_auto_cleanup(&self, now: Timestamp) -> Result<bool, CoreError> {
        let policy = self.policy()?;
        if !policy.auto_cleanup_enabled {
            return Ok(false);
        }
        if let Some(last) = self.last_cleanup() {
            if (now - last).num_days() < AUTO_CLEANUP_INTERVAL_DAYS {
                return Ok(false);
            }
        }
        Ok(dir_size(&self.backup_dir) > policy.max_backup_size_bytes())
    }

    fn auto_cleanup(&self, now: Timestamp) -> Result<Option<CleanupReport>, CoreError> {
        if self.should_auto_cleanup(now)? {
            self.cleanup_at(now).map(Some)
        } else {
            Ok(None)
        }
    }

    pub fn cleanup(&self) -> Result<CleanupReport, CoreError> {
        self.cleanup_at(Utc::now())
    }

    /// Remove every indexed backup older than its retention threshold at
    /// `now`. A failure on one entry is recorded and the rest carry on;
    /// failed entries stay in the index.
    pub fn cleanup_at(&self, now: Timestamp) -> Result<CleanupReport, CoreError> {
        let policy = self.policy()?;
        let mut index = self.read_index()?;
        let mut report = CleanupReport::default();

        let mut kept = Vec::with_capacity(index.backups.len());
        for record in std::mem::take(&mut index.backups) {
            if !policy.is_expired(&record, now) {
                kept.push(record);
                continue;
            }
            match remove_backup(&record) {
                Ok(payload_removed) => {
                    if payload_removed {
                        report.files_removed += 1;
                        report.space_freed += record.size_bytes;
                    }
                    tracing::info!(backup = %record.backup_id, "Removed expired backup");
                }
                Err(e) => {
                    tracing::error!(backup = %record.backup_id, error = %e, "Failed to remove backup");
                    report.errors.push(format!("{}: {e}", record.backup_path.display()));
                    kept.push(record);
                }
            }
        }

        index.backups = kept;
        index.last_updated = Some(now);
        self.write_index(&index)?;

        let marker = self.marker_path();
        fs::create_dir_all(&self.backup_dir).map_err(|e| CoreError::io(&self.backup_dir, e))?;
        fs::write(&marker, now.to_rfc3339()).map_err(|e| CoreError::io(&marker, e))?;

        tracing::info!(
            removed = report.files_removed,
            freed = %format_bytes(report.space_freed),
            errors = report.errors.len(),
            "Backup cleanup completed"
        );
        Ok(report)
    }

    pub fn statistics(&self) -> Result<BackupStatistics, CoreError> {
        let index = self.read_index()?;
        let mut stats = BackupStatistics {
            total_backups: index.backups.len(),
            last_cleanup: self.last_cleanup(),
            ..BackupStatistics::default()
        };

        for record in &index.backups {
            stats.total_size_bytes += record.size_bytes;
            *stats
                .backup_types
                .entry(record.backup_type.as_str().to_string())
                .or_default() += 1;
            *stats
                .retention_categories
                .entry(record.retention_category.as_str().to_string())
                .or_default() += 1;
            stats.oldest_backup = Some(match stats.oldest_backup {
                Some(oldest) => oldest.min(record.created_at),
                None => record.created_at,
            });
            stats.newest_backup = Some(match stats.newest_backup {
                Some(newest) => newest.max(record.created_at),
                None => record.created_at,
            });
        }
        stats.total_size_mb = bytes_to_mb(stats.total_size_bytes);
        Ok(stats)
    }

    // -----------------------------------------------------------------------
    // Restore
    // -----------------------------------------------------------------------

    /// Copy a backup back to `target`. An existing target directory is
    /// replaced; an existing target file is overwritten.
    pub fn restore(&self, backup_path: &Path, target: &Path) -> Result<(), CoreError> {
        if !backup_path.exists() {
            return Err(CoreError::NotFound {
                entity: "Backup",
                id: backup_path.display().to_string(),
            });
        }
        if let Some(parent) = target.parent().filter(|p| !p.as_os_str().is_empty()) {
            fs::create_dir_all(parent).map_err(|e| CoreError::io(parent, e))?;
        }

        if backup_path.is_file() {
            fs::copy(backup_path, target).map_err(|e| CoreError::io(target, e))?;
        } else {
            if target.is_dir() {
                fs::remove_dir_all(target).map_err(|e| CoreError::io(target, e))?;
            }
            copy_dir_all(backup_path, target)?;
        }
        tracing::info!(from = %backup_path.display(), to = %target.display(), "Restored backup");
        Ok(())
    }
}

// ---------------------------------------------------------------------------
// Filesystem helpers
// ---------------------------------------------------------------------------

fn write_json<T: serde::Serialize>(path: &Path, value: &T) -> Result<(), CoreError> {
    let text = serde_json::to_string_pretty(value)
        .map_err(|e| CoreError::Internal(format!("Failed to serialize {}: {e}", path.display())))?;
    fs::write(path, text).map_err(|e| CoreError::io(path, e))
}

fn copy_dir_all(from: &Path, to: &Path) -> Result<(), CoreError> {
    fs::create_dir_all(to).map_err(|e| CoreError::io(to, e))?;
    for entry in fs::read_dir(from).map_err(|e| CoreError::io(from, e))? {
        let entry = entry.map_err(|e| CoreError::io(from, e))?;
        let src = entry.path();
        let dst = to.join(entry.file_name());
        if src.is_dir() {
            copy_dir_all(&src, &dst)?;
        } else {
            fs::copy(&src, &dst).map_err(|e| CoreError::io(&src, e))?;
        }
    }
    Ok(())
}

/// Total size of the files under `path`. Unreadable entries count as zero.
fn dir_size(path: &Path) -> u64 {
    let Ok(entries) = fs::read_dir(path) else {
        return 0;
    };
    entries
        .filter_map(Result::ok)
        .map(|entry| {
            let path = entry.path();
            if path.is_dir() {
                dir_size(&path)
            } else {
                entry.metadata().map(|m| m.len()).unwrap_or(0)
            }
        })
        .sum()
}

/// Delete a backup's sidecar, then its payload. Returns whether a payload
/// was present.
///
/// On error the caller keeps the index entry, so the payload of a kept
/// entry is never already gone.
fn remove_backup(record: &BackupRecord) -> io::Result<bool> {
    let path = &record.backup_path;
    let metadata = metadata_path_for(path);
    if metadata.exists() {
        fs::remove_file(metadata)?;
    }

    if path.is_dir() {
        fs::remove_dir_all(path)?;
        Ok(true)
    } else if path.exists() {
        fs::remove_file(path)?;
        Ok(true)
    } else {
        Ok(false)
    }
}
