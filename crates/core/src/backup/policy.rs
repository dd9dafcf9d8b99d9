//! Retention policy (`retention_policy.json`).

use serde::{Deserialize, Serialize};

use super::record::{BackupRecord, RetentionCategory};
use crate::types::Timestamp;

fn default_keep_days() -> i64 {
    7
}

fn default_keep_weeks() -> i64 {
    4
}

fn default_keep_months() -> i64 {
    12
}

fn default_max_size_mb() -> u64 {
    1000
}

fn default_true() -> bool {
    true
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct DailyRule {
    #[serde(default = "default_keep_days")]
    pub keep_days: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct WeeklyRule {
    #[serde(default = "default_keep_weeks")]
    pub keep_weeks: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct MonthlyRule {
    #[serde(default = "default_keep_months")]
    pub keep_months: i64,
    #[serde(default)]
    pub description: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionRules {
    #[serde(default)]
    pub daily_backups: DailyRule,
    #[serde(default)]
    pub weekly_backups: WeeklyRule,
    #[serde(default)]
    pub monthly_backups: MonthlyRule,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct RetentionPolicy {
    #[serde(default)]
    pub retention_rules: RetentionRules,
    #[serde(default = "default_max_size_mb")]
    pub max_backup_size_mb: u64,
    #[serde(default = "default_true")]
    pub auto_cleanup_enabled: bool,
}

impl Default for DailyRule {
    fn default() -> Self {
        Self {
            keep_days: default_keep_days(),
            description: "Keep daily backups for 7 days".into(),
        }
    }
}

impl Default for WeeklyRule {
    fn default() -> Self {
        Self {
            keep_weeks: default_keep_weeks(),
            description: "Keep weekly backups for 4 weeks".into(),
        }
    }
}

impl Default for MonthlyRule {
    fn default() -> Self {
        Self {
            keep_months: default_keep_months(),
            description: "Keep monthly backups for 12 months".into(),
        }
    }
}

impl Default for RetentionRules {
    fn default() -> Self {
        Self {
            daily_backups: DailyRule::default(),
            weekly_backups: WeeklyRule::default(),
            monthly_backups: MonthlyRule::default(),
        }
    }
}

impl Default for RetentionPolicy {
    fn default() -> Self {
        Self {
            retention_rules: RetentionRules::default(),
            max_backup_size_mb: default_max_size_mb(),
            auto_cleanup_enabled: true,
        }
    }
}

impl RetentionPolicy {
    /// Age in days after which a backup of `category` is removed. Weeks
    /// and months are counted as 7 and 30 days.
    pub fn threshold_days(&self, category: RetentionCategory) -> i64 {
        let rules = &self.retention_rules;
        match category {
            RetentionCategory::Daily => rules.daily_backups.keep_days,
            RetentionCategory::Weekly => rules.weekly_backups.keep_weeks * 7,
            RetentionCategory::Monthly => rules.monthly_backups.keep_months * 30,
        }
    }

    /// Whether `record`, aged in whole days at `now`, exceeds its threshold.
    pub fn is_expired(&self, record: &BackupRecord, now: Timestamp) -> bool {
        let age_days = (now - record.created_at).num_days();
        age_days > self.threshold_days(record.retention_category)
    }

    pub fn max_backup_size_bytes(&self) -> u64 {
        self.max_backup_size_mb.saturating_mul(1024 * 1024)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[test]
    fn thresholds_scale_weeks_and_months() {
        let policy = RetentionPolicy::default();
        assert_eq!(policy.threshold_days(RetentionCategory::Daily), 7);
        assert_eq!(policy.threshold_days(RetentionCategory::Weekly), 28);
        assert_eq!(policy.threshold_days(RetentionCategory::Monthly), 360);
    }

    #[test]
    fn partial_policy_fills_defaults() {
        let policy: RetentionPolicy = serde_json::from_value(json!({
            "retention_rules": {"daily_backups": {"keep_days": 2}},
            "auto_cleanup_enabled": false
        }))
        .unwrap();
        assert_eq!(policy.retention_rules.daily_backups.keep_days, 2);
        assert_eq!(policy.retention_rules.weekly_backups.keep_weeks, 4);
        assert_eq!(policy.max_backup_size_mb, 1000);
        assert!(!policy.auto_cleanup_enabled);
    }
}
