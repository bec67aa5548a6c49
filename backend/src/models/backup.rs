//! Backup model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A completed or in-progress backup of one node.
///
/// `end_time` stays empty while the backup is running. Status values are
/// written by the backup-producing system ("success", "failed", "running").
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct Backup {
    pub id: i32,
    pub node_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub backup_path: String,
    pub status: String,
    /// Raw size in bytes
    pub backup_size: Option<i64>,
    /// Compressed size in bytes
    pub compressed_size: Option<i64>,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A backup together with the name of the node it belongs to.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct BackupListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub backup: Backup,
    pub node_name: String,
}

/// Writable backup fields (create and full update).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct BackupInput {
    pub node_id: i32,
    pub start_time: DateTime<Utc>,
    pub end_time: Option<DateTime<Utc>>,
    pub backup_path: String,
    pub status: String,
    pub backup_size: Option<i64>,
    pub compressed_size: Option<i64>,
}

/// Admin search and date filters over backups.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct BackupFilter {
    /// Matches backup path or status
    pub q: Option<String>,
    pub node_id: Option<i32>,
    pub start_from: Option<DateTime<Utc>>,
    pub start_to: Option<DateTime<Utc>>,
    pub end_from: Option<DateTime<Utc>>,
    pub end_to: Option<DateTime<Utc>>,
}

impl BackupFilter {
    pub fn matches(&self, backup: &Backup) -> bool {
        if self.node_id.is_some_and(|id| backup.node_id != id) {
            return false;
        }
        if self.start_from.is_some_and(|t| backup.start_time < t)
            || self.start_to.is_some_and(|t| backup.start_time > t)
        {
            return false;
        }
        // An end-time bound excludes backups that have not finished yet.
        if let Some(from) = self.end_from {
            if !backup.end_time.is_some_and(|end| end >= from) {
                return false;
            }
        }
        if let Some(to) = self.end_to {
            if !backup.end_time.is_some_and(|end| end <= to) {
                return false;
            }
        }
        match self.q.as_deref() {
            Some(term) if !term.is_empty() => {
                super::matches_term(&backup.backup_path, term)
                    || super::matches_term(&backup.status, term)
            }
            _ => true,
        }
    }
}
