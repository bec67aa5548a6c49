//! Backup metadata models (SQLx).
//!
//! The schema is owned by the backup-producing system; column names follow
//! its tables (`cbm_cluster`, `cbm_node`, `cbm_backup`) and are aliased to the
//! field names below in every query.

pub mod backup;
pub mod cluster;
pub mod node;

pub use backup::{Backup, BackupFilter, BackupInput, BackupListing};
pub use cluster::{Cluster, ClusterFilter, ClusterInput};
pub use node::{Node, NodeFilter, NodeInput, NodeListing};

use serde::Serialize;
use utoipa::ToSchema;

/// Rows removed by an administrative delete, including cascaded children.
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize, ToSchema)]
pub struct CascadeSummary {
    pub clusters: u64,
    pub nodes: u64,
    pub backups: u64,
}

/// Case-insensitive substring match used by admin search on every store.
pub(crate) fn matches_term(value: &str, term: &str) -> bool {
    value.to_lowercase().contains(&term.to_lowercase())
}
