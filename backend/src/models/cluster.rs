//! Cluster model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A named group of database nodes.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct Cluster {
    pub id: i32,
    pub name: String,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// Writable cluster fields (create and full update).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct ClusterInput {
    pub name: String,
}

/// Admin search over clusters.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct ClusterFilter {
    /// Matches the cluster name
    pub q: Option<String>,
}

impl ClusterFilter {
    pub fn matches(&self, cluster: &Cluster) -> bool {
        match self.q.as_deref() {
            Some(term) if !term.is_empty() => super::matches_term(&cluster.name, term),
            _ => true,
        }
    }
}
