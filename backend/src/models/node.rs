//! Node model.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use utoipa::ToSchema;

/// A single database instance belonging to a cluster.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct Node {
    pub id: i32,
    pub cluster_id: i32,
    pub name: String,
    /// Database engine, free text (e.g. "postgres", "mysql")
    pub db_type: String,
    pub port: i32,
    pub inserted_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

/// A node together with the name of its owning cluster.
#[derive(Debug, Clone, PartialEq, Eq, FromRow, Serialize, ToSchema)]
pub struct NodeListing {
    #[sqlx(flatten)]
    #[serde(flatten)]
    pub node: Node,
    pub cluster_name: String,
}

/// Writable node fields (create and full update).
#[derive(Debug, Clone, Deserialize, ToSchema)]
pub struct NodeInput {
    pub cluster_id: i32,
    pub name: String,
    pub db_type: String,
    pub port: i32,
}

/// Admin search over nodes.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct NodeFilter {
    /// Matches node name, engine type or port
    pub q: Option<String>,
    pub cluster_id: Option<i32>,
}

impl NodeFilter {
    pub fn matches(&self, node: &Node) -> bool {
        if let Some(cluster_id) = self.cluster_id {
            if node.cluster_id != cluster_id {
                return false;
            }
        }
        match self.q.as_deref() {
            Some(term) if !term.is_empty() => {
                super::matches_term(&node.name, term)
                    || super::matches_term(&node.db_type, term)
                    || super::matches_term(&node.port.to_string(), term)
            }
            _ => true,
        }
    }
}
