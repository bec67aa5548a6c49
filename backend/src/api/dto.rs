//! Request and response bodies for the admin API.
//!
//! Query structs list every field explicitly; `serde(flatten)` does not mix
//! with numeric fields in URL-encoded queries.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use utoipa::{IntoParams, ToSchema};

use crate::models::{
    Backup, BackupFilter, CascadeSummary, Cluster, ClusterFilter, Node, NodeFilter,
};
use crate::presentation::Pagination;

/// Default page size for admin lists.
pub const ADMIN_PAGE_SIZE: u32 = 50;

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct ClusterSearchQuery {
    /// Case-insensitive substring of the cluster name
    pub q: Option<String>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl ClusterSearchQuery {
    pub fn filter(&self) -> ClusterFilter {
        ClusterFilter { q: self.q.clone() }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct NodeSearchQuery {
    /// Case-insensitive substring of node name, engine type or port
    pub q: Option<String>,
    pub cluster_id: Option<i32>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl NodeSearchQuery {
    pub fn filter(&self) -> NodeFilter {
        NodeFilter {
            q: self.q.clone(),
            cluster_id: self.cluster_id,
        }
    }
}

#[derive(Debug, Clone, Default, Deserialize, IntoParams)]
pub struct BackupSearchQuery {
    /// Case-insensitive substring of backup path or status
    pub q: Option<String>,
    pub node_id: Option<i32>,
    /// Earliest start time (inclusive, RFC 3339)
    pub start_from: Option<DateTime<Utc>>,
    /// Latest start time (inclusive, RFC 3339)
    pub start_to: Option<DateTime<Utc>>,
    pub end_from: Option<DateTime<Utc>>,
    pub end_to: Option<DateTime<Utc>>,
    pub page: Option<u32>,
    pub per_page: Option<u32>,
}

impl BackupSearchQuery {
    pub fn filter(&self) -> BackupFilter {
        BackupFilter {
            q: self.q.clone(),
            node_id: self.node_id,
            start_from: self.start_from,
            start_to: self.start_to,
            end_from: self.end_from,
            end_to: self.end_to,
        }
    }
}

/// Page `items` with the admin default size.
pub fn paginate<T>(
    items: Vec<T>,
    page: Option<u32>,
    per_page: Option<u32>,
) -> (Vec<T>, Pagination) {
    let pagination = Pagination::resolve(page, per_page.unwrap_or(ADMIN_PAGE_SIZE), items.len());
    (pagination.slice(items), pagination)
}

#[derive(Debug, Serialize, ToSchema)]
pub struct ClusterListResponse {
    pub items: Vec<Cluster>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct NodeListResponse {
    pub items: Vec<Node>,
    pub pagination: Pagination,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct BackupListResponse {
    pub items: Vec<Backup>,
    pub pagination: Pagination,
}

/// Rows removed by a delete, including cascaded children.
#[derive(Debug, Serialize, ToSchema)]
pub struct DeleteResponse {
    pub deleted: CascadeSummary,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_paginate_defaults() {
        let (items, pagination) = paginate((0..120).collect::<Vec<_>>(), None, None);
        assert_eq!(items.len(), ADMIN_PAGE_SIZE as usize);
        assert_eq!(pagination.total, 120);
        assert_eq!(pagination.total_pages, 3);
    }

    #[test]
    fn test_paginate_last_page() {
        let (items, pagination) = paginate((0..120).collect::<Vec<_>>(), Some(3), None);
        assert_eq!(items, (100..120).collect::<Vec<_>>());
        assert_eq!(pagination.page, 3);
    }

    #[test]
    fn test_backup_query_maps_every_filter() {
        let query: BackupSearchQuery = serde_json::from_value(serde_json::json!({
            "q": "fail",
            "node_id": 3,
            "start_from": "2024-01-01T00:00:00Z",
            "end_to": "2024-01-02T00:00:00Z",
        }))
        .unwrap();
        let filter = query.filter();
        assert_eq!(filter.q.as_deref(), Some("fail"));
        assert_eq!(filter.node_id, Some(3));
        assert!(filter.start_from.is_some());
        assert!(filter.start_to.is_none());
        assert!(filter.end_to.is_some());
    }
}
