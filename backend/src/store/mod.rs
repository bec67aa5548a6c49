//! Metadata store backends.
//!
//! The backup metadata lives in a relational schema owned by the
//! backup-producing system. Reporting only ever calls the read methods; the
//! write methods exist for the administrative surface and must each be atomic.

pub mod memory;
pub mod postgres;

use std::future::Future;
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};

use crate::error::{AppError, Result};
use crate::models::{
    Backup, BackupFilter, BackupInput, BackupListing, CascadeSummary, Cluster, ClusterFilter,
    ClusterInput, Node, NodeFilter, NodeInput, NodeListing,
};

pub use memory::MemoryStore;
pub use postgres::PgStore;

/// Metadata store trait
#[async_trait]
pub trait MetadataStore: Send + Sync {
    /// Cheap connectivity check
    async fn ping(&self) -> Result<()>;

    /// All clusters, by identity ascending
    async fn list_clusters(&self) -> Result<Vec<Cluster>>;

    /// All nodes with their cluster name, by identity ascending
    async fn list_nodes(&self) -> Result<Vec<NodeListing>>;

    /// All backups with their node name, newest start first, ties by identity ascending
    async fn list_backups(&self) -> Result<Vec<BackupListing>>;

    /// Backups with `from <= start_time <= to`, ordered like [`list_backups`](Self::list_backups)
    async fn list_backups_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BackupListing>>;

    async fn get_cluster(&self, id: i32) -> Result<Option<Cluster>>;
    async fn get_node(&self, id: i32) -> Result<Option<Node>>;
    async fn get_backup(&self, id: i32) -> Result<Option<Backup>>;

    async fn search_clusters(&self, filter: &ClusterFilter) -> Result<Vec<Cluster>>;
    async fn search_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>>;
    async fn search_backups(&self, filter: &BackupFilter) -> Result<Vec<Backup>>;

    /// Insert a cluster. Fails with a `name` validation error when the name is taken.
    async fn insert_cluster(&self, input: &ClusterInput, now: DateTime<Utc>) -> Result<Cluster>;

    /// Replace a cluster's fields. `Ok(None)` when the cluster does not exist.
    async fn update_cluster(
        &self,
        id: i32,
        input: &ClusterInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Cluster>>;

    /// Delete a cluster, its nodes and their backups in one transaction.
    /// `Ok(None)` when the cluster does not exist.
    async fn delete_cluster(&self, id: i32) -> Result<Option<CascadeSummary>>;

    /// Insert a node. Fails with a `cluster_id` validation error when the cluster is unknown.
    async fn insert_node(&self, input: &NodeInput, now: DateTime<Utc>) -> Result<Node>;

    async fn update_node(
        &self,
        id: i32,
        input: &NodeInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Node>>;

    /// Delete a node and its backups in one transaction.
    async fn delete_node(&self, id: i32) -> Result<Option<CascadeSummary>>;

    /// Insert a backup. Fails with a `node_id` validation error when the node is unknown.
    async fn insert_backup(&self, input: &BackupInput, now: DateTime<Utc>) -> Result<Backup>;

    async fn update_backup(
        &self,
        id: i32,
        input: &BackupInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Backup>>;

    async fn delete_backup(&self, id: i32) -> Result<Option<CascadeSummary>>;
}

/// Run a store call, converting an elapsed `limit` into `StoreUnavailable`.
pub async fn bounded<T, F>(limit: Duration, call: F) -> Result<T>
where
    F: Future<Output = Result<T>>,
{
    match tokio::time::timeout(limit, call).await {
        Ok(result) => result,
        Err(_) => Err(AppError::StoreUnavailable(format!(
            "no answer within {}ms",
            limit.as_millis()
        ))),
    }
}

pub(crate) fn unknown_cluster(id: i32) -> AppError {
    AppError::Validation(crate::error::FieldErrors::single(
        "cluster_id",
        format!("cluster {} does not exist", id),
    ))
}

pub(crate) fn unknown_node(id: i32) -> AppError {
    AppError::Validation(crate::error::FieldErrors::single(
        "node_id",
        format!("node {} does not exist", id),
    ))
}

pub(crate) fn duplicate_cluster_name(name: &str) -> AppError {
    AppError::Validation(crate::error::FieldErrors::single(
        "name",
        format!("a cluster named '{}' already exists", name),
    ))
}
