//! Privileged create/update/delete over clusters, nodes and backups.
//!
//! Field rules are checked before the store is touched. Name uniqueness and
//! parent references are checked by the store inside the write itself.

use std::sync::Arc;
use std::time::Duration;

use crate::error::{AppError, Result};
use crate::models::{
    Backup, BackupFilter, BackupInput, CascadeSummary, Cluster, ClusterFilter, ClusterInput, Node,
    NodeFilter, NodeInput,
};
use crate::services::clock::Clock;
use crate::services::validation::{validate_backup, validate_cluster, validate_node};
use crate::store::{bounded, MetadataStore};

pub struct AdminService {
    store: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    timeout: Duration,
}

fn not_found(kind: &str, id: i32) -> AppError {
    AppError::NotFound(format!("{} {} not found", kind, id))
}

impl AdminService {
    pub fn new(store: Arc<dyn MetadataStore>, clock: Arc<dyn Clock>, timeout: Duration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    // --- clusters ---

    pub async fn search_clusters(&self, filter: &ClusterFilter) -> Result<Vec<Cluster>> {
        bounded(self.timeout, self.store.search_clusters(filter)).await
    }

    pub async fn get_cluster(&self, id: i32) -> Result<Cluster> {
        bounded(self.timeout, self.store.get_cluster(id))
            .await?
            .ok_or_else(|| not_found("Cluster", id))
    }

    pub async fn create_cluster(&self, input: &ClusterInput) -> Result<Cluster> {
        validate_cluster(input)?;
        let now = self.clock.now();
        let cluster = bounded(self.timeout, self.store.insert_cluster(input, now)).await?;
        tracing::info!(cluster_id = cluster.id, name = %cluster.name, "Cluster created");
        Ok(cluster)
    }

    pub async fn update_cluster(&self, id: i32, input: &ClusterInput) -> Result<Cluster> {
        validate_cluster(input)?;
        let now = self.clock.now();
        let cluster = bounded(self.timeout, self.store.update_cluster(id, input, now))
            .await?
            .ok_or_else(|| not_found("Cluster", id))?;
        tracing::info!(cluster_id = id, name = %cluster.name, "Cluster updated");
        Ok(cluster)
    }

    /// Delete a cluster with all of its nodes and their backups.
    pub async fn delete_cluster(&self, id: i32) -> Result<CascadeSummary> {
        let removed = bounded(self.timeout, self.store.delete_cluster(id))
            .await?
            .ok_or_else(|| not_found("Cluster", id))?;
        tracing::info!(
            cluster_id = id,
            nodes = removed.nodes,
            backups = removed.backups,
            "Cluster deleted"
        );
        Ok(removed)
    }

    // --- nodes ---

    pub async fn search_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>> {
        bounded(self.timeout, self.store.search_nodes(filter)).await
    }

    pub async fn get_node(&self, id: i32) -> Result<Node> {
        bounded(self.timeout, self.store.get_node(id))
            .await?
            .ok_or_else(|| not_found("Node", id))
    }

    pub async fn create_node(&self, input: &NodeInput) -> Result<Node> {
        validate_node(input)?;
        let now = self.clock.now();
        let node = bounded(self.timeout, self.store.insert_node(input, now)).await?;
        tracing::info!(node_id = node.id, cluster_id = node.cluster_id, "Node created");
        Ok(node)
    }

    pub async fn update_node(&self, id: i32, input: &NodeInput) -> Result<Node> {
        validate_node(input)?;
        let now = self.clock.now();
        let node = bounded(self.timeout, self.store.update_node(id, input, now))
            .await?
            .ok_or_else(|| not_found("Node", id))?;
        tracing::info!(node_id = id, "Node updated");
        Ok(node)
    }

    /// Delete a node with all of its backups.
    pub async fn delete_node(&self, id: i32) -> Result<CascadeSummary> {
        let removed = bounded(self.timeout, self.store.delete_node(id))
            .await?
            .ok_or_else(|| not_found("Node", id))?;
        tracing::info!(node_id = id, backups = removed.backups, "Node deleted");
        Ok(removed)
    }

    // --- backups ---

    pub async fn search_backups(&self, filter: &BackupFilter) -> Result<Vec<Backup>> {
        bounded(self.timeout, self.store.search_backups(filter)).await
    }

    pub async fn get_backup(&self, id: i32) -> Result<Backup> {
        bounded(self.timeout, self.store.get_backup(id))
            .await?
            .ok_or_else(|| not_found("Backup", id))
    }

    pub async fn create_backup(&self, input: &BackupInput) -> Result<Backup> {
        validate_backup(input)?;
        let now = self.clock.now();
        let backup = bounded(self.timeout, self.store.insert_backup(input, now)).await?;
        tracing::info!(
            backup_id = backup.id,
            node_id = backup.node_id,
            status = %backup.status,
            "Backup created"
        );
        Ok(backup)
    }

    pub async fn update_backup(&self, id: i32, input: &BackupInput) -> Result<Backup> {
        validate_backup(input)?;
        let now = self.clock.now();
        let backup = bounded(self.timeout, self.store.update_backup(id, input, now))
            .await?
            .ok_or_else(|| not_found("Backup", id))?;
        tracing::info!(backup_id = id, status = %backup.status, "Backup updated");
        Ok(backup)
    }

    pub async fn delete_backup(&self, id: i32) -> Result<CascadeSummary> {
        let removed = bounded(self.timeout, self.store.delete_backup(id))
            .await?
            .ok_or_else(|| not_found("Backup", id))?;
        tracing::info!(backup_id = id, "Backup deleted");
        Ok(removed)
    }
}
