//! In-process metadata store.
//!
//! Mirrors the PostgreSQL store's ordering, cascade and constraint behaviour.
//! Used by the test suites and for running the dashboard without a database.
//! Availability and latency can be switched at runtime to exercise the
//! `StoreUnavailable` paths.

use std::collections::BTreeMap;
use std::sync::atomic::{AtomicBool, AtomicU64, Ordering};
use std::time::Duration;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use tokio::sync::RwLock;

use super::{duplicate_cluster_name, unknown_cluster, unknown_node, MetadataStore};
use crate::error::{AppError, Result};
use crate::models::{
    Backup, BackupFilter, BackupInput, BackupListing, CascadeSummary, Cluster, ClusterFilter,
    ClusterInput, Node, NodeFilter, NodeInput, NodeListing,
};

#[derive(Debug, Default)]
struct Tables {
    clusters: BTreeMap<i32, Cluster>,
    nodes: BTreeMap<i32, Node>,
    backups: BTreeMap<i32, Backup>,
    next_cluster_id: i32,
    next_node_id: i32,
    next_backup_id: i32,
}

impl Tables {
    fn node_listing(&self, node: &Node) -> NodeListing {
        NodeListing {
            node: node.clone(),
            cluster_name: self
                .clusters
                .get(&node.cluster_id)
                .map(|c| c.name.clone())
                .unwrap_or_default(),
        }
    }

    fn backup_listing(&self, backup: &Backup) -> BackupListing {
        BackupListing {
            backup: backup.clone(),
            node_name: self
                .nodes
                .get(&backup.node_id)
                .map(|n| n.name.clone())
                .unwrap_or_default(),
        }
    }

    fn name_taken(&self, name: &str, except: Option<i32>) -> bool {
        self.clusters
            .values()
            .any(|c| c.name == name && Some(c.id) != except)
    }

    fn remove_node_cascade(&mut self, node_id: i32) -> CascadeSummary {
        let before = self.backups.len();
        self.backups.retain(|_, b| b.node_id != node_id);
        let backups = (before - self.backups.len()) as u64;
        let nodes = u64::from(self.nodes.remove(&node_id).is_some());
        CascadeSummary {
            clusters: 0,
            nodes,
            backups,
        }
    }
}

/// Order backups newest start first, ties by identity ascending.
pub(crate) fn sort_newest_first(backups: &mut [BackupListing]) {
    backups.sort_by(|a, b| {
        b.backup
            .start_time
            .cmp(&a.backup.start_time)
            .then(a.backup.id.cmp(&b.backup.id))
    });
}

/// In-memory store backend
#[derive(Debug)]
pub struct MemoryStore {
    tables: RwLock<Tables>,
    available: AtomicBool,
    latency_ms: AtomicU64,
}

impl Default for MemoryStore {
    fn default() -> Self {
        Self::new()
    }
}

impl MemoryStore {
    pub fn new() -> Self {
        Self {
            tables: RwLock::new(Tables {
                next_cluster_id: 1,
                next_node_id: 1,
                next_backup_id: 1,
                ..Default::default()
            }),
            available: AtomicBool::new(true),
            latency_ms: AtomicU64::new(0),
        }
    }

    /// Simulate the store going down (`false`) or coming back (`true`).
    pub fn set_available(&self, available: bool) {
        self.available.store(available, Ordering::SeqCst);
    }

    /// Delay every call by `latency`.
    pub fn set_latency(&self, latency: Duration) {
        self.latency_ms
            .store(latency.as_millis() as u64, Ordering::SeqCst);
    }

    async fn gate(&self) -> Result<()> {
        let latency = self.latency_ms.load(Ordering::SeqCst);
        if latency > 0 {
            tokio::time::sleep(Duration::from_millis(latency)).await;
        }
        if self.available.load(Ordering::SeqCst) {
            Ok(())
        } else {
            Err(AppError::StoreUnavailable("connection refused".into()))
        }
    }
}

#[async_trait]
impl MetadataStore for MemoryStore {
    async fn ping(&self) -> Result<()> {
        self.gate().await
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables.clusters.values().cloned().collect())
    }

    async fn list_nodes(&self) -> Result<Vec<NodeListing>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .values()
            .map(|n| tables.node_listing(n))
            .collect())
    }

    async fn list_backups(&self) -> Result<Vec<BackupListing>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut listings: Vec<BackupListing> = tables
            .backups
            .values()
            .map(|b| tables.backup_listing(b))
            .collect();
        sort_newest_first(&mut listings);
        Ok(listings)
    }

    async fn list_backups_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BackupListing>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut listings: Vec<BackupListing> = tables
            .backups
            .values()
            .filter(|b| b.start_time >= from && b.start_time <= to)
            .map(|b| tables.backup_listing(b))
            .collect();
        sort_newest_first(&mut listings);
        Ok(listings)
    }

    async fn get_cluster(&self, id: i32) -> Result<Option<Cluster>> {
        self.gate().await?;
        Ok(self.tables.read().await.clusters.get(&id).cloned())
    }

    async fn get_node(&self, id: i32) -> Result<Option<Node>> {
        self.gate().await?;
        Ok(self.tables.read().await.nodes.get(&id).cloned())
    }

    async fn get_backup(&self, id: i32) -> Result<Option<Backup>> {
        self.gate().await?;
        Ok(self.tables.read().await.backups.get(&id).cloned())
    }

    async fn search_clusters(&self, filter: &ClusterFilter) -> Result<Vec<Cluster>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .clusters
            .values()
            .filter(|c| filter.matches(c))
            .cloned()
            .collect())
    }

    async fn search_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        Ok(tables
            .nodes
            .values()
            .filter(|n| filter.matches(n))
            .cloned()
            .collect())
    }

    async fn search_backups(&self, filter: &BackupFilter) -> Result<Vec<Backup>> {
        self.gate().await?;
        let tables = self.tables.read().await;
        let mut backups: Vec<Backup> = tables
            .backups
            .values()
            .filter(|b| filter.matches(b))
            .cloned()
            .collect();
        backups.sort_by(|a, b| b.start_time.cmp(&a.start_time).then(a.id.cmp(&b.id)));
        Ok(backups)
    }

    async fn insert_cluster(&self, input: &ClusterInput, now: DateTime<Utc>) -> Result<Cluster> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if tables.name_taken(&input.name, None) {
            return Err(duplicate_cluster_name(&input.name));
        }
        let id = tables.next_cluster_id;
        tables.next_cluster_id += 1;
        let cluster = Cluster {
            id,
            name: input.name.clone(),
            inserted_at: now,
            updated_at: now,
        };
        tables.clusters.insert(id, cluster.clone());
        Ok(cluster)
    }

    async fn update_cluster(
        &self,
        id: i32,
        input: &ClusterInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Cluster>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.clusters.contains_key(&id) {
            return Ok(None);
        }
        if tables.name_taken(&input.name, Some(id)) {
            return Err(duplicate_cluster_name(&input.name));
        }
        let Some(cluster) = tables.clusters.get_mut(&id) else {
            return Ok(None);
        };
        cluster.name = input.name.clone();
        cluster.updated_at = now;
        Ok(Some(cluster.clone()))
    }

    async fn delete_cluster(&self, id: i32) -> Result<Option<CascadeSummary>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if tables.clusters.remove(&id).is_none() {
            return Ok(None);
        }
        let node_ids: Vec<i32> = tables
            .nodes
            .values()
            .filter(|n| n.cluster_id == id)
            .map(|n| n.id)
            .collect();
        let mut summary = CascadeSummary {
            clusters: 1,
            ..Default::default()
        };
        for node_id in node_ids {
            let removed = tables.remove_node_cascade(node_id);
            summary.nodes += removed.nodes;
            summary.backups += removed.backups;
        }
        Ok(Some(summary))
    }

    async fn insert_node(&self, input: &NodeInput, now: DateTime<Utc>) -> Result<Node> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.clusters.contains_key(&input.cluster_id) {
            return Err(unknown_cluster(input.cluster_id));
        }
        let id = tables.next_node_id;
        tables.next_node_id += 1;
        let node = Node {
            id,
            cluster_id: input.cluster_id,
            name: input.name.clone(),
            db_type: input.db_type.clone(),
            port: input.port,
            inserted_at: now,
            updated_at: now,
        };
        tables.nodes.insert(id, node.clone());
        Ok(node)
    }

    async fn update_node(
        &self,
        id: i32,
        input: &NodeInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Node>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.nodes.contains_key(&id) {
            return Ok(None);
        }
        if !tables.clusters.contains_key(&input.cluster_id) {
            return Err(unknown_cluster(input.cluster_id));
        }
        let Some(node) = tables.nodes.get_mut(&id) else {
            return Ok(None);
        };
        node.cluster_id = input.cluster_id;
        node.name = input.name.clone();
        node.db_type = input.db_type.clone();
        node.port = input.port;
        node.updated_at = now;
        Ok(Some(node.clone()))
    }

    async fn delete_node(&self, id: i32) -> Result<Option<CascadeSummary>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.nodes.contains_key(&id) {
            return Ok(None);
        }
        Ok(Some(tables.remove_node_cascade(id)))
    }

    async fn insert_backup(&self, input: &BackupInput, now: DateTime<Utc>) -> Result<Backup> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.nodes.contains_key(&input.node_id) {
            return Err(unknown_node(input.node_id));
        }
        let id = tables.next_backup_id;
        tables.next_backup_id += 1;
        let backup = Backup {
            id,
            node_id: input.node_id,
            start_time: input.start_time,
            end_time: input.end_time,
            backup_path: input.backup_path.clone(),
            status: input.status.clone(),
            backup_size: input.backup_size,
            compressed_size: input.compressed_size,
            inserted_at: now,
            updated_at: now,
        };
        tables.backups.insert(id, backup.clone());
        Ok(backup)
    }

    async fn update_backup(
        &self,
        id: i32,
        input: &BackupInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Backup>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        if !tables.backups.contains_key(&id) {
            return Ok(None);
        }
        if !tables.nodes.contains_key(&input.node_id) {
            return Err(unknown_node(input.node_id));
        }
        let Some(backup) = tables.backups.get_mut(&id) else {
            return Ok(None);
        };
        backup.node_id = input.node_id;
        backup.start_time = input.start_time;
        backup.end_time = input.end_time;
        backup.backup_path = input.backup_path.clone();
        backup.status = input.status.clone();
        backup.backup_size = input.backup_size;
        backup.compressed_size = input.compressed_size;
        backup.updated_at = now;
        Ok(Some(backup.clone()))
    }

    async fn delete_backup(&self, id: i32) -> Result<Option<CascadeSummary>> {
        self.gate().await?;
        let mut tables = self.tables.write().await;
        Ok(tables.backups.remove(&id).map(|_| CascadeSummary {
            backups: 1,
            ..Default::default()
        }))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    async fn seeded() -> (MemoryStore, Node) {
        let store = MemoryStore::new();
        let cluster = store
            .insert_cluster(&ClusterInput { name: "prod-1".into() }, at(1, 0))
            .await
            .unwrap();
        let node = store
            .insert_node(
                &NodeInput {
                    cluster_id: cluster.id,
                    name: "db-a".into(),
                    db_type: "postgres".into(),
                    port: 5432,
                },
                at(1, 0),
            )
            .await
            .unwrap();
        (store, node)
    }

    fn backup_input(node_id: i32, start: DateTime<Utc>) -> BackupInput {
        BackupInput {
            node_id,
            start_time: start,
            end_time: None,
            backup_path: format!("/backups/{}", start.timestamp()),
            status: "running".into(),
            backup_size: None,
            compressed_size: None,
        }
    }

    #[tokio::test]
    async fn test_list_backups_orders_by_start_desc_then_id() {
        let (store, node) = seeded().await;
        store.insert_backup(&backup_input(node.id, at(2, 0)), at(2, 0)).await.unwrap();
        store.insert_backup(&backup_input(node.id, at(3, 0)), at(3, 0)).await.unwrap();
        store.insert_backup(&backup_input(node.id, at(2, 0)), at(3, 0)).await.unwrap();

        let ids: Vec<i32> = store
            .list_backups()
            .await
            .unwrap()
            .iter()
            .map(|b| b.backup.id)
            .collect();
        assert_eq!(ids, vec![2, 1, 3]);
    }

    #[tokio::test]
    async fn test_listings_carry_parent_names() {
        let (store, node) = seeded().await;
        store.insert_backup(&backup_input(node.id, at(2, 0)), at(2, 0)).await.unwrap();

        let nodes = store.list_nodes().await.unwrap();
        assert_eq!(nodes[0].cluster_name, "prod-1");
        let backups = store.list_backups().await.unwrap();
        assert_eq!(backups[0].node_name, "db-a");
    }

    #[tokio::test]
    async fn test_duplicate_cluster_name_rejected() {
        let (store, _) = seeded().await;
        let err = store
            .insert_cluster(&ClusterInput { name: "prod-1".into() }, at(2, 0))
            .await
            .unwrap_err();
        match err {
            AppError::Validation(fields) => assert!(fields.contains("name")),
            other => panic!("unexpected error: {other:?}"),
        }
    }

    #[tokio::test]
    async fn test_rename_to_own_name_is_allowed() {
        let (store, _) = seeded().await;
        let updated = store
            .update_cluster(1, &ClusterInput { name: "prod-1".into() }, at(2, 0))
            .await
            .unwrap()
            .unwrap();
        assert_eq!(updated.updated_at, at(2, 0));
        assert_eq!(updated.inserted_at, at(1, 0));
    }

    #[tokio::test]
    async fn test_delete_cluster_cascades() {
        let (store, node) = seeded().await;
        store.insert_backup(&backup_input(node.id, at(2, 0)), at(2, 0)).await.unwrap();
        store.insert_backup(&backup_input(node.id, at(3, 0)), at(3, 0)).await.unwrap();

        let summary = store.delete_cluster(1).await.unwrap().unwrap();
        assert_eq!(
            summary,
            CascadeSummary {
                clusters: 1,
                nodes: 1,
                backups: 2
            }
        );
        assert!(store.list_nodes().await.unwrap().is_empty());
        assert!(store.list_backups().await.unwrap().is_empty());
        assert!(store.delete_cluster(1).await.unwrap().is_none());
    }

    #[tokio::test]
    async fn test_unavailable_store_fails_every_call() {
        let (store, _) = seeded().await;
        store.set_available(false);
        assert!(matches!(
            store.list_clusters().await,
            Err(AppError::StoreUnavailable(_))
        ));
        store.set_available(true);
        assert_eq!(store.list_clusters().await.unwrap().len(), 1);
    }
}
