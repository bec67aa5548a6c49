//! Read-only reporting queries over the metadata store.

use std::collections::BTreeMap;
use std::sync::Arc;
use std::time::Duration as StdDuration;

use chrono::{DateTime, Duration, Utc};
use serde::Serialize;
use utoipa::ToSchema;

use crate::error::Result;
use crate::models::{BackupListing, Cluster, NodeListing};
use crate::services::clock::Clock;
use crate::store::{bounded, MetadataStore};

/// Recent-backup window used when the caller does not pick one.
pub fn default_recent_window() -> Duration {
    Duration::days(2)
}

/// Backups started within a window, with a count per status.
#[derive(Debug, Clone, Serialize, ToSchema)]
pub struct Overview {
    pub window_start: DateTime<Utc>,
    pub window_end: DateTime<Utc>,
    pub backups: Vec<BackupListing>,
    #[schema(value_type = Object)]
    pub by_status: BTreeMap<String, usize>,
}

impl Overview {
    pub fn total(&self) -> usize {
        self.backups.len()
    }
}

pub struct QueryService {
    store: Arc<dyn MetadataStore>,
    clock: Arc<dyn Clock>,
    timeout: StdDuration,
}

impl QueryService {
    pub fn new(store: Arc<dyn MetadataStore>, clock: Arc<dyn Clock>, timeout: StdDuration) -> Self {
        Self {
            store,
            clock,
            timeout,
        }
    }

    pub async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        bounded(self.timeout, self.store.list_clusters()).await
    }

    pub async fn list_nodes(&self) -> Result<Vec<NodeListing>> {
        bounded(self.timeout, self.store.list_nodes()).await
    }

    /// Newest start first, ties by id ascending.
    pub async fn list_backups(&self) -> Result<Vec<BackupListing>> {
        bounded(self.timeout, self.store.list_backups()).await
    }

    /// Backups whose start lies in `[now - window, now]`.
    pub async fn list_recent_backups(&self, window: Duration) -> Result<Vec<BackupListing>> {
        let (from, to) = self.window_bounds(window);
        bounded(self.timeout, self.store.list_backups_started_between(from, to)).await
    }

    pub async fn overview(&self, window: Duration) -> Result<Overview> {
        let (window_start, window_end) = self.window_bounds(window);
        let backups = bounded(
            self.timeout,
            self.store
                .list_backups_started_between(window_start, window_end),
        )
        .await?;

        let mut by_status = BTreeMap::new();
        for listing in &backups {
            *by_status.entry(listing.backup.status.clone()).or_insert(0) += 1;
        }

        tracing::debug!(
            total = backups.len(),
            %window_start,
            %window_end,
            "Built backup overview"
        );

        Ok(Overview {
            window_start,
            window_end,
            backups,
            by_status,
        })
    }

    fn window_bounds(&self, window: Duration) -> (DateTime<Utc>, DateTime<Utc>) {
        let now = self.clock.now();
        (now - window, now)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::error::AppError;
    use crate::models::{BackupInput, ClusterInput, NodeInput};
    use crate::services::clock::FixedClock;
    use crate::store::MemoryStore;
    use chrono::TimeZone;

    fn at(day: u32, hour: u32) -> DateTime<Utc> {
        Utc.with_ymd_and_hms(2024, 1, day, hour, 0, 0).unwrap()
    }

    async fn seeded(clock: Arc<FixedClock>) -> (Arc<MemoryStore>, QueryService) {
        let store = Arc::new(MemoryStore::new());
        let now = at(1, 0);
        let cluster = store
            .insert_cluster(&ClusterInput { name: "prod-1".into() }, now)
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
                now,
            )
            .await
            .unwrap();
        let seeds = [(at(1, 0), "success"), (at(4, 12), "failed"), (at(5, 0), "success")];
        for (start, status) in seeds {
            store
                .insert_backup(
                    &BackupInput {
                        node_id: node.id,
                        start_time: start,
                        end_time: Some(start + Duration::minutes(10)),
                        backup_path: format!("/backups/db-a/{}", start.format("%Y%m%d%H")),
                        status: status.into(),
                        backup_size: None,
                        compressed_size: None,
                    },
                    now,
                )
                .await
                .unwrap();
        }
        let service = QueryService::new(store.clone(), clock, StdDuration::from_secs(1));
        (store, service)
    }

    #[tokio::test]
    async fn test_recent_window_is_inclusive_and_uses_current_time() {
        let clock = Arc::new(FixedClock::new(at(5, 0)));
        let (_store, service) = seeded(clock.clone()).await;

        // [Jan 3 00:00, Jan 5 00:00] holds the Jan 4 and Jan 5 backups.
        let recent = service.list_recent_backups(default_recent_window()).await.unwrap();
        let starts: Vec<_> = recent.iter().map(|b| b.backup.start_time).collect();
        assert_eq!(starts, vec![at(5, 0), at(4, 12)]);

        // Jan 7 00:00: the Jan 5 backup sits exactly on the lower bound.
        clock.advance(Duration::days(2));
        let recent = service.list_recent_backups(default_recent_window()).await.unwrap();
        assert_eq!(recent.len(), 1);

        clock.advance(Duration::seconds(1));
        let recent = service.list_recent_backups(default_recent_window()).await.unwrap();
        assert!(recent.is_empty());
    }

    #[tokio::test]
    async fn test_recent_window_excludes_future_starts() {
        let clock = Arc::new(FixedClock::new(at(5, 0)));
        let (store, service) = seeded(clock.clone()).await;
        let node_id = store.list_nodes().await.unwrap()[0].node.id;
        store
            .insert_backup(
                &BackupInput {
                    node_id,
                    start_time: clock.now() + Duration::seconds(1),
                    end_time: None,
                    backup_path: "/backups/db-a/scheduled".into(),
                    status: "running".into(),
                    backup_size: None,
                    compressed_size: None,
                },
                clock.now(),
            )
            .await
            .unwrap();

        let recent = service.list_recent_backups(default_recent_window()).await.unwrap();
        assert!(recent.iter().all(|b| b.backup.start_time <= clock.now()));
        assert!(!recent.iter().any(|b| b.backup.backup_path == "/backups/db-a/scheduled"));
        assert_eq!(recent.len(), 2);
    }

    #[tokio::test]
    async fn test_overview_counts_statuses() {
        let clock = Arc::new(FixedClock::new(at(5, 0)));
        let (_store, service) = seeded(clock).await;

        let overview = service.overview(Duration::days(10)).await.unwrap();
        assert_eq!(overview.total(), 3);
        assert_eq!(overview.by_status.get("success"), Some(&2));
        assert_eq!(overview.by_status.get("failed"), Some(&1));
        assert_eq!(overview.window_end, at(5, 0));
        assert_eq!(overview.window_start, at(5, 0) - Duration::days(10));
    }

    #[tokio::test]
    async fn test_unavailable_store_returns_no_partial_rows() {
        let clock = Arc::new(FixedClock::new(at(5, 0)));
        let (store, service) = seeded(clock).await;
        store.set_available(false);

        assert!(matches!(
            service.list_backups().await,
            Err(AppError::StoreUnavailable(_))
        ));
        assert!(matches!(
            service.list_clusters().await,
            Err(AppError::StoreUnavailable(_))
        ));
    }

    #[tokio::test(start_paused = true)]
    async fn test_slow_store_times_out() {
        let clock = Arc::new(FixedClock::new(at(5, 0)));
        let (store, service) = seeded(clock).await;
        store.set_latency(StdDuration::from_secs(30));

        assert!(matches!(
            service.list_nodes().await,
            Err(AppError::StoreUnavailable(_))
        ));
    }
}
