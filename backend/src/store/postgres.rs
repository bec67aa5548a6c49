//! PostgreSQL metadata store.
//!
//! Reads and writes the externally managed `cbm_cluster` / `cbm_node` /
//! `cbm_backup` tables. Every administrative write runs in its own
//! transaction; cascades are explicit deletes, child tables first.

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use sqlx::PgPool;

use super::{duplicate_cluster_name, unknown_cluster, unknown_node, MetadataStore};
use crate::error::{AppError, Result};
use crate::models::{
    Backup, BackupFilter, BackupInput, BackupListing, CascadeSummary, Cluster, ClusterFilter,
    ClusterInput, Node, NodeFilter, NodeInput, NodeListing,
};

const UNIQUE_VIOLATION: &str = "23505";
const FOREIGN_KEY_VIOLATION: &str = "23503";

const LOCK_CLUSTER: &str = "SELECT cluster_id FROM cbm_cluster WHERE cluster_id = $1 FOR UPDATE";

const CLUSTER_COLUMNS: &str = r#"
    c.cluster_id AS id, c.cluster_name AS name,
    c.ts_insert AS inserted_at, c.ts_update AS updated_at
"#;

const NODE_COLUMNS: &str = r#"
    n.node_id AS id, n.cluster_name_id AS cluster_id, n.node_name AS name,
    n.db_type, n.port, n.ts_insert AS inserted_at, n.ts_update AS updated_at
"#;

// Sizes are cast so the store works whether the columns are INTEGER or BIGINT.
const BACKUP_COLUMNS: &str = r#"
    b.backup_id AS id, b.node_name_id AS node_id, b.start_time, b.end_time,
    b.backup_path, b.status,
    b.backup_size::BIGINT AS backup_size, b.compressed_size::BIGINT AS compressed_size,
    b.ts_insert AS inserted_at, b.ts_update AS updated_at
"#;

fn constraint_code(err: &sqlx::Error) -> Option<String> {
    err.as_database_error()
        .and_then(|db| db.code())
        .map(|code| code.into_owned())
}

/// Escape LIKE wildcards and wrap the term for a substring match.
fn like_pattern(term: Option<&str>) -> Option<String> {
    term.filter(|t| !t.is_empty()).map(|t| {
        let escaped = t
            .replace('\\', "\\\\")
            .replace('%', "\\%")
            .replace('_', "\\_");
        format!("%{}%", escaped)
    })
}

/// PostgreSQL store backend
#[derive(Debug, Clone)]
pub struct PgStore {
    pool: PgPool,
}

impl PgStore {
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    async fn backups_query(
        &self,
        condition: &str,
        bounds: Option<(DateTime<Utc>, DateTime<Utc>)>,
    ) -> Result<Vec<BackupListing>> {
        let sql = format!(
            r#"
            SELECT {BACKUP_COLUMNS}, n.node_name AS node_name
            FROM cbm_backup b
            JOIN cbm_node n ON n.node_id = b.node_name_id
            {condition}
            ORDER BY b.start_time DESC, b.backup_id ASC
            "#
        );
        let mut query = sqlx::query_as::<_, BackupListing>(&sql);
        if let Some((from, to)) = bounds {
            query = query.bind(from).bind(to);
        }
        Ok(query.fetch_all(&self.pool).await?)
    }
}

#[async_trait]
impl MetadataStore for PgStore {
    async fn ping(&self) -> Result<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    async fn list_clusters(&self) -> Result<Vec<Cluster>> {
        let sql = format!("SELECT {CLUSTER_COLUMNS} FROM cbm_cluster c ORDER BY c.cluster_id");
        Ok(sqlx::query_as::<_, Cluster>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_nodes(&self) -> Result<Vec<NodeListing>> {
        let sql = format!(
            r#"
            SELECT {NODE_COLUMNS}, c.cluster_name AS cluster_name
            FROM cbm_node n
            JOIN cbm_cluster c ON c.cluster_id = n.cluster_name_id
            ORDER BY n.node_id
            "#
        );
        Ok(sqlx::query_as::<_, NodeListing>(&sql)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn list_backups(&self) -> Result<Vec<BackupListing>> {
        self.backups_query("", None).await
    }

    async fn list_backups_started_between(
        &self,
        from: DateTime<Utc>,
        to: DateTime<Utc>,
    ) -> Result<Vec<BackupListing>> {
        self.backups_query("WHERE b.start_time >= $1 AND b.start_time <= $2", Some((from, to)))
            .await
    }

    async fn get_cluster(&self, id: i32) -> Result<Option<Cluster>> {
        let sql = format!("SELECT {CLUSTER_COLUMNS} FROM cbm_cluster c WHERE c.cluster_id = $1");
        Ok(sqlx::query_as::<_, Cluster>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_node(&self, id: i32) -> Result<Option<Node>> {
        let sql = format!("SELECT {NODE_COLUMNS} FROM cbm_node n WHERE n.node_id = $1");
        Ok(sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn get_backup(&self, id: i32) -> Result<Option<Backup>> {
        let sql = format!("SELECT {BACKUP_COLUMNS} FROM cbm_backup b WHERE b.backup_id = $1");
        Ok(sqlx::query_as::<_, Backup>(&sql)
            .bind(id)
            .fetch_optional(&self.pool)
            .await?)
    }

    async fn search_clusters(&self, filter: &ClusterFilter) -> Result<Vec<Cluster>> {
        let sql = format!(
            r#"
            SELECT {CLUSTER_COLUMNS} FROM cbm_cluster c
            WHERE ($1::TEXT IS NULL OR c.cluster_name ILIKE $1)
            ORDER BY c.cluster_id
            "#
        );
        Ok(sqlx::query_as::<_, Cluster>(&sql)
            .bind(like_pattern(filter.q.as_deref()))
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_nodes(&self, filter: &NodeFilter) -> Result<Vec<Node>> {
        let sql = format!(
            r#"
            SELECT {NODE_COLUMNS} FROM cbm_node n
            WHERE ($1::TEXT IS NULL
                   OR n.node_name ILIKE $1
                   OR n.db_type ILIKE $1
                   OR n.port::TEXT ILIKE $1)
              AND ($2::INTEGER IS NULL OR n.cluster_name_id = $2)
            ORDER BY n.node_id
            "#
        );
        Ok(sqlx::query_as::<_, Node>(&sql)
            .bind(like_pattern(filter.q.as_deref()))
            .bind(filter.cluster_id)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn search_backups(&self, filter: &BackupFilter) -> Result<Vec<Backup>> {
        let sql = format!(
            r#"
            SELECT {BACKUP_COLUMNS} FROM cbm_backup b
            WHERE ($1::TEXT IS NULL OR b.backup_path ILIKE $1 OR b.status ILIKE $1)
              AND ($2::INTEGER IS NULL OR b.node_name_id = $2)
              AND ($3::TIMESTAMPTZ IS NULL OR b.start_time >= $3)
              AND ($4::TIMESTAMPTZ IS NULL OR b.start_time <= $4)
              AND ($5::TIMESTAMPTZ IS NULL OR b.end_time >= $5)
              AND ($6::TIMESTAMPTZ IS NULL OR b.end_time <= $6)
            ORDER BY b.start_time DESC, b.backup_id ASC
            "#
        );
        Ok(sqlx::query_as::<_, Backup>(&sql)
            .bind(like_pattern(filter.q.as_deref()))
            .bind(filter.node_id)
            .bind(filter.start_from)
            .bind(filter.start_to)
            .bind(filter.end_from)
            .bind(filter.end_to)
            .fetch_all(&self.pool)
            .await?)
    }

    async fn insert_cluster(&self, input: &ClusterInput, now: DateTime<Utc>) -> Result<Cluster> {
        let mut tx = self.pool.begin().await?;

        let taken: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cbm_cluster WHERE cluster_name = $1)")
                .bind(&input.name)
                .fetch_one(&mut *tx)
                .await?;
        if taken {
            return Err(duplicate_cluster_name(&input.name));
        }

        let sql = format!(
            r#"
            INSERT INTO cbm_cluster AS c (cluster_name, ts_insert, ts_update)
            VALUES ($1, $2, $2)
            RETURNING {CLUSTER_COLUMNS}
            "#
        );
        let cluster = sqlx::query_as::<_, Cluster>(&sql)
            .bind(&input.name)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(UNIQUE_VIOLATION) => duplicate_cluster_name(&input.name),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(cluster)
    }

    async fn update_cluster(
        &self,
        id: i32,
        input: &ClusterInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Cluster>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> = sqlx::query_scalar(LOCK_CLUSTER)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let taken: bool = sqlx::query_scalar(
            "SELECT EXISTS(SELECT 1 FROM cbm_cluster WHERE cluster_name = $1 AND cluster_id <> $2)",
        )
        .bind(&input.name)
        .bind(id)
        .fetch_one(&mut *tx)
        .await?;
        if taken {
            return Err(duplicate_cluster_name(&input.name));
        }

        let sql = format!(
            r#"
            UPDATE cbm_cluster AS c SET cluster_name = $2, ts_update = $3
            WHERE c.cluster_id = $1
            RETURNING {CLUSTER_COLUMNS}
            "#
        );
        let cluster = sqlx::query_as::<_, Cluster>(&sql)
            .bind(id)
            .bind(&input.name)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(UNIQUE_VIOLATION) => duplicate_cluster_name(&input.name),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(cluster)
    }

    async fn delete_cluster(&self, id: i32) -> Result<Option<CascadeSummary>> {
        let mut tx = self.pool.begin().await?;

        // Lock the parent row so no node can be attached mid-cascade.
        let exists: Option<i32> = sqlx::query_scalar(LOCK_CLUSTER)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let backups = sqlx::query(
            r#"
            DELETE FROM cbm_backup
            WHERE node_name_id IN (SELECT node_id FROM cbm_node WHERE cluster_name_id = $1)
            "#,
        )
        .bind(id)
        .execute(&mut *tx)
        .await?
        .rows_affected();

        let nodes = sqlx::query("DELETE FROM cbm_node WHERE cluster_name_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let clusters = sqlx::query("DELETE FROM cbm_cluster WHERE cluster_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(Some(CascadeSummary {
            clusters,
            nodes,
            backups,
        }))
    }

    async fn insert_node(&self, input: &NodeInput, now: DateTime<Utc>) -> Result<Node> {
        let mut tx = self.pool.begin().await?;

        let cluster_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cbm_cluster WHERE cluster_id = $1)")
                .bind(input.cluster_id)
                .fetch_one(&mut *tx)
                .await?;
        if !cluster_exists {
            return Err(unknown_cluster(input.cluster_id));
        }

        let sql = format!(
            r#"
            INSERT INTO cbm_node AS n (cluster_name_id, node_name, db_type, port, ts_insert, ts_update)
            VALUES ($1, $2, $3, $4, $5, $5)
            RETURNING {NODE_COLUMNS}
            "#
        );
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(input.cluster_id)
            .bind(&input.name)
            .bind(&input.db_type)
            .bind(input.port)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => unknown_cluster(input.cluster_id),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(node)
    }

    async fn update_node(
        &self,
        id: i32,
        input: &NodeInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Node>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT node_id FROM cbm_node WHERE node_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let cluster_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cbm_cluster WHERE cluster_id = $1)")
                .bind(input.cluster_id)
                .fetch_one(&mut *tx)
                .await?;
        if !cluster_exists {
            return Err(unknown_cluster(input.cluster_id));
        }

        let sql = format!(
            r#"
            UPDATE cbm_node AS n
            SET cluster_name_id = $2, node_name = $3, db_type = $4, port = $5, ts_update = $6
            WHERE n.node_id = $1
            RETURNING {NODE_COLUMNS}
            "#
        );
        let node = sqlx::query_as::<_, Node>(&sql)
            .bind(id)
            .bind(input.cluster_id)
            .bind(&input.name)
            .bind(&input.db_type)
            .bind(input.port)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => unknown_cluster(input.cluster_id),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(node)
    }

    async fn delete_node(&self, id: i32) -> Result<Option<CascadeSummary>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT node_id FROM cbm_node WHERE node_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let backups = sqlx::query("DELETE FROM cbm_backup WHERE node_name_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        let nodes = sqlx::query("DELETE FROM cbm_node WHERE node_id = $1")
            .bind(id)
            .execute(&mut *tx)
            .await?
            .rows_affected();

        tx.commit().await?;
        Ok(Some(CascadeSummary {
            clusters: 0,
            nodes,
            backups,
        }))
    }

    async fn insert_backup(&self, input: &BackupInput, now: DateTime<Utc>) -> Result<Backup> {
        let mut tx = self.pool.begin().await?;

        let node_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cbm_node WHERE node_id = $1)")
                .bind(input.node_id)
                .fetch_one(&mut *tx)
                .await?;
        if !node_exists {
            return Err(unknown_node(input.node_id));
        }

        let sql = format!(
            r#"
            INSERT INTO cbm_backup AS b
                (node_name_id, start_time, end_time, backup_path, status,
                 backup_size, compressed_size, ts_insert, ts_update)
            VALUES ($1, $2, $3, $4, $5, $6, $7, $8, $8)
            RETURNING {BACKUP_COLUMNS}
            "#
        );
        let backup = sqlx::query_as::<_, Backup>(&sql)
            .bind(input.node_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.backup_path)
            .bind(&input.status)
            .bind(input.backup_size)
            .bind(input.compressed_size)
            .bind(now)
            .fetch_one(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => unknown_node(input.node_id),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(backup)
    }

    async fn update_backup(
        &self,
        id: i32,
        input: &BackupInput,
        now: DateTime<Utc>,
    ) -> Result<Option<Backup>> {
        let mut tx = self.pool.begin().await?;

        let exists: Option<i32> =
            sqlx::query_scalar("SELECT backup_id FROM cbm_backup WHERE backup_id = $1 FOR UPDATE")
                .bind(id)
                .fetch_optional(&mut *tx)
                .await?;
        if exists.is_none() {
            return Ok(None);
        }

        let node_exists: bool =
            sqlx::query_scalar("SELECT EXISTS(SELECT 1 FROM cbm_node WHERE node_id = $1)")
                .bind(input.node_id)
                .fetch_one(&mut *tx)
                .await?;
        if !node_exists {
            return Err(unknown_node(input.node_id));
        }

        let sql = format!(
            r#"
            UPDATE cbm_backup AS b
            SET node_name_id = $2, start_time = $3, end_time = $4, backup_path = $5,
                status = $6, backup_size = $7, compressed_size = $8, ts_update = $9
            WHERE b.backup_id = $1
            RETURNING {BACKUP_COLUMNS}
            "#
        );
        let backup = sqlx::query_as::<_, Backup>(&sql)
            .bind(id)
            .bind(input.node_id)
            .bind(input.start_time)
            .bind(input.end_time)
            .bind(&input.backup_path)
            .bind(&input.status)
            .bind(input.backup_size)
            .bind(input.compressed_size)
            .bind(now)
            .fetch_optional(&mut *tx)
            .await
            .map_err(|e| match constraint_code(&e).as_deref() {
                Some(FOREIGN_KEY_VIOLATION) => unknown_node(input.node_id),
                _ => AppError::from(e),
            })?;

        tx.commit().await?;
        Ok(backup)
    }

    async fn delete_backup(&self, id: i32) -> Result<Option<CascadeSummary>> {
        let deleted = sqlx::query("DELETE FROM cbm_backup WHERE backup_id = $1")
            .bind(id)
            .execute(&self.pool)
            .await?
            .rows_affected();

        Ok((deleted > 0).then_some(CascadeSummary {
            backups: deleted,
            ..Default::default()
        }))
    }
}
