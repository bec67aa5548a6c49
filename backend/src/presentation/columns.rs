//! Column sets for the three dashboard tables.

use super::table::{Cell, Column};
use crate::models::{BackupListing, Cluster, NodeListing};

pub fn cluster_columns() -> Vec<Column<Cluster>> {
    vec![
        Column {
            key: "id",
            header: "ID",
            value: |c| Cell::Int(c.id.into()),
        },
        Column {
            key: "cluster_name",
            header: "Cluster name",
            value: |c| Cell::text(c.name.as_str()),
        },
    ]
}

pub fn node_columns() -> Vec<Column<NodeListing>> {
    vec![
        Column {
            key: "id",
            header: "ID",
            value: |n| Cell::Int(n.node.id.into()),
        },
        Column {
            key: "node_name",
            header: "Node name",
            value: |n| Cell::text(n.node.name.as_str()),
        },
        Column {
            key: "cluster_name",
            header: "Cluster name",
            value: |n| Cell::text(n.cluster_name.as_str()),
        },
        Column {
            key: "db_type",
            header: "Engine type",
            value: |n| Cell::text(n.node.db_type.as_str()),
        },
        Column {
            key: "port",
            header: "Port",
            value: |n| Cell::Int(n.node.port.into()),
        },
    ]
}

pub fn backup_columns() -> Vec<Column<BackupListing>> {
    vec![
        Column {
            key: "id",
            header: "ID",
            value: |b| Cell::Int(b.backup.id.into()),
        },
        Column {
            key: "node_name",
            header: "Node name",
            value: |b| Cell::text(b.node_name.as_str()),
        },
        Column {
            key: "start_time",
            header: "Start time",
            value: |b| Cell::Timestamp(b.backup.start_time),
        },
        Column {
            key: "end_time",
            header: "End time",
            value: |b| Cell::optional_timestamp(b.backup.end_time),
        },
        Column {
            key: "backup_path",
            header: "Path",
            value: |b| Cell::text(b.backup.backup_path.as_str()),
        },
        Column {
            key: "status",
            header: "Status",
            value: |b| Cell::text(b.backup.status.as_str()),
        },
    ]
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::models::{Backup, Node};
    use crate::presentation::table::Table;
    use chrono::{TimeZone, Utc};

    #[test]
    fn test_node_table_headers() {
        let headers: Vec<_> = node_columns().iter().map(|c| c.key).collect();
        assert_eq!(
            headers,
            vec!["id", "node_name", "cluster_name", "db_type", "port"]
        );
    }

    #[test]
    fn test_backup_row_values() {
        let start = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let listing = BackupListing {
            backup: Backup {
                id: 1,
                node_id: 1,
                start_time: start,
                end_time: None,
                backup_path: "/backups/db-a/20240101".into(),
                status: "running".into(),
                backup_size: None,
                compressed_size: None,
                inserted_at: start,
                updated_at: start,
            },
            node_name: "db-a".into(),
        };
        let table = Table::build(&backup_columns(), &[listing]);
        let rendered: Vec<_> = table.rows[0].iter().map(|c| c.render()).collect();
        assert_eq!(
            rendered,
            vec![
                "1",
                "db-a",
                "2024-01-01 00:00:00 UTC",
                "—",
                "/backups/db-a/20240101",
                "running"
            ]
        );
    }

    #[test]
    fn test_node_row_includes_cluster_name() {
        let now = Utc.with_ymd_and_hms(2024, 1, 1, 0, 0, 0).unwrap();
        let listing = NodeListing {
            node: Node {
                id: 4,
                cluster_id: 1,
                name: "db-a".into(),
                db_type: "postgres".into(),
                port: 5432,
                inserted_at: now,
                updated_at: now,
            },
            cluster_name: "prod-1".into(),
        };
        let table = Table::build(&node_columns(), &[listing]);
        let rendered: Vec<_> = table.rows[0].iter().map(|c| c.render()).collect();
        assert_eq!(rendered, vec!["4", "db-a", "prod-1", "postgres", "5432"]);
    }
}
