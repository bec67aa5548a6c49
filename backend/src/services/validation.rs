//! Field rules applied to administrative input before any write.
//!
//! Uniqueness and reference checks need the store and run inside the write
//! transaction instead.

use crate::error::{FieldErrors, Result};
use crate::models::{BackupInput, ClusterInput, NodeInput};

pub(crate) const NAME_MAX_LEN: usize = 45;
pub(crate) const DB_TYPE_MAX_LEN: usize = 45;
pub(crate) const STATUS_MAX_LEN: usize = 45;
pub(crate) const BACKUP_PATH_MAX_LEN: usize = 255;

fn check_text(errors: &mut FieldErrors, field: &str, value: &str, max_len: usize) {
    if value.trim().is_empty() {
        errors.push(field, "must not be empty");
    } else if value.chars().count() > max_len {
        errors.push(field, format!("must be at most {} characters", max_len));
    }
}

fn check_size(errors: &mut FieldErrors, field: &str, value: Option<i64>) {
    if value.is_some_and(|v| v < 0) {
        errors.push(field, "must not be negative");
    }
}

pub(crate) fn validate_cluster(input: &ClusterInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", &input.name, NAME_MAX_LEN);
    errors.into_result()
}

pub(crate) fn validate_node(input: &NodeInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    check_text(&mut errors, "name", &input.name, NAME_MAX_LEN);
    check_text(&mut errors, "db_type", &input.db_type, DB_TYPE_MAX_LEN);
    if !(1..=65535).contains(&input.port) {
        errors.push("port", "must be between 1 and 65535");
    }
    errors.into_result()
}

pub(crate) fn validate_backup(input: &BackupInput) -> Result<()> {
    let mut errors = FieldErrors::new();
    if input
        .end_time
        .is_some_and(|end| end < input.start_time)
    {
        errors.push("end_time", "must not be before start_time");
    }
    check_text(&mut errors, "backup_path", &input.backup_path, BACKUP_PATH_MAX_LEN);
    check_text(&mut errors, "status", &input.status, STATUS_MAX_LEN);
    check_size(&mut errors, "backup_size", input.backup_size);
    check_size(&mut errors, "compressed_size", input.compressed_size);
    errors.into_result()
}
