//! Cluster Backup Monitor - Backend Library
//!
//! Read-only reports over database cluster backups plus a token-protected
//! admin API for maintaining the cluster, node and backup records.

#[macro_use]
mod macros;

pub mod api;
pub mod config;
pub mod db;
pub mod error;
pub mod models;
pub mod presentation;
pub mod services;
pub mod store;
pub mod telemetry;

pub use config::Config;
pub use error::{AppError, Result};
