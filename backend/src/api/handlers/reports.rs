//! JSON versions of the dashboard reports.

use axum::{
    extract::{Query, State},
    Json,
};
use utoipa::OpenApi;

use crate::api::handlers::dashboard::OverviewQuery;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{Backup, BackupListing, Cluster, Node, NodeListing};
use crate::services::query_service::Overview;

#[utoipa::path(
    get,
    path = "/api/v1/clusters",
    tag = "reports",
    responses(
        (status = 200, description = "All clusters by id", body = Vec<Cluster>),
        (status = 503, description = "Metadata store unavailable"),
    )
)]
pub async fn list_clusters(State(state): State<SharedState>) -> Result<Json<Vec<Cluster>>> {
    Ok(Json(state.query.list_clusters().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/nodes",
    tag = "reports",
    responses(
        (status = 200, description = "All nodes with their cluster name", body = Vec<NodeListing>),
        (status = 503, description = "Metadata store unavailable"),
    )
)]
pub async fn list_nodes(State(state): State<SharedState>) -> Result<Json<Vec<NodeListing>>> {
    Ok(Json(state.query.list_nodes().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/backups",
    tag = "reports",
    responses(
        (status = 200, description = "All backups, newest start first", body = Vec<BackupListing>),
        (status = 503, description = "Metadata store unavailable"),
    )
)]
pub async fn list_backups(State(state): State<SharedState>) -> Result<Json<Vec<BackupListing>>> {
    Ok(Json(state.query.list_backups().await?))
}

#[utoipa::path(
    get,
    path = "/api/v1/overview",
    tag = "reports",
    params(("hours" = Option<i64>, Query, description = "Window length in hours")),
    responses(
        (status = 200, description = "Recent backups with status counts", body = Overview),
        (status = 400, description = "Invalid window"),
        (status = 503, description = "Metadata store unavailable"),
    )
)]
pub async fn overview(
    State(state): State<SharedState>,
    Query(query): Query<OverviewQuery>,
) -> Result<Json<Overview>> {
    let window = query.window(state.config.overview_window())?;
    Ok(Json(state.query.overview(window).await?))
}

#[derive(OpenApi)]
#[openapi(
    paths(list_clusters, list_nodes, list_backups, overview),
    components(schemas(Cluster, Node, NodeListing, Backup, BackupListing, Overview))
)]
pub struct ReportsApiDoc;
