//! Admin handlers: create, update, delete and search clusters, nodes and backups.

use axum::{
    extract::{Extension, Path, Query, State},
    http::StatusCode,
    routing::get,
    Json, Router,
};
use utoipa::OpenApi;

use crate::api::dto::{
    paginate, BackupListResponse, BackupSearchQuery, ClusterListResponse, ClusterSearchQuery,
    DeleteResponse, NodeListResponse, NodeSearchQuery,
};
use crate::api::middleware::auth::AuthExtension;
use crate::api::SharedState;
use crate::error::Result;
use crate::models::{Backup, BackupInput, CascadeSummary, Cluster, ClusterInput, Node, NodeInput};
use crate::presentation::Pagination;

/// Create admin routes
pub fn router() -> Router<SharedState> {
    Router::new()
        .route("/clusters", get(list_clusters).post(create_cluster))
        .route(
            "/clusters/:id",
            get(get_cluster).put(update_cluster).delete(delete_cluster),
        )
        .route("/nodes", get(list_nodes).post(create_node))
        .route(
            "/nodes/:id",
            get(get_node).put(update_node).delete(delete_node),
        )
        .route("/backups", get(list_backups).post(create_backup))
        .route(
            "/backups/:id",
            get(get_backup).put(update_backup).delete(delete_backup),
        )
}

// ---------------------------------------------------------------------------
// Clusters
// ---------------------------------------------------------------------------

/// Search clusters by name
#[utoipa::path(
    get,
    path = "/clusters",
    context_path = "/admin",
    tag = "admin",
    params(ClusterSearchQuery),
    responses(
        (status = 200, description = "Matching clusters", body = ClusterListResponse),
        (status = 503, description = "Metadata store unavailable"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_clusters(
    State(state): State<SharedState>,
    Query(query): Query<ClusterSearchQuery>,
) -> Result<Json<ClusterListResponse>> {
    let clusters = state.admin.search_clusters(&query.filter()).await?;
    let (items, pagination) = paginate(clusters, query.page, query.per_page);
    Ok(Json(ClusterListResponse { items, pagination }))
}

#[utoipa::path(
    get,
    path = "/clusters/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Cluster", body = Cluster),
        (status = 404, description = "Cluster not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_cluster(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Cluster>> {
    Ok(Json(state.admin.get_cluster(id).await?))
}

#[utoipa::path(
    post,
    path = "/clusters",
    context_path = "/admin",
    tag = "admin",
    request_body = ClusterInput,
    responses(
        (status = 201, description = "Cluster created", body = Cluster),
        (status = 400, description = "Invalid or duplicate name"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_cluster(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Json(input): Json<ClusterInput>,
) -> Result<(StatusCode, Json<Cluster>)> {
    tracing::debug!(admin = %auth.username, "Creating cluster");
    let cluster = state.admin.create_cluster(&input).await?;
    Ok((StatusCode::CREATED, Json(cluster)))
}

#[utoipa::path(
    put,
    path = "/clusters/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Cluster ID")),
    request_body = ClusterInput,
    responses(
        (status = 200, description = "Cluster updated", body = Cluster),
        (status = 400, description = "Invalid or duplicate name"),
        (status = 404, description = "Cluster not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_cluster(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    Json(input): Json<ClusterInput>,
) -> Result<Json<Cluster>> {
    Ok(Json(state.admin.update_cluster(id, &input).await?))
}

/// Delete a cluster together with its nodes and their backups
#[utoipa::path(
    delete,
    path = "/clusters/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Cluster ID")),
    responses(
        (status = 200, description = "Rows removed", body = DeleteResponse),
        (status = 404, description = "Cluster not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_cluster(
    State(state): State<SharedState>,
    Extension(auth): Extension<AuthExtension>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>> {
    tracing::debug!(admin = %auth.username, cluster_id = id, "Deleting cluster");
    let deleted = state.admin.delete_cluster(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

// ---------------------------------------------------------------------------
// Nodes
// ---------------------------------------------------------------------------

/// Search nodes by name, engine type or port
#[utoipa::path(
    get,
    path = "/nodes",
    context_path = "/admin",
    tag = "admin",
    params(NodeSearchQuery),
    responses(
        (status = 200, description = "Matching nodes", body = NodeListResponse),
        (status = 503, description = "Metadata store unavailable"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_nodes(
    State(state): State<SharedState>,
    Query(query): Query<NodeSearchQuery>,
) -> Result<Json<NodeListResponse>> {
    let nodes = state.admin.search_nodes(&query.filter()).await?;
    let (items, pagination) = paginate(nodes, query.page, query.per_page);
    Ok(Json(NodeListResponse { items, pagination }))
}

#[utoipa::path(
    get,
    path = "/nodes/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Node ID")),
    responses(
        (status = 200, description = "Node", body = Node),
        (status = 404, description = "Node not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_node(State(state): State<SharedState>, Path(id): Path<i32>) -> Result<Json<Node>> {
    Ok(Json(state.admin.get_node(id).await?))
}

#[utoipa::path(
    post,
    path = "/nodes",
    context_path = "/admin",
    tag = "admin",
    request_body = NodeInput,
    responses(
        (status = 201, description = "Node created", body = Node),
        (status = 400, description = "Invalid fields or unknown cluster"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_node(
    State(state): State<SharedState>,
    Json(input): Json<NodeInput>,
) -> Result<(StatusCode, Json<Node>)> {
    let node = state.admin.create_node(&input).await?;
    Ok((StatusCode::CREATED, Json(node)))
}

#[utoipa::path(
    put,
    path = "/nodes/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Node ID")),
    request_body = NodeInput,
    responses(
        (status = 200, description = "Node updated", body = Node),
        (status = 400, description = "Invalid fields or unknown cluster"),
        (status = 404, description = "Node not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_node(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    Json(input): Json<NodeInput>,
) -> Result<Json<Node>> {
    Ok(Json(state.admin.update_node(id, &input).await?))
}

/// Delete a node together with its backups
#[utoipa::path(
    delete,
    path = "/nodes/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Node ID")),
    responses(
        (status = 200, description = "Rows removed", body = DeleteResponse),
        (status = 404, description = "Node not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_node(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.admin.delete_node(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

// ---------------------------------------------------------------------------
// Backups
// ---------------------------------------------------------------------------

/// Search backups by path or status, with start/end time filters
#[utoipa::path(
    get,
    path = "/backups",
    context_path = "/admin",
    tag = "admin",
    params(BackupSearchQuery),
    responses(
        (status = 200, description = "Matching backups", body = BackupListResponse),
        (status = 503, description = "Metadata store unavailable"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn list_backups(
    State(state): State<SharedState>,
    Query(query): Query<BackupSearchQuery>,
) -> Result<Json<BackupListResponse>> {
    let backups = state.admin.search_backups(&query.filter()).await?;
    let (items, pagination) = paginate(backups, query.page, query.per_page);
    Ok(Json(BackupListResponse { items, pagination }))
}

#[utoipa::path(
    get,
    path = "/backups/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Backup ID")),
    responses(
        (status = 200, description = "Backup", body = Backup),
        (status = 404, description = "Backup not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn get_backup(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<Backup>> {
    Ok(Json(state.admin.get_backup(id).await?))
}

#[utoipa::path(
    post,
    path = "/backups",
    context_path = "/admin",
    tag = "admin",
    request_body = BackupInput,
    responses(
        (status = 201, description = "Backup created", body = Backup),
        (status = 400, description = "Invalid fields or unknown node"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn create_backup(
    State(state): State<SharedState>,
    Json(input): Json<BackupInput>,
) -> Result<(StatusCode, Json<Backup>)> {
    let backup = state.admin.create_backup(&input).await?;
    Ok((StatusCode::CREATED, Json(backup)))
}

#[utoipa::path(
    put,
    path = "/backups/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Backup ID")),
    request_body = BackupInput,
    responses(
        (status = 200, description = "Backup updated", body = Backup),
        (status = 400, description = "Invalid fields or unknown node"),
        (status = 404, description = "Backup not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn update_backup(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
    Json(input): Json<BackupInput>,
) -> Result<Json<Backup>> {
    Ok(Json(state.admin.update_backup(id, &input).await?))
}

#[utoipa::path(
    delete,
    path = "/backups/{id}",
    context_path = "/admin",
    tag = "admin",
    params(("id" = i32, Path, description = "Backup ID")),
    responses(
        (status = 200, description = "Rows removed", body = DeleteResponse),
        (status = 404, description = "Backup not found"),
    ),
    security(("bearer_auth" = []))
)]
pub async fn delete_backup(
    State(state): State<SharedState>,
    Path(id): Path<i32>,
) -> Result<Json<DeleteResponse>> {
    let deleted = state.admin.delete_backup(id).await?;
    Ok(Json(DeleteResponse { deleted }))
}

#[derive(OpenApi)]
#[openapi(
    paths(
        list_clusters,
        get_cluster,
        create_cluster,
        update_cluster,
        delete_cluster,
        list_nodes,
        get_node,
        create_node,
        update_node,
        delete_node,
        list_backups,
        get_backup,
        create_backup,
        update_backup,
        delete_backup,
    ),
    components(schemas(
        ClusterInput,
        NodeInput,
        BackupInput,
        ClusterListResponse,
        NodeListResponse,
        BackupListResponse,
        DeleteResponse,
        CascadeSummary,
        Pagination,
    ))
)]
pub struct AdminApiDoc;
