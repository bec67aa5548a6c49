//! Route definitions.

use axum::{middleware, routing::get, Json, Router};

use super::handlers;
use super::middleware::auth::admin_middleware;
use super::middleware::tracing::correlation_id_middleware;
use super::SharedState;

/// Create the application router
pub fn create_router(state: SharedState) -> Router {
    Router::new()
        .merge(dashboard_routes())
        // Health endpoints (no auth required)
        .route("/health", get(handlers::health::health_check))
        .route("/ready", get(handlers::health::readiness_check))
        .nest("/api/v1", api_v1_routes())
        .nest("/admin", admin_routes(&state))
        .fallback(handlers::dashboard::not_found)
        .layer(middleware::from_fn(correlation_id_middleware))
        .with_state(state)
}

/// HTML pages; each also answers with a trailing slash.
fn dashboard_routes() -> Router<SharedState> {
    use handlers::dashboard;

    Router::new()
        .route("/", get(dashboard::home))
        .route("/cluster", get(dashboard::clusters))
        .route("/cluster/", get(dashboard::clusters))
        .route("/node", get(dashboard::nodes))
        .route("/node/", get(dashboard::nodes))
        .route("/backup", get(dashboard::backups))
        .route("/backup/", get(dashboard::backups))
        .route("/overview", get(dashboard::overview))
        .route("/overview/", get(dashboard::overview))
}

/// JSON reports and the OpenAPI document
fn api_v1_routes() -> Router<SharedState> {
    use handlers::reports;

    let openapi = super::openapi::build_openapi();

    Router::new()
        .route("/clusters", get(reports::list_clusters))
        .route("/nodes", get(reports::list_nodes))
        .route("/backups", get(reports::list_backups))
        .route("/overview", get(reports::overview))
        .route("/openapi.json", get(move || async move { Json(openapi) }))
}

/// Login is public; everything else needs an admin token.
fn admin_routes(state: &SharedState) -> Router<SharedState> {
    let protected = handlers::admin::router().route_layer(middleware::from_fn_with_state(
        state.auth.clone(),
        admin_middleware,
    ));

    Router::new()
        .merge(handlers::auth::public_router(state))
        .merge(protected)
}
