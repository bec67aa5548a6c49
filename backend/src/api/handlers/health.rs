//! Health check endpoints.

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use serde::Serialize;
use utoipa::{OpenApi, ToSchema};

use crate::api::SharedState;
use crate::store::bounded;

/// Reported in place of the driver error, which can name hosts and users.
pub const STORE_UNHEALTHY_MESSAGE: &str = "Metadata store unavailable";

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthResponse {
    pub status: String,
    pub version: String,
    pub checks: HealthChecks,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct HealthChecks {
    pub metadata_store: CheckStatus,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct CheckStatus {
    pub status: String,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub message: Option<String>,
}

async fn check_store(state: &SharedState) -> CheckStatus {
    match bounded(state.config.store_timeout(), state.store.ping()).await {
        Ok(()) => CheckStatus {
            status: "healthy".to_string(),
            message: None,
        },
        Err(e) => {
            tracing::warn!(error = %e, "Metadata store health check failed");
            CheckStatus {
                status: "unhealthy".to_string(),
                message: Some(STORE_UNHEALTHY_MESSAGE.to_string()),
            }
        }
    }
}

/// Liveness plus a metadata store check
#[utoipa::path(
    get,
    path = "/health",
    tag = "health",
    responses(
        (status = 200, description = "Service and store healthy", body = HealthResponse),
        (status = 503, description = "Metadata store unreachable", body = HealthResponse),
    )
)]
pub async fn health_check(State(state): State<SharedState>) -> impl IntoResponse {
    let store_check = check_store(&state).await;
    let healthy = store_check.status == "healthy";

    let response = HealthResponse {
        status: if healthy { "healthy" } else { "unhealthy" }.to_string(),
        version: env!("CARGO_PKG_VERSION").to_string(),
        checks: HealthChecks {
            metadata_store: store_check,
        },
    };

    let status_code = if healthy {
        StatusCode::OK
    } else {
        StatusCode::SERVICE_UNAVAILABLE
    };

    (status_code, Json(response))
}

/// Readiness check endpoint - is the service ready to accept traffic?
pub async fn readiness_check(State(state): State<SharedState>) -> StatusCode {
    match bounded(state.config.store_timeout(), state.store.ping()).await {
        Ok(()) => StatusCode::OK,
        Err(_) => StatusCode::SERVICE_UNAVAILABLE,
    }
}

#[derive(OpenApi)]
#[openapi(
    paths(health_check),
    components(schemas(HealthResponse, HealthChecks, CheckStatus))
)]
pub struct HealthApiDoc;

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_unhealthy_check_serializes_message() {
        let check = CheckStatus {
            status: "unhealthy".to_string(),
            message: Some(STORE_UNHEALTHY_MESSAGE.to_string()),
        };
        let json = serde_json::to_value(&check).unwrap();
        assert_eq!(json["status"], "unhealthy");
        assert_eq!(json["message"], STORE_UNHEALTHY_MESSAGE);
    }

    #[test]
    fn test_healthy_check_omits_message() {
        let check = CheckStatus {
            status: "healthy".to_string(),
            message: None,
        };
        let json = serde_json::to_value(&check).unwrap();
        assert!(json.get("message").is_none());
    }
}
