//! Admin login.

use axum::{extract::State, middleware, routing::post, Json, Router};
use serde::{Deserialize, Serialize};
use utoipa::{OpenApi, ToSchema};

use crate::api::middleware::rate_limit::rate_limit_middleware;
use crate::api::SharedState;
use crate::error::{AppError, Result};
use crate::services::auth_service::TokenPair;

/// Public login route, rate limited per client address.
pub fn public_router(state: &SharedState) -> Router<SharedState> {
    Router::new()
        .route("/login", post(login))
        .route_layer(middleware::from_fn_with_state(
            state.login_limiter.clone(),
            rate_limit_middleware,
        ))
}

#[derive(Debug, Deserialize, ToSchema)]
pub struct LoginRequest {
    pub username: String,
    pub password: String,
}

#[derive(Debug, Serialize, ToSchema)]
pub struct LoginResponse {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: u64,
}

impl From<TokenPair> for LoginResponse {
    fn from(tokens: TokenPair) -> Self {
        Self {
            access_token: tokens.access_token,
            token_type: tokens.token_type,
            expires_in: tokens.expires_in,
        }
    }
}

/// Exchange admin credentials for an access token
#[utoipa::path(
    post,
    path = "/login",
    context_path = "/admin",
    tag = "auth",
    request_body = LoginRequest,
    responses(
        (status = 200, description = "Logged in", body = LoginResponse),
        (status = 401, description = "Invalid credentials"),
        (status = 429, description = "Too many attempts"),
    )
)]
pub async fn login(
    State(state): State<SharedState>,
    Json(payload): Json<LoginRequest>,
) -> Result<Json<LoginResponse>> {
    if payload.username.is_empty() || payload.password.is_empty() {
        return Err(AppError::Authentication(
            "Username and password are required".to_string(),
        ));
    }

    let auth = state.auth.clone();
    // bcrypt verification blocks.
    let tokens = tokio::task::spawn_blocking(move || {
        auth.authenticate(&payload.username, &payload.password)
    })
    .await
    .map_err(|e| AppError::Internal(format!("Login task failed: {}", e)))??;

    Ok(Json(tokens.into()))
}

#[derive(OpenApi)]
#[openapi(paths(login), components(schemas(LoginRequest, LoginResponse)))]
pub struct AuthApiDoc;
