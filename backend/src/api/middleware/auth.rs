//! Bearer-token guard for the administrative routes.

use std::sync::Arc;

use axum::{
    extract::{Request, State},
    http::header::{AUTHORIZATION, WWW_AUTHENTICATE},
    middleware::Next,
    response::{IntoResponse, Response},
};

use crate::error::AppError;
use crate::services::auth_service::{AuthService, Claims};

/// Authenticated admin, inserted as a request extension.
#[derive(Debug, Clone)]
pub struct AuthExtension {
    pub username: String,
    pub is_admin: bool,
}

impl From<Claims> for AuthExtension {
    fn from(claims: Claims) -> Self {
        Self {
            username: claims.sub,
            is_admin: claims.is_admin,
        }
    }
}

#[derive(Debug, PartialEq, Eq)]
enum ExtractedToken<'a> {
    Bearer(&'a str),
    None,
    Invalid,
}

fn extract_token(request: &Request) -> ExtractedToken<'_> {
    let Some(header) = request.headers().get(AUTHORIZATION) else {
        return ExtractedToken::None;
    };
    let Ok(value) = header.to_str() else {
        return ExtractedToken::Invalid;
    };
    match value.strip_prefix("Bearer ") {
        Some(token) if !token.trim().is_empty() => ExtractedToken::Bearer(token.trim()),
        _ => ExtractedToken::Invalid,
    }
}

fn unauthorized(message: &str) -> Response {
    let mut response = AppError::Authentication(message.to_string()).into_response();
    if let Ok(value) = "Bearer".parse() {
        response.headers_mut().insert(WWW_AUTHENTICATE, value);
    }
    response
}

/// Admin-only middleware: requires a valid access token with the admin claim.
pub async fn admin_middleware(
    State(auth_service): State<Arc<AuthService>>,
    mut request: Request,
    next: Next,
) -> Response {
    let auth_ext = match extract_token(&request) {
        ExtractedToken::Bearer(token) => match auth_service.validate_access_token(token) {
            Ok(claims) => AuthExtension::from(claims),
            Err(_) => return unauthorized("Invalid or expired token"),
        },
        ExtractedToken::None => return unauthorized("Missing authorization header"),
        ExtractedToken::Invalid => return unauthorized("Invalid authorization header format"),
    };

    if !auth_ext.is_admin {
        return AppError::Authorization("Admin access required".to_string()).into_response();
    }

    request.extensions_mut().insert(auth_ext);
    next.run(request).await
}
