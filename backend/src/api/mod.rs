//! API module - HTTP handlers and middleware.

pub mod dto;
pub mod handlers;
pub mod middleware;
pub mod openapi;
pub mod routes;

use std::sync::Arc;

use crate::config::Config;
use crate::services::admin_service::AdminService;
use crate::services::auth_service::AuthService;
use crate::services::clock::Clock;
use crate::services::query_service::QueryService;
use crate::store::MetadataStore;
use middleware::rate_limit::RateLimiter;

/// Application state shared across handlers
pub struct AppState {
    pub config: Arc<Config>,
    pub store: Arc<dyn MetadataStore>,
    pub query: QueryService,
    pub admin: AdminService,
    pub auth: Arc<AuthService>,
    pub login_limiter: Arc<RateLimiter>,
}

impl AppState {
    pub fn new(config: Config, store: Arc<dyn MetadataStore>, clock: Arc<dyn Clock>) -> Self {
        let config = Arc::new(config);
        let timeout = config.store_timeout();
        Self {
            query: QueryService::new(store.clone(), clock.clone(), timeout),
            admin: AdminService::new(store.clone(), clock, timeout),
            auth: Arc::new(AuthService::new(config.clone())),
            login_limiter: Arc::new(RateLimiter::for_login()),
            store,
            config,
        }
    }

    /// Rows per page when the client does not ask for a size.
    pub fn default_page_size(&self) -> u32 {
        u32::try_from(self.config.page_size).unwrap_or(u32::MAX)
    }
}

pub type SharedState = Arc<AppState>;
