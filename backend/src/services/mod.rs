//! Business logic services.

pub mod admin_service;
pub mod auth_service;
pub mod clock;
pub mod query_service;
pub(crate) mod validation;
