//! API endpoints for the check-cx control plane
//!
//! Provides REST API for managing:
//! - Check configs (CRUD, copy, enabled/maintenance flags)
//! - Groups (CRUD with config counts)
//! - System notifications
//! - Dashboard summary
//! - Authentication (setup, login, session claims)

pub mod auth;
pub mod configs;
pub mod dashboard;
pub mod error;
pub mod groups;
pub mod notifications;

use axum::{
    middleware,
    routing::{get, post, put},
    Router,
};
use std::sync::Arc;

use crate::auth::auth_middleware;
use crate::AppState;

pub use error::ApiError;

/// Routes reachable without a token
fn public_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/setup/status", get(auth::setup_status))
        .route("/setup/init", post(auth::setup_init))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
}

/// Routes that require `Authorization: Bearer <jwt>`
fn protected_routes() -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::current_user))

        // Dashboard
        .route("/dashboard", get(dashboard::get_dashboard))

        // Check configs
        .route("/configs", get(configs::list_configs).post(configs::create_config))
        .route("/configs/:id", get(configs::get_config).put(configs::update_config).delete(configs::delete_config))
        .route("/configs/:id/copy", post(configs::copy_config))
        .route("/configs/:id/enabled", put(configs::set_enabled))
        .route("/configs/:id/maintenance", put(configs::set_maintenance))

        // Groups
        .route("/groups", get(groups::list_groups).post(groups::create_group))
        .route("/groups/:id", put(groups::update_group).delete(groups::delete_group))

        // Notifications
        .route("/notifications", get(notifications::list_notifications).post(notifications::create_notification))
        .route("/notifications/:id", put(notifications::update_notification).delete(notifications::delete_notification))
        .route("/notifications/:id/active", put(notifications::set_active))
}

/// Create the API router with all control plane endpoints
pub fn create_api_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    public_routes().merge(
        protected_routes().route_layer(middleware::from_fn_with_state(state, auth_middleware)),
    )
}
