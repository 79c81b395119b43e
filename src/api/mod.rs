use axum::{
    Router,
    http::HeaderValue,
    middleware,
    routing::{delete, get, post, put},
};
use std::sync::Arc;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;

use crate::config::Config;
use crate::state::SharedState;

pub mod audit;
pub mod auth;
pub mod departments;
mod error;
pub mod event_types;
pub mod guard;
pub mod incidents;
mod observability;
pub mod system;
mod types;
pub mod users;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub shared: Arc<SharedState>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

impl AppState {
    #[must_use]
    pub fn store(&self) -> &crate::db::Store {
        &self.shared.store
    }

    #[must_use]
    pub fn event_bus(
        &self,
    ) -> &tokio::sync::broadcast::Sender<crate::domain::events::AuditEvent> {
        &self.shared.event_bus
    }
}

pub async fn create_app_state(
    shared: Arc<SharedState>,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    Ok(Arc::new(AppState {
        shared,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let shared = Arc::new(SharedState::new(config).await?);
    create_app_state(shared, prometheus_handle).await
}

pub async fn router(state: Arc<AppState>) -> Router {
    let cors_origins = {
        let config = state.shared.config.read().await;
        config.server.cors_allowed_origins.clone()
    };

    let protected_routes = create_protected_router(state.clone());

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/login", post(auth::login))
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    let ops_router = Router::new()
        .route("/metrics", get(observability::get_metrics))
        .route("/health/live", get(system::health_live))
        .route("/health/ready", get(system::health_ready))
        .with_state(state);

    Router::new()
        .nest("/api", api_router)
        .merge(ops_router)
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/refresh", post(auth::refresh))
        .route("/users", post(users::register))
        .route("/users", get(users::list_users))
        .route("/users/{id}", get(users::get_user))
        .route("/users/{id}", delete(users::deactivate_user))
        .route("/users/me/password", put(users::change_password))
        .route("/incidents", post(incidents::create_incident))
        .route("/incidents", get(incidents::list_incidents))
        .route("/incidents/{id}", get(incidents::get_incident))
        .route("/incidents/{id}/submit", post(incidents::submit))
        .route(
            "/incidents/{id}/department-approve",
            post(incidents::department_approve),
        )
        .route(
            "/incidents/{id}/department-reject",
            post(incidents::department_reject),
        )
        .route(
            "/incidents/{id}/submit-command-center",
            post(incidents::submit_command_center),
        )
        .route(
            "/incidents/{id}/command-center-resolve",
            post(incidents::command_center_resolve),
        )
        .route(
            "/incidents/{id}/issue-emergency-team",
            post(incidents::issue_emergency_team),
        )
        .route("/incidents/{id}/resolve", post(incidents::resolve))
        .route("/incidents/{id}/close", post(incidents::close))
        .route("/incidents/{id}/resubmit", post(incidents::resubmit))
        .route("/event-types", post(event_types::create_event_type))
        .route("/event-types", get(event_types::list_event_types))
        .route("/departments", post(departments::create_department))
        .route("/departments", get(departments::list_departments))
        .route("/audit-logs", get(audit::list_audit_logs))
        .route_layer(middleware::from_fn_with_state(state, guard::auth_middleware))
}
