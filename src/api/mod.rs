use axum::{
    Json, Router,
    http::HeaderValue,
    middleware,
    routing::{get, post, put},
};
use std::sync::Arc;
use tokio::sync::RwLock;
use tower_http::cors::{Any, CorsLayer};
use tower_http::trace::TraceLayer;
use tower_sessions::{Expiry, MemoryStore, SessionManagerLayer};

use time;

use crate::config::Config;
use crate::db::Store;
use crate::services::{
    AuthService, AuthServiceImpl, NoteService, NoteServiceImpl, ProjectService,
    ProjectServiceImpl, UploadService,
};

pub mod auth;
mod error;
mod notes;
mod observability;
mod projects;
mod types;

pub use error::ApiError;
pub use types::*;

use metrics_exporter_prometheus::PrometheusHandle;

#[derive(Clone)]
pub struct AppState {
    pub config: Arc<RwLock<Config>>,

    pub store: Store,

    pub uploads: Arc<UploadService>,

    pub auth_service: Arc<dyn AuthService>,

    pub project_service: Arc<dyn ProjectService>,

    pub note_service: Arc<dyn NoteService>,

    pub start_time: std::time::Instant,

    pub prometheus_handle: Option<PrometheusHandle>,
}

pub async fn create_app_state_from_config(
    config: Config,
    prometheus_handle: Option<PrometheusHandle>,
) -> anyhow::Result<Arc<AppState>> {
    let store = Store::with_pool_options(
        &config.general.database_path,
        config.general.max_db_connections,
        config.general.min_db_connections,
    )
    .await?;

    let uploads = Arc::new(UploadService::new(&config.general.upload_path));

    let auth_service: Arc<dyn AuthService> = Arc::new(AuthServiceImpl::new(
        store.clone(),
        config.security.clone(),
        config.defaults.clone(),
    ));

    let project_service: Arc<dyn ProjectService> = Arc::new(ProjectServiceImpl::new(
        store.clone(),
        uploads.clone(),
        config.defaults.clone(),
    ));

    let note_service: Arc<dyn NoteService> =
        Arc::new(NoteServiceImpl::new(store.clone(), uploads.clone()));

    Ok(Arc::new(AppState {
        config: Arc::new(RwLock::new(config)),
        store,
        uploads,
        auth_service,
        project_service,
        note_service,
        start_time: std::time::Instant::now(),
        prometheus_handle,
    }))
}

/// GET /
/// Unauthenticated landing route.
async fn home() -> Json<ApiResponse<MessageResponse>> {
    Json(ApiResponse::success(MessageResponse {
        message: format!("notey v{}", env!("CARGO_PKG_VERSION")),
    }))
}

pub async fn router(state: Arc<AppState>) -> Router {
    let (upload_path, cors_origins, session_minutes) = {
        let config = state.config.read().await;
        (
            config.general.upload_path.clone(),
            config.server.cors_allowed_origins.clone(),
            config.server.session_inactivity_minutes,
        )
    };

    let protected_routes = create_protected_router(state.clone());

    let session_store = MemoryStore::default();
    let session_layer = SessionManagerLayer::new(session_store)
        .with_secure(false)
        .with_same_site(tower_sessions::cookie::SameSite::Lax)
        .with_expiry(Expiry::OnInactivity(time::Duration::minutes(
            session_minutes,
        )));

    let api_router = Router::new()
        .merge(protected_routes)
        .route("/auth/register", post(auth::register))
        .route("/auth/login", post(auth::login))
        .route("/auth/logout", post(auth::logout))
        .route("/health/live", get(observability::health_live))
        .route("/health/ready", get(observability::health_ready))
        .layer(session_layer)
        .with_state(state.clone());

    let cors_layer = if cors_origins.contains(&"*".to_string()) {
        CorsLayer::new().allow_origin(Any)
    } else {
        let origins: Vec<HeaderValue> =
            cors_origins.iter().filter_map(|s| s.parse().ok()).collect();
        CorsLayer::new().allow_origin(origins)
    };

    Router::new()
        .route("/", get(home))
        .nest("/api", api_router)
        .nest_service(
            "/uploads",
            tower_http::services::ServeDir::new(upload_path),
        )
        .layer(cors_layer.allow_methods(Any).allow_headers(Any))
        .layer(TraceLayer::new_for_http())
        .layer(middleware::from_fn(observability::logging_middleware))
}

fn create_protected_router(state: Arc<AppState>) -> Router<Arc<AppState>> {
    Router::new()
        .route("/auth/me", get(auth::get_current_user))
        .route("/auth/password", put(auth::change_password))
        .route("/profile", get(auth::get_profile))
        .route("/profile", post(auth::update_profile))
        .route("/projects", get(projects::list_projects))
        .route("/projects/archived", get(projects::list_archived_projects))
        .route("/projects/new", post(projects::create_project))
        .route("/projects/delete/{id}", post(projects::delete_project))
        .route("/projects/{id}", get(projects::project_details))
        .route("/projects/{id}/new", post(notes::new_note))
        .route("/projects/{id}/delete/{note_id}", post(notes::delete_note))
        .route(
            "/projects/{id}/complete/{note_id}",
            post(notes::complete_note),
        )
        .route("/projects/{id}/settings", get(projects::project_settings))
        .route("/projects/{id}/settings", post(projects::update_project))
        .route("/projects/{id}/archive", post(projects::archive_project))
        .route(
            "/projects/{id}/settings/add_user",
            post(projects::add_user),
        )
        .route(
            "/projects/{id}/settings/remove_user/{user_id}",
            post(projects::remove_user),
        )
        .route("/projects/{id}/leave", post(projects::leave_project))
        .route("/metrics", get(observability::get_metrics))
        .layer(middleware::from_fn_with_state(state, auth::auth_middleware))
}
