pub mod health;

use axum::{
    routing::{delete, get, post, put},
    Router,
};

use crate::cv_files::handlers as cv_files;
use crate::sections::handlers as sections;
use crate::state::AppState;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        // CV sections
        .route(
            "/api/v1/users/:user_id/cv-sections",
            get(sections::handle_load).put(sections::handle_commit),
        )
        .route(
            "/api/v1/users/:user_id/cv-sections/edits",
            post(sections::handle_edit),
        )
        .route(
            "/api/v1/users/:user_id/cv-sections/sync-status",
            get(sections::handle_sync_status),
        )
        // CV files (proxied to the upload service)
        .route(
            "/api/v1/cv",
            get(cv_files::handle_list).post(cv_files::handle_upload),
        )
        .route(
            "/api/v1/cv/:cv_id/default",
            put(cv_files::handle_set_default),
        )
        .route("/api/v1/cv/:cv_id", delete(cv_files::handle_delete))
        .with_state(state)
}
