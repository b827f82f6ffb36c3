pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    routing::{get, patch, post, put},
    Router,
};

use crate::extraction::MAX_UPLOAD_BYTES;
use crate::session::handlers as session;
use crate::state::AppState;
use crate::suggestions::handlers as suggestions;

/// Request body ceiling for uploads: the file limit plus multipart framing.
const UPLOAD_BODY_LIMIT: usize = MAX_UPLOAD_BYTES as usize + 64 * 1024;

pub fn build_router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health::health_handler))
        .route("/api/v1/resumes/parse", post(session::handle_parse_text))
        // Session pipeline: upload → job description → editor → templates
        .route(
            "/api/v1/sessions",
            post(session::handle_upload).layer(DefaultBodyLimit::max(UPLOAD_BODY_LIMIT)),
        )
        .route("/api/v1/sessions/:id", get(session::handle_get_session))
        .route(
            "/api/v1/sessions/:id/job-description",
            put(session::handle_set_job_description),
        )
        .route(
            "/api/v1/sessions/:id/sections/:section_id",
            patch(session::handle_update_section),
        )
        .route(
            "/api/v1/sessions/:id/suggestions",
            post(suggestions::handle_bulk_suggestions),
        )
        .route(
            "/api/v1/sessions/:id/rewrite",
            post(suggestions::handle_rewrite),
        )
        .route("/api/v1/sessions/:id/preview", get(session::handle_preview))
        .route("/api/v1/sessions/:id/finalize", post(session::handle_finalize))
        .with_state(state)
}
