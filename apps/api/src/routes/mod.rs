pub mod health;

use axum::{
    extract::DefaultBodyLimit,
    response::Html,
    routing::{get, post},
    Router,
};

use crate::session::handlers;
use crate::state::AppState;

const INDEX_HTML: &str = include_str!("../../static/index.html");

/// GET /
/// The browser form: two uploads, four result boxes, one answer box.
async fn index() -> Html<&'static str> {
    Html(INDEX_HTML)
}

pub fn build_router(state: AppState) -> Router {
    let upload_limit = state.config.max_upload_bytes;

    Router::new()
        .route("/", get(index))
        .route("/health", get(health::health_handler))
        .route("/api/v1/tasks", get(handlers::handle_list_tasks))
        .route("/api/v1/greeting", get(handlers::handle_greeting))
        .route("/api/v1/sessions", post(handlers::handle_create_session))
        .route(
            "/api/v1/sessions/:id",
            get(handlers::handle_get_session).delete(handlers::handle_delete_session),
        )
        .route(
            "/api/v1/sessions/:id/documents/:role",
            post(handlers::handle_upload_document),
        )
        .route(
            "/api/v1/sessions/:id/tasks/:task",
            post(handlers::handle_run_task),
        )
        .layer(DefaultBodyLimit::max(upload_limit))
        .with_state(state)
}
