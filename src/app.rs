use crate::handlers;
use crate::state::AppState;
use axum::{
    Router,
    routing::{delete, get, post},
};

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/", get(handlers::index))
        .route("/log/:category", post(handlers::log_form))
        .route("/delete/:id", post(handlers::delete_form))
        .route("/api/config", get(handlers::get_config))
        .route("/api/events", get(handlers::list_events).post(handlers::create_event))
        .route("/api/events/:id", delete(handlers::delete_event))
        .route("/api/report", get(handlers::get_report))
        .route("/api/reload", post(handlers::reload))
        .with_state(state)
}
