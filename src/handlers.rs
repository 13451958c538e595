use crate::errors::{AppError, StoreError};
use crate::models::{
    Category, ConfigResponse, Event, NewEventRequest, Period, ReloadResponse, Report, ReportQuery,
};
use crate::state::AppState;
use crate::stats::build_report;
use crate::ui::render_index;
use axum::{
    Json,
    extract::{Path, Query, State},
    http::StatusCode,
    response::{Html, Redirect},
};
use chrono::Local;
use tracing::warn;

pub async fn index(State(state): State<AppState>) -> Html<String> {
    let mode = state.store.lock().await.backend().mode();
    Html(render_index(&state.config, mode))
}

pub async fn get_config(State(state): State<AppState>) -> Json<ConfigResponse> {
    let storage = state.store.lock().await.backend().mode();
    Json(ConfigResponse {
        labels: state.config.labels.clone(),
        default_period: state.config.default_period,
        periods: Period::ALL,
        chart_style: state.config.chart_style,
        storage,
    })
}

pub async fn list_events(State(state): State<AppState>) -> Json<Vec<Event>> {
    let store = state.store.lock().await;
    Json(store.newest_first())
}

pub async fn create_event(
    State(state): State<AppState>,
    Json(payload): Json<NewEventRequest>,
) -> Result<(StatusCode, Json<Event>), AppError> {
    let event = add_event(&state, &payload.category).await?;
    Ok((StatusCode::CREATED, Json(event)))
}

pub async fn delete_event(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<StatusCode, AppError> {
    remove_event(&state, &id).await?;
    Ok(StatusCode::NO_CONTENT)
}

pub async fn get_report(
    State(state): State<AppState>,
    Query(query): Query<ReportQuery>,
) -> Result<Json<Report>, AppError> {
    let period = match query.period.as_deref() {
        Some(raw) => raw
            .parse::<Period>()
            .map_err(|e| AppError::bad_request(e.to_string()))?,
        None => state.config.default_period,
    };
    let store = state.store.lock().await;
    Ok(Json(build_report(store.list(), period, &Local::now())))
}

pub async fn reload(State(state): State<AppState>) -> Result<Json<ReloadResponse>, AppError> {
    let mut store = state.store.lock().await;
    let entries = store.reload().await.inspect_err(log_failure)?;
    Ok(Json(ReloadResponse {
        entries,
        revision: store.revision().map(str::to_string),
    }))
}

pub async fn log_form(
    State(state): State<AppState>,
    Path(category): Path<String>,
) -> Result<Redirect, AppError> {
    add_event(&state, &category).await?;
    Ok(Redirect::to("/"))
}

pub async fn delete_form(
    State(state): State<AppState>,
    Path(id): Path<String>,
) -> Result<Redirect, AppError> {
    remove_event(&state, &id).await?;
    Ok(Redirect::to("/"))
}

async fn add_event(state: &AppState, raw_category: &str) -> Result<Event, AppError> {
    let category = Category::parse(raw_category);
    let mut store = state.store.lock().await;
    let event = store.add(category).await.inspect_err(log_failure)?;
    Ok(event)
}

async fn remove_event(state: &AppState, id: &str) -> Result<(), AppError> {
    let mut store = state.store.lock().await;
    if store.remove(id).await.inspect_err(log_failure)? {
        Ok(())
    } else {
        Err(StoreError::Validation(format!("no entry with id '{id}'")).into())
    }
}

fn log_failure(err: &StoreError) {
    warn!(error = %err, retryable = err.is_retryable(), "store operation failed");
}
