// src/handlers/activity.rs

use axum::{extract::State, http::StatusCode, response::IntoResponse, Json};
use chrono::{DateTime, Utc};
use serde::Serialize;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, view::RequestView},
    services::notifications::ActivityType,
};

/// Entrada do feed já traduzida para o idioma do cliente.
#[derive(Debug, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityView {
    #[serde(rename = "type")]
    pub activity: ActivityType,
    pub message: String,
    pub subject_name: String,
    pub at: DateTime<Utc>,
}

// GET /api/activity
pub async fn list_activity(
    State(app_state): State<AppState>,
    locale: Locale,
) -> impl IntoResponse {
    let feed: Vec<ActivityView> = app_state
        .workspace
        .notifications()
        .activity()
        .into_iter()
        .map(|event| ActivityView {
            activity: event.activity,
            message: app_state.i18n_store.render(&locale.0, &event.message),
            subject_name: event.subject_name,
            at: event.at,
        })
        .collect();

    Json(feed)
}

// DELETE /api/activity
pub async fn clear_activity(State(app_state): State<AppState>) -> impl IntoResponse {
    app_state.workspace.notifications().clear_activity();
    StatusCode::NO_CONTENT
}

// POST /api/sync
pub async fn sync_workspace(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .load(view.ctx())
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(app_state.workspace.departments.list())))
}
