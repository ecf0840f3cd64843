// src/handlers/departments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::ConfirmPayload,
    middleware::{i18n::Locale, view::RequestView},
    models::department::{DepartmentDraft, DepartmentPatch},
};

// =============================================================================
//  LISTAGEM
// =============================================================================

// GET /api/departments
pub async fn list_departments(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
) -> Result<impl IntoResponse, ApiError> {
    let departments = &app_state.workspace.departments;

    // Primeira visita carrega do servidor; depois serve da memória
    if !departments.store().is_loaded() {
        departments
            .refresh(view.ctx())
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok((StatusCode::OK, Json(departments.list())))
}

// GET /api/departments/counts
pub async fn department_counts(
    State(app_state): State<AppState>,
) -> Result<impl IntoResponse, ApiError> {
    Ok((StatusCode::OK, Json(app_state.workspace.customers.department_counts())))
}

// =============================================================================
//  ESCRITA
// =============================================================================

// POST /api/departments
pub async fn create_department(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Json(payload): Json<DepartmentDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let department = app_state
        .workspace
        .departments
        .create(view.ctx(), payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(department)))
}

// PUT /api/departments/{id}
pub async fn rename_department(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(id): Path<Uuid>,
    Json(payload): Json<DepartmentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let department = app_state
        .workspace
        .departments
        .rename(view.ctx(), id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(department)))
}

// DELETE /api/departments/{id}
pub async fn delete_department(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .departments
        .delete(view.ctx(), id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  REORDENAÇÃO
// =============================================================================

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReorderPayload {
    pub active_id: Uuid,
    pub over_id: Uuid,
}

// POST /api/departments/reorder
pub async fn reorder_departments(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Json(payload): Json<ReorderPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let departments = app_state
        .workspace
        .departments
        .reorder(view.ctx(), payload.active_id, payload.over_id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(departments)))
}
