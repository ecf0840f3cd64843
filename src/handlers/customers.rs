// src/handlers/customers.rs

use axum::{
    extract::{Path, Query, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::ConfirmPayload,
    middleware::{i18n::Locale, view::RequestView},
    models::customer::{CustomerDraft, CustomerFilter, CustomerPatch},
};

// GET /api/customers?status=active&department=sales&search=acme
pub async fn list_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Query(filter): Query<CustomerFilter>,
) -> Result<impl IntoResponse, ApiError> {
    let customers = &app_state.workspace.customers;

    if !customers.store().is_loaded() {
        customers
            .refresh(view.ctx())
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok((StatusCode::OK, Json(customers.list(&filter))))
}

// GET /api/customers/{id}
pub async fn get_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    Path(id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .workspace
        .customers
        .find(id)
        .ok_or_else(|| AppError::NotFound(id).to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// POST /api/customers
pub async fn create_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Json(payload): Json<CustomerDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .workspace
        .customers
        .create(view.ctx(), payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(customer)))
}

// PUT /api/customers/{id}
pub async fn update_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(id): Path<Uuid>,
    Json(payload): Json<CustomerPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let customer = app_state
        .workspace
        .customers
        .update(view.ctx(), id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(customer)))
}

// DELETE /api/customers/{id}
pub async fn delete_customer(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(id): Path<Uuid>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .delete_customer(view.ctx(), id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ReassignPayload {
    pub ids: Vec<Uuid>,
    pub department: String,
    #[serde(default)]
    pub secret: String,
}

// POST /api/customers/reassign
pub async fn reassign_customers(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Json(payload): Json<ReassignPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let moved = app_state
        .workspace
        .customers
        .reassign(view.ctx(), &payload.ids, &payload.department, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(json!({ "moved": moved.len(), "customers": moved }))))
}
