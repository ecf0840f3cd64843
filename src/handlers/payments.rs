// src/handlers/payments.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use serde::Deserialize;
use serde_json::json;
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    handlers::ConfirmPayload,
    middleware::{i18n::Locale, view::RequestView},
    models::payment::{PaymentDraft, PaymentPatch},
};

// GET /api/customers/{id}/payments
pub async fn list_payments(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let payments = &app_state.workspace.payments;

    if !payments.store(customer_id).is_loaded() {
        payments
            .refresh(view.ctx(), customer_id)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok((
        StatusCode::OK,
        Json(json!({
            "records": payments.list(customer_id),
            "summary": payments.summary(customer_id),
        })),
    ))
}

// POST /api/customers/{id}/payments
pub async fn create_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<PaymentDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .workspace
        .payments
        .create(view.ctx(), customer_id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(record)))
}

// PUT /api/customers/{id}/payments/{payment_id}
pub async fn update_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<PaymentPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .workspace
        .payments
        .update(view.ctx(), customer_id, id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(record)))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmedPayload {
    pub is_confirmed: bool,
}

// PUT /api/customers/{id}/payments/{payment_id}/confirm
pub async fn set_confirmed(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ConfirmedPayload>,
) -> Result<impl IntoResponse, ApiError> {
    let record = app_state
        .workspace
        .payments
        .set_confirmed(view.ctx(), customer_id, id, payload.is_confirmed)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(record)))
}

// DELETE /api/customers/{id}/payments/{payment_id}
pub async fn delete_payment(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .payments
        .delete(view.ctx(), customer_id, id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
