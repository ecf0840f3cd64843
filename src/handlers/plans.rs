// src/handlers/plans.rs

use axum::{
    extract::{Path, State},
    http::StatusCode,
    response::IntoResponse,
    Json,
};
use uuid::Uuid;

use crate::{
    common::error::{ApiError, AppError},
    config::AppState,
    handlers::ConfirmPayload,
    middleware::{i18n::Locale, view::RequestView},
    models::plan::{AdvertisingPlanDraft, ServicePlanDraft, ServicePlanPatch, SERVICE_CATALOG},
};

// GET /api/catalog/services
pub async fn service_catalog() -> impl IntoResponse {
    Json(SERVICE_CATALOG)
}

// =============================================================================
//  PLANO DE SERVIÇOS
// =============================================================================

// GET /api/customers/{id}/services
pub async fn list_service_plans(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = &app_state.workspace.plans;

    if !plans.service_store(customer_id).is_loaded() {
        plans
            .refresh_services(view.ctx(), customer_id)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok((StatusCode::OK, Json(plans.service_plans(customer_id))))
}

// POST /api/customers/{id}/services
pub async fn create_service_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<ServicePlanDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let item = app_state
        .workspace
        .plans
        .add_service(view.ctx(), customer_id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(item)))
}

// PUT /api/customers/{id}/services/{item_id}
pub async fn update_service_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ServicePlanPatch>,
) -> Result<impl IntoResponse, ApiError> {
    let item = app_state
        .workspace
        .plans
        .update_service(view.ctx(), customer_id, id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(item)))
}

// DELETE /api/customers/{id}/services/{item_id}
pub async fn delete_service_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .plans
        .delete_service(view.ctx(), customer_id, id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// =============================================================================
//  PLANO DE ANÚNCIOS
// =============================================================================

// GET /api/customers/{id}/advertising
pub async fn get_advertising_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let plans = &app_state.workspace.plans;

    let plan = if plans.ad_store(customer_id).is_loaded() {
        plans.advertising_plan(customer_id)
    } else {
        plans
            .refresh_advertising(view.ctx(), customer_id)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?
    };

    let plan = plan.ok_or_else(|| AppError::NotFound(customer_id).to_api_error(&locale, &app_state.i18n_store))?;
    Ok((StatusCode::OK, Json(plan)))
}

// PUT /api/customers/{id}/advertising
pub async fn select_advertising_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<AdvertisingPlanDraft>,
) -> Result<impl IntoResponse, ApiError> {
    let plan = app_state
        .workspace
        .plans
        .select_advertising(view.ctx(), customer_id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(plan)))
}

// DELETE /api/customers/{id}/advertising
pub async fn delete_advertising_plan(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .plans
        .remove_advertising(view.ctx(), customer_id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}
