// src/middleware/customer.rs

use std::collections::HashMap;

use axum::{
    extract::{Path, Request, State},
    middleware::Next,
    response::Response,
};
use uuid::Uuid;

use crate::{
    common::error::ApiError,
    config::AppState,
    middleware::{i18n::Locale, view::RequestView},
};

// Guarda das abas (/customers/{id}/...): o cliente precisa existir antes
// de qualquer store da aba ser criado
pub async fn customer_guard(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(params): Path<HashMap<String, String>>,
    request: Request,
    next: Next,
) -> Result<Response, ApiError> {
    // id malformado fica para o extrator do handler (400)
    if let Some(id) = params.get("id").and_then(|raw| Uuid::parse_str(raw).ok()) {
        app_state
            .workspace
            .require_customer(view.ctx(), id)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok(next.run(request).await)
}
