// src/handlers/files.rs

use axum::{
    body::Bytes,
    extract::{Path, Query, State},
    http::{header, HeaderMap, StatusCode},
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
    models::file::{FileRename, FileUpload, MAX_FILE_SIZE},
};

// Acima do limite do arquivo, para que o excesso chegue à validação e volte traduzido
pub const UPLOAD_BODY_LIMIT: usize = MAX_FILE_SIZE + 1024 * 1024;

// GET /api/customers/{id}/files
pub async fn list_files(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
) -> Result<impl IntoResponse, ApiError> {
    let files = &app_state.workspace.files;

    if !files.store(customer_id).is_loaded() {
        files
            .refresh(view.ctx(), customer_id)
            .await
            .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;
    }

    Ok((StatusCode::OK, Json(files.list(customer_id))))
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UploadQuery {
    pub file_name: String,
}

// POST /api/customers/{id}/files?fileName=contrato.pdf  (corpo = bytes do arquivo)
pub async fn upload_file(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path(customer_id): Path<Uuid>,
    Query(query): Query<UploadQuery>,
    headers: HeaderMap,
    body: Bytes,
) -> Result<impl IntoResponse, ApiError> {
    let mime_type = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
        .unwrap_or("application/octet-stream")
        .to_string();

    let upload = FileUpload { file_name: query.file_name, mime_type, bytes: body.to_vec() };

    let file = app_state
        .workspace
        .files
        .upload(view.ctx(), customer_id, upload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::CREATED, Json(file)))
}

// GET /api/customers/{id}/files/{file_id}
pub async fn download_file(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
) -> Result<impl IntoResponse, ApiError> {
    let (file, bytes) = app_state
        .workspace
        .files
        .download(view.ctx(), customer_id, id)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    let disposition = format!("attachment; filename*=UTF-8''{}", encode_file_name(&file.file_name));
    Ok((
        StatusCode::OK,
        [(header::CONTENT_TYPE, file.mime_type), (header::CONTENT_DISPOSITION, disposition)],
        bytes,
    ))
}

// PUT /api/customers/{id}/files/{file_id}
pub async fn rename_file(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<FileRename>,
) -> Result<impl IntoResponse, ApiError> {
    let file = app_state
        .workspace
        .files
        .rename(view.ctx(), customer_id, id, payload)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok((StatusCode::OK, Json(file)))
}

// DELETE /api/customers/{id}/files/{file_id}
pub async fn delete_file(
    State(app_state): State<AppState>,
    locale: Locale,
    view: RequestView,
    Path((customer_id, id)): Path<(Uuid, Uuid)>,
    Json(payload): Json<ConfirmPayload>,
) -> Result<impl IntoResponse, ApiError> {
    app_state
        .workspace
        .files
        .delete(view.ctx(), customer_id, id, &payload.secret)
        .await
        .map_err(|app_err| app_err.to_api_error(&locale, &app_state.i18n_store))?;

    Ok(StatusCode::NO_CONTENT)
}

// RFC 5987: nomes com acentos ou CJK no Content-Disposition
fn encode_file_name(name: &str) -> String {
    name.bytes()
        .map(|b| match b {
            b'A'..=b'Z' | b'a'..=b'z' | b'0'..=b'9' | b'.' | b'-' | b'_' => (b as char).to_string(),
            _ => format!("%{:02X}", b),
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn file_names_are_percent_encoded() {
        assert_eq!(encode_file_name("contrato.pdf"), "contrato.pdf");
        assert_eq!(encode_file_name("a b.txt"), "a%20b.txt");
        assert_eq!(encode_file_name("合約.pdf"), "%E5%90%88%E7%B4%84.pdf");
    }
}
