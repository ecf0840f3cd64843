use std::collections::HashMap;

use axum::{
    http::StatusCode,
    response::{IntoResponse, Response},
    Json,
};
use serde_json::json;
use thiserror::Error;
use uuid::Uuid;

use crate::common::i18n::{I18nStore, Message, MessageKey};
use crate::db::{GatewayError, StorageError};
use crate::middleware::i18n::Locale;

// Nosso tipo de erro, com `thiserror` para melhor ergonomia.
// Nada aqui é fatal: toda variante volta o usuário a um estado válido.
#[derive(Debug, Error)]
pub enum AppError {
    #[error("Erro de validação")]
    ValidationError(#[from] validator::ValidationErrors),

    #[error("Código de departamento já existe: {0}")]
    DuplicateDepartmentCode(String),

    #[error("Departamento fixo não pode ser alterado: {0}")]
    PinnedDepartment(String),

    #[error("Departamento inexistente: {0}")]
    UnknownDepartment(String),

    #[error("Falha ao gravar no servidor: {0}")]
    RemoteWriteError(#[source] GatewayError),

    #[error("Falha ao carregar do servidor: {0}")]
    RemoteReadError(#[source] GatewayError),

    #[error("Senha de confirmação incorreta")]
    ConfirmationDenied,

    #[error("Registro não encontrado: {0}")]
    NotFound(Uuid),

    #[error("Já existe um envio em andamento para {0}")]
    SubmissionInProgress(String),

    #[error("Operação cancelada")]
    Cancelled,

    #[error("Falha no armazenamento de arquivos: {0}")]
    StorageError(#[from] StorageError),

    // Variante genérica para qualquer outro erro inesperado
    #[error("Erro interno do servidor")]
    InternalServerError(#[from] anyhow::Error),
}

impl AppError {
    /// Erros detectados localmente, antes de qualquer chamada de rede.
    pub fn is_validation(&self) -> bool {
        matches!(
            self,
            AppError::ValidationError(_)
                | AppError::DuplicateDepartmentCode(_)
                | AppError::PinnedDepartment(_)
                | AppError::UnknownDepartment(_)
        )
    }

    pub fn message(&self) -> Message {
        match self {
            AppError::ValidationError(_) => Message::new(MessageKey::ValidationFailed),
            AppError::DuplicateDepartmentCode(code) => {
                Message::new(MessageKey::DuplicateDepartmentCode).with_subject(code.clone())
            }
            AppError::PinnedDepartment(code) => {
                Message::new(MessageKey::PinnedDepartment).with_subject(code.clone())
            }
            AppError::UnknownDepartment(code) => {
                Message::new(MessageKey::UnknownDepartment).with_subject(code.clone())
            }
            AppError::RemoteWriteError(_) => Message::new(MessageKey::RemoteWriteFailed),
            AppError::RemoteReadError(_) => Message::new(MessageKey::RemoteReadFailed),
            AppError::ConfirmationDenied => Message::new(MessageKey::ConfirmationDenied),
            AppError::NotFound(_) => Message::new(MessageKey::NotFound),
            AppError::SubmissionInProgress(_) => Message::new(MessageKey::SubmissionInProgress),
            AppError::Cancelled => Message::new(MessageKey::Cancelled),
            AppError::StorageError(_) => Message::new(MessageKey::StorageFailed),
            AppError::InternalServerError(_) => Message::new(MessageKey::Internal),
        }
    }

    pub fn status(&self) -> StatusCode {
        match self {
            AppError::ValidationError(_)
            | AppError::PinnedDepartment(_)
            | AppError::UnknownDepartment(_) => StatusCode::BAD_REQUEST,
            AppError::DuplicateDepartmentCode(_) | AppError::SubmissionInProgress(_) => {
                StatusCode::CONFLICT
            }
            AppError::ConfirmationDenied => StatusCode::FORBIDDEN,
            AppError::NotFound(_) => StatusCode::NOT_FOUND,
            AppError::RemoteWriteError(_)
            | AppError::RemoteReadError(_)
            | AppError::StorageError(_) => StatusCode::BAD_GATEWAY,
            // 499: o cliente foi embora antes da resposta
            AppError::Cancelled => {
                StatusCode::from_u16(499).unwrap_or(StatusCode::REQUEST_TIMEOUT)
            }
            AppError::InternalServerError(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    /// Converte para a resposta HTTP, com a mensagem no idioma do cliente.
    pub fn to_api_error(&self, locale: &Locale, i18n: &I18nStore) -> ApiError {
        let status = self.status();
        if status.is_server_error() {
            tracing::error!("Erro Interno do Servidor: {:?}", self);
        }

        // Retorna todos os detalhes da validação, campo a campo.
        let details = match self {
            AppError::ValidationError(errors) => {
                let mut details = HashMap::new();
                for (field, field_errors) in errors.field_errors() {
                    let messages: Vec<String> = field_errors
                        .iter()
                        .map(|e| {
                            e.message
                                .as_ref()
                                .map(|m| m.to_string())
                                .unwrap_or_else(|| e.code.to_string())
                        })
                        .collect();
                    details.insert(field.to_string(), messages);
                }
                Some(details)
            }
            _ => None,
        };

        ApiError {
            status,
            message: i18n.render(&locale.0, &self.message()),
            details,
        }
    }
}

// O erro já traduzido que volta para o navegador
#[derive(Debug)]
pub struct ApiError {
    pub status: StatusCode,
    pub message: String,
    pub details: Option<HashMap<String, Vec<String>>>,
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = match self.details {
            Some(details) => json!({ "error": self.message, "details": details }),
            None => json!({ "error": self.message }),
        };
        (self.status, Json(body)).into_response()
    }
}
