// src/models/file.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::Table;
use crate::services::entity_store::Entity;

pub const MAX_FILE_SIZE: usize = 10 * 1024 * 1024;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFile {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_id: Uuid,

    pub file_name: String,
    pub storage_path: String, // Chave no blob store: {user}/{customer}/{millis}.{ext}
    pub file_size: i64,
    pub mime_type: String,

    pub uploaded_at: DateTime<Utc>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for CustomerFile {
    const TABLE: Table = Table::CustomerFiles;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        self.file_name.clone()
    }
}

fn validate_size(bytes: &[u8]) -> Result<(), ValidationError> {
    if bytes.is_empty() {
        let mut err = ValidationError::new("length");
        err.message = Some("O arquivo está vazio.".into());
        return Err(err);
    }
    if bytes.len() > MAX_FILE_SIZE {
        let mut err = ValidationError::new("length");
        err.add_param("max".into(), &MAX_FILE_SIZE);
        err.message = Some("O arquivo passa do limite de 10 MB.".into());
        return Err(err);
    }
    Ok(())
}

/// Arquivo recebido do formulário, antes de ir para o blob store.
#[derive(Debug, Clone, Validate)]
pub struct FileUpload {
    #[validate(length(min = 1, max = 255, message = "O nome do arquivo é obrigatório."))]
    pub file_name: String,
    pub mime_type: String,
    #[validate(custom(function = "validate_size"))]
    pub bytes: Vec<u8>,
}

/// Metadados gravados na tabela depois que o blob foi salvo.
#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct NewCustomerFile {
    pub file_name: String,
    pub storage_path: String,
    pub file_size: i64,
    pub mime_type: String,
    pub uploaded_at: DateTime<Utc>,
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct FileRename {
    #[validate(length(min = 1, max = 255, message = "O nome do arquivo é obrigatório."))]
    pub file_name: String,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn uploads_are_limited_to_ten_megabytes() {
        let upload = |size: usize| FileUpload {
            file_name: "contrato.pdf".into(),
            mime_type: "application/pdf".into(),
            bytes: vec![0; size],
        };
        assert!(upload(1024).validate().is_ok());
        assert!(upload(0).validate().is_err());
        assert!(upload(MAX_FILE_SIZE + 1).validate().is_err());
    }
}
