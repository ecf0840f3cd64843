// src/models/department.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::Table;
use crate::models::validation::validate_slug;
use crate::services::entity_store::Entity;

// Linhas fixas: nunca arrastáveis e fora da renumeração
pub const ALL_CODE: &str = "all";
pub const UNCATEGORIZED_CODE: &str = "uncategorized";
pub const UNCATEGORIZED_SORT_ORDER: i32 = 9999;

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Department {
    pub id: Uuid,
    pub user_id: Uuid,

    pub code: String, // Ex: "marketing", "行銷"
    pub name: String, // Nome exibido na navegação

    pub sort_order: i32,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Department {
    pub fn is_all(&self) -> bool {
        self.code == ALL_CODE
    }

    pub fn is_uncategorized(&self) -> bool {
        self.code == UNCATEGORIZED_CODE
    }

    pub fn is_pinned(&self) -> bool {
        self.is_all() || self.is_uncategorized()
    }
}

impl Entity for Department {
    const TABLE: Table = Table::Departments;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentDraft {
    #[validate(custom(function = "validate_slug"))]
    pub code: String,

    #[validate(length(min = 1, max = 60, message = "O nome é obrigatório."))]
    pub name: String,

    // Sem valor, o serviço coloca no fim (antes de "uncategorized")
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub sort_order: Option<i32>,
}

impl DepartmentDraft {
    pub fn pinned_all() -> Self {
        Self { code: ALL_CODE.to_string(), name: "全部".to_string(), sort_order: Some(0) }
    }

    pub fn pinned_uncategorized() -> Self {
        Self {
            code: UNCATEGORIZED_CODE.to_string(),
            name: "未分類".to_string(),
            sort_order: Some(UNCATEGORIZED_SORT_ORDER),
        }
    }
}

/// Só o nome muda; o código identifica o departamento nos clientes.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentPatch {
    #[validate(length(min = 1, max = 60, message = "O nome é obrigatório."))]
    pub name: String,
}

/// Par (id, posição) gravado em lote depois de um arrastar-e-soltar.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct SortOrderUpdate {
    pub id: Uuid,
    pub sort_order: i32,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn pinned_drafts_use_reserved_codes() {
        let all = DepartmentDraft::pinned_all();
        let none = DepartmentDraft::pinned_uncategorized();
        assert_eq!(all.code, ALL_CODE);
        assert_eq!(none.sort_order, Some(UNCATEGORIZED_SORT_ORDER));
        assert!(all.validate().is_ok());
        assert!(none.validate().is_ok());
    }

    #[test]
    fn draft_rejects_codes_with_spaces() {
        let draft = DepartmentDraft { code: "Sales Team".into(), name: "Sales".into(), sort_order: None };
        let errors = draft.validate().unwrap_err();
        assert!(errors.field_errors().contains_key("code"));
    }
}
