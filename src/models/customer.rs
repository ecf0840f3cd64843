// src/models/customer.rs

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::Table;
use crate::models::department::{ALL_CODE, UNCATEGORIZED_CODE};
use crate::models::nullable;
use crate::services::entity_store::Entity;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum CustomerStatus {
    #[default]
    Active,
    Paused,
    Inactive,
}

// --- CLIENTE ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct Customer {
    pub id: Uuid,
    pub user_id: Uuid,

    pub name: String,

    // Código do departamento + nome desnormalizado para exibição
    pub department: String,
    pub department_name: String,

    pub status: CustomerStatus,

    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,

    pub created_at: DateTime<Utc>,
}

impl Entity for Customer {
    const TABLE: Table = Table::Customers;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        self.name.clone()
    }
}

// Campo de formulário vazio vira None
fn blank_to_none(value: &mut Option<String>) {
    if let Some(text) = value {
        let trimmed = text.trim();
        if trimmed.is_empty() {
            *value = None;
        } else if trimmed.len() != text.len() {
            *value = Some(trimmed.to_string());
        }
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerDraft {
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    pub name: String,

    #[serde(default = "default_department")]
    pub department: String,

    // Preenchido pelo serviço a partir do departamento escolhido
    #[serde(default, skip_deserializing)]
    pub department_name: String,

    #[serde(default)]
    pub status: CustomerStatus,

    #[validate(email(message = "invalid_email"))]
    pub email: Option<String>,
    pub phone: Option<String>,
    pub address: Option<String>,
    pub contact_person: Option<String>,
    pub tax_id: Option<String>,
    pub notes: Option<String>,
}

fn default_department() -> String {
    UNCATEGORIZED_CODE.to_string()
}

impl CustomerDraft {
    pub fn new(name: impl Into<String>, department: impl Into<String>) -> Self {
        Self { name: name.into(), department: department.into(), ..Default::default() }
    }

    pub fn normalized(mut self) -> Self {
        self.name = self.name.trim().to_string();
        for field in [
            &mut self.email,
            &mut self.phone,
            &mut self.address,
            &mut self.contact_person,
            &mut self.tax_id,
            &mut self.notes,
        ] {
            blank_to_none(field);
        }
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct CustomerPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(length(min = 1, max = 120, message = "O nome é obrigatório."))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub department: Option<String>,

    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub department_name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub status: Option<CustomerStatus>,

    // Campos opcionais: `null` limpa o valor no servidor
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    #[validate(email(message = "invalid_email"))]
    pub email: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub phone: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub address: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub contact_person: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub tax_id: Option<Option<String>>,
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub notes: Option<Option<String>>,
}

impl CustomerPatch {
    /// Texto em branco num campo opcional vira `null` (limpa o campo).
    pub fn normalized(mut self) -> Self {
        if let Some(name) = self.name.as_mut() {
            *name = name.trim().to_string();
        }
        for field in [
            &mut self.email,
            &mut self.phone,
            &mut self.address,
            &mut self.contact_person,
            &mut self.tax_id,
            &mut self.notes,
        ] {
            if let Some(value) = field.as_mut() {
                blank_to_none(value);
            }
        }
        self
    }
}

// --- FILTRO DA LISTA ---

/// Predicados combinados com AND. `department = "all"` equivale a sem filtro.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerFilter {
    pub status: Option<CustomerStatus>,
    pub department: Option<String>,
    pub search: Option<String>,
}

impl CustomerFilter {
    pub fn by_department(code: impl Into<String>) -> Self {
        Self { department: Some(code.into()), ..Default::default() }
    }

    pub fn matches(&self, customer: &Customer) -> bool {
        let status_ok = self.status.is_none_or(|s| customer.status == s);

        let department_ok = match self.department.as_deref() {
            None | Some(ALL_CODE) => true,
            Some(code) => customer.department == code,
        };

        let search_ok = match self.search.as_deref().map(str::trim) {
            None | Some("") => true,
            Some(term) => {
                let term = term.to_lowercase();
                [
                    Some(&customer.name),
                    customer.email.as_ref(),
                    customer.phone.as_ref(),
                    customer.contact_person.as_ref(),
                ]
                .into_iter()
                .flatten()
                .any(|field| field.to_lowercase().contains(&term))
            }
        };

        status_ok && department_ok && search_ok
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn customer(name: &str, department: &str, status: CustomerStatus) -> Customer {
        Customer {
            id: Uuid::new_v4(),
            user_id: Uuid::nil(),
            name: name.to_string(),
            department: department.to_string(),
            department_name: department.to_string(),
            status,
            email: Some(format!("{}@example.com", name.to_lowercase())),
            phone: None,
            address: None,
            contact_person: None,
            tax_id: None,
            notes: None,
            created_at: Utc::now(),
        }
    }

    #[test]
    fn filters_compose_with_and() {
        let acme = customer("Acme", "sales", CustomerStatus::Active);
        let globex = customer("Globex", "sales", CustomerStatus::Paused);
        let initech = customer("Initech", "ops", CustomerStatus::Active);

        let filter = CustomerFilter {
            status: Some(CustomerStatus::Active),
            department: Some("sales".into()),
            search: None,
        };
        assert!(filter.matches(&acme));
        assert!(!filter.matches(&globex));
        assert!(!filter.matches(&initech));
    }

    #[test]
    fn all_department_means_no_filter() {
        let acme = customer("Acme", "sales", CustomerStatus::Inactive);
        assert!(CustomerFilter::by_department(ALL_CODE).matches(&acme));
        assert!(!CustomerFilter::by_department("ops").matches(&acme));
    }

    #[test]
    fn search_is_case_insensitive_over_contact_fields() {
        let acme = customer("Acme", "sales", CustomerStatus::Active);
        let filter = CustomerFilter { search: Some("ACME@".into()), ..Default::default() };
        assert!(filter.matches(&acme));

        let filter = CustomerFilter { search: Some("globex".into()), ..Default::default() };
        assert!(!filter.matches(&acme));
    }

    #[test]
    fn normalized_draft_drops_blank_fields() {
        let mut draft = CustomerDraft::new("  Acme ", "sales");
        draft.email = Some("   ".into());
        draft.phone = Some(" 02-1234 ".into());

        let draft = draft.normalized();
        assert_eq!(draft.name, "Acme");
        assert_eq!(draft.email, None);
        assert_eq!(draft.phone.as_deref(), Some("02-1234"));
    }

    #[test]
    fn patch_tells_null_from_absent() {
        let patch: CustomerPatch = serde_json::from_str(r#"{"email": null, "phone": "02-1234"}"#).unwrap();
        assert_eq!(patch.email, Some(None));
        assert_eq!(patch.phone, Some(Some("02-1234".to_string())));
        assert_eq!(patch.notes, None);

        // Só os campos enviados voltam no JSON, e o null continua null
        let body = serde_json::to_value(&patch).unwrap();
        assert_eq!(body, serde_json::json!({"email": null, "phone": "02-1234"}));
    }

    #[test]
    fn normalized_patch_clears_blank_fields() {
        let patch = CustomerPatch {
            name: Some(" Acme ".into()),
            email: Some(Some("  ".into())),
            notes: Some(Some(" vip ".into())),
            ..Default::default()
        }
        .normalized();

        assert_eq!(patch.name.as_deref(), Some("Acme"));
        assert_eq!(patch.email, Some(None));
        assert_eq!(patch.notes, Some(Some("vip".to_string())));
        assert!(patch.validate().is_ok());
    }

    #[test]
    fn patch_email_is_validated_only_when_set() {
        let bad = CustomerPatch { email: Some(Some("not-an-email".into())), ..Default::default() };
        assert!(bad.validate().is_err());

        let cleared = CustomerPatch { email: Some(None), ..Default::default() };
        assert!(cleared.validate().is_ok());
    }
}
