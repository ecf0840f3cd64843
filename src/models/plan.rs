// src/models/plan.rs

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::{Validate, ValidationError};

use crate::db::Table;
use crate::models::validation::{required_error, validate_not_negative, validate_percentage};
use crate::services::entity_store::Entity;

// Catálogo fixo de serviços oferecidos
pub const SERVICE_CATALOG: &[&str] = &[
    "網站設計",
    "網站維護",
    "SEO 優化",
    "社群經營",
    "內容行銷",
    "LINE 官方帳號經營",
    "廣告投放代操",
    "主機代管",
];

fn validate_catalog_name(name: &str) -> Result<(), ValidationError> {
    if SERVICE_CATALOG.contains(&name) {
        return Ok(());
    }
    let mut err = ValidationError::new("catalog");
    err.message = Some("Serviço fora do catálogo.".into());
    Err(err)
}

// ===================================================================
// PLANO DE SERVIÇOS
// ===================================================================

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_id: Uuid,

    pub name: String,
    pub description: Option<String>,
    pub price: Decimal,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
}

impl Entity for ServicePlanItem {
    const TABLE: Table = Table::ServicePlans;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        self.name.clone()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanDraft {
    #[validate(custom(function = "validate_catalog_name"))]
    pub name: String,

    #[serde(default)]
    pub description: Option<String>,

    #[validate(custom(function = "validate_not_negative"))]
    pub price: Decimal,
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct ServicePlanPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_catalog_name"))]
    pub name: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    #[serde(skip_serializing_if = "Option::is_none")]
    #[validate(custom(function = "validate_not_negative"))]
    pub price: Option<Decimal>,
}

// ===================================================================
// PLANO DE ANÚNCIOS (no máximo um por cliente)
// ===================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPlatform {
    Google,
    Meta,
    Line,
    Tiktok,
    Yahoo,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum AdPaymentMethod {
    ServiceFee,
    Prepaid,
    CappedServiceFee,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AdvertisingPlanItem {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_id: Uuid,

    pub platform: AdPlatform,
    pub payment_method: AdPaymentMethod,

    pub service_fee_percentage: Option<Decimal>,
    pub prepaid_amount: Option<Decimal>,
    pub placement_limit: Option<Decimal>,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for AdvertisingPlanItem {
    const TABLE: Table = Table::AdvertisingPlans;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        serde_json::to_value(self.platform)
            .ok()
            .and_then(|v| v.as_str().map(str::to_string))
            .unwrap_or_default()
    }
}

/// Substitui o plano inteiro: campos `None` são gravados como null.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
#[validate(schema(function = "validate_method_fields"))]
pub struct AdvertisingPlanDraft {
    pub platform: AdPlatform,
    pub payment_method: AdPaymentMethod,

    #[serde(default)]
    #[validate(custom(function = "validate_percentage"))]
    pub service_fee_percentage: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub prepaid_amount: Option<Decimal>,

    #[serde(default)]
    #[validate(custom(function = "validate_not_negative"))]
    pub placement_limit: Option<Decimal>,
}

// Cada forma de cobrança exige o seu subconjunto de campos
fn validate_method_fields(draft: &AdvertisingPlanDraft) -> Result<(), ValidationError> {
    let missing = match draft.payment_method {
        AdPaymentMethod::ServiceFee => draft.service_fee_percentage.is_none(),
        AdPaymentMethod::Prepaid => draft.prepaid_amount.is_none(),
        AdPaymentMethod::CappedServiceFee => {
            draft.service_fee_percentage.is_none() || draft.placement_limit.is_none()
        }
    };
    if missing {
        return Err(required_error("Preencha os campos da forma de cobrança escolhida."));
    }
    Ok(())
}

impl AdvertisingPlanDraft {
    /// Limpa os campos que não pertencem à forma de cobrança.
    pub fn normalized(mut self) -> Self {
        match self.payment_method {
            AdPaymentMethod::ServiceFee => {
                self.prepaid_amount = None;
                self.placement_limit = None;
            }
            AdPaymentMethod::Prepaid => {
                self.service_fee_percentage = None;
                self.placement_limit = None;
            }
            AdPaymentMethod::CappedServiceFee => {
                self.prepaid_amount = None;
            }
        }
        self
    }
}
