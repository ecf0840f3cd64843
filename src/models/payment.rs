// src/models/payment.rs

use chrono::{DateTime, NaiveDate, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

use crate::db::Table;
use crate::models::nullable;
use crate::models::validation::validate_not_negative;
use crate::services::entity_store::Entity;

// --- ENUMS ---

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentMethod {
    BankTransfer,
    Cash,
    CreditCard,
    Check,
    Other,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PaymentAccount {
    Company,
    Personal,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum BillingCycle {
    Monthly,
    Quarterly,
    SemiAnnual,
    Annual,
    OneTime,
}

/// `total = amount + tax`, sempre calculado pelo cliente.
pub fn total_amount(amount: Decimal, tax_amount: Decimal) -> Decimal {
    amount + tax_amount
}

// --- REGISTRO DE PAGAMENTO ---

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentRecord {
    pub id: Uuid,
    pub user_id: Uuid,
    pub customer_id: Uuid,

    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    pub account: Option<PaymentAccount>,
    pub billing_cycle: BillingCycle,

    pub amount: Decimal,
    pub tax_amount: Decimal,
    pub total_amount: Decimal,

    pub is_confirmed: bool,

    #[serde(default)]
    pub created_at: Option<DateTime<Utc>>,
    #[serde(default)]
    pub updated_at: Option<DateTime<Utc>>,
}

impl Entity for PaymentRecord {
    const TABLE: Table = Table::PaymentRecords;

    fn id(&self) -> Uuid {
        self.id
    }

    fn subject(&self) -> String {
        self.payment_date.to_string()
    }
}

#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentDraft {
    pub payment_date: NaiveDate,
    pub payment_method: PaymentMethod,
    #[serde(default)]
    pub account: Option<PaymentAccount>,
    pub billing_cycle: BillingCycle,

    #[validate(custom(function = "validate_not_negative"))]
    pub amount: Decimal,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default)]
    pub tax_amount: Decimal,

    #[serde(default)]
    pub is_confirmed: bool,

    // Nunca vem do formulário
    #[serde(default, skip_deserializing)]
    pub total_amount: Decimal,
}

impl PaymentDraft {
    pub fn with_total(mut self) -> Self {
        self.total_amount = total_amount(self.amount, self.tax_amount);
        self
    }
}

#[derive(Debug, Clone, Default, Serialize, Deserialize, Validate)]
#[serde(rename_all = "camelCase")]
pub struct PaymentPatch {
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_date: Option<NaiveDate>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub payment_method: Option<PaymentMethod>,
    // `null` tira a conta do registro
    #[serde(default, deserialize_with = "nullable::deserialize", skip_serializing_if = "Option::is_none")]
    pub account: Option<Option<PaymentAccount>>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub billing_cycle: Option<BillingCycle>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub amount: Option<Decimal>,

    #[validate(custom(function = "validate_not_negative"))]
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub tax_amount: Option<Decimal>,

    #[serde(skip_serializing_if = "Option::is_none")]
    pub is_confirmed: Option<bool>,

    #[serde(default, skip_deserializing, skip_serializing_if = "Option::is_none")]
    pub total_amount: Option<Decimal>,
}

impl PaymentPatch {
    pub fn confirmed(is_confirmed: bool) -> Self {
        Self { is_confirmed: Some(is_confirmed), ..Default::default() }
    }

    /// Recalcula o total quando valor ou imposto mudam, usando o registro
    /// atual para o campo que não veio no patch.
    pub fn with_total(mut self, current: &PaymentRecord) -> Self {
        if self.amount.is_some() || self.tax_amount.is_some() {
            let amount = self.amount.unwrap_or(current.amount);
            let tax = self.tax_amount.unwrap_or(current.tax_amount);
            self.total_amount = Some(total_amount(amount, tax));
        }
        self
    }
}

// --- RESUMO (cabeçalho da aba de pagamentos) ---

#[derive(Debug, Clone, Default, PartialEq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct PaymentSummary {
    pub count: usize,
    pub total: Decimal,
    pub confirmed: Decimal,
    pub pending: Decimal,
}

impl PaymentSummary {
    pub fn of(records: &[PaymentRecord]) -> Self {
        records.iter().fold(Self::default(), |mut acc, r| {
            acc.count += 1;
            acc.total += r.total_amount;
            if r.is_confirmed {
                acc.confirmed += r.total_amount;
            } else {
                acc.pending += r.total_amount;
            }
            acc
        })
    }
}
