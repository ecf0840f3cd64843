// src/db/gateway.rs

use std::fmt;

use async_trait::async_trait;
use serde_json::{Map, Value};
use thiserror::Error;
use uuid::Uuid;

// =========================================================================
//  TABELAS REMOTAS
// =========================================================================

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Table {
    Customers,
    Departments,
    PaymentRecords,
    ServicePlans,
    AdvertisingPlans,
    CustomerFiles,
}

impl Table {
    pub fn as_str(&self) -> &'static str {
        match self {
            Table::Customers => "customers",
            Table::Departments => "departments",
            Table::PaymentRecords => "payment_records",
            Table::ServicePlans => "service_plans",
            Table::AdvertisingPlans => "advertising_plans",
            Table::CustomerFiles => "customer_files",
        }
    }
}

impl fmt::Display for Table {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.as_str())
    }
}

// =========================================================================
//  FILTRO E ORDENAÇÃO
// =========================================================================

/// Conjunto de condições de igualdade, todas combinadas com AND.
/// As chaves são nomes de campo (camelCase), iguais aos do JSON das entidades.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    conditions: Map<String, Value>,
}

impl Filter {
    pub fn new() -> Self {
        Self::default()
    }

    pub fn eq(mut self, field: &str, value: impl Into<Value>) -> Self {
        self.conditions.insert(field.to_string(), value.into());
        self
    }

    pub fn is_empty(&self) -> bool {
        self.conditions.is_empty()
    }

    pub fn conditions(&self) -> impl Iterator<Item = (&String, &Value)> {
        self.conditions.iter()
    }

    pub fn get(&self, field: &str) -> Option<&Value> {
        self.conditions.get(field)
    }

    /// O filtro como objeto JSON (usado para containment `@>` no Postgres).
    pub fn as_json(&self) -> Value {
        Value::Object(self.conditions.clone())
    }

    pub fn matches(&self, row: &Value) -> bool {
        self.conditions
            .iter()
            .all(|(field, expected)| row.get(field) == Some(expected))
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct OrderBy {
    pub field: &'static str,
    pub ascending: bool,
}

impl OrderBy {
    pub const fn asc(field: &'static str) -> Self {
        Self { field, ascending: true }
    }

    pub const fn desc(field: &'static str) -> Self {
        Self { field, ascending: false }
    }
}

// =========================================================================
//  ERROS DO GATEWAY
// =========================================================================

#[derive(Debug, Error)]
pub enum GatewayError {
    #[error("erro de banco de dados: {0}")]
    Database(#[from] sqlx::Error),

    #[error("linha {id} não encontrada em {table}")]
    RowNotFound { table: Table, id: Uuid },

    // Violação de restrição (unique, check, fk) vinda do servidor
    #[error("escrita rejeitada pelo servidor: {0}")]
    Rejected(String),

    #[error("nome de coluna inválido: {0}")]
    InvalidColumn(String),

    #[error("linha em formato inesperado: {0}")]
    Decode(#[from] serde_json::Error),

    #[error("servidor indisponível")]
    Unavailable,
}

// =========================================================================
//  O CONTRATO
// =========================================================================

/// Cliente CRUD orientado a linhas sobre as tabelas do backend hospedado.
///
/// Linhas trafegam como objetos JSON com chaves camelCase. Quem implementa
/// é responsável por traduzir para o formato físico do armazenamento.
#[async_trait]
pub trait RemoteGateway: Send + Sync {
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: &[OrderBy],
    ) -> Result<Vec<Value>, GatewayError>;

    /// Insere e devolve a linha gravada, com id e timestamps gerados.
    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError>;

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError>;

    /// Atualização em massa; devolve quantas linhas foram afetadas.
    async fn update_where(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, GatewayError>;

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError>;

    /// Grava um lote de linhas (cada uma com `id`) de forma atômica.
    async fn upsert_batch(&self, table: Table, rows: Vec<Value>) -> Result<(), GatewayError>;
}
