// src/db/memory_gateway.rs

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicUsize, Ordering as AtomicOrdering};
use std::sync::{Mutex, MutexGuard, PoisonError};
use std::time::Duration;

use async_trait::async_trait;
use chrono::Utc;
use serde_json::{Map, Value};
use uuid::Uuid;

use super::gateway::{Filter, GatewayError, OrderBy, RemoteGateway, Table};

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Select,
    Insert,
    Update,
    UpdateWhere,
    Delete,
    UpsertBatch,
}

#[derive(Debug)]
struct FailureRule {
    table: Table,
    operation: Operation,
    remaining: usize,
}

/// Gateway em memória: modo offline do binário e dublê dos testes.
///
/// Imita o que o backend faz de relevante para a sincronização: gera `id`,
/// `createdAt` e `updatedAt`, aplica a unicidade de código de departamento
/// por usuário e permite injetar falhas por tabela/operação.
#[derive(Debug, Default)]
pub struct MemoryGateway {
    tables: Mutex<HashMap<Table, Vec<Value>>>,
    failures: Mutex<Vec<FailureRule>>,
    latency: Mutex<Option<Duration>>,
    writes: AtomicUsize,
}

fn lock<T>(mutex: &Mutex<T>) -> MutexGuard<'_, T> {
    mutex.lock().unwrap_or_else(PoisonError::into_inner)
}

// Chaves únicas por tabela (além do id)
fn unique_key(table: Table) -> Option<&'static [&'static str]> {
    match table {
        Table::Departments => Some(&["userId", "code"]),
        _ => None,
    }
}

fn compare_values(a: Option<&Value>, b: Option<&Value>) -> Ordering {
    match (a, b) {
        (Some(Value::Number(x)), Some(Value::Number(y))) => x
            .as_f64()
            .partial_cmp(&y.as_f64())
            .unwrap_or(Ordering::Equal),
        (Some(Value::String(x)), Some(Value::String(y))) => x.cmp(y),
        (Some(Value::Bool(x)), Some(Value::Bool(y))) => x.cmp(y),
        (None | Some(Value::Null), None | Some(Value::Null)) => Ordering::Equal,
        (None | Some(Value::Null), _) => Ordering::Less,
        (_, None | Some(Value::Null)) => Ordering::Greater,
        _ => Ordering::Equal,
    }
}

fn as_object(row: Value) -> Result<Map<String, Value>, GatewayError> {
    match row {
        Value::Object(map) => Ok(map),
        other => Err(GatewayError::Rejected(format!("linha não é um objeto: {}", other))),
    }
}

fn row_id(row: &Value) -> Option<Uuid> {
    row.get("id")
        .and_then(Value::as_str)
        .and_then(|s| Uuid::parse_str(s).ok())
}

impl MemoryGateway {
    pub fn new() -> Self {
        Self::default()
    }

    /// Faz a próxima chamada de `operation` em `table` falhar.
    pub fn fail_next(&self, table: Table, operation: Operation) {
        self.fail_times(table, operation, 1);
    }

    pub fn fail_times(&self, table: Table, operation: Operation, times: usize) {
        lock(&self.failures).push(FailureRule { table, operation, remaining: times });
    }

    pub fn clear_failures(&self) {
        lock(&self.failures).clear();
    }

    /// Atraso artificial antes de cada chamada (simula rede).
    pub fn set_latency(&self, latency: Option<Duration>) {
        *lock(&self.latency) = latency;
    }

    pub fn seed(&self, table: Table, rows: Vec<Value>) {
        lock(&self.tables).entry(table).or_default().extend(rows);
    }

    pub fn rows(&self, table: Table) -> Vec<Value> {
        lock(&self.tables).get(&table).cloned().unwrap_or_default()
    }

    /// Quantas escritas chegaram ao "servidor" (incluindo as que falharam).
    pub fn write_count(&self) -> usize {
        self.writes.load(AtomicOrdering::SeqCst)
    }

    async fn enter(&self, table: Table, operation: Operation) -> Result<(), GatewayError> {
        let latency = *lock(&self.latency);
        if let Some(latency) = latency {
            tokio::time::sleep(latency).await;
        }

        if operation != Operation::Select {
            self.writes.fetch_add(1, AtomicOrdering::SeqCst);
        }

        let mut failures = lock(&self.failures);
        if let Some(pos) = failures
            .iter()
            .position(|f| f.table == table && f.operation == operation && f.remaining > 0)
        {
            failures[pos].remaining -= 1;
            if failures[pos].remaining == 0 {
                failures.remove(pos);
            }
            return Err(GatewayError::Unavailable);
        }
        Ok(())
    }

    fn check_unique(
        table: Table,
        rows: &[Value],
        candidate: &Map<String, Value>,
    ) -> Result<(), GatewayError> {
        let Some(keys) = unique_key(table) else {
            return Ok(());
        };
        let candidate_id = candidate.get("id");
        let clash = rows.iter().any(|row| {
            row.get("id") != candidate_id
                && keys.iter().all(|k| row.get(*k).is_some() && row.get(*k) == candidate.get(*k))
        });
        if clash {
            return Err(GatewayError::Rejected(format!(
                "duplicate key value violates unique constraint on {} ({})",
                table,
                keys.join(", ")
            )));
        }
        Ok(())
    }
}

#[async_trait]
impl RemoteGateway for MemoryGateway {
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: &[OrderBy],
    ) -> Result<Vec<Value>, GatewayError> {
        self.enter(table, Operation::Select).await?;

        let mut rows: Vec<Value> = self
            .rows(table)
            .into_iter()
            .filter(|row| filter.matches(row))
            .collect();

        // Ordenação estável: empates mantêm a ordem de inserção
        rows.sort_by(|a, b| {
            order
                .iter()
                .map(|o| {
                    let ord = compare_values(a.get(o.field), b.get(o.field));
                    if o.ascending { ord } else { ord.reverse() }
                })
                .find(|ord| *ord != Ordering::Equal)
                .unwrap_or(Ordering::Equal)
        });
        Ok(rows)
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        self.enter(table, Operation::Insert).await?;

        let mut row = as_object(row)?;
        let now = Value::String(Utc::now().to_rfc3339());
        row.entry("id").or_insert_with(|| Value::String(Uuid::new_v4().to_string()));
        row.entry("createdAt").or_insert_with(|| now.clone());
        row.entry("updatedAt").or_insert(now);

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table).or_default();
        Self::check_unique(table, rows, &row)?;

        let row = Value::Object(row);
        rows.push(row.clone());
        Ok(row)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError> {
        self.enter(table, Operation::Update).await?;

        let patch = as_object(patch)?;
        let mut tables = lock(&self.tables);
        let rows = tables.entry(table).or_default();
        let pos = rows
            .iter()
            .position(|row| row_id(row) == Some(id))
            .ok_or(GatewayError::RowNotFound { table, id })?;

        let mut merged = as_object(rows[pos].clone())?;
        merged.extend(patch);
        merged.insert("updatedAt".to_string(), Value::String(Utc::now().to_rfc3339()));
        Self::check_unique(table, rows, &merged)?;

        rows[pos] = Value::Object(merged);
        Ok(rows[pos].clone())
    }

    async fn update_where(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, GatewayError> {
        self.enter(table, Operation::UpdateWhere).await?;

        let patch = as_object(patch)?;
        let now = Value::String(Utc::now().to_rfc3339());
        let mut tables = lock(&self.tables);
        let mut affected = 0;
        for row in tables.entry(table).or_default().iter_mut() {
            if !filter.matches(row) {
                continue;
            }
            if let Value::Object(map) = row {
                map.extend(patch.clone());
                map.insert("updatedAt".to_string(), now.clone());
                affected += 1;
            }
        }
        Ok(affected)
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        self.enter(table, Operation::Delete).await?;

        let mut tables = lock(&self.tables);
        let rows = tables.entry(table).or_default();
        let before = rows.len();
        rows.retain(|row| row_id(row) != Some(id));
        if rows.len() == before {
            return Err(GatewayError::RowNotFound { table, id });
        }
        Ok(())
    }

    async fn upsert_batch(&self, table: Table, rows: Vec<Value>) -> Result<(), GatewayError> {
        self.enter(table, Operation::UpsertBatch).await?;

        let batch = rows.into_iter().map(as_object).collect::<Result<Vec<_>, _>>()?;
        let mut tables = lock(&self.tables);
        let stored = tables.entry(table).or_default();

        // Aplica numa cópia e só troca no fim: o lote é atômico
        let mut next = stored.clone();
        for row in batch {
            let id = row
                .get("id")
                .and_then(Value::as_str)
                .and_then(|s| Uuid::parse_str(s).ok())
                .ok_or_else(|| GatewayError::Rejected("linha do lote sem id".to_string()))?;
            match next.iter().position(|r| row_id(r) == Some(id)) {
                Some(pos) => {
                    let mut merged = as_object(next[pos].clone())?;
                    merged.extend(row);
                    next[pos] = Value::Object(merged);
                }
                // Como o UPDATE do Postgres: id desconhecido derruba o lote inteiro
                None => {
                    return Err(GatewayError::Rejected(format!(
                        "lote em {}: linha {} não encontrada",
                        table, id
                    )))
                }
            }
        }
        *stored = next;
        Ok(())
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde_json::json;

    #[tokio::test]
    async fn insert_fills_generated_fields() {
        let gateway = MemoryGateway::new();
        let row = gateway
            .insert(Table::Customers, json!({"name": "Acme"}))
            .await
            .unwrap();

        assert!(row_id(&row).is_some());
        assert!(row.get("createdAt").is_some());
        assert_eq!(gateway.rows(Table::Customers).len(), 1);
    }

    #[tokio::test]
    async fn select_filters_and_orders() {
        let gateway = MemoryGateway::new();
        gateway.seed(
            Table::Departments,
            vec![
                json!({"userId": "u1", "code": "b", "sortOrder": 2}),
                json!({"userId": "u1", "code": "a", "sortOrder": 1}),
                json!({"userId": "u2", "code": "c", "sortOrder": 0}),
            ],
        );

        let rows = gateway
            .select(
                Table::Departments,
                &Filter::new().eq("userId", "u1"),
                &[OrderBy::asc("sortOrder")],
            )
            .await
            .unwrap();

        let codes: Vec<_> = rows.iter().map(|r| r["code"].as_str().unwrap()).collect();
        assert_eq!(codes, vec!["a", "b"]);
    }

    #[tokio::test]
    async fn department_codes_are_unique_per_user() {
        let gateway = MemoryGateway::new();
        gateway
            .insert(Table::Departments, json!({"userId": "u1", "code": "sales"}))
            .await
            .unwrap();

        let dup = gateway
            .insert(Table::Departments, json!({"userId": "u1", "code": "sales"}))
            .await;
        assert!(matches!(dup, Err(GatewayError::Rejected(_))));

        let other_user = gateway
            .insert(Table::Departments, json!({"userId": "u2", "code": "sales"}))
            .await;
        assert!(other_user.is_ok());
    }

    #[tokio::test]
    async fn injected_failures_are_consumed_once() {
        let gateway = MemoryGateway::new();
        gateway.fail_next(Table::Customers, Operation::Insert);

        assert!(gateway.insert(Table::Customers, json!({"name": "x"})).await.is_err());
        assert!(gateway.insert(Table::Customers, json!({"name": "x"})).await.is_ok());
        assert_eq!(gateway.write_count(), 2);
    }

    #[tokio::test]
    async fn failed_batch_leaves_rows_untouched() {
        let gateway = MemoryGateway::new();
        let id = Uuid::new_v4();
        gateway.seed(Table::Departments, vec![json!({"id": id.to_string(), "sortOrder": 1})]);

        let result = gateway
            .upsert_batch(
                Table::Departments,
                vec![json!({"id": id.to_string(), "sortOrder": 5}), json!({"sortOrder": 6})],
            )
            .await;

        assert!(result.is_err());
        assert_eq!(gateway.rows(Table::Departments)[0]["sortOrder"], json!(1));
    }

    #[tokio::test]
    async fn batch_with_unknown_id_is_rejected_whole() {
        let gateway = MemoryGateway::new();
        let id = Uuid::new_v4();
        gateway.seed(Table::Departments, vec![json!({"id": id.to_string(), "sortOrder": 1})]);

        let result = gateway
            .upsert_batch(
                Table::Departments,
                vec![
                    json!({"id": id.to_string(), "sortOrder": 5}),
                    json!({"id": Uuid::new_v4().to_string(), "sortOrder": 6}),
                ],
            )
            .await;

        assert!(matches!(result, Err(GatewayError::Rejected(_))));
        let rows = gateway.rows(Table::Departments);
        assert_eq!(rows.len(), 1);
        assert_eq!(rows[0]["sortOrder"], json!(1));
    }
}
