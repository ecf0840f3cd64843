// src/db/pg_gateway.rs

use async_trait::async_trait;
use serde_json::Value;
use sqlx::PgPool;
use uuid::Uuid;

use super::gateway::{Filter, GatewayError, OrderBy, RemoteGateway, Table};
use super::row_codec::{quoted_column, to_columns, to_fields};
use crate::common::db_utils::begin_user_scope;

/// Gateway sobre o Postgres do backend hospedado.
///
/// Todas as queries passam pelo JSONB: filtros viram containment (`@>`) e as
/// escritas usam `jsonb_populate_record`, então um único caminho serve para
/// as seis tabelas. O RLS (app.user_id) restringe tudo ao usuário dono.
#[derive(Clone)]
pub struct PgGateway {
    pool: PgPool,
    user_id: Uuid,
}

impl PgGateway {
    pub fn new(pool: PgPool, user_id: Uuid) -> Self {
        Self { pool, user_id }
    }
}

// Converte violação de restrição em erro de negócio, o resto fica como erro de banco
fn map_db_error(e: sqlx::Error) -> GatewayError {
    if let sqlx::Error::Database(db_err) = &e {
        if db_err.is_unique_violation()
            || db_err.is_check_violation()
            || db_err.is_foreign_key_violation()
        {
            return GatewayError::Rejected(db_err.message().to_string());
        }
    }
    GatewayError::Database(e)
}

fn filter_columns(filter: &Filter) -> Result<Value, GatewayError> {
    to_columns(filter.as_json())
}

fn order_clause(order: &[OrderBy]) -> Result<String, GatewayError> {
    if order.is_empty() {
        return Ok(String::new());
    }
    let parts = order
        .iter()
        .map(|o| {
            quoted_column(o.field)
                .map(|col| format!("t.{} {}", col, if o.ascending { "ASC" } else { "DESC" }))
        })
        .collect::<Result<Vec<_>, _>>()?;
    Ok(format!(" ORDER BY {}", parts.join(", ")))
}

/// Colunas presentes na linha (já traduzidas e entre aspas).
fn row_columns(row: &Value) -> Result<Vec<String>, GatewayError> {
    let object = row
        .as_object()
        .ok_or_else(|| GatewayError::Rejected("linha não é um objeto".to_string()))?;
    if object.is_empty() {
        return Err(GatewayError::Rejected("linha sem colunas".to_string()));
    }
    object.keys().map(|k| quoted_column(k)).collect()
}

fn assignments(columns: &[String], source: &str) -> String {
    columns
        .iter()
        .map(|c| format!("{c} = {source}.{c}"))
        .collect::<Vec<_>>()
        .join(", ")
}

#[async_trait]
impl RemoteGateway for PgGateway {
    async fn select(
        &self,
        table: Table,
        filter: &Filter,
        order: &[OrderBy],
    ) -> Result<Vec<Value>, GatewayError> {
        let sql = format!(
            "SELECT to_jsonb(t) FROM {table} AS t WHERE to_jsonb(t) @> $1::jsonb{order}",
            table = table.as_str(),
            order = order_clause(order)?,
        );

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let rows: Vec<Value> = sqlx::query_scalar(&sql)
            .bind(filter_columns(filter)?)
            .fetch_all(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await?;

        rows.into_iter().map(to_fields).collect()
    }

    async fn insert(&self, table: Table, row: Value) -> Result<Value, GatewayError> {
        let row = to_columns(row)?;
        let columns = row_columns(&row)?.join(", ");
        // Só as colunas enviadas entram no INSERT; o resto fica com o DEFAULT da tabela
        let sql = format!(
            "INSERT INTO {table} AS t ({columns}) \
             SELECT {columns} FROM jsonb_populate_record(NULL::{table}, $1) \
             RETURNING to_jsonb(t)",
            table = table.as_str(),
        );

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let created: Value = sqlx::query_scalar(&sql)
            .bind(row)
            .fetch_one(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await?;

        to_fields(created)
    }

    async fn update(&self, table: Table, id: Uuid, patch: Value) -> Result<Value, GatewayError> {
        let patch = to_columns(patch)?;
        let columns = row_columns(&patch)?;
        let sql = format!(
            "UPDATE {table} AS t SET {set} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE t.id = $2 RETURNING to_jsonb(t)",
            table = table.as_str(),
            set = assignments(&columns, "r"),
        );

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let updated: Option<Value> = sqlx::query_scalar(&sql)
            .bind(patch)
            .bind(id)
            .fetch_optional(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await?;

        match updated {
            Some(row) => to_fields(row),
            None => Err(GatewayError::RowNotFound { table, id }),
        }
    }

    async fn update_where(
        &self,
        table: Table,
        filter: &Filter,
        patch: Value,
    ) -> Result<u64, GatewayError> {
        let patch = to_columns(patch)?;
        let columns = row_columns(&patch)?;
        let sql = format!(
            "UPDATE {table} AS t SET {set} \
             FROM jsonb_populate_record(NULL::{table}, $1) AS r \
             WHERE to_jsonb(t) @> $2::jsonb",
            table = table.as_str(),
            set = assignments(&columns, "r"),
        );

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let result = sqlx::query(&sql)
            .bind(patch)
            .bind(filter_columns(filter)?)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await?;

        Ok(result.rows_affected())
    }

    async fn delete(&self, table: Table, id: Uuid) -> Result<(), GatewayError> {
        let sql = format!("DELETE FROM {} WHERE id = $1", table.as_str());

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let result = sqlx::query(&sql)
            .bind(id)
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;
        tx.commit().await?;

        if result.rows_affected() == 0 {
            return Err(GatewayError::RowNotFound { table, id });
        }
        Ok(())
    }

    async fn upsert_batch(&self, table: Table, rows: Vec<Value>) -> Result<(), GatewayError> {
        if rows.is_empty() {
            return Ok(());
        }
        let expected = rows.len() as u64;
        let rows = rows.into_iter().map(to_columns).collect::<Result<Vec<_>, _>>()?;

        // Todas as linhas do lote carregam as mesmas colunas; o id é a chave
        let columns: Vec<String> = row_columns(&rows[0])?
            .into_iter()
            .filter(|c| c != "\"id\"")
            .collect();
        if columns.is_empty() {
            return Err(GatewayError::Rejected("lote sem colunas para gravar".to_string()));
        }

        // Um único UPDATE sobre o recordset: ou o lote inteiro entra, ou nada entra
        let sql = format!(
            "UPDATE {table} AS t SET {set} \
             FROM jsonb_populate_recordset(NULL::{table}, $1) AS r \
             WHERE t.id = r.id",
            table = table.as_str(),
            set = assignments(&columns, "r"),
        );

        let mut tx = begin_user_scope(&self.pool, self.user_id).await?;
        let result = sqlx::query(&sql)
            .bind(Value::Array(rows))
            .execute(&mut *tx)
            .await
            .map_err(map_db_error)?;

        if result.rows_affected() != expected {
            // tx é descartada sem commit -> rollback
            return Err(GatewayError::Rejected(format!(
                "lote em {}: {} de {} linhas encontradas",
                table,
                result.rows_affected(),
                expected
            )));
        }
        tx.commit().await?;

        Ok(())
    }
}
