// src/db/row_codec.rs

// Tradução entre o JSON das entidades (camelCase) e as colunas do Postgres (snake_case).

use serde_json::{Map, Value};

use super::gateway::GatewayError;

/// "departmentName" -> "department_name"
pub fn column_name(field: &str) -> String {
    let mut column = String::with_capacity(field.len() + 4);
    for ch in field.chars() {
        if ch.is_ascii_uppercase() {
            column.push('_');
            column.push(ch.to_ascii_lowercase());
        } else {
            column.push(ch);
        }
    }
    column
}

/// "department_name" -> "departmentName"
pub fn field_name(column: &str) -> String {
    let mut field = String::with_capacity(column.len());
    let mut upper_next = false;
    for ch in column.chars() {
        if ch == '_' {
            upper_next = true;
        } else if upper_next {
            field.push(ch.to_ascii_uppercase());
            upper_next = false;
        } else {
            field.push(ch);
        }
    }
    field
}

/// Identificador SQL entre aspas. Só aceita [a-z_][a-z0-9_]*,
/// então nunca há interpolação de texto arbitrário na query.
pub fn quoted_column(field: &str) -> Result<String, GatewayError> {
    let column = column_name(field);
    let mut chars = column.chars();
    let valid = matches!(chars.next(), Some(c) if c.is_ascii_lowercase() || c == '_')
        && chars.all(|c| c.is_ascii_lowercase() || c.is_ascii_digit() || c == '_');

    if !valid {
        return Err(GatewayError::InvalidColumn(field.to_string()));
    }
    Ok(format!("\"{}\"", column))
}

pub fn to_columns(row: Value) -> Result<Value, GatewayError> {
    rename_keys(row, column_name)
}

pub fn to_fields(row: Value) -> Result<Value, GatewayError> {
    rename_keys(row, field_name)
}

fn rename_keys(row: Value, rename: fn(&str) -> String) -> Result<Value, GatewayError> {
    match row {
        Value::Object(map) => Ok(Value::Object(
            map.into_iter().map(|(key, value)| (rename(&key), value)).collect::<Map<_, _>>(),
        )),
        other => Err(GatewayError::Rejected(format!("linha não é um objeto: {}", other))),
    }
}
