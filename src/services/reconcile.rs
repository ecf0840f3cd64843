// src/services/reconcile.rs

// Protocolo compartilhado por todas as escritas dos stores:
//   1. valida localmente
//   2. exatamente uma escrita remota
//   3. sucesso -> patch local ou releitura completa (o store declara qual)
//   4. falha -> estado local intacto + erro tipado
//   5. evento de notificação (sucesso ou falha)

use std::collections::HashSet;
use std::sync::{Arc, Mutex, PoisonError};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;

use crate::common::error::AppError;
use crate::db::GatewayError;

/// Como o store converge depois de uma escrita confirmada.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum ReconcilePolicy {
    /// Aplica a linha devolvida pelo servidor direto na lista.
    Patch,
    /// Relê o escopo inteiro do servidor.
    Refresh,
}

/// O que mudou no servidor, para aplicar na lista local.
#[derive(Debug, Clone)]
pub enum Change<E> {
    Inserted(E),
    Replaced(E),
    Removed(uuid::Uuid),
}

/// Equivalente ao botão "salvar" desabilitado durante o envio:
/// no máximo uma escrita em voo por chave (id da entidade ou formulário).
#[derive(Debug, Default, Clone)]
pub struct InFlight {
    keys: Arc<Mutex<HashSet<String>>>,
}

#[derive(Debug)]
pub struct InFlightGuard {
    keys: Arc<Mutex<HashSet<String>>>,
    key: String,
}

impl InFlight {
    pub fn acquire(&self, key: impl Into<String>) -> Result<InFlightGuard, AppError> {
        let key = key.into();
        let mut keys = self.keys.lock().unwrap_or_else(PoisonError::into_inner);
        if !keys.insert(key.clone()) {
            return Err(AppError::SubmissionInProgress(key));
        }
        Ok(InFlightGuard { keys: Arc::clone(&self.keys), key })
    }
}

impl Drop for InFlightGuard {
    fn drop(&mut self) {
        self.keys
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&self.key);
    }
}

/// Aplica os campos devolvidos pelo servidor sobre a entidade local.
/// Campos ausentes na resposta mantêm o valor conhecido pelo cliente.
pub fn merge_server_row<E>(local: &E, server: Value) -> Result<E, GatewayError>
where
    E: Serialize + DeserializeOwned,
{
    let mut base = serde_json::to_value(local)?;
    match (base.as_object_mut(), server) {
        (Some(base_map), Value::Object(server_map)) => {
            base_map.extend(server_map);
        }
        (_, other) => {
            return Err(GatewayError::Rejected(format!(
                "resposta do servidor não é um objeto: {}",
                other
            )));
        }
    }
    Ok(serde_json::from_value(base)?)
}

#[cfg(test)]
mod tests {
    use super::*;
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Row {
        name: String,
        updated_at: Option<String>,
    }

    #[test]
    fn server_fields_win_and_missing_fields_are_kept() {
        let local = Row { name: "old".into(), updated_at: Some("t1".into()) };

        let merged = merge_server_row(&local, json!({"name": "new"})).unwrap();
        assert_eq!(merged, Row { name: "new".into(), updated_at: Some("t1".into()) });

        let merged = merge_server_row(&local, json!({"updatedAt": "t2"})).unwrap();
        assert_eq!(merged.updated_at.as_deref(), Some("t2"));
    }

    #[test]
    fn in_flight_rejects_second_submission_until_released() {
        let in_flight = InFlight::default();
        let guard = in_flight.acquire("customer:1").unwrap();

        assert!(matches!(
            in_flight.acquire("customer:1"),
            Err(AppError::SubmissionInProgress(_))
        ));
        assert!(in_flight.acquire("customer:2").is_ok());

        drop(guard);
        assert!(in_flight.acquire("customer:1").is_ok());
    }
}
