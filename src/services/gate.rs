// src/services/gate.rs

// Confirmação por senha antes de operações destrutivas.
// É só atrito de UX: o segredo vive no cliente e não protege nada no servidor.

use std::fmt;
use std::future::Future;

use crate::common::error::AppError;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Confirmation {
    Allowed,
    Denied,
}

#[derive(Clone)]
pub struct Gate {
    name: &'static str,
    secret: String,
}

// Nunca imprime o segredo
impl fmt::Debug for Gate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.debug_struct("Gate").field("name", &self.name).finish_non_exhaustive()
    }
}

impl Gate {
    pub fn new(name: &'static str, secret: impl Into<String>) -> Self {
        Self { name, secret: secret.into() }
    }

    pub fn name(&self) -> &'static str {
        self.name
    }

    pub fn confirm(&self, entered: &str) -> Confirmation {
        if !self.secret.is_empty() && entered == self.secret {
            Confirmation::Allowed
        } else {
            Confirmation::Denied
        }
    }

    /// Executa `action` exatamente uma vez se a senha conferir.
    /// Com senha errada nada roda e nenhum estado muda.
    pub async fn guard<F, Fut, T>(&self, entered: &str, action: F) -> Result<T, AppError>
    where
        F: FnOnce() -> Fut,
        Fut: Future<Output = Result<T, AppError>>,
    {
        match self.confirm(entered) {
            Confirmation::Allowed => action().await,
            Confirmation::Denied => {
                tracing::warn!("Confirmação negada no portão '{}'", self.name);
                Err(AppError::ConfirmationDenied)
            }
        }
    }
}

/// Os dois portões do sistema, com segredos independentes.
#[derive(Debug, Clone)]
pub struct Gates {
    /// Exclusão de clientes, pagamentos, planos e arquivos.
    pub records: Gate,
    /// Exclusão de departamentos e reatribuição em massa.
    pub departments: Gate,
}

impl Gates {
    pub fn new(record_secret: impl Into<String>, department_secret: impl Into<String>) -> Self {
        Self {
            records: Gate::new("records", record_secret),
            departments: Gate::new("departments", department_secret),
        }
    }
}
