// src/services/context.rs

use std::future::Future;

use tokio_util::sync::{CancellationToken, DropGuard};

use crate::common::error::AppError;

/// Escopo de cancelamento da view (ou requisição) que iniciou a operação.
///
/// Toda chamada remota de um store roda dentro de `run`: se a view for
/// desmontada antes da resposta, a chamada é abandonada e o resultado nunca
/// é aplicado à lista em memória.
#[derive(Debug, Clone, Default)]
pub struct ViewContext {
    token: CancellationToken,
}

impl ViewContext {
    pub fn new() -> Self {
        Self::default()
    }

    /// Contexto filho: é cancelado junto com o pai (ex.: shutdown do servidor).
    pub fn child_of(parent: &CancellationToken) -> Self {
        Self { token: parent.child_token() }
    }

    pub fn token(&self) -> &CancellationToken {
        &self.token
    }

    pub fn cancel(&self) {
        self.token.cancel();
    }

    pub fn is_cancelled(&self) -> bool {
        self.token.is_cancelled()
    }

    /// Guarda que cancela o contexto quando é dropado (fim da view).
    pub fn teardown_guard(&self) -> DropGuard {
        self.token.clone().drop_guard()
    }

    pub async fn run<F, T>(&self, fut: F) -> Result<T, AppError>
    where
        F: Future<Output = T>,
    {
        if self.token.is_cancelled() {
            return Err(AppError::Cancelled);
        }
        tokio::select! {
            biased;
            _ = self.token.cancelled() => Err(AppError::Cancelled),
            out = fut => Ok(out),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use std::time::Duration;

    #[tokio::test]
    async fn completes_when_not_cancelled() {
        let ctx = ViewContext::new();
        assert_eq!(ctx.run(async { 7 }).await.unwrap(), 7);
    }

    #[tokio::test]
    async fn cancelled_context_abandons_the_call() {
        let ctx = ViewContext::new();
        let canceller = ctx.clone();
        tokio::spawn(async move {
            tokio::time::sleep(Duration::from_millis(10)).await;
            canceller.cancel();
        });

        let out = ctx
            .run(async {
                tokio::time::sleep(Duration::from_secs(5)).await;
                1
            })
            .await;
        assert!(matches!(out, Err(AppError::Cancelled)));
    }

    #[tokio::test]
    async fn dropping_the_guard_cancels_children() {
        let parent = CancellationToken::new();
        let ctx = ViewContext::child_of(&parent);
        {
            let _guard = ctx.teardown_guard();
        }
        assert!(ctx.is_cancelled());
        assert!(!parent.is_cancelled());
    }
}
