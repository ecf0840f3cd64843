// src/middleware/view.rs

use axum::extract::FromRequestParts;
use axum::http::request::Parts;
use tokio_util::sync::DropGuard;

use crate::config::AppState;
use crate::services::ViewContext;

/// Contexto de cancelamento de uma requisição.
///
/// Filho do token de shutdown; quando o handler é abandonado (cliente
/// desconectou) o extrator é dropado e as chamadas remotas em andamento
/// são canceladas.
pub struct RequestView {
    pub ctx: ViewContext,
    _teardown: DropGuard,
}

impl RequestView {
    pub fn ctx(&self) -> &ViewContext {
        &self.ctx
    }
}

impl FromRequestParts<AppState> for RequestView {
    type Rejection = std::convert::Infallible;

    async fn from_request_parts(_parts: &mut Parts, state: &AppState) -> Result<Self, Self::Rejection> {
        let ctx = ViewContext::child_of(&state.shutdown);
        let teardown = ctx.teardown_guard();
        Ok(Self { ctx, _teardown: teardown })
    }
}
