use sqlx::{PgPool, Postgres, Transaction};
use uuid::Uuid;

// ---
// Helper RLS: A "Chave" para o Banco de Dados
// ---
/// Abre uma transação e define `app.user_id`, que as policies de RLS usam
/// para restringir todas as tabelas ao dono autenticado.
/// O `set_config(..., true)` vale só até o commit/rollback desta transação.
pub(crate) async fn begin_user_scope(
    pool: &PgPool,
    user_id: Uuid,
) -> Result<Transaction<'static, Postgres>, sqlx::Error> {
    // 1. Abre a transação
    let mut tx = pool.begin().await?;

    // 2. Define User ID
    sqlx::query("SELECT set_config('app.user_id', $1, true)")
        .bind(user_id.to_string())
        .execute(&mut *tx)
        .await?;

    Ok(tx)
}
