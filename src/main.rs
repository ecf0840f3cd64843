//src/main.rs

use tokio::net::TcpListener;
use tokio::sync::broadcast::error::RecvError;
use tracing_subscriber::EnvFilter;

use crm_desk::common::i18n::I18nStore;
use crm_desk::config::{AppState, Settings};
use crm_desk::handlers;
use crm_desk::services::notifications::NotificationKind;
use crm_desk::services::ViewContext;

#[tokio::main]
async fn main() -> anyhow::Result<()> {
    // Logger: RUST_LOG controla o nível (padrão: info)
    tracing_subscriber::fmt()
        .with_env_filter(EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info")))
        .with_target(false)
        .compact()
        .init();

    // Se a configuração falhar, a aplicação não deve iniciar.
    let settings = Settings::from_env()?;
    tracing::info!("Configuração carregada: {:?}", settings);

    let app_state = AppState::new(&settings).await?;

    // Carga inicial; sem servidor remoto o app sobe mesmo assim e tenta de novo em /api/sync
    let startup = ViewContext::child_of(&app_state.shutdown);
    if let Err(e) = app_state.workspace.load(&startup).await {
        tracing::warn!("Carga inicial do workspace falhou: {}", e);
    }

    // Toasts vão para o log enquanto não existe um front-end escutando
    let mut toasts = app_state.workspace.notifications().subscribe();
    let i18n = I18nStore::default();
    tokio::spawn(async move {
        loop {
            let toast = match toasts.recv().await {
                Ok(toast) => toast,
                Err(RecvError::Lagged(skipped)) => {
                    tracing::debug!("{} toasts descartados", skipped);
                    continue;
                }
                Err(RecvError::Closed) => break,
            };
            let text = i18n.render("en", &toast.message);
            match toast.kind {
                NotificationKind::Success => tracing::info!("🔔 {}", text),
                NotificationKind::Error => tracing::warn!("🔔 {}", text),
            }
        }
    });

    let shutdown = app_state.shutdown.clone();
    let app = handlers::router(app_state);

    // Inicia o servidor
    let listener = TcpListener::bind(&settings.bind_addr).await?;
    tracing::info!("🚀 Servidor escutando em {}", listener.local_addr()?);
    axum::serve(listener, app)
        .with_graceful_shutdown(async move {
            if let Err(e) = tokio::signal::ctrl_c().await {
                tracing::error!("Falha ao escutar o sinal de encerramento: {}", e);
            }
            tracing::info!("Encerrando: cancelando operações em andamento");
            shutdown.cancel();
        })
        .await?;

    Ok(())
}
