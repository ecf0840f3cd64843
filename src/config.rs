// src/config.rs

use std::{env, path::PathBuf, sync::Arc, time::Duration};

use anyhow::Context;
use sqlx::postgres::PgPoolOptions;
use tokio_util::sync::CancellationToken;
use uuid::Uuid;

use crate::common::i18n::I18nStore;
use crate::db::{BlobStore, LocalBlobStore, MemoryGateway, PgGateway, RemoteGateway};
use crate::services::{Gates, Workspace};

/// Configuração lida do ambiente (e do `.env`, se existir).
#[derive(Clone)]
pub struct Settings {
    pub database_url: Option<String>,
    pub user_id: Uuid,
    pub delete_secret: String,
    pub department_secret: String,
    pub blob_dir: PathBuf,
    pub bind_addr: String,
}

impl std::fmt::Debug for Settings {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("Settings")
            .field("database", &self.database_url.as_ref().map(|_| "<definida>"))
            .field("user_id", &self.user_id)
            .field("blob_dir", &self.blob_dir)
            .field("bind_addr", &self.bind_addr)
            .finish_non_exhaustive()
    }
}

fn required(name: &str) -> anyhow::Result<String> {
    env::var(name).with_context(|| format!("{} deve ser definida", name))
}

impl Settings {
    pub fn from_env() -> anyhow::Result<Self> {
        dotenvy::dotenv().ok();

        let user_id = required("CRM_USER_ID")?;
        let user_id = Uuid::parse_str(user_id.trim())
            .with_context(|| format!("CRM_USER_ID não é um UUID válido: {}", user_id))?;

        Ok(Self {
            database_url: env::var("DATABASE_URL").ok().filter(|url| !url.trim().is_empty()),
            user_id,
            delete_secret: required("CRM_DELETE_SECRET")?,
            department_secret: required("CRM_DEPARTMENT_SECRET")?,
            blob_dir: env::var("CRM_BLOB_DIR")
                .map(PathBuf::from)
                .unwrap_or_else(|_| PathBuf::from("./storage")),
            bind_addr: env::var("CRM_BIND_ADDR").unwrap_or_else(|_| "0.0.0.0:3000".to_string()),
        })
    }

    pub fn gates(&self) -> Gates {
        Gates::new(self.delete_secret.clone(), self.department_secret.clone())
    }
}

// O estado compartilhado que será acessível em todos os handlers
#[derive(Clone)]
pub struct AppState {
    pub workspace: Arc<Workspace>,
    pub i18n_store: Arc<I18nStore>,
    /// Cancelado no shutdown; cada requisição deriva o seu contexto dele.
    pub shutdown: CancellationToken,
}

impl AppState {
    pub async fn new(settings: &Settings) -> anyhow::Result<Self> {
        let gateway: Arc<dyn RemoteGateway> = match &settings.database_url {
            Some(database_url) => {
                let db_pool = PgPoolOptions::new()
                    .max_connections(5)
                    .acquire_timeout(Duration::from_secs(3))
                    .connect(database_url)
                    .await
                    .context("Falha ao conectar ao banco de dados")?;
                tracing::info!("✅ Conexão com o banco de dados estabelecida com sucesso!");

                sqlx::migrate!("./migrations")
                    .run(&db_pool)
                    .await
                    .context("Falha ao rodar as migrações do banco de dados")?;
                tracing::info!("✅ Migrações do banco de dados executadas com sucesso!");

                Arc::new(PgGateway::new(db_pool, settings.user_id))
            }
            None => {
                tracing::warn!("DATABASE_URL não definida: usando o gateway em memória (dados não persistem)");
                Arc::new(MemoryGateway::new())
            }
        };

        tokio::fs::create_dir_all(&settings.blob_dir)
            .await
            .with_context(|| format!("Falha ao criar {}", settings.blob_dir.display()))?;
        let blobs: Arc<dyn BlobStore> = Arc::new(LocalBlobStore::new(settings.blob_dir.clone()));

        let workspace = Workspace::new(gateway, blobs, settings.user_id, settings.gates());
        Ok(Self::with_workspace(workspace))
    }

    pub fn with_workspace(workspace: Workspace) -> Self {
        Self {
            workspace: Arc::new(workspace),
            i18n_store: Arc::new(I18nStore::default()),
            shutdown: CancellationToken::new(),
        }
    }
}
