// src/services/file_service.rs

use std::sync::Arc;

use chrono::{DateTime, Duration, Utc};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::i18n::MessageKey;
use crate::db::{storage_key, BlobStore, OrderBy, RemoteGateway, StorageError};
use crate::models::file::{CustomerFile, FileRename, FileUpload, NewCustomerFile};
use crate::services::context::ViewContext;
use crate::services::entity_store::{EntityStore, ScopedStores};
use crate::services::gate::Gate;
use crate::services::notifications::{ActivityType, NotificationHub};

const MAX_KEY_ATTEMPTS: i64 = 64;

fn configure(store: EntityStore<CustomerFile>) -> EntityStore<CustomerFile> {
    store.with_order(vec![OrderBy::desc("uploadedAt")])
}

pub struct FileService {
    stores: ScopedStores<CustomerFile>,
    blobs: Arc<dyn BlobStore>,
    gate: Gate,
    user_id: Uuid,
}

impl FileService {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        blobs: Arc<dyn BlobStore>,
        notifier: Arc<NotificationHub>,
        user_id: Uuid,
        gate: Gate,
    ) -> Self {
        Self { stores: ScopedStores::new(gateway, notifier, user_id, configure), blobs, gate, user_id }
    }

    pub fn store(&self, customer_id: Uuid) -> Arc<EntityStore<CustomerFile>> {
        self.stores.get(customer_id)
    }

    pub fn list(&self, customer_id: Uuid) -> Vec<CustomerFile> {
        self.store(customer_id).list()
    }

    pub fn forget(&self, customer_id: Uuid) {
        self.stores.forget(customer_id);
    }

    pub async fn refresh(&self, ctx: &ViewContext, customer_id: Uuid) -> Result<Vec<CustomerFile>, AppError> {
        self.store(customer_id).refresh(ctx).await
    }

    /// Caminhos dos blobs do cliente; lê do servidor se a aba nunca abriu.
    pub async fn storage_paths(&self, ctx: &ViewContext, customer_id: Uuid) -> Result<Vec<String>, AppError> {
        let store = self.store(customer_id);
        let files = if store.is_loaded() { store.list() } else { store.reload(ctx).await? };
        Ok(files.into_iter().map(|f| f.storage_path).collect())
    }

    /// Apaga blobs cujas linhas já sumiram. Falhas só vão para o log.
    pub async fn purge_blobs(&self, paths: &[String]) {
        for path in paths {
            match self.blobs.delete(path).await {
                Ok(()) | Err(StorageError::NotFound(_)) => {}
                Err(err) => tracing::warn!("Blob {} ficou órfão: {}", path, err),
            }
        }
    }

    /// Salva o blob e depois os metadados. Se a linha não for gravada,
    /// o blob é apagado de novo.
    pub async fn upload(&self, ctx: &ViewContext, customer_id: Uuid, upload: FileUpload) -> Result<CustomerFile, AppError> {
        let store = self.store(customer_id);
        let result = self.store_upload(ctx, &store, customer_id, upload).await;
        store.report(result, ActivityType::Upload, MessageKey::Uploaded)
    }

    async fn store_upload(
        &self,
        ctx: &ViewContext,
        store: &EntityStore<CustomerFile>,
        customer_id: Uuid,
        upload: FileUpload,
    ) -> Result<CustomerFile, AppError> {
        upload.validate()?;

        let now = Utc::now();
        let file_size = upload.bytes.len() as i64;
        let path = self.put_blob(ctx, customer_id, &upload, now).await?;

        let meta = NewCustomerFile {
            file_name: upload.file_name,
            storage_path: path.clone(),
            file_size,
            mime_type: upload.mime_type,
            uploaded_at: now,
        };
        let row = serde_json::to_value(&meta).map_err(|e| AppError::InternalServerError(e.into()))?;

        match store.insert_row(ctx, row).await {
            Ok(file) => Ok(file),
            Err(err) => {
                tracing::warn!("Metadados do arquivo não gravados, apagando blob {}: {}", path, err);
                if let Err(cleanup) = self.blobs.delete(&path).await {
                    tracing::warn!("Blob órfão {} não pôde ser apagado: {}", path, cleanup);
                }
                Err(err)
            }
        }
    }

    // Dois envios no mesmo milissegundo: avança o timestamp até achar um caminho livre
    async fn put_blob(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        upload: &FileUpload,
        at: DateTime<Utc>,
    ) -> Result<String, AppError> {
        for offset in 0..MAX_KEY_ATTEMPTS {
            let path = storage_key(
                self.user_id,
                customer_id,
                &upload.file_name,
                at + Duration::milliseconds(offset),
            );
            match ctx
                .run(self.blobs.put(&path, upload.bytes.clone(), &upload.mime_type))
                .await?
            {
                Ok(()) => return Ok(path),
                Err(StorageError::AlreadyExists(taken)) => {
                    tracing::debug!("Caminho {} ocupado, tentando o próximo", taken);
                }
                Err(err) => return Err(err.into()),
            }
        }
        Err(StorageError::AlreadyExists(storage_key(self.user_id, customer_id, &upload.file_name, at)).into())
    }

    pub async fn rename(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
        rename: FileRename,
    ) -> Result<CustomerFile, AppError> {
        let rename = FileRename { file_name: rename.file_name.trim().to_string() };
        self.store(customer_id).update(ctx, id, &rename).await
    }

    pub async fn download(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
    ) -> Result<(CustomerFile, Vec<u8>), AppError> {
        let file = self.store(customer_id).find(id).ok_or(AppError::NotFound(id))?;
        let bytes = ctx.run(self.blobs.get(&file.storage_path)).await??;
        Ok((file, bytes))
    }

    /// Remove o blob e depois a linha de metadados.
    pub async fn delete(&self, ctx: &ViewContext, customer_id: Uuid, id: Uuid, secret: &str) -> Result<CustomerFile, AppError> {
        let store = self.store(customer_id);
        let files = store.as_ref();
        let blobs = &self.blobs;
        let result = self
            .gate
            .guard(secret, move || async move {
                let file = files.find(id).ok_or(AppError::NotFound(id))?;
                match ctx.run(blobs.delete(&file.storage_path)).await? {
                    // Blob que já não existe não impede a exclusão da linha
                    Ok(()) | Err(StorageError::NotFound(_)) => {}
                    Err(err) => return Err(err.into()),
                }
                files.remove_silent(ctx, id).await
            })
            .await;
        store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }
}
