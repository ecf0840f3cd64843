// src/services/workspace.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::db::{BlobStore, Filter, RemoteGateway};
use crate::models::customer::Customer;
use crate::services::context::ViewContext;
use crate::services::customer_service::CustomerService;
use crate::services::department_service::DepartmentService;
use crate::services::entity_store::EntityStore;
use crate::services::file_service::FileService;
use crate::services::gate::Gates;
use crate::services::notifications::NotificationHub;
use crate::services::payment_service::PaymentService;
use crate::services::plan_service::PlanService;

/// Todos os stores do usuário autenticado. Clientes e departamentos
/// compartilham o mesmo store de clientes (renomear/excluir propaga).
pub struct Workspace {
    user_id: Uuid,
    notifications: Arc<NotificationHub>,
    pub departments: Arc<DepartmentService>,
    pub customers: CustomerService,
    pub payments: PaymentService,
    pub plans: PlanService,
    pub files: FileService,
}

impl Workspace {
    pub fn new(gateway: Arc<dyn RemoteGateway>, blobs: Arc<dyn BlobStore>, user_id: Uuid, gates: Gates) -> Self {
        let notifications = Arc::new(NotificationHub::default());

        let customer_store = Arc::new(EntityStore::<Customer>::new(
            Arc::clone(&gateway),
            Arc::clone(&notifications),
            Filter::new().eq("userId", user_id.to_string()),
        ));

        let departments = Arc::new(DepartmentService::new(
            Arc::clone(&gateway),
            Arc::clone(&notifications),
            Arc::clone(&customer_store),
            user_id,
            gates.departments.clone(),
        ));

        let customers = CustomerService::new(customer_store, Arc::clone(&departments), gates.clone());
        let payments = PaymentService::new(
            Arc::clone(&gateway),
            Arc::clone(&notifications),
            user_id,
            gates.records.clone(),
        );
        let plans = PlanService::new(
            Arc::clone(&gateway),
            Arc::clone(&notifications),
            user_id,
            gates.records.clone(),
        );
        let files = FileService::new(gateway, blobs, Arc::clone(&notifications), user_id, gates.records);

        Self { user_id, notifications, departments, customers, payments, plans, files }
    }

    pub fn user_id(&self) -> Uuid {
        self.user_id
    }

    pub fn notifications(&self) -> &Arc<NotificationHub> {
        &self.notifications
    }

    /// Carga inicial: departamentos (com as linhas fixas) e clientes.
    pub async fn load(&self, ctx: &ViewContext) -> Result<(), AppError> {
        let departments = self.departments.refresh(ctx).await?;
        let customers = self.customers.refresh(ctx).await?;
        tracing::info!(
            "Workspace de {} carregado: {} departamentos, {} clientes",
            self.user_id,
            departments.len(),
            customers.len()
        );
        Ok(())
    }

    /// Cliente do usuário, carregando a lista na primeira chamada.
    /// As abas só abrem stores para ids que passam por aqui.
    pub async fn require_customer(&self, ctx: &ViewContext, id: Uuid) -> Result<Customer, AppError> {
        if !self.customers.store().is_loaded() {
            self.customers.refresh(ctx).await?;
        }
        self.customers.find(id).ok_or(AppError::NotFound(id))
    }

    /// Exclui o cliente, apaga os blobs dos arquivos dele e descarta os
    /// stores das abas.
    pub async fn delete_customer(&self, ctx: &ViewContext, id: Uuid, secret: &str) -> Result<Customer, AppError> {
        // As linhas de arquivo caem junto com o cliente; os caminhos são lidos antes
        let paths = match self.customers.find(id) {
            Some(_) => self.files.storage_paths(ctx, id).await.unwrap_or_else(|err| {
                tracing::warn!("Arquivos do cliente {} não listados antes da exclusão: {}", id, err);
                Vec::new()
            }),
            None => Vec::new(),
        };

        let removed = self.customers.delete(ctx, id, secret).await?;
        self.files.purge_blobs(&paths).await;
        self.payments.forget(id);
        self.plans.forget(id);
        self.files.forget(id);
        Ok(removed)
    }
}
