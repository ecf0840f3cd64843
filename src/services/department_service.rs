// src/services/department_service.rs

use std::cmp::Ordering;
use std::sync::{Arc, Mutex, PoisonError};

use serde_json::{json, Value};
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::i18n::{Message, MessageKey};
use crate::db::{Filter, OrderBy, RemoteGateway, Table};
use crate::models::customer::Customer;
use crate::models::department::{
    Department, DepartmentDraft, DepartmentPatch, ALL_CODE, UNCATEGORIZED_CODE,
};
use crate::services::context::ViewContext;
use crate::services::entity_store::{Arrangement, EntityStore};
use crate::services::gate::Gate;
use crate::services::notifications::{ActivityType, NotificationHub};
use crate::services::reconcile::{Change, ReconcilePolicy};
use crate::services::reorder::{display_order, DropOutcome, ReorderEngine};

fn by_display_order(a: &Department, b: &Department) -> Ordering {
    (!a.is_all(), a.sort_order).cmp(&(!b.is_all(), b.sort_order))
}

pub struct DepartmentService {
    store: EntityStore<Department>,
    customers: Arc<EntityStore<Customer>>,
    gate: Gate,
    drag: Mutex<ReorderEngine>,
    user_id: Uuid,
}

impl DepartmentService {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        notifier: Arc<NotificationHub>,
        customers: Arc<EntityStore<Customer>>,
        user_id: Uuid,
        gate: Gate,
    ) -> Self {
        let scope = Filter::new().eq("userId", user_id.to_string());
        let store = EntityStore::new(gateway, notifier, scope)
            .with_order(vec![OrderBy::asc("sortOrder")])
            .with_arrangement(Arrangement::Sorted(by_display_order))
            .with_policy(ReconcilePolicy::Refresh);
        Self { store, customers, gate, drag: Mutex::new(ReorderEngine::new()), user_id }
    }

    pub fn store(&self) -> &EntityStore<Department> {
        &self.store
    }

    /// Lista na ordem da navegação: "all" no topo, depois por sort_order.
    pub fn list(&self) -> Vec<Department> {
        display_order(&self.store.list())
    }

    pub fn find_by_code(&self, code: &str) -> Option<Department> {
        self.store.list_by(|d| d.code == code).into_iter().next()
    }

    /// Nome exibido para um código; o fixo "uncategorized" sempre resolve.
    pub fn display_name(&self, code: &str) -> Option<String> {
        match self.find_by_code(code) {
            Some(dept) => Some(dept.name),
            None if code == UNCATEGORIZED_CODE => Some(DepartmentDraft::pinned_uncategorized().name),
            None => None,
        }
    }

    fn reject(&self, err: AppError) -> AppError {
        self.store.notifier().failure(&err);
        err
    }

    // ===================================================================
    // LEITURA
    // ===================================================================

    pub async fn refresh(&self, ctx: &ViewContext) -> Result<Vec<Department>, AppError> {
        self.store.refresh(ctx).await?;
        self.ensure_pinned(ctx).await?;
        Ok(self.list())
    }

    // As duas linhas fixas existem sempre; cria as que faltarem
    async fn ensure_pinned(&self, ctx: &ViewContext) -> Result<(), AppError> {
        for draft in [DepartmentDraft::pinned_all(), DepartmentDraft::pinned_uncategorized()] {
            if self.find_by_code(&draft.code).is_none() {
                tracing::info!("Criando departamento fixo '{}' para {}", draft.code, self.user_id);
                self.store.add_silent(ctx, &draft).await.map_err(|e| self.reject(e))?;
            }
        }
        Ok(())
    }

    // ===================================================================
    // ESCRITA
    // ===================================================================

    pub async fn create(&self, ctx: &ViewContext, mut draft: DepartmentDraft) -> Result<Department, AppError> {
        draft.code = draft.code.trim().to_string();
        draft.name = draft.name.trim().to_string();
        if let Err(errors) = draft.validate() {
            return Err(self.reject(errors.into()));
        }

        // Código repetido é erro de validação: nunca chega ao servidor
        if draft.code == ALL_CODE
            || draft.code == UNCATEGORIZED_CODE
            || self.find_by_code(&draft.code).is_some()
        {
            return Err(self.reject(AppError::DuplicateDepartmentCode(draft.code)));
        }

        if draft.sort_order.is_none() {
            let last = self
                .store
                .list_by(|d| !d.is_pinned())
                .iter()
                .map(|d| d.sort_order)
                .max()
                .unwrap_or(0);
            draft.sort_order = Some(last + 1);
        }

        self.store.add(ctx, &draft).await
    }

    /// Renomeia e propaga o nome para os clientes do departamento.
    pub async fn rename(&self, ctx: &ViewContext, id: Uuid, patch: DepartmentPatch) -> Result<Department, AppError> {
        let current = self.store.find(id).ok_or_else(|| self.reject(AppError::NotFound(id)))?;
        if current.is_pinned() {
            return Err(self.reject(AppError::PinnedDepartment(current.code)));
        }

        let renamed = self.store.update(ctx, id, &patch).await?;

        let filter = self.customer_filter(&renamed.code);
        let propagated = ctx
            .run(self.store.gateway().update_where(
                Table::Customers,
                &filter,
                json!({ "departmentName": renamed.name }),
            ))
            .await
            .and_then(|r| r.map_err(AppError::RemoteWriteError));
        match propagated {
            Ok(affected) => {
                tracing::info!("Nome do departamento '{}' propagado para {} clientes", renamed.code, affected);
                let name = renamed.name.clone();
                self.sync_customers(ctx, &renamed.code, |c| c.department_name = name.clone()).await;
            }
            // O departamento já foi renomeado; os clientes ficam com o nome antigo
            Err(err) => {
                tracing::warn!("Falha ao propagar o nome do departamento '{}': {}", renamed.code, err);
                self.store.notifier().failure(&err);
            }
        }
        Ok(renamed)
    }

    /// Exclusão com senha. Os clientes do departamento vão para
    /// "uncategorized" antes da linha ser removida (duas escritas).
    pub async fn delete(&self, ctx: &ViewContext, id: Uuid, secret: &str) -> Result<Department, AppError> {
        let result = self
            .gate
            .guard(secret, move || async move {
                let current = self.store.find(id).ok_or(AppError::NotFound(id))?;
                if current.is_pinned() {
                    return Err(AppError::PinnedDepartment(current.code));
                }

                let fallback_name = self.display_name(UNCATEGORIZED_CODE).unwrap_or_default();
                let affected = ctx
                    .run(self.store.gateway().update_where(
                        Table::Customers,
                        &self.customer_filter(&current.code),
                        json!({ "department": UNCATEGORIZED_CODE, "departmentName": fallback_name }),
                    ))
                    .await?
                    .map_err(AppError::RemoteWriteError)?;
                tracing::info!(
                    "{} clientes de '{}' movidos para '{}'",
                    affected,
                    current.code,
                    UNCATEGORIZED_CODE
                );

                // Os clientes já foram movidos no servidor: sincroniza mesmo se a remoção falhar
                let removed = self.store.remove_silent(ctx, id).await;
                if let Err(err) = &removed {
                    tracing::warn!("Departamento '{}' não removido após mover os clientes: {}", current.code, err);
                }

                self.sync_customers(ctx, &current.code, |c| {
                    c.department = UNCATEGORIZED_CODE.to_string();
                    c.department_name = fallback_name.clone();
                })
                .await;
                removed
            })
            .await;
        self.store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }

    // ===================================================================
    // REORDENAÇÃO
    // ===================================================================

    pub fn begin_drag(&self, active: Uuid) -> Result<(), AppError> {
        let rows = self.list();
        let mut drag = self.drag.lock().unwrap_or_else(PoisonError::into_inner);
        drag.begin(&rows, active).map_err(|reason| {
            tracing::debug!("Arraste recusado: {:?}", reason);
            match rows.iter().find(|d| d.id == active) {
                Some(dept) => AppError::PinnedDepartment(dept.code.clone()),
                None => AppError::NotFound(active),
            }
        })
    }

    pub fn cancel_drag(&self) {
        self.drag.lock().unwrap_or_else(PoisonError::into_inner).cancel();
    }

    /// Solta sobre `over`. Drop inválido devolve a lista sem mudanças.
    /// Drop válido aplica a nova ordem localmente e grava tudo num lote;
    /// se o lote falhar, relê do servidor (ou volta ao snapshot).
    pub async fn drop_on(&self, ctx: &ViewContext, over: Uuid) -> Result<Vec<Department>, AppError> {
        let rows = self.list();
        let outcome = self.drag.lock().unwrap_or_else(PoisonError::into_inner).drop_on(&rows, over);
        let plan = match outcome {
            DropOutcome::Valid(plan) => plan,
            DropOutcome::Invalid(reason) => {
                tracing::debug!("Drop ignorado: {:?}", reason);
                return Ok(rows);
            }
        };

        let _guard = self.store.begin_write("reorder").map_err(|e| self.reject(e))?;
        let snapshot = self.store.snapshot();
        self.store.replace_local(plan.ordered.clone());

        let batch = plan
            .updates
            .iter()
            .map(serde_json::to_value)
            .collect::<Result<Vec<Value>, _>>()
            .map_err(|e| AppError::InternalServerError(e.into()))?;

        let written = ctx
            .run(self.store.gateway().upsert_batch(Table::Departments, batch))
            .await
            .and_then(|r| r.map_err(AppError::RemoteWriteError));

        match written {
            Ok(()) => {
                tracing::info!("Ordem de {} departamentos salva", plan.updates.len());
                self.store.notifier().success(Message::new(MessageKey::Reordered));
                Ok(plan.ordered)
            }
            Err(err) => {
                tracing::warn!("Falha ao salvar a ordem dos departamentos, desfazendo: {}", err);
                if let Err(reload_err) = self.store.reload(ctx).await {
                    tracing::warn!("Releitura falhou, restaurando a ordem anterior: {}", reload_err);
                    self.store.replace_local(snapshot);
                }
                Err(self.reject(err))
            }
        }
    }

    pub async fn reorder(&self, ctx: &ViewContext, active: Uuid, over: Uuid) -> Result<Vec<Department>, AppError> {
        if let Err(err) = self.begin_drag(active) {
            tracing::debug!("Reordenação ignorada: {}", err);
            return Ok(self.list());
        }
        self.drop_on(ctx, over).await
    }

    // ===================================================================
    // AUXILIARES
    // ===================================================================

    fn customer_filter(&self, code: &str) -> Filter {
        Filter::new()
            .eq("userId", self.user_id.to_string())
            .eq("department", code)
    }

    // Relê os clientes; se a releitura falhar, aplica a mudança localmente
    async fn sync_customers(&self, ctx: &ViewContext, code: &str, change: impl Fn(&mut Customer)) {
        if !self.customers.is_loaded() {
            return;
        }
        if let Err(err) = self.customers.reload(ctx).await {
            tracing::warn!("Releitura de clientes falhou, atualizando localmente: {}", err);
            for mut customer in self.customers.list_by(|c| c.department == code) {
                change(&mut customer);
                self.customers.apply(Change::Replaced(customer));
            }
        }
    }
}
