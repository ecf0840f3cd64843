// src/services/customer_service.rs

use std::collections::HashSet;
use std::sync::Arc;

use serde::Serialize;
use serde_json::{json, Value};
use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::i18n::{Message, MessageKey};
use crate::db::Table;
use crate::models::customer::{Customer, CustomerDraft, CustomerFilter, CustomerPatch};
use crate::models::department::{ALL_CODE, UNCATEGORIZED_CODE};
use crate::services::context::ViewContext;
use crate::services::department_service::DepartmentService;
use crate::services::entity_store::EntityStore;
use crate::services::gate::Gates;
use crate::services::notifications::ActivityType;
use crate::services::reconcile::Change;

/// Contagem de clientes por departamento, para a barra lateral.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct DepartmentCount {
    pub code: String,
    pub name: String,
    pub count: usize,
}

pub struct CustomerService {
    store: Arc<EntityStore<Customer>>,
    departments: Arc<DepartmentService>,
    gates: Gates,
}

impl CustomerService {
    pub fn new(store: Arc<EntityStore<Customer>>, departments: Arc<DepartmentService>, gates: Gates) -> Self {
        Self { store, departments, gates }
    }

    pub fn store(&self) -> &EntityStore<Customer> {
        &self.store
    }

    pub fn list(&self, filter: &CustomerFilter) -> Vec<Customer> {
        self.store.list_by(|c| filter.matches(c))
    }

    pub fn find(&self, id: Uuid) -> Option<Customer> {
        self.store.find(id)
    }

    pub fn department_counts(&self) -> Vec<DepartmentCount> {
        let customers = self.store.list();
        self.departments
            .list()
            .into_iter()
            .map(|dept| {
                let count = if dept.is_all() {
                    customers.len()
                } else {
                    customers.iter().filter(|c| c.department == dept.code).count()
                };
                DepartmentCount { code: dept.code, name: dept.name, count }
            })
            .collect()
    }

    pub async fn refresh(&self, ctx: &ViewContext) -> Result<Vec<Customer>, AppError> {
        self.store.refresh(ctx).await
    }

    fn reject(&self, err: AppError) -> AppError {
        self.store.notifier().failure(&err);
        err
    }

    // "all" é só um filtro; qualquer outro código precisa existir
    fn resolve_department(&self, code: &str) -> Result<String, AppError> {
        if code == ALL_CODE {
            return Err(AppError::UnknownDepartment(code.to_string()));
        }
        self.departments
            .display_name(code)
            .ok_or_else(|| AppError::UnknownDepartment(code.to_string()))
    }

    // ===================================================================
    // CRUD
    // ===================================================================

    pub async fn create(&self, ctx: &ViewContext, draft: CustomerDraft) -> Result<Customer, AppError> {
        let mut draft = draft.normalized();
        if draft.department.trim().is_empty() {
            draft.department = UNCATEGORIZED_CODE.to_string();
        }
        draft.department_name = self.resolve_department(&draft.department).map_err(|e| self.reject(e))?;
        self.store.add(ctx, &draft).await
    }

    pub async fn update(&self, ctx: &ViewContext, id: Uuid, patch: CustomerPatch) -> Result<Customer, AppError> {
        let mut patch = patch.normalized();
        if let Some(code) = patch.department.as_deref() {
            patch.department_name = Some(self.resolve_department(code).map_err(|e| self.reject(e))?);
        }
        self.store.update(ctx, id, &patch).await
    }

    pub async fn delete(&self, ctx: &ViewContext, id: Uuid, secret: &str) -> Result<Customer, AppError> {
        let result = self
            .gates
            .records
            .guard(secret, move || self.store.remove_silent(ctx, id))
            .await;
        self.store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }

    /// Move os clientes selecionados para outro departamento num único lote.
    /// Usa a senha do portão de departamentos.
    pub async fn reassign(
        &self,
        ctx: &ViewContext,
        ids: &[Uuid],
        department: &str,
        secret: &str,
    ) -> Result<Vec<Customer>, AppError> {
        let result = self
            .gates
            .departments
            .guard(secret, move || self.reassign_confirmed(ctx, ids, department))
            .await;

        match &result {
            Ok(moved) => {
                let name = self.departments.display_name(department).unwrap_or_default();
                tracing::info!("{} clientes movidos para '{}'", moved.len(), department);
                self.store
                    .notifier()
                    .success(Message::about(MessageKey::Reassigned, Table::Customers, name));
            }
            Err(err) => self.store.notifier().failure(err),
        }
        result
    }

    async fn reassign_confirmed(
        &self,
        ctx: &ViewContext,
        ids: &[Uuid],
        department: &str,
    ) -> Result<Vec<Customer>, AppError> {
        let name = self.resolve_department(department)?;

        let mut seen = HashSet::new();
        let mut selected = Vec::with_capacity(ids.len());
        for id in ids.iter().filter(|id| seen.insert(**id)) {
            selected.push(self.store.find(*id).ok_or(AppError::NotFound(*id))?);
        }
        if selected.is_empty() {
            return Ok(selected);
        }

        let _guard = self.store.begin_write("reassign")?;
        let batch: Vec<Value> = selected
            .iter()
            .map(|c| json!({ "id": c.id, "department": department, "departmentName": name }))
            .collect();
        ctx.run(self.store.gateway().upsert_batch(Table::Customers, batch))
            .await?
            .map_err(AppError::RemoteWriteError)?;

        for customer in selected.iter_mut() {
            customer.department = department.to_string();
            customer.department_name = name.clone();
        }
        if let Err(err) = self.store.reload(ctx).await {
            tracing::warn!("Releitura de clientes após reatribuição falhou: {}", err);
            for customer in &selected {
                self.store.apply(Change::Replaced(customer.clone()));
            }
        }
        Ok(selected)
    }
}
