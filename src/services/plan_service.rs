// src/services/plan_service.rs

use std::sync::Arc;

use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::i18n::MessageKey;
use crate::db::{OrderBy, RemoteGateway};
use crate::models::plan::{
    AdvertisingPlanDraft, AdvertisingPlanItem, ServicePlanDraft, ServicePlanItem, ServicePlanPatch,
};
use crate::services::context::ViewContext;
use crate::services::entity_store::{EntityStore, ScopedStores};
use crate::services::gate::Gate;
use crate::services::notifications::{ActivityType, NotificationHub};

fn configure_services(store: EntityStore<ServicePlanItem>) -> EntityStore<ServicePlanItem> {
    store.with_order(vec![OrderBy::desc("createdAt")])
}

fn configure_ads(store: EntityStore<AdvertisingPlanItem>) -> EntityStore<AdvertisingPlanItem> {
    store.with_order(vec![OrderBy::desc("updatedAt")])
}

pub struct PlanService {
    services: ScopedStores<ServicePlanItem>,
    ads: ScopedStores<AdvertisingPlanItem>,
    gate: Gate,
}

impl PlanService {
    pub fn new(gateway: Arc<dyn RemoteGateway>, notifier: Arc<NotificationHub>, user_id: Uuid, gate: Gate) -> Self {
        Self {
            services: ScopedStores::new(Arc::clone(&gateway), Arc::clone(&notifier), user_id, configure_services),
            ads: ScopedStores::new(gateway, notifier, user_id, configure_ads),
            gate,
        }
    }

    pub fn forget(&self, customer_id: Uuid) {
        self.services.forget(customer_id);
        self.ads.forget(customer_id);
    }

    // ===================================================================
    // PLANO DE SERVIÇOS
    // ===================================================================

    pub fn service_store(&self, customer_id: Uuid) -> Arc<EntityStore<ServicePlanItem>> {
        self.services.get(customer_id)
    }

    pub fn service_plans(&self, customer_id: Uuid) -> Vec<ServicePlanItem> {
        self.service_store(customer_id).list()
    }

    pub async fn refresh_services(&self, ctx: &ViewContext, customer_id: Uuid) -> Result<Vec<ServicePlanItem>, AppError> {
        self.service_store(customer_id).refresh(ctx).await
    }

    pub async fn add_service(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        draft: ServicePlanDraft,
    ) -> Result<ServicePlanItem, AppError> {
        self.service_store(customer_id).add(ctx, &draft).await
    }

    pub async fn update_service(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
        patch: ServicePlanPatch,
    ) -> Result<ServicePlanItem, AppError> {
        self.service_store(customer_id).update(ctx, id, &patch).await
    }

    pub async fn delete_service(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
        secret: &str,
    ) -> Result<ServicePlanItem, AppError> {
        let store = self.service_store(customer_id);
        let items = store.as_ref();
        let result = self.gate.guard(secret, move || items.remove_silent(ctx, id)).await;
        store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }

    // ===================================================================
    // PLANO DE ANÚNCIOS (no máximo um por cliente)
    // ===================================================================

    pub fn ad_store(&self, customer_id: Uuid) -> Arc<EntityStore<AdvertisingPlanItem>> {
        self.ads.get(customer_id)
    }

    pub fn advertising_plan(&self, customer_id: Uuid) -> Option<AdvertisingPlanItem> {
        self.ad_store(customer_id).list().into_iter().next()
    }

    pub async fn refresh_advertising(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
    ) -> Result<Option<AdvertisingPlanItem>, AppError> {
        let rows = self.ad_store(customer_id).refresh(ctx).await?;
        Ok(rows.into_iter().next())
    }

    /// Grava o plano escolhido: atualiza o existente ou cria um novo.
    /// Linhas excedentes (de versões antigas) são removidas.
    pub async fn select_advertising(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        draft: AdvertisingPlanDraft,
    ) -> Result<AdvertisingPlanItem, AppError> {
        let store = self.ad_store(customer_id);
        let result = self.replace_advertising(ctx, &store, draft.normalized()).await;
        let (activity, key) = match &result {
            Ok((_, true)) => (ActivityType::Create, MessageKey::Created),
            _ => (ActivityType::Edit, MessageKey::Updated),
        };
        store.report(result.map(|(plan, _)| plan), activity, key)
    }

    // Devolve o plano e se ele foi criado agora
    async fn replace_advertising(
        &self,
        ctx: &ViewContext,
        store: &EntityStore<AdvertisingPlanItem>,
        draft: AdvertisingPlanDraft,
    ) -> Result<(AdvertisingPlanItem, bool), AppError> {
        draft.validate()?;
        if !store.is_loaded() {
            store.reload(ctx).await?;
        }

        let existing = store.list();
        let Some((current, extras)) = existing.split_first() else {
            let created = store.add_silent(ctx, &draft).await?;
            return Ok((created, true));
        };

        let plan = store.update_silent(ctx, current.id, &draft).await?;
        for extra in extras {
            tracing::warn!("Removendo plano de anúncios excedente {} do cliente", extra.id);
            store.remove_silent(ctx, extra.id).await?;
        }
        Ok((plan, false))
    }

    pub async fn remove_advertising(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        secret: &str,
    ) -> Result<AdvertisingPlanItem, AppError> {
        let store = self.ad_store(customer_id);
        let plans = store.as_ref();
        let result = self
            .gate
            .guard(secret, move || async move {
                let current = plans
                    .list()
                    .into_iter()
                    .next()
                    .ok_or(AppError::NotFound(Uuid::nil()))?;
                plans.remove_silent(ctx, current.id).await
            })
            .await;
        store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }
}
