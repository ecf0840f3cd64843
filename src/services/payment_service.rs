// src/services/payment_service.rs

use std::sync::Arc;

use uuid::Uuid;

use crate::common::error::AppError;
use crate::common::i18n::MessageKey;
use crate::db::{OrderBy, RemoteGateway};
use crate::models::payment::{PaymentDraft, PaymentPatch, PaymentRecord, PaymentSummary};
use crate::services::context::ViewContext;
use crate::services::entity_store::{Arrangement, EntityStore, ScopedStores};
use crate::services::gate::Gate;
use crate::services::notifications::{ActivityType, NotificationHub};

// Mais recentes primeiro
fn configure(store: EntityStore<PaymentRecord>) -> EntityStore<PaymentRecord> {
    store
        .with_order(vec![OrderBy::desc("paymentDate"), OrderBy::desc("createdAt")])
        .with_arrangement(Arrangement::Sorted(|a, b| b.payment_date.cmp(&a.payment_date)))
}

pub struct PaymentService {
    stores: ScopedStores<PaymentRecord>,
    gate: Gate,
}

impl PaymentService {
    pub fn new(gateway: Arc<dyn RemoteGateway>, notifier: Arc<NotificationHub>, user_id: Uuid, gate: Gate) -> Self {
        Self { stores: ScopedStores::new(gateway, notifier, user_id, configure), gate }
    }

    pub fn store(&self, customer_id: Uuid) -> Arc<EntityStore<PaymentRecord>> {
        self.stores.get(customer_id)
    }

    pub fn list(&self, customer_id: Uuid) -> Vec<PaymentRecord> {
        self.store(customer_id).list()
    }

    pub fn summary(&self, customer_id: Uuid) -> PaymentSummary {
        PaymentSummary::of(&self.list(customer_id))
    }

    pub fn forget(&self, customer_id: Uuid) {
        self.stores.forget(customer_id);
    }

    pub async fn refresh(&self, ctx: &ViewContext, customer_id: Uuid) -> Result<Vec<PaymentRecord>, AppError> {
        self.store(customer_id).refresh(ctx).await
    }

    pub async fn create(&self, ctx: &ViewContext, customer_id: Uuid, draft: PaymentDraft) -> Result<PaymentRecord, AppError> {
        self.store(customer_id).add(ctx, &draft.with_total()).await
    }

    pub async fn update(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
        patch: PaymentPatch,
    ) -> Result<PaymentRecord, AppError> {
        let store = self.store(customer_id);
        let Some(current) = store.find(id) else {
            return store.report(Err(AppError::NotFound(id)), ActivityType::Edit, MessageKey::Updated);
        };
        store.update(ctx, id, &patch.with_total(&current)).await
    }

    pub async fn set_confirmed(
        &self,
        ctx: &ViewContext,
        customer_id: Uuid,
        id: Uuid,
        is_confirmed: bool,
    ) -> Result<PaymentRecord, AppError> {
        self.store(customer_id)
            .update(ctx, id, &PaymentPatch::confirmed(is_confirmed))
            .await
    }

    pub async fn delete(&self, ctx: &ViewContext, customer_id: Uuid, id: Uuid, secret: &str) -> Result<PaymentRecord, AppError> {
        let store = self.store(customer_id);
        let records = store.as_ref();
        let result = self.gate.guard(secret, move || records.remove_silent(ctx, id)).await;
        store.report(result, ActivityType::Delete, MessageKey::Deleted)
    }
}
