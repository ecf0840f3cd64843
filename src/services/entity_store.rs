// src/services/entity_store.rs

use std::cmp::Ordering;
use std::collections::HashMap;
use std::sync::atomic::{AtomicBool, Ordering as AtomicOrdering};
use std::sync::{Arc, Mutex, PoisonError, RwLock, RwLockReadGuard, RwLockWriteGuard};

use serde::{de::DeserializeOwned, Serialize};
use serde_json::Value;
use uuid::Uuid;
use validator::Validate;

use crate::common::error::AppError;
use crate::common::i18n::MessageKey;
use crate::db::{Filter, GatewayError, OrderBy, RemoteGateway, Table};
use crate::services::context::ViewContext;
use crate::services::notifications::{ActivityType, NotificationHub};
use crate::services::reconcile::{merge_server_row, Change, InFlight, InFlightGuard, ReconcilePolicy};

/// Linha de uma tabela remota espelhada em memória.
pub trait Entity: Clone + Serialize + DeserializeOwned + Send + Sync + 'static {
    const TABLE: Table;

    fn id(&self) -> Uuid;

    /// Nome exibido em toasts e no feed de atividades.
    fn subject(&self) -> String;
}

/// Onde uma linha recém-criada entra na lista local.
pub enum Arrangement<E> {
    Head,
    Sorted(fn(&E, &E) -> Ordering),
}

impl<E> Clone for Arrangement<E> {
    fn clone(&self) -> Self {
        *self
    }
}

impl<E> Copy for Arrangement<E> {}

// =========================================================================
//  STORE
// =========================================================================

/// Lista em memória de um tipo de entidade dentro de um escopo
/// (sempre o usuário; às vezes também um cliente).
pub struct EntityStore<E: Entity> {
    gateway: Arc<dyn RemoteGateway>,
    notifier: Arc<NotificationHub>,
    scope: Filter,
    order: Vec<OrderBy>,
    arrangement: Arrangement<E>,
    policy: ReconcilePolicy,
    rows: RwLock<Vec<E>>,
    loaded: AtomicBool,
    in_flight: InFlight,
}

impl<E: Entity> EntityStore<E> {
    pub fn new(gateway: Arc<dyn RemoteGateway>, notifier: Arc<NotificationHub>, scope: Filter) -> Self {
        Self {
            gateway,
            notifier,
            scope,
            order: vec![OrderBy::desc("createdAt")],
            arrangement: Arrangement::Head,
            policy: ReconcilePolicy::Refresh,
            rows: RwLock::new(Vec::new()),
            loaded: AtomicBool::new(false),
            in_flight: InFlight::default(),
        }
    }

    pub fn with_order(mut self, order: Vec<OrderBy>) -> Self {
        self.order = order;
        self
    }

    pub fn with_arrangement(mut self, arrangement: Arrangement<E>) -> Self {
        self.arrangement = arrangement;
        self
    }

    pub fn with_policy(mut self, policy: ReconcilePolicy) -> Self {
        self.policy = policy;
        self
    }

    fn read(&self) -> RwLockReadGuard<'_, Vec<E>> {
        self.rows.read().unwrap_or_else(PoisonError::into_inner)
    }

    fn write(&self) -> RwLockWriteGuard<'_, Vec<E>> {
        self.rows.write().unwrap_or_else(PoisonError::into_inner)
    }

    // --- Leitura local (sem I/O) ---

    pub fn scope(&self) -> &Filter {
        &self.scope
    }

    pub fn list(&self) -> Vec<E> {
        self.read().clone()
    }

    pub fn list_by(&self, predicate: impl Fn(&E) -> bool) -> Vec<E> {
        self.read().iter().filter(|row| predicate(row)).cloned().collect()
    }

    pub fn find(&self, id: Uuid) -> Option<E> {
        self.read().iter().find(|row| row.id() == id).cloned()
    }

    pub fn len(&self) -> usize {
        self.read().len()
    }

    pub fn is_empty(&self) -> bool {
        self.read().is_empty()
    }

    pub fn is_loaded(&self) -> bool {
        self.loaded.load(AtomicOrdering::SeqCst)
    }

    // --- Releitura ---

    /// Relê o escopo inteiro. Em caso de falha a lista anterior é mantida.
    pub async fn refresh(&self, ctx: &ViewContext) -> Result<Vec<E>, AppError> {
        match self.reload(ctx).await {
            Ok(rows) => {
                tracing::info!("{} recarregado: {} linhas", E::TABLE, rows.len());
                Ok(rows)
            }
            Err(err) => {
                tracing::warn!("Falha ao recarregar {}: {}", E::TABLE, err);
                self.notifier.failure(&err);
                Err(err)
            }
        }
    }

    /// Releitura sem toast; usada na reconciliação e nos rollbacks.
    pub(crate) async fn reload(&self, ctx: &ViewContext) -> Result<Vec<E>, AppError> {
        let rows = ctx
            .run(self.gateway.select(E::TABLE, &self.scope, &self.order))
            .await?
            .map_err(AppError::RemoteReadError)?;
        let rows = decode_rows::<E>(rows).map_err(AppError::RemoteReadError)?;

        self.replace_local(rows.clone());
        self.loaded.store(true, AtomicOrdering::SeqCst);
        Ok(rows)
    }

    // --- Escritas com notificação ---

    pub async fn add<D>(&self, ctx: &ViewContext, draft: &D) -> Result<E, AppError>
    where
        D: Serialize + Validate,
    {
        let result = self.add_silent(ctx, draft).await;
        self.report(result, ActivityType::Create, MessageKey::Created)
    }

    pub async fn update<P>(&self, ctx: &ViewContext, id: Uuid, patch: &P) -> Result<E, AppError>
    where
        P: Serialize + Validate,
    {
        let result = self.update_silent(ctx, id, patch).await;
        self.report(result, ActivityType::Edit, MessageKey::Updated)
    }

    pub async fn remove(&self, ctx: &ViewContext, id: Uuid) -> Result<E, AppError> {
        let result = self.remove_silent(ctx, id).await;
        self.report(result, ActivityType::Delete, MessageKey::Deleted)
    }

    pub(crate) fn report(
        &self,
        result: Result<E, AppError>,
        activity: ActivityType,
        key: MessageKey,
    ) -> Result<E, AppError> {
        match &result {
            Ok(entity) => self.notifier.record(activity, key, E::TABLE, &entity.subject()),
            Err(err) => self.notifier.failure(err),
        }
        result
    }

    // --- Escritas sem notificação (serviços compõem as suas) ---

    pub(crate) async fn add_silent<D>(&self, ctx: &ViewContext, draft: &D) -> Result<E, AppError>
    where
        D: Serialize + Validate,
    {
        draft.validate()?;
        let row = self.scoped_row(draft)?;
        self.insert_row(ctx, row).await
    }

    /// Insere uma linha já validada pelo chamador.
    pub(crate) async fn insert_row(&self, ctx: &ViewContext, row: Value) -> Result<E, AppError> {
        let row = self.with_scope(row)?;
        let _guard = self.begin_write("new")?;

        let created = ctx
            .run(self.gateway.insert(E::TABLE, row))
            .await?
            .map_err(AppError::RemoteWriteError)?;
        let entity: E = serde_json::from_value(created)
            .map_err(|e| AppError::RemoteWriteError(GatewayError::Decode(e)))?;

        tracing::info!("{} criado: {}", E::TABLE, entity.id());
        self.reconcile(ctx, Change::Inserted(entity.clone())).await;
        Ok(entity)
    }

    pub(crate) async fn update_silent<P>(&self, ctx: &ViewContext, id: Uuid, patch: &P) -> Result<E, AppError>
    where
        P: Serialize + Validate,
    {
        patch.validate()?;
        let current = self.find(id).ok_or(AppError::NotFound(id))?;
        let body = serde_json::to_value(patch).map_err(|e| AppError::InternalServerError(e.into()))?;
        let _guard = self.begin_write(&id.to_string())?;

        let server = ctx
            .run(self.gateway.update(E::TABLE, id, body))
            .await?
            .map_err(AppError::RemoteWriteError)?;
        let entity = merge_server_row(&current, server).map_err(AppError::RemoteWriteError)?;

        tracing::info!("{} atualizado: {}", E::TABLE, id);
        self.reconcile(ctx, Change::Replaced(entity.clone())).await;
        Ok(entity)
    }

    pub(crate) async fn remove_silent(&self, ctx: &ViewContext, id: Uuid) -> Result<E, AppError> {
        let current = self.find(id).ok_or(AppError::NotFound(id))?;
        let _guard = self.begin_write(&id.to_string())?;

        ctx.run(self.gateway.delete(E::TABLE, id))
            .await?
            .map_err(AppError::RemoteWriteError)?;

        tracing::info!("{} removido: {}", E::TABLE, id);
        self.reconcile(ctx, Change::Removed(id)).await;
        Ok(current)
    }

    // --- Reconciliação ---

    async fn reconcile(&self, ctx: &ViewContext, change: Change<E>) {
        if self.policy == ReconcilePolicy::Refresh {
            match self.reload(ctx).await {
                Ok(_) => return,
                // A escrita já foi confirmada; converge com a linha do servidor
                Err(err) => tracing::warn!(
                    "Releitura de {} após escrita falhou, aplicando a mudança localmente: {}",
                    E::TABLE,
                    err
                ),
            }
        }
        self.apply(change);
    }

    pub(crate) fn apply(&self, change: Change<E>) {
        let mut rows = self.write();
        match change {
            Change::Inserted(entity) => match self.arrangement {
                Arrangement::Head => rows.insert(0, entity),
                Arrangement::Sorted(cmp) => {
                    let pos = rows.partition_point(|row| cmp(row, &entity) != Ordering::Greater);
                    rows.insert(pos, entity);
                }
            },
            Change::Replaced(entity) => {
                if let Some(slot) = rows.iter_mut().find(|row| row.id() == entity.id()) {
                    *slot = entity;
                }
                if let Arrangement::Sorted(cmp) = self.arrangement {
                    rows.sort_by(cmp);
                }
            }
            Change::Removed(id) => rows.retain(|row| row.id() != id),
        }
    }

    // --- Acesso para os serviços ---

    pub(crate) fn gateway(&self) -> &Arc<dyn RemoteGateway> {
        &self.gateway
    }

    pub(crate) fn notifier(&self) -> &Arc<NotificationHub> {
        &self.notifier
    }

    pub(crate) fn begin_write(&self, key: &str) -> Result<InFlightGuard, AppError> {
        self.in_flight.acquire(format!("{}:{}", E::TABLE, key))
    }

    pub(crate) fn snapshot(&self) -> Vec<E> {
        self.list()
    }

    pub(crate) fn replace_local(&self, rows: Vec<E>) {
        *self.write() = rows;
    }

    /// Serializa o draft e acrescenta os campos do escopo (userId, customerId).
    fn scoped_row<D: Serialize>(&self, draft: &D) -> Result<Value, AppError> {
        let row = serde_json::to_value(draft).map_err(|e| AppError::InternalServerError(e.into()))?;
        self.with_scope(row)
    }

    fn with_scope(&self, row: Value) -> Result<Value, AppError> {
        let Value::Object(mut map) = row else {
            return Err(AppError::InternalServerError(anyhow::anyhow!(
                "linha de {} não é um objeto JSON",
                E::TABLE
            )));
        };
        for (field, value) in self.scope.conditions() {
            map.insert(field.clone(), value.clone());
        }
        Ok(Value::Object(map))
    }
}

// =========================================================================
//  STORES POR CLIENTE (pagamentos, planos, arquivos)
// =========================================================================

/// Um store por cliente, criado na primeira vez que a aba é aberta.
pub struct ScopedStores<E: Entity> {
    gateway: Arc<dyn RemoteGateway>,
    notifier: Arc<NotificationHub>,
    user_id: Uuid,
    configure: fn(EntityStore<E>) -> EntityStore<E>,
    stores: Mutex<HashMap<Uuid, Arc<EntityStore<E>>>>,
}

impl<E: Entity> ScopedStores<E> {
    pub fn new(
        gateway: Arc<dyn RemoteGateway>,
        notifier: Arc<NotificationHub>,
        user_id: Uuid,
        configure: fn(EntityStore<E>) -> EntityStore<E>,
    ) -> Self {
        Self { gateway, notifier, user_id, configure, stores: Mutex::new(HashMap::new()) }
    }

    pub fn get(&self, customer_id: Uuid) -> Arc<EntityStore<E>> {
        let mut stores = self.stores.lock().unwrap_or_else(PoisonError::into_inner);
        let store = stores.entry(customer_id).or_insert_with(|| {
            let scope = Filter::new()
                .eq("userId", self.user_id.to_string())
                .eq("customerId", customer_id.to_string());
            let store = EntityStore::new(Arc::clone(&self.gateway), Arc::clone(&self.notifier), scope);
            Arc::new((self.configure)(store))
        });
        Arc::clone(store)
    }

    /// Descarta o store de um cliente excluído.
    pub fn forget(&self, customer_id: Uuid) {
        self.stores
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .remove(&customer_id);
    }
}

pub(crate) fn decode_rows<E: DeserializeOwned>(rows: Vec<Value>) -> Result<Vec<E>, GatewayError> {
    rows.into_iter()
        .map(|row| serde_json::from_value(row).map_err(GatewayError::from))
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::db::memory_gateway::{MemoryGateway, Operation};
    use serde::Deserialize;
    use serde_json::json;

    #[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
    #[serde(rename_all = "camelCase")]
    struct Note {
        id: Uuid,
        user_id: Uuid,
        name: String,
        rank: i32,
    }

    impl Entity for Note {
        const TABLE: Table = Table::ServicePlans;

        fn id(&self) -> Uuid {
            self.id
        }

        fn subject(&self) -> String {
            self.name.clone()
        }
    }

    #[derive(Serialize, Validate)]
    struct NoteDraft {
        #[validate(length(min = 1))]
        name: String,
        rank: i32,
    }

    fn store(gateway: Arc<MemoryGateway>, policy: ReconcilePolicy) -> EntityStore<Note> {
        EntityStore::new(gateway, Arc::new(NotificationHub::default()), Filter::new().eq("userId", Uuid::nil().to_string()))
            .with_order(vec![OrderBy::asc("rank")])
            .with_arrangement(Arrangement::Sorted(|a: &Note, b: &Note| a.rank.cmp(&b.rank)))
            .with_policy(policy)
    }

    #[tokio::test]
    async fn patch_policy_inserts_at_sorted_position() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store(gateway.clone(), ReconcilePolicy::Patch);
        let ctx = ViewContext::new();

        for (name, rank) in [("c", 3), ("a", 1), ("b", 2)] {
            store.add(&ctx, &NoteDraft { name: name.into(), rank }).await.unwrap();
        }

        let names: Vec<_> = store.list().into_iter().map(|n| n.name).collect();
        assert_eq!(names, vec!["a", "b", "c"]);
        assert_eq!(gateway.rows(Table::ServicePlans)[0]["userId"], json!(Uuid::nil().to_string()));
    }

    #[tokio::test]
    async fn invalid_draft_never_reaches_the_gateway() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store(gateway.clone(), ReconcilePolicy::Refresh);

        let err = store
            .add(&ViewContext::new(), &NoteDraft { name: String::new(), rank: 1 })
            .await
            .unwrap_err();
        assert!(err.is_validation());
        assert_eq!(gateway.write_count(), 0);
    }

    #[tokio::test]
    async fn failed_refresh_after_write_falls_back_to_local_patch() {
        let gateway = Arc::new(MemoryGateway::new());
        let store = store(gateway.clone(), ReconcilePolicy::Refresh);
        gateway.fail_next(Table::ServicePlans, Operation::Select);

        let note = store
            .add(&ViewContext::new(), &NoteDraft { name: "a".into(), rank: 1 })
            .await
            .unwrap();
        assert_eq!(store.list(), vec![note]);
    }

    #[tokio::test]
    async fn unknown_id_is_not_found_locally() {
        let store = store(Arc::new(MemoryGateway::new()), ReconcilePolicy::Patch);
        let id = Uuid::new_v4();
        assert!(matches!(
            store.remove(&ViewContext::new(), id).await,
            Err(AppError::NotFound(missing)) if missing == id
        ));
    }
}
