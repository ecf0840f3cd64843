// src/services/notifications.rs

use std::sync::{Mutex, PoisonError};

use chrono::{DateTime, Utc};
use serde::Serialize;
use tokio::sync::broadcast;

use crate::common::error::AppError;
use crate::common::i18n::{Message, MessageKey};
use crate::db::Table;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum NotificationKind {
    Success,
    Error,
}

/// Evento de toast. Quem apresenta decide o idioma na hora de exibir.
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Notification {
    pub kind: NotificationKind,
    pub message: Message,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
#[serde(rename_all = "snake_case")]
pub enum ActivityType {
    Create,
    Edit,
    Delete,
    Upload,
}

#[derive(Debug, Clone, Serialize)]
#[serde(rename_all = "camelCase")]
pub struct ActivityEvent {
    #[serde(rename = "type")]
    pub activity: ActivityType,
    pub message: Message,
    pub subject_name: String,
    pub at: DateTime<Utc>,
}

/// Toasts (broadcast, sem histórico) + feed de atividades (acumula até `clear`).
#[derive(Debug)]
pub struct NotificationHub {
    toasts: broadcast::Sender<Notification>,
    feed: Mutex<Vec<ActivityEvent>>,
}

impl Default for NotificationHub {
    fn default() -> Self {
        Self::new(64)
    }
}

impl NotificationHub {
    pub fn new(capacity: usize) -> Self {
        let (toasts, _) = broadcast::channel(capacity.max(1));
        Self { toasts, feed: Mutex::new(Vec::new()) }
    }

    pub fn subscribe(&self) -> broadcast::Receiver<Notification> {
        self.toasts.subscribe()
    }

    pub fn notify(&self, notification: Notification) {
        // Sem ninguém inscrito o envio falha; toast perdido não é erro
        let _ = self.toasts.send(notification);
    }

    pub fn success(&self, message: Message) {
        self.notify(Notification { kind: NotificationKind::Success, message });
    }

    pub fn failure(&self, err: &AppError) {
        // View que foi embora não recebe toast
        if matches!(err, AppError::Cancelled) {
            return;
        }
        self.notify(Notification { kind: NotificationKind::Error, message: err.message() });
    }

    /// Toast de sucesso + entrada no feed de atividades.
    pub fn record(&self, activity: ActivityType, key: MessageKey, table: Table, subject: &str) {
        let message = Message::about(key, table, subject);
        self.success(message.clone());
        self.feed
            .lock()
            .unwrap_or_else(PoisonError::into_inner)
            .push(ActivityEvent {
                activity,
                message,
                subject_name: subject.to_string(),
                at: Utc::now(),
            });
    }

    /// Feed do mais recente para o mais antigo.
    pub fn activity(&self) -> Vec<ActivityEvent> {
        let feed = self.feed.lock().unwrap_or_else(PoisonError::into_inner);
        feed.iter().rev().cloned().collect()
    }

    pub fn clear_activity(&self) {
        self.feed.lock().unwrap_or_else(PoisonError::into_inner).clear();
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[tokio::test]
    async fn record_emits_toast_and_feed_entry() {
        let hub = NotificationHub::default();
        let mut toasts = hub.subscribe();

        hub.record(ActivityType::Create, MessageKey::Created, Table::Customers, "Acme");

        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.kind, NotificationKind::Success);
        assert_eq!(toast.message.subject.as_deref(), Some("Acme"));

        let feed = hub.activity();
        assert_eq!(feed.len(), 1);
        assert_eq!(feed[0].activity, ActivityType::Create);

        hub.clear_activity();
        assert!(hub.activity().is_empty());
    }

    #[tokio::test]
    async fn cancelled_operations_are_silent() {
        let hub = NotificationHub::default();
        let mut toasts = hub.subscribe();

        hub.failure(&AppError::Cancelled);
        hub.failure(&AppError::ConfirmationDenied);

        let toast = toasts.recv().await.unwrap();
        assert_eq!(toast.kind, NotificationKind::Error);
        assert_eq!(toast.message.key, MessageKey::ConfirmationDenied);
    }
}
