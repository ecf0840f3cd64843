mod common;

use std::time::Duration;

use common::{customer, department, loaded, DEPARTMENT_SECRET, RECORD_SECRET};
use crm_desk::common::error::AppError;
use crm_desk::common::i18n::MessageKey;
use crm_desk::db::{Operation, Table};
use crm_desk::models::customer::{CustomerDraft, CustomerFilter, CustomerPatch};
use crm_desk::models::department::DepartmentPatch;
use crm_desk::services::notifications::NotificationKind;
use crm_desk::services::ViewContext;

#[tokio::test]
async fn failed_refresh_keeps_the_previous_list() {
    let h = loaded().await;
    customer(&h, "Acme", "uncategorized").await;
    let before = h.workspace.customers.list(&CustomerFilter::default());
    let mut toasts = h.workspace.notifications().subscribe();

    h.gateway.fail_next(Table::Customers, Operation::Select);
    let err = h.workspace.customers.refresh(&h.ctx).await.unwrap_err();

    assert!(matches!(err, AppError::RemoteReadError(_)));
    assert_eq!(h.workspace.customers.list(&CustomerFilter::default()), before);

    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert_eq!(toast.message.key, MessageKey::RemoteReadFailed);
}

#[tokio::test]
async fn failed_update_changes_nothing_locally() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;

    h.gateway.fail_next(Table::Customers, Operation::Update);
    let patch = CustomerPatch { name: Some("Acme Ltd".into()), ..Default::default() };
    assert!(h.workspace.customers.update(&h.ctx, acme.id, patch).await.is_err());

    assert_eq!(h.workspace.customers.find(acme.id).unwrap().name, "Acme");
}

#[tokio::test]
async fn failed_delete_keeps_the_row_and_only_warns() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let before = h.workspace.customers.list(&CustomerFilter::default());
    let feed = h.workspace.notifications().activity().len();
    let mut toasts = h.workspace.notifications().subscribe();

    h.gateway.fail_next(Table::Customers, Operation::Delete);
    let err = h
        .workspace
        .customers
        .delete(&h.ctx, acme.id, RECORD_SECRET)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RemoteWriteError(_)));
    assert_eq!(h.workspace.customers.list(&CustomerFilter::default()), before);
    assert_eq!(h.gateway.rows(Table::Customers).len(), 1);

    // Só o toast de erro; nada no feed de atividades
    let toast = toasts.recv().await.unwrap();
    assert_eq!(toast.kind, NotificationKind::Error);
    assert!(toasts.try_recv().is_err());
    assert_eq!(h.workspace.notifications().activity().len(), feed);
}

#[tokio::test]
async fn rename_survives_a_failed_propagation() {
    let h = loaded().await;
    let sales = department(&h, "sales", "Sales").await;
    let acme = customer(&h, "Acme", "sales").await;
    let mut toasts = h.workspace.notifications().subscribe();

    h.gateway.fail_next(Table::Customers, Operation::UpdateWhere);
    let renamed = h
        .workspace
        .departments
        .rename(&h.ctx, sales.id, DepartmentPatch { name: "Revenue".into() })
        .await
        .unwrap();

    assert_eq!(renamed.name, "Revenue");
    assert_eq!(h.workspace.departments.find_by_code("sales").unwrap().name, "Revenue");
    // Clientes ficam com o nome antigo, aqui e no servidor
    assert_eq!(h.workspace.customers.find(acme.id).unwrap().department_name, "Sales");
    assert_eq!(h.gateway.rows(Table::Customers)[0]["departmentName"], "Sales");

    let mut kinds = Vec::new();
    while let Ok(toast) = toasts.try_recv() {
        kinds.push(toast.kind);
    }
    assert!(kinds.contains(&NotificationKind::Error));
}

#[tokio::test]
async fn delete_stops_when_customers_cannot_be_moved() {
    let h = loaded().await;
    let sales = department(&h, "sales", "Sales").await;
    let acme = customer(&h, "Acme", "sales").await;
    let departments = h.workspace.departments.list();

    h.gateway.fail_next(Table::Customers, Operation::UpdateWhere);
    let err = h
        .workspace
        .departments
        .delete(&h.ctx, sales.id, DEPARTMENT_SECRET)
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RemoteWriteError(_)));
    assert_eq!(h.workspace.departments.list(), departments);
    assert_eq!(h.workspace.customers.find(acme.id).unwrap().department, "sales");
    assert_eq!(h.gateway.rows(Table::Departments).len(), departments.len());
}

#[tokio::test]
async fn second_submission_is_rejected_while_the_first_is_in_flight() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    h.gateway.set_latency(Some(Duration::from_millis(30)));

    let rename = |name: &str| CustomerPatch { name: Some(name.into()), ..Default::default() };
    let (first, second) = tokio::join!(
        h.workspace.customers.update(&h.ctx, acme.id, rename("One")),
        h.workspace.customers.update(&h.ctx, acme.id, rename("Two")),
    );

    assert_eq!(first.unwrap().name, "One");
    assert!(matches!(second, Err(AppError::SubmissionInProgress(_))));

    // Terminado o envio, a chave é liberada
    h.gateway.set_latency(None);
    let third = h.workspace.customers.update(&h.ctx, acme.id, rename("Three")).await.unwrap();
    assert_eq!(third.name, "Three");
}

#[tokio::test]
async fn concurrent_creates_share_the_new_form_key() {
    let h = loaded().await;
    h.gateway.set_latency(Some(Duration::from_millis(30)));
    let writes = h.gateway.write_count();

    let (first, second) = tokio::join!(
        h.workspace.customers.create(&h.ctx, CustomerDraft::new("Acme", "uncategorized")),
        h.workspace.customers.create(&h.ctx, CustomerDraft::new("Acme", "uncategorized")),
    );

    assert!(first.is_ok());
    assert!(matches!(second, Err(AppError::SubmissionInProgress(_))));
    assert_eq!(h.gateway.write_count(), writes + 1);
}

#[tokio::test]
async fn cancelled_view_abandons_the_write() {
    let h = loaded().await;
    h.gateway.set_latency(Some(Duration::from_millis(50)));
    let view = ViewContext::new();
    let writes = h.gateway.write_count();

    let (result, _) = tokio::join!(
        h.workspace.customers.create(&view, CustomerDraft::new("Acme", "uncategorized")),
        async {
            tokio::time::sleep(Duration::from_millis(10)).await;
            view.cancel();
        },
    );

    assert!(matches!(result, Err(AppError::Cancelled)));
    assert_eq!(h.gateway.write_count(), writes);
    assert!(h.workspace.customers.list(&CustomerFilter::default()).is_empty());

    // Outra view continua funcionando
    h.gateway.set_latency(None);
    assert!(customer(&h, "Globex", "uncategorized").await.id != uuid::Uuid::nil());
}

#[tokio::test]
async fn teardown_guard_cancels_on_drop() {
    let view = ViewContext::new();
    {
        let _guard = view.teardown_guard();
        assert!(!view.is_cancelled());
    }
    assert!(view.is_cancelled());
}
