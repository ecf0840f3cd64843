mod common;

use chrono::NaiveDate;
use rust_decimal::Decimal;

use common::{customer, loaded, RECORD_SECRET};
use crm_desk::common::error::AppError;
use crm_desk::db::{Operation, Table};
use crm_desk::models::customer::{CustomerDraft, CustomerFilter, CustomerPatch, CustomerStatus};
use crm_desk::models::file::{FileRename, FileUpload};
use crm_desk::models::payment::{BillingCycle, PaymentAccount, PaymentDraft, PaymentMethod, PaymentPatch};
use crm_desk::models::plan::{AdPaymentMethod, AdPlatform, AdvertisingPlanDraft, ServicePlanDraft};

fn payment(day: u32, amount: i64, tax: i64) -> PaymentDraft {
    PaymentDraft {
        payment_date: NaiveDate::from_ymd_opt(2024, 3, day).unwrap(),
        payment_method: PaymentMethod::BankTransfer,
        account: None,
        billing_cycle: BillingCycle::Monthly,
        amount: Decimal::new(amount, 0),
        tax_amount: Decimal::new(tax, 0),
        is_confirmed: false,
        total_amount: Decimal::ZERO,
    }
}

fn upload(name: &str, bytes: &[u8]) -> FileUpload {
    FileUpload { file_name: name.into(), mime_type: "application/pdf".into(), bytes: bytes.to_vec() }
}

// =========================================================================
//  CLIENTES
// =========================================================================

#[tokio::test]
async fn customer_filters_combine() {
    let h = loaded().await;
    customer(&h, "Acme Trading", "uncategorized").await;
    let globex = customer(&h, "Globex", "uncategorized").await;

    h.workspace
        .customers
        .update(&h.ctx, globex.id, CustomerPatch { status: Some(CustomerStatus::Paused), ..Default::default() })
        .await
        .unwrap();

    let search = CustomerFilter { search: Some("acme".into()), ..Default::default() };
    assert_eq!(h.workspace.customers.list(&search).len(), 1);

    let paused = CustomerFilter { status: Some(CustomerStatus::Paused), ..Default::default() };
    let found = h.workspace.customers.list(&paused);
    assert_eq!(found.len(), 1);
    assert_eq!(found[0].id, globex.id);
}

#[tokio::test]
async fn optional_fields_can_be_cleared() {
    let h = loaded().await;
    let mut draft = CustomerDraft::new("Acme", "uncategorized");
    draft.email = Some("ops@acme.test".into());
    draft.phone = Some("02-1234".into());
    let acme = h.workspace.customers.create(&h.ctx, draft).await.unwrap();

    let patch: CustomerPatch = serde_json::from_value(serde_json::json!({ "email": null, "phone": "  " })).unwrap();
    let updated = h.workspace.customers.update(&h.ctx, acme.id, patch).await.unwrap();

    assert_eq!(updated.email, None);
    assert_eq!(updated.phone, None);
    assert_eq!(updated.name, "Acme");
    let row = &h.gateway.rows(Table::Customers)[0];
    assert!(row["email"].is_null());
}

#[tokio::test]
async fn payment_account_can_be_cleared() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let mut draft = payment(1, 100, 0);
    draft.account = Some(PaymentAccount::Company);
    let record = h.workspace.payments.create(&h.ctx, acme.id, draft).await.unwrap();
    assert_eq!(record.account, Some(PaymentAccount::Company));

    let patch = PaymentPatch { account: Some(None), ..Default::default() };
    let edited = h.workspace.payments.update(&h.ctx, acme.id, record.id, patch).await.unwrap();

    assert_eq!(edited.account, None);
    assert_eq!(edited.total_amount, Decimal::new(100, 0));
}

#[tokio::test]
async fn customer_needs_an_existing_department() {
    let h = loaded().await;
    let writes = h.gateway.write_count();

    for code in ["ghost", "all"] {
        let err = h
            .workspace
            .customers
            .create(&h.ctx, CustomerDraft::new("Acme", code))
            .await
            .unwrap_err();
        assert!(matches!(err, AppError::UnknownDepartment(_)));
    }
    assert_eq!(h.gateway.write_count(), writes);
}

#[tokio::test]
async fn failed_insert_leaves_the_list_untouched() {
    let h = loaded().await;
    customer(&h, "Acme", "uncategorized").await;
    let before = h.workspace.customers.list(&CustomerFilter::default());

    h.gateway.fail_next(Table::Customers, Operation::Insert);
    let err = h
        .workspace
        .customers
        .create(&h.ctx, CustomerDraft::new("Globex", "uncategorized"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RemoteWriteError(_)));
    assert_eq!(h.workspace.customers.list(&CustomerFilter::default()), before);
}

#[tokio::test]
async fn wrong_secret_never_deletes_a_customer() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let writes = h.gateway.write_count();

    let err = h.workspace.customers.delete(&h.ctx, acme.id, "guess").await.unwrap_err();
    assert!(matches!(err, AppError::ConfirmationDenied));
    assert_eq!(h.gateway.write_count(), writes);
    assert!(h.workspace.customers.find(acme.id).is_some());

    // O segredo de departamentos não serve para registros
    let err = h
        .workspace
        .customers
        .delete(&h.ctx, acme.id, common::DEPARTMENT_SECRET)
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ConfirmationDenied));

    h.workspace.delete_customer(&h.ctx, acme.id, RECORD_SECRET).await.unwrap();
    assert!(h.workspace.customers.find(acme.id).is_none());
}

#[tokio::test]
async fn bulk_reassign_moves_all_selected_in_one_write() {
    let h = loaded().await;
    common::department(&h, "sales", "Sales").await;
    let a = customer(&h, "A", "uncategorized").await;
    let b = customer(&h, "B", "uncategorized").await;
    let c = customer(&h, "C", "uncategorized").await;
    let writes = h.gateway.write_count();

    let moved = h
        .workspace
        .customers
        .reassign(&h.ctx, &[a.id, b.id, a.id], "sales", common::DEPARTMENT_SECRET)
        .await
        .unwrap();

    assert_eq!(moved.len(), 2);
    assert_eq!(h.gateway.write_count(), writes + 1);
    let sales = h.workspace.customers.list(&CustomerFilter::by_department("sales"));
    assert_eq!(sales.len(), 2);
    assert!(sales.iter().all(|c| c.department_name == "Sales"));
    assert_eq!(h.workspace.customers.find(c.id).unwrap().department, "uncategorized");
}

// =========================================================================
//  PAGAMENTOS
// =========================================================================

#[tokio::test]
async fn payment_totals_are_computed_locally() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let payments = &h.workspace.payments;

    let first = payments.create(&h.ctx, acme.id, payment(1, 1000, 50)).await.unwrap();
    assert_eq!(first.total_amount, Decimal::new(1050, 0));

    let edited = payments
        .update(&h.ctx, acme.id, first.id, PaymentPatch { tax_amount: Some(Decimal::new(100, 0)), ..Default::default() })
        .await
        .unwrap();
    assert_eq!(edited.amount, Decimal::new(1000, 0));
    assert_eq!(edited.total_amount, Decimal::new(1100, 0));

    let second = payments.create(&h.ctx, acme.id, payment(15, 200, 0)).await.unwrap();
    payments.set_confirmed(&h.ctx, acme.id, second.id, true).await.unwrap();

    // Mais recente primeiro
    let list = payments.list(acme.id);
    assert_eq!(list[0].id, second.id);

    let summary = payments.summary(acme.id);
    assert_eq!(summary.count, 2);
    assert_eq!(summary.total, Decimal::new(1300, 0));
    assert_eq!(summary.confirmed, Decimal::new(200, 0));
    assert_eq!(summary.pending, Decimal::new(1100, 0));
}

#[tokio::test]
async fn negative_amounts_are_rejected() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let writes = h.gateway.write_count();

    let err = h
        .workspace
        .payments
        .create(&h.ctx, acme.id, payment(1, -5, 0))
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(h.gateway.write_count(), writes);
}

#[tokio::test]
async fn payments_are_scoped_per_customer() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let globex = customer(&h, "Globex", "uncategorized").await;

    h.workspace.payments.create(&h.ctx, acme.id, payment(1, 10, 0)).await.unwrap();
    h.workspace.payments.refresh(&h.ctx, globex.id).await.unwrap();

    assert_eq!(h.workspace.payments.list(acme.id).len(), 1);
    assert!(h.workspace.payments.list(globex.id).is_empty());
}

// =========================================================================
//  PLANOS
// =========================================================================

#[tokio::test]
async fn service_plan_names_come_from_the_catalog() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let plans = &h.workspace.plans;

    let draft = |name: &str| ServicePlanDraft { name: name.into(), description: None, price: Decimal::new(3000, 0) };
    let item = plans.add_service(&h.ctx, acme.id, draft("網站設計")).await.unwrap();
    assert_eq!(plans.service_plans(acme.id), vec![item.clone()]);

    assert!(plans.add_service(&h.ctx, acme.id, draft("Astrology")).await.is_err());

    plans.delete_service(&h.ctx, acme.id, item.id, RECORD_SECRET).await.unwrap();
    assert!(plans.service_plans(acme.id).is_empty());
}

#[tokio::test]
async fn a_customer_has_at_most_one_advertising_plan() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let plans = &h.workspace.plans;

    let first = plans
        .select_advertising(
            &h.ctx,
            acme.id,
            AdvertisingPlanDraft {
                platform: AdPlatform::Google,
                payment_method: AdPaymentMethod::ServiceFee,
                service_fee_percentage: Some(Decimal::new(15, 0)),
                prepaid_amount: Some(Decimal::new(999, 0)),
                placement_limit: None,
            },
        )
        .await
        .unwrap();
    assert!(first.prepaid_amount.is_none());

    let second = plans
        .select_advertising(
            &h.ctx,
            acme.id,
            AdvertisingPlanDraft {
                platform: AdPlatform::Meta,
                payment_method: AdPaymentMethod::Prepaid,
                service_fee_percentage: None,
                prepaid_amount: Some(Decimal::new(30000, 0)),
                placement_limit: None,
            },
        )
        .await
        .unwrap();

    assert_eq!(second.id, first.id);
    assert_eq!(second.platform, AdPlatform::Meta);
    assert!(second.service_fee_percentage.is_none());
    assert_eq!(h.gateway.rows(Table::AdvertisingPlans).len(), 1);
    assert_eq!(plans.advertising_plan(acme.id), Some(second));
}

#[tokio::test]
async fn advertising_fields_must_match_the_method() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let writes = h.gateway.write_count();

    let err = h
        .workspace
        .plans
        .select_advertising(
            &h.ctx,
            acme.id,
            AdvertisingPlanDraft {
                platform: AdPlatform::Line,
                payment_method: AdPaymentMethod::CappedServiceFee,
                service_fee_percentage: Some(Decimal::new(10, 0)),
                prepaid_amount: None,
                placement_limit: None,
            },
        )
        .await
        .unwrap_err();
    assert!(matches!(err, AppError::ValidationError(_)));
    assert_eq!(h.gateway.write_count(), writes);
}

// =========================================================================
//  ARQUIVOS
// =========================================================================

#[tokio::test]
async fn upload_rename_download_delete() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let files = &h.workspace.files;

    let file = files.upload(&h.ctx, acme.id, upload("合約.pdf", b"%PDF-1.4")).await.unwrap();
    assert_eq!(file.file_size, 8);
    assert!(file.storage_path.ends_with(".pdf"));
    assert!(h.blobs.contains(&file.storage_path));

    let renamed = files
        .rename(&h.ctx, acme.id, file.id, FileRename { file_name: "  contract.pdf ".into() })
        .await
        .unwrap();
    assert_eq!(renamed.file_name, "contract.pdf");
    assert_eq!(renamed.storage_path, file.storage_path);

    let (meta, bytes) = files.download(&h.ctx, acme.id, file.id).await.unwrap();
    assert_eq!(meta.file_name, "contract.pdf");
    assert_eq!(bytes, b"%PDF-1.4".to_vec());

    files.delete(&h.ctx, acme.id, file.id, RECORD_SECRET).await.unwrap();
    assert!(files.list(acme.id).is_empty());
    assert!(h.blobs.is_empty());
}

#[tokio::test]
async fn failed_metadata_insert_removes_the_blob() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;

    h.gateway.fail_next(Table::CustomerFiles, Operation::Insert);
    let err = h
        .workspace
        .files
        .upload(&h.ctx, acme.id, upload("a.pdf", b"data"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::RemoteWriteError(_)));
    assert!(h.blobs.is_empty());
    assert!(h.workspace.files.list(acme.id).is_empty());
}

#[tokio::test]
async fn failed_blob_write_stores_no_metadata() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let writes = h.gateway.write_count();

    h.blobs.fail_writes(true);
    let err = h
        .workspace
        .files
        .upload(&h.ctx, acme.id, upload("a.pdf", b"data"))
        .await
        .unwrap_err();

    assert!(matches!(err, AppError::StorageError(_)));
    assert_eq!(h.gateway.write_count(), writes);
}

#[tokio::test]
async fn uploads_in_the_same_millisecond_keep_their_own_blobs() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let files = &h.workspace.files;

    let mut uploaded = Vec::new();
    for i in 0..20 {
        let body = format!("conteúdo {}", i);
        let file = files.upload(&h.ctx, acme.id, upload("a.pdf", body.as_bytes())).await.unwrap();
        uploaded.push((file, body));
    }

    assert_eq!(h.blobs.len(), uploaded.len());
    for (file, body) in &uploaded {
        let (_, bytes) = files.download(&h.ctx, acme.id, file.id).await.unwrap();
        assert_eq!(bytes, body.as_bytes().to_vec());
    }
}

#[tokio::test]
async fn deleting_a_customer_removes_its_blobs() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    let globex = customer(&h, "Globex", "uncategorized").await;
    h.workspace.files.upload(&h.ctx, acme.id, upload("a.pdf", b"a")).await.unwrap();
    h.workspace.files.upload(&h.ctx, acme.id, upload("b.pdf", b"b")).await.unwrap();
    let kept = h.workspace.files.upload(&h.ctx, globex.id, upload("c.pdf", b"c")).await.unwrap();
    // Aba de arquivos nunca aberta: os caminhos vêm do servidor
    h.workspace.files.forget(acme.id);

    h.workspace.delete_customer(&h.ctx, acme.id, RECORD_SECRET).await.unwrap();

    assert_eq!(h.blobs.len(), 1);
    assert!(h.blobs.contains(&kept.storage_path));
}

#[tokio::test]
async fn wrong_secret_keeps_customer_and_blobs() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    h.workspace.files.upload(&h.ctx, acme.id, upload("a.pdf", b"a")).await.unwrap();

    let err = h.workspace.delete_customer(&h.ctx, acme.id, "wrong").await.unwrap_err();

    assert!(matches!(err, AppError::ConfirmationDenied));
    assert!(h.workspace.customers.find(acme.id).is_some());
    assert_eq!(h.blobs.len(), 1);
}

#[tokio::test]
async fn tabs_require_a_known_customer() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;

    assert_eq!(h.workspace.require_customer(&h.ctx, acme.id).await.unwrap().id, acme.id);

    let stranger = uuid::Uuid::new_v4();
    let err = h.workspace.require_customer(&h.ctx, stranger).await.unwrap_err();
    assert!(matches!(err, AppError::NotFound(id) if id == stranger));
}

#[tokio::test]
async fn deleting_a_customer_forgets_its_tabs() {
    let h = loaded().await;
    let acme = customer(&h, "Acme", "uncategorized").await;
    h.workspace.payments.create(&h.ctx, acme.id, payment(1, 10, 0)).await.unwrap();

    h.workspace.delete_customer(&h.ctx, acme.id, RECORD_SECRET).await.unwrap();

    assert!(!h.workspace.payments.store(acme.id).is_loaded());
    assert!(h.workspace.payments.list(acme.id).is_empty());
}
