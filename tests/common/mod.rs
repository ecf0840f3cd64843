#![allow(dead_code)]

use std::sync::Arc;

use crm_desk::db::{MemoryBlobStore, MemoryGateway};
use crm_desk::models::customer::{Customer, CustomerDraft};
use crm_desk::models::department::{Department, DepartmentDraft};
use crm_desk::services::{Gates, ViewContext, Workspace};
use uuid::Uuid;

pub const RECORD_SECRET: &str = "delete-me";
pub const DEPARTMENT_SECRET: &str = "dept-secret";

pub struct Harness {
    pub gateway: Arc<MemoryGateway>,
    pub blobs: Arc<MemoryBlobStore>,
    pub workspace: Workspace,
    pub user_id: Uuid,
    pub ctx: ViewContext,
}

pub fn harness() -> Harness {
    let gateway = Arc::new(MemoryGateway::new());
    let blobs = Arc::new(MemoryBlobStore::new());
    let user_id = Uuid::new_v4();
    let workspace = Workspace::new(
        gateway.clone(),
        blobs.clone(),
        user_id,
        Gates::new(RECORD_SECRET, DEPARTMENT_SECRET),
    );
    Harness { gateway, blobs, workspace, user_id, ctx: ViewContext::new() }
}

/// Workspace já carregado (com as linhas fixas criadas).
pub async fn loaded() -> Harness {
    let h = harness();
    h.workspace.load(&h.ctx).await.unwrap();
    h
}

pub async fn department(h: &Harness, code: &str, name: &str) -> Department {
    h.workspace
        .departments
        .create(&h.ctx, DepartmentDraft { code: code.into(), name: name.into(), sort_order: None })
        .await
        .unwrap()
}

pub async fn customer(h: &Harness, name: &str, department: &str) -> Customer {
    h.workspace
        .customers
        .create(&h.ctx, CustomerDraft::new(name, department))
        .await
        .unwrap()
}

pub fn codes(rows: &[Department]) -> Vec<String> {
    rows.iter().map(|d| d.code.clone()).collect()
}
