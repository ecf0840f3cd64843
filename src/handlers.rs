// src/handlers.rs

use axum::{
    extract::DefaultBodyLimit,
    middleware as axum_middleware,
    routing::{get, post, put},
    Router,
};
use serde::Deserialize;

use crate::config::AppState;
use crate::middleware::customer::customer_guard;

pub mod activity;
pub mod customers;
pub mod departments;
pub mod files;
pub mod payments;
pub mod plans;

/// Corpo das rotas de exclusão e das ações com senha.
#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct ConfirmPayload {
    #[serde(default)]
    pub secret: String,
}

pub fn router(app_state: AppState) -> Router {
    let department_routes = Router::new()
        .route("/"
               ,get(departments::list_departments)
               .post(departments::create_department)
        )
        .route("/counts", get(departments::department_counts))
        .route("/reorder", post(departments::reorder_departments))
        .route("/{id}"
               ,put(departments::rename_department)
               .delete(departments::delete_department)
        );

    let customer_routes = Router::new()
        .route("/"
               ,get(customers::list_customers)
               .post(customers::create_customer)
        )
        .route("/reassign", post(customers::reassign_customers))
        .route("/{id}"
               ,get(customers::get_customer)
               .put(customers::update_customer)
               .delete(customers::delete_customer)
        );

    let tab_routes = Router::new()
        // Aba de pagamentos
        .route("/{id}/payments"
               ,get(payments::list_payments)
               .post(payments::create_payment)
        )
        .route("/{id}/payments/{payment_id}"
               ,put(payments::update_payment)
               .delete(payments::delete_payment)
        )
        .route("/{id}/payments/{payment_id}/confirm", put(payments::set_confirmed))
        // Aba de planos
        .route("/{id}/services"
               ,get(plans::list_service_plans)
               .post(plans::create_service_plan)
        )
        .route("/{id}/services/{item_id}"
               ,put(plans::update_service_plan)
               .delete(plans::delete_service_plan)
        )
        .route("/{id}/advertising"
               ,get(plans::get_advertising_plan)
               .put(plans::select_advertising_plan)
               .delete(plans::delete_advertising_plan)
        )
        // Aba de arquivos
        .route("/{id}/files"
               ,get(files::list_files)
               .post(files::upload_file)
               .layer(DefaultBodyLimit::max(files::UPLOAD_BODY_LIMIT))
        )
        .route("/{id}/files/{file_id}"
               ,get(files::download_file)
               .put(files::rename_file)
               .delete(files::delete_file)
        )
        .route_layer(axum_middleware::from_fn_with_state(
            app_state.clone(),
            customer_guard,
        ));

    Router::new()
        .route("/api/health", get(|| async { "OK" }))
        .route("/api/sync", post(activity::sync_workspace))
        .route("/api/catalog/services", get(plans::service_catalog))
        .route("/api/activity"
               ,get(activity::list_activity)
               .delete(activity::clear_activity)
        )
        .nest("/api/departments", department_routes)
        .nest("/api/customers", customer_routes.merge(tab_routes))
        .with_state(app_state)
}
