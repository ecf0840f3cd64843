pub mod context;
pub use context::ViewContext;
pub mod notifications;
pub use notifications::NotificationHub;
pub mod reconcile;
pub mod entity_store;
pub use entity_store::{Arrangement, Entity, EntityStore, ScopedStores};
pub mod gate;
pub use gate::{Confirmation, Gate, Gates};
pub mod reorder;
pub use reorder::ReorderEngine;
pub mod customer_service;
pub use customer_service::CustomerService;
pub mod department_service;
pub use department_service::DepartmentService;
pub mod payment_service;
pub use payment_service::PaymentService;
pub mod plan_service;
pub use plan_service::PlanService;
pub mod file_service;
pub use file_service::FileService;
pub mod workspace;
pub use workspace::Workspace;
