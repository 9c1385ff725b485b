//! Repository layer.
//!
//! Each repository is a zero-sized struct providing async CRUD methods
//! that accept `&PgPool` as the first argument. Repositories for
//! tenant-owned tables take `tenant_id` as the second argument.

pub mod analytics_repo;
pub mod audit_repo;
pub mod content_repo;
pub mod customer_repo;
pub mod deal_repo;
pub mod employee_repo;
pub mod event_repo;
pub mod lead_repo;
pub mod notification_repo;
pub mod permission_repo;
pub mod project_repo;
pub mod session_repo;
pub mod task_repo;
pub mod tenant_repo;
pub mod user_repo;

pub use analytics_repo::AnalyticsRepo;
pub use audit_repo::AuditLogRepo;
pub use content_repo::ContentRepo;
pub use customer_repo::CustomerRepo;
pub use deal_repo::DealRepo;
pub use employee_repo::EmployeeRepo;
pub use event_repo::EventRepo;
pub use lead_repo::LeadRepo;
pub use notification_repo::NotificationRepo;
pub use permission_repo::PermissionRepo;
pub use project_repo::ProjectRepo;
pub use session_repo::SessionRepo;
pub use task_repo::TaskRepo;
pub use tenant_repo::TenantRepo;
pub use user_repo::UserRepo;
