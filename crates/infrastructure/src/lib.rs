//! Infrastructure adapters for application ports.

#![forbid(unsafe_code)]

mod in_memory_audit_repository;
mod in_memory_role_permission_repository;
mod postgres_audit_log_repository;
mod postgres_audit_repository;
mod postgres_authorization_repository;
mod postgres_role_permission_repository;

pub use in_memory_audit_repository::InMemoryAuditRepository;
pub use in_memory_role_permission_repository::{
    InMemoryRolePermissionRepository, RoleSeedDocument, RoleSeedEntry, SubjectRoleSeed,
};
pub use postgres_audit_log_repository::PostgresAuditLogRepository;
pub use postgres_audit_repository::PostgresAuditRepository;
pub use postgres_authorization_repository::PostgresAuthorizationRepository;
pub use postgres_role_permission_repository::PostgresRolePermissionRepository;
