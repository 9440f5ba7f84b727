use std::sync::Arc;

use axum::http::HeaderName;
use rolegrid_application::{
    AuditLogRepository, AuditRepository, AuthorizationRepository, AuthorizationService,
    RolePermissionRepository, RolePermissionService, RoleProvisioningRepository,
};
use rolegrid_infrastructure::{
    InMemoryRolePermissionRepository, PostgresAuditLogRepository, PostgresAuditRepository,
    PostgresAuthorizationRepository, PostgresRolePermissionRepository,
};
use sqlx::PgPool;

use crate::state::AppState;

/// Port implementations selected by the storage backend.
#[derive(Clone)]
pub struct PortSet {
    pub role_permission_repository: Arc<dyn RolePermissionRepository>,
    pub role_provisioning_repository: Arc<dyn RoleProvisioningRepository>,
    pub authorization_repository: Arc<dyn AuthorizationRepository>,
    pub audit_repository: Arc<dyn AuditRepository>,
    pub audit_log_repository: Arc<dyn AuditLogRepository>,
}

pub fn postgres_ports(pool: &PgPool) -> PortSet {
    let roles = Arc::new(PostgresRolePermissionRepository::new(pool.clone()));

    PortSet {
        role_permission_repository: roles.clone(),
        role_provisioning_repository: roles,
        authorization_repository: Arc::new(PostgresAuthorizationRepository::new(pool.clone())),
        audit_repository: Arc::new(PostgresAuditRepository::new(pool.clone())),
        audit_log_repository: Arc::new(PostgresAuditLogRepository::new(pool.clone())),
    }
}

pub fn in_memory_ports(roles: InMemoryRolePermissionRepository) -> PortSet {
    let audit = roles.audit_log();
    let roles = Arc::new(roles);

    PortSet {
        role_permission_repository: roles.clone(),
        role_provisioning_repository: roles.clone(),
        authorization_repository: roles,
        audit_repository: audit.clone(),
        audit_log_repository: audit,
    }
}

pub fn build_app_state(
    ports: PortSet,
    frontend_url: String,
    auth_subject_header: HeaderName,
) -> AppState {
    let authorization_service = AuthorizationService::new(ports.authorization_repository);
    let role_permission_service = RolePermissionService::new(
        authorization_service.clone(),
        ports.role_permission_repository,
        ports.audit_log_repository,
    );

    AppState {
        authorization_service,
        role_permission_service,
        frontend_url,
        auth_subject_header,
    }
}
