//! Application services and ports.

#![forbid(unsafe_code)]

mod audit_ports;
mod authorization_service;
mod permission_editor;
mod role_bootstrap_service;
mod role_permission_ports;
mod role_permission_service;

#[cfg(test)]
mod test_support;

pub use audit_ports::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
};
pub use authorization_service::{AuthorizationRepository, AuthorizationService};
pub use permission_editor::{PermissionEditor, RoleSelection, SaveOutcome};
pub use role_bootstrap_service::{
    ADMINISTRATOR_ROLE_CODE, AdministratorBootstrap, RoleBootstrapService,
};
pub use role_permission_ports::{
    EnsureRoleInput, EnsuredRole, RolePermissionRepository, RoleProvisioningRepository,
};
pub use role_permission_service::{
    RolePermissionMatrix, RolePermissionService, SaveRolePermissionsInput, SavedRolePermissions,
};
