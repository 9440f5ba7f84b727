use std::collections::BTreeSet;

use async_trait::async_trait;
use rolegrid_core::AppResult;
use rolegrid_domain::{PermissionCode, Role, RoleId};

use crate::AuditEvent;

/// Repository port for roles and their grant sets.
#[async_trait]
pub trait RolePermissionRepository: Send + Sync {
    /// Lists every role ordered by name.
    async fn list_roles(&self) -> AppResult<Vec<Role>>;

    /// Finds one role by identifier.
    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>>;

    /// Lists the stored grant set of a role. Unknown roles yield an empty list.
    async fn list_role_permission_codes(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>>;

    /// Replaces the complete grant set of a role and records `audit_event`
    /// in the same atomic write. Either both are stored or neither is.
    ///
    /// Returns [`rolegrid_core::AppError::NotFound`] when the role does not exist.
    async fn replace_role_permission_codes(
        &self,
        role_id: RoleId,
        permission_codes: &BTreeSet<PermissionCode>,
        audit_event: AuditEvent,
    ) -> AppResult<()>;
}

/// Input for creating a role if it is missing.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsureRoleInput {
    /// Stable role code used for lookup.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    pub description: Option<String>,
    /// Marks the role as system-managed.
    pub is_system: bool,
    /// Grants attached only when the role is created.
    pub initial_permission_codes: BTreeSet<PermissionCode>,
}

/// Result of [`RoleProvisioningRepository::ensure_role`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct EnsuredRole {
    /// Stored role.
    pub role: Role,
    /// Whether this call created it.
    pub created: bool,
}

/// Repository port for role provisioning and subject assignments.
#[async_trait]
pub trait RoleProvisioningRepository: Send + Sync {
    /// Returns the role with the given code, creating it with its initial grants if missing.
    async fn ensure_role(&self, input: EnsureRoleInput) -> AppResult<EnsuredRole>;

    /// Assigns a role to a subject. Returns `false` when the assignment already existed.
    async fn assign_role_to_subject(&self, subject: &str, role_id: RoleId) -> AppResult<bool>;
}
