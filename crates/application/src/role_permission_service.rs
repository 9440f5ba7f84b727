use std::collections::BTreeSet;
use std::sync::Arc;

use rolegrid_core::{AppError, AppResult, UserIdentity};
use rolegrid_domain::{
    AuditAction, PageDefinition, PermissionAction, PermissionCode, PermissionFormRow, Role,
    RoleId, merge_permissions_into_rows, permission_pages, rows_to_permission_codes,
    validate_catalog_rows,
};
use tracing::info;

use crate::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuthorizationService,
    RolePermissionRepository,
};

const PERMISSIONS_PAGE: &str = "permissions";

/// One role's stored grant set together with its matrix rows.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RolePermissionMatrix {
    /// Loaded role.
    pub role: Role,
    /// Stored grant set, as persisted.
    pub permission_codes: BTreeSet<PermissionCode>,
    /// One row per catalog page.
    pub rows: Vec<PermissionFormRow>,
}

/// Input payload for replacing a role's grant set.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SaveRolePermissionsInput {
    /// Target role.
    pub role_id: RoleId,
    /// Complete desired matrix.
    pub rows: Vec<PermissionFormRow>,
}

/// Grant set written by a successful save.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct SavedRolePermissions {
    /// Target role.
    pub role_id: RoleId,
    /// New complete grant set.
    pub permission_codes: BTreeSet<PermissionCode>,
}

/// Application service for reading and replacing role grant sets.
#[derive(Clone)]
pub struct RolePermissionService {
    authorization_service: AuthorizationService,
    repository: Arc<dyn RolePermissionRepository>,
    audit_log_repository: Arc<dyn AuditLogRepository>,
}

impl RolePermissionService {
    /// Creates a new service from required dependencies.
    #[must_use]
    pub fn new(
        authorization_service: AuthorizationService,
        repository: Arc<dyn RolePermissionRepository>,
        audit_log_repository: Arc<dyn AuditLogRepository>,
    ) -> Self {
        Self {
            authorization_service,
            repository,
            audit_log_repository,
        }
    }

    /// Returns the catalog pages the matrix is built from.
    pub async fn catalog(&self, actor: &UserIdentity) -> AppResult<&'static [PageDefinition]> {
        self.require_view_permission(actor).await?;
        Ok(permission_pages())
    }

    /// Returns every role that can be administered.
    pub async fn list_roles(&self, actor: &UserIdentity) -> AppResult<Vec<Role>> {
        self.require_view_permission(actor).await?;
        self.repository.list_roles().await
    }

    /// Returns the stored grant set of a role.
    pub async fn role_permission_codes(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<BTreeSet<PermissionCode>> {
        self.require_view_permission(actor).await?;
        self.require_role(role_id).await?;
        self.stored_codes(role_id).await
    }

    /// Loads a role's grant set merged into matrix rows.
    pub async fn load_role_permissions(
        &self,
        actor: &UserIdentity,
        role_id: RoleId,
    ) -> AppResult<RolePermissionMatrix> {
        self.require_view_permission(actor).await?;
        let role = self.require_role(role_id).await?;
        let permission_codes = self.stored_codes(role_id).await?;
        let rows = merge_permissions_into_rows(permission_codes.iter().map(PermissionCode::as_str));

        Ok(RolePermissionMatrix {
            role,
            permission_codes,
            rows,
        })
    }

    /// Replaces a role's grant set with the one implied by the submitted rows.
    ///
    /// The write and its audit record are all-or-nothing. Pages left out of
    /// `rows` lose every grant.
    pub async fn save_role_permissions(
        &self,
        actor: &UserIdentity,
        input: SaveRolePermissionsInput,
    ) -> AppResult<SavedRolePermissions> {
        self.authorization_service
            .require_permission(actor.subject(), PERMISSIONS_PAGE, PermissionAction::Edit)
            .await?;

        validate_catalog_rows(&input.rows)?;
        let role = self.require_role(input.role_id).await?;
        let permission_codes = rows_to_permission_codes(&input.rows);

        let audit_event = AuditEvent {
            subject: actor.subject().to_owned(),
            action: AuditAction::RolePermissionsReplaced,
            resource_type: "rbac_role".to_owned(),
            resource_id: input.role_id.to_string(),
            detail: Some(format!(
                "replaced grants of role '{}' with {} permission codes",
                role.code().as_str(),
                permission_codes.len()
            )),
        };

        self.repository
            .replace_role_permission_codes(input.role_id, &permission_codes, audit_event)
            .await?;

        info!(
            subject = actor.subject(),
            role_id = %input.role_id,
            grant_count = permission_codes.len(),
            "replaced role permissions"
        );

        Ok(SavedRolePermissions {
            role_id: input.role_id,
            permission_codes,
        })
    }

    /// Returns recent audit entries for permission administrators.
    pub async fn list_audit_log(
        &self,
        actor: &UserIdentity,
        query: AuditLogQuery,
    ) -> AppResult<Vec<AuditLogEntry>> {
        self.require_view_permission(actor).await?;
        self.audit_log_repository.list_recent_entries(query).await
    }

    async fn require_view_permission(&self, actor: &UserIdentity) -> AppResult<()> {
        self.authorization_service
            .require_permission(actor.subject(), PERMISSIONS_PAGE, PermissionAction::View)
            .await
    }

    async fn require_role(&self, role_id: RoleId) -> AppResult<Role> {
        self.repository
            .find_role(role_id)
            .await?
            .ok_or_else(|| AppError::NotFound(format!("role '{role_id}' does not exist")))
    }

    async fn stored_codes(&self, role_id: RoleId) -> AppResult<BTreeSet<PermissionCode>> {
        Ok(self
            .repository
            .list_role_permission_codes(role_id)
            .await?
            .into_iter()
            .collect())
    }
}
