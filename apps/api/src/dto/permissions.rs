use rolegrid_application::{AuditLogEntry, RolePermissionMatrix, SavedRolePermissions};
use rolegrid_domain::{PageDefinition, PermissionAction, PermissionFormRow, Role};
use serde::{Deserialize, Serialize};
use ts_rs::TS;

/// One catalog page with the codes it can grant.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/page-definition-response.ts"
)]
pub struct PageDefinitionResponse {
    pub page_code: String,
    pub page_name: String,
    pub page_description: Option<String>,
    pub permission_codes: Vec<String>,
}

/// Static permission catalog.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-catalog-response.ts"
)]
pub struct PermissionCatalogResponse {
    pub actions: Vec<String>,
    pub pages: Vec<PageDefinitionResponse>,
}

/// API representation of a role.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-response.ts"
)]
pub struct RoleResponse {
    pub role_id: String,
    pub code: String,
    pub name: String,
    pub description: Option<String>,
    pub is_system: bool,
}

/// One matrix row, used both for loading and saving.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/permission-form-row.ts"
)]
pub struct PermissionFormRowDto {
    pub page_code: String,
    #[serde(default)]
    pub page_name: String,
    #[serde(default)]
    pub page_description: Option<String>,
    pub can_view: bool,
    pub can_create: bool,
    pub can_edit: bool,
    pub can_delete: bool,
}

/// A role's stored grants merged into matrix rows.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/role-permissions-response.ts"
)]
pub struct RolePermissionsResponse {
    pub role: RoleResponse,
    pub permission_codes: Vec<String>,
    pub rows: Vec<PermissionFormRowDto>,
}

/// Incoming payload replacing a role's grant set.
#[derive(Debug, Deserialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/save-role-permissions-request.ts"
)]
pub struct SaveRolePermissionsRequest {
    pub rows: Vec<PermissionFormRowDto>,
}

/// Grant set written by a save.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/saved-role-permissions-response.ts"
)]
pub struct SavedRolePermissionsResponse {
    pub role_id: String,
    pub permission_codes: Vec<String>,
}

/// API representation of an audit log entry.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/audit-log-entry-response.ts"
)]
pub struct AuditLogEntryResponse {
    pub event_id: String,
    pub subject: String,
    pub action: String,
    pub resource_type: String,
    pub resource_id: String,
    pub detail: Option<String>,
    pub created_at: String,
}

impl From<&PageDefinition> for PageDefinitionResponse {
    fn from(value: &PageDefinition) -> Self {
        Self {
            page_code: value.page_code().to_owned(),
            page_name: value.page_name().to_owned(),
            page_description: value.page_description().map(str::to_owned),
            permission_codes: PermissionAction::all()
                .iter()
                .map(|action| value.permission_code(*action).into())
                .collect(),
        }
    }
}

impl PermissionCatalogResponse {
    pub fn from_pages(pages: &[PageDefinition]) -> Self {
        Self {
            actions: PermissionAction::all()
                .iter()
                .map(|action| action.as_str().to_owned())
                .collect(),
            pages: pages.iter().map(PageDefinitionResponse::from).collect(),
        }
    }
}

impl From<Role> for RoleResponse {
    fn from(value: Role) -> Self {
        Self {
            role_id: value.role_id().to_string(),
            code: value.code().as_str().to_owned(),
            name: value.name().as_str().to_owned(),
            description: value.description().map(str::to_owned),
            is_system: value.is_system(),
        }
    }
}

impl From<PermissionFormRow> for PermissionFormRowDto {
    fn from(value: PermissionFormRow) -> Self {
        Self {
            page_code: value.page_code,
            page_name: value.page_name,
            page_description: value.page_description,
            can_view: value.can_view,
            can_create: value.can_create,
            can_edit: value.can_edit,
            can_delete: value.can_delete,
        }
    }
}

impl From<PermissionFormRowDto> for PermissionFormRow {
    fn from(value: PermissionFormRowDto) -> Self {
        Self {
            page_code: value.page_code,
            page_name: value.page_name,
            page_description: value.page_description,
            can_view: value.can_view,
            can_create: value.can_create,
            can_edit: value.can_edit,
            can_delete: value.can_delete,
        }
    }
}

impl From<RolePermissionMatrix> for RolePermissionsResponse {
    fn from(value: RolePermissionMatrix) -> Self {
        Self {
            role: RoleResponse::from(value.role),
            permission_codes: value
                .permission_codes
                .into_iter()
                .map(String::from)
                .collect(),
            rows: value
                .rows
                .into_iter()
                .map(PermissionFormRowDto::from)
                .collect(),
        }
    }
}

impl From<SavedRolePermissions> for SavedRolePermissionsResponse {
    fn from(value: SavedRolePermissions) -> Self {
        Self {
            role_id: value.role_id.to_string(),
            permission_codes: value
                .permission_codes
                .into_iter()
                .map(String::from)
                .collect(),
        }
    }
}

impl From<AuditLogEntry> for AuditLogEntryResponse {
    fn from(value: AuditLogEntry) -> Self {
        Self {
            event_id: value.event_id,
            subject: value.subject,
            action: value.action,
            resource_type: value.resource_type,
            resource_id: value.resource_id,
            detail: value.detail,
            created_at: value.created_at,
        }
    }
}
