use rolegrid_core::UserIdentity;
use serde::Serialize;
use ts_rs::TS;

pub mod permissions;

pub use permissions::{
    AuditLogEntryResponse, PageDefinitionResponse, PermissionCatalogResponse,
    PermissionFormRowDto, RolePermissionsResponse, RoleResponse, SaveRolePermissionsRequest,
    SavedRolePermissionsResponse,
};

/// Health response payload.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/health-response.ts"
)]
pub struct HealthResponse {
    pub status: &'static str,
}

/// Current operator identity and effective grants.
#[derive(Debug, Serialize, TS)]
#[ts(
    export,
    export_to = "../../../packages/api-types/src/generated/user-identity-response.ts"
)]
pub struct UserIdentityResponse {
    pub subject: String,
    pub display_name: String,
    pub email: Option<String>,
    pub permissions: Vec<String>,
}

impl UserIdentityResponse {
    pub fn new(identity: &UserIdentity, permissions: Vec<String>) -> Self {
        Self {
            subject: identity.subject().to_owned(),
            display_name: identity.display_name().to_owned(),
            email: identity.email().map(str::to_owned),
            permissions,
        }
    }
}
