use std::str::FromStr;

use rolegrid_core::AppError;
use serde::{Deserialize, Serialize};

/// Audit action kinds emitted by permission administration.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum AuditAction {
    /// Emitted when a role's grant set is replaced as a whole.
    RolePermissionsReplaced,
    /// Emitted when a role is created during bootstrap.
    RoleCreated,
    /// Emitted when a role is assigned to a subject.
    RoleAssigned,
}

impl AuditAction {
    /// Returns a stable storage value for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::RolePermissionsReplaced => "security.role_permissions.replaced",
            Self::RoleCreated => "security.role.created",
            Self::RoleAssigned => "security.role.assigned",
        }
    }
}

impl FromStr for AuditAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "security.role_permissions.replaced" => Ok(Self::RolePermissionsReplaced),
            "security.role.created" => Ok(Self::RoleCreated),
            "security.role.assigned" => Ok(Self::RoleAssigned),
            _ => Err(AppError::Validation(format!(
                "unknown audit action '{value}'"
            ))),
        }
    }
}

#[cfg(test)]
mod tests {
    use std::str::FromStr;

    use super::AuditAction;

    #[test]
    fn audit_action_roundtrip_storage_value() {
        let action = AuditAction::RolePermissionsReplaced;
        let restored = AuditAction::from_str(action.as_str());
        assert!(matches!(restored, Ok(AuditAction::RolePermissionsReplaced)));
    }

    #[test]
    fn unknown_audit_action_is_rejected() {
        assert!(AuditAction::from_str("security.role.deleted").is_err());
    }
}
