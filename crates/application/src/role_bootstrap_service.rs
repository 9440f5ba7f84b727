use std::sync::Arc;

use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{AuditAction, Role, catalog_permission_codes};
use tracing::info;

use crate::{AuditEvent, AuditRepository, EnsureRoleInput, RoleProvisioningRepository};

/// Code of the system role that holds the full catalog on creation.
pub const ADMINISTRATOR_ROLE_CODE: &str = "administrator";

const BOOTSTRAP_SUBJECT: &str = "system:bootstrap";

/// Outcome of [`RoleBootstrapService::ensure_administrator`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct AdministratorBootstrap {
    /// The administrator role.
    pub role: Role,
    /// Whether the role was created by this call.
    pub role_created: bool,
    /// Whether the subject received a new assignment.
    pub subject_assigned: bool,
}

/// Provisions the administrator role for a first operator.
#[derive(Clone)]
pub struct RoleBootstrapService {
    repository: Arc<dyn RoleProvisioningRepository>,
    audit_repository: Arc<dyn AuditRepository>,
}

impl RoleBootstrapService {
    /// Creates a new bootstrap service.
    #[must_use]
    pub fn new(
        repository: Arc<dyn RoleProvisioningRepository>,
        audit_repository: Arc<dyn AuditRepository>,
    ) -> Self {
        Self {
            repository,
            audit_repository,
        }
    }

    /// Ensures the administrator role exists and is assigned to `subject`.
    ///
    /// The full catalog is granted only when the role is created, so later edits survive restarts.
    pub async fn ensure_administrator(&self, subject: &str) -> AppResult<AdministratorBootstrap> {
        let subject = subject.trim();
        if subject.is_empty() {
            return Err(AppError::Validation(
                "bootstrap subject must not be empty".to_owned(),
            ));
        }

        let ensured = self
            .repository
            .ensure_role(EnsureRoleInput {
                code: ADMINISTRATOR_ROLE_CODE.to_owned(),
                name: "Administrator".to_owned(),
                description: Some("Full access to every dashboard page".to_owned()),
                is_system: true,
                initial_permission_codes: catalog_permission_codes().clone(),
            })
            .await?;
        let role_id = ensured.role.role_id();

        if ensured.created {
            info!(role_id = %role_id, "created administrator role");
            self.audit_repository
                .append_event(AuditEvent {
                    subject: BOOTSTRAP_SUBJECT.to_owned(),
                    action: AuditAction::RoleCreated,
                    resource_type: "rbac_role".to_owned(),
                    resource_id: role_id.to_string(),
                    detail: Some(format!(
                        "created role '{ADMINISTRATOR_ROLE_CODE}' with {} permission codes",
                        catalog_permission_codes().len()
                    )),
                })
                .await?;
        }

        let subject_assigned = self
            .repository
            .assign_role_to_subject(subject, role_id)
            .await?;

        if subject_assigned {
            info!(subject, role_id = %role_id, "assigned administrator role");
            self.audit_repository
                .append_event(AuditEvent {
                    subject: BOOTSTRAP_SUBJECT.to_owned(),
                    action: AuditAction::RoleAssigned,
                    resource_type: "rbac_subject_role".to_owned(),
                    resource_id: format!("{subject}:{ADMINISTRATOR_ROLE_CODE}"),
                    detail: Some(format!(
                        "assigned role '{ADMINISTRATOR_ROLE_CODE}' to '{subject}'"
                    )),
                })
                .await?;
        }

        Ok(AdministratorBootstrap {
            role: ensured.role,
            role_created: ensured.created,
            subject_assigned,
        })
    }
}

#[cfg(test)]
mod tests;
