use std::collections::BTreeSet;
use std::sync::Arc;

use async_trait::async_trait;
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionAction, PermissionCode, to_permission_code};

/// Repository port for permission lookups.
#[async_trait]
pub trait AuthorizationRepository: Send + Sync {
    /// Lists the union of grant sets over every role assigned to the subject.
    async fn list_permission_codes_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<PermissionCode>>;
}

/// Application service for page-level authorization checks.
#[derive(Clone)]
pub struct AuthorizationService {
    repository: Arc<dyn AuthorizationRepository>,
}

impl AuthorizationService {
    /// Creates a new authorization service from a repository implementation.
    #[must_use]
    pub fn new(repository: Arc<dyn AuthorizationRepository>) -> Self {
        Self { repository }
    }

    /// Ensures a subject holds `<page_code>:<action>`.
    pub async fn require_permission(
        &self,
        subject: &str,
        page_code: &str,
        action: PermissionAction,
    ) -> AppResult<()> {
        if self.has_permission(subject, page_code, action).await? {
            return Ok(());
        }

        Err(AppError::Forbidden(format!(
            "subject '{subject}' is missing permission '{}'",
            to_permission_code(page_code, action)
        )))
    }

    /// Returns whether the subject currently holds `<page_code>:<action>`.
    pub async fn has_permission(
        &self,
        subject: &str,
        page_code: &str,
        action: PermissionAction,
    ) -> AppResult<bool> {
        let required = to_permission_code(page_code, action);
        let permissions = self
            .repository
            .list_permission_codes_for_subject(subject)
            .await?;

        Ok(permissions.iter().any(|value| value == &required))
    }

    /// Returns the effective catalog codes held by a subject.
    pub async fn effective_permission_codes(
        &self,
        subject: &str,
    ) -> AppResult<BTreeSet<PermissionCode>> {
        let permissions = self
            .repository
            .list_permission_codes_for_subject(subject)
            .await?;

        Ok(permissions
            .into_iter()
            .filter(PermissionCode::is_catalog_code)
            .collect())
    }
}
