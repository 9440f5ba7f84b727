use std::collections::{BTreeSet, HashMap};
use std::path::Path;
use std::sync::Arc;

use async_trait::async_trait;
use rolegrid_application::{
    AuditEvent, AuditRepository, AuthorizationRepository, EnsureRoleInput, EnsuredRole,
    RolePermissionRepository, RoleProvisioningRepository,
};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionCode, Role, RoleId, RolePayload};
use serde::Deserialize;
use tokio::sync::RwLock;
use tracing::info;

use crate::InMemoryAuditRepository;

/// Seed document accepted by [`InMemoryRolePermissionRepository::from_seed_json`].
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RoleSeedDocument {
    /// Roles with their initial grants.
    #[serde(default)]
    pub roles: Vec<RoleSeedEntry>,
    /// Subject assignments referencing roles by code.
    #[serde(default)]
    pub assignments: Vec<SubjectRoleSeed>,
}

/// One seeded role.
#[derive(Debug, Clone, Deserialize)]
pub struct RoleSeedEntry {
    /// Role as an object or a one-element array.
    pub role: RolePayload,
    /// Granted permission codes, stored verbatim.
    #[serde(default)]
    pub permissions: Vec<String>,
}

/// One seeded subject assignment.
#[derive(Debug, Clone, Deserialize)]
pub struct SubjectRoleSeed {
    /// Subject identifier.
    pub subject: String,
    /// Code of the assigned role.
    pub role_code: String,
}

#[derive(Debug, Default)]
struct RoleStoreState {
    roles: HashMap<RoleId, Role>,
    grants: HashMap<RoleId, BTreeSet<PermissionCode>>,
    assignments: BTreeSet<(String, RoleId)>,
}

impl RoleStoreState {
    fn find_by_code(&self, code: &str) -> Option<&Role> {
        self.roles
            .values()
            .find(|role| role.code().as_str() == code)
    }

    fn insert_role(&mut self, role: Role, grants: BTreeSet<PermissionCode>) -> AppResult<()> {
        if self.find_by_code(role.code().as_str()).is_some() {
            return Err(AppError::Conflict(format!(
                "role '{}' already exists",
                role.code().as_str()
            )));
        }
        if self.roles.contains_key(&role.role_id()) {
            return Err(AppError::Conflict(format!(
                "role id '{}' already exists",
                role.role_id()
            )));
        }

        self.grants.insert(role.role_id(), grants);
        self.roles.insert(role.role_id(), role);
        Ok(())
    }
}

/// In-memory role store. Every write takes a single lock, so replacements are atomic.
///
/// Grant replacements are recorded in the store's own audit log while that lock is held.
#[derive(Debug, Default)]
pub struct InMemoryRolePermissionRepository {
    state: RwLock<RoleStoreState>,
    audit_log: Arc<InMemoryAuditRepository>,
}

impl InMemoryRolePermissionRepository {
    /// Creates an empty repository.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }

    /// Builds a repository from a seed document.
    pub fn from_seed(document: RoleSeedDocument) -> AppResult<Self> {
        let mut state = RoleStoreState::default();

        for entry in document.roles {
            let role = entry.role.into_role()?;
            let grants = entry
                .permissions
                .into_iter()
                .map(PermissionCode::from_stored)
                .collect();
            state.insert_role(role, grants).map_err(|error| match error {
                AppError::Conflict(detail) => AppError::Validation(detail),
                other => other,
            })?;
        }

        for assignment in document.assignments {
            let role_id = state
                .find_by_code(assignment.role_code.as_str())
                .map(Role::role_id)
                .ok_or_else(|| {
                    AppError::Validation(format!(
                        "assignment for '{}' references unknown role '{}'",
                        assignment.subject, assignment.role_code
                    ))
                })?;
            state.assignments.insert((assignment.subject, role_id));
        }

        info!(
            roles = state.roles.len(),
            assignments = state.assignments.len(),
            "loaded role seed"
        );

        Ok(Self {
            state: RwLock::new(state),
            audit_log: Arc::default(),
        })
    }

    /// Builds a repository from a JSON seed document.
    pub fn from_seed_json(raw: &str) -> AppResult<Self> {
        let document = serde_json::from_str::<RoleSeedDocument>(raw)
            .map_err(|error| AppError::Validation(format!("invalid role seed document: {error}")))?;
        Self::from_seed(document)
    }

    /// Returns the audit log that grant replacements are written to.
    #[must_use]
    pub fn audit_log(&self) -> Arc<InMemoryAuditRepository> {
        self.audit_log.clone()
    }

    /// Reads and parses a JSON seed file.
    pub async fn from_seed_file(path: &Path) -> AppResult<Self> {
        let raw = tokio::fs::read_to_string(path).await.map_err(|error| {
            AppError::Internal(format!(
                "failed to read role seed '{}': {error}",
                path.display()
            ))
        })?;
        Self::from_seed_json(raw.as_str())
    }
}

#[async_trait]
impl RolePermissionRepository for InMemoryRolePermissionRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let state = self.state.read().await;
        let mut roles: Vec<Role> = state.roles.values().cloned().collect();
        roles.sort_by(|left, right| {
            left.name()
                .cmp(right.name())
                .then_with(|| left.code().cmp(right.code()))
        });

        Ok(roles)
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self.state.read().await.roles.get(&role_id).cloned())
    }

    async fn list_role_permission_codes(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>> {
        Ok(self
            .state
            .read()
            .await
            .grants
            .get(&role_id)
            .map(|codes| codes.iter().cloned().collect())
            .unwrap_or_default())
    }

    async fn replace_role_permission_codes(
        &self,
        role_id: RoleId,
        permission_codes: &BTreeSet<PermissionCode>,
        audit_event: AuditEvent,
    ) -> AppResult<()> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        self.audit_log.append_event(audit_event).await?;
        state.grants.insert(role_id, permission_codes.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleProvisioningRepository for InMemoryRolePermissionRepository {
    async fn ensure_role(&self, input: EnsureRoleInput) -> AppResult<EnsuredRole> {
        let mut state = self.state.write().await;
        if let Some(role) = state.find_by_code(input.code.as_str()) {
            return Ok(EnsuredRole {
                role: role.clone(),
                created: false,
            });
        }

        let role = Role::new(
            RoleId::new(),
            input.code,
            input.name,
            input.description,
            input.is_system,
        )?;
        state.insert_role(role.clone(), input.initial_permission_codes)?;

        Ok(EnsuredRole {
            role,
            created: true,
        })
    }

    async fn assign_role_to_subject(&self, subject: &str, role_id: RoleId) -> AppResult<bool> {
        let mut state = self.state.write().await;
        if !state.roles.contains_key(&role_id) {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        Ok(state.assignments.insert((subject.to_owned(), role_id)))
    }
}

#[async_trait]
impl AuthorizationRepository for InMemoryRolePermissionRepository {
    async fn list_permission_codes_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<PermissionCode>> {
        let state = self.state.read().await;
        let codes: BTreeSet<PermissionCode> = state
            .assignments
            .iter()
            .filter(|(assigned_subject, _)| assigned_subject == subject)
            .filter_map(|(_, role_id)| state.grants.get(role_id))
            .flat_map(|codes| codes.iter().cloned())
            .collect();

        Ok(codes.into_iter().collect())
    }
}
