use std::collections::{BTreeSet, HashMap};
use std::sync::Arc;
use std::sync::atomic::{AtomicBool, Ordering};

use async_trait::async_trait;
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionCode, Role, RoleId};
use tokio::sync::Mutex;

use crate::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
    AuthorizationRepository, EnsureRoleInput, EnsuredRole, RolePermissionRepository,
    RoleProvisioningRepository,
};

pub(crate) fn role(code: &str, name: &str) -> Role {
    match Role::new(RoleId::new(), code, name, None, false) {
        Ok(role) => role,
        Err(error) => panic!("test role should be valid: {error}"),
    }
}

pub(crate) fn codes(values: &[&str]) -> BTreeSet<PermissionCode> {
    values
        .iter()
        .map(|value| PermissionCode::from_stored(*value))
        .collect()
}

#[derive(Default)]
pub(crate) struct FakeAuthorizationRepository {
    grants: HashMap<String, Vec<PermissionCode>>,
}

impl FakeAuthorizationRepository {
    pub(crate) fn with_grants(subject: &str, permission_codes: &[&str]) -> Self {
        Self {
            grants: HashMap::from([(
                subject.to_owned(),
                permission_codes
                    .iter()
                    .map(|value| PermissionCode::from_stored(*value))
                    .collect(),
            )]),
        }
    }
}

#[async_trait]
impl AuthorizationRepository for FakeAuthorizationRepository {
    async fn list_permission_codes_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<PermissionCode>> {
        Ok(self.grants.get(subject).cloned().unwrap_or_default())
    }
}

#[derive(Default)]
pub(crate) struct FakeAuditRepository {
    pub(crate) events: Mutex<Vec<AuditEvent>>,
    fail_appends: AtomicBool,
}

impl FakeAuditRepository {
    pub(crate) fn fail_next_appends(&self, value: bool) {
        self.fail_appends.store(value, Ordering::SeqCst);
    }
}

#[async_trait]
impl AuditRepository for FakeAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        if self.fail_appends.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "failed to append audit event: disk full".to_owned(),
            ));
        }

        self.events.lock().await.push(event);
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for FakeAuditRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let events = self.events.lock().await;
        Ok(events
            .iter()
            .enumerate()
            .rev()
            .filter(|(_, event)| query.action.is_none_or(|action| action == event.action))
            .filter(|(_, event)| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| subject == event.subject)
            })
            .skip(query.offset)
            .take(query.limit)
            .map(|(index, event)| AuditLogEntry {
                event_id: index.to_string(),
                subject: event.subject.clone(),
                action: event.action.as_str().to_owned(),
                resource_type: event.resource_type.clone(),
                resource_id: event.resource_id.clone(),
                detail: event.detail.clone(),
                created_at: "2026-01-01T00:00:00Z".to_owned(),
            })
            .collect())
    }
}

#[derive(Default)]
pub(crate) struct FakeRoleStore {
    pub(crate) roles: Mutex<Vec<Role>>,
    pub(crate) grants: Mutex<HashMap<RoleId, BTreeSet<PermissionCode>>>,
    pub(crate) assignments: Mutex<Vec<(String, RoleId)>>,
    pub(crate) audit: Arc<FakeAuditRepository>,
    pub(crate) fail_writes: AtomicBool,
}

impl FakeRoleStore {
    pub(crate) fn with_role(mut self, role: Role, permission_codes: &[&str]) -> Self {
        self.grants
            .get_mut()
            .insert(role.role_id(), codes(permission_codes));
        self.roles.get_mut().push(role);
        self
    }

    pub(crate) fn fail_next_writes(&self, value: bool) {
        self.fail_writes.store(value, Ordering::SeqCst);
    }

    pub(crate) async fn stored_codes(&self, role_id: RoleId) -> BTreeSet<PermissionCode> {
        self.grants
            .lock()
            .await
            .get(&role_id)
            .cloned()
            .unwrap_or_default()
    }

    pub(crate) async fn delete_role(&self, role_id: RoleId) {
        self.roles
            .lock()
            .await
            .retain(|role| role.role_id() != role_id);
        self.grants.lock().await.remove(&role_id);
    }
}

#[async_trait]
impl RolePermissionRepository for FakeRoleStore {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        Ok(self.roles.lock().await.clone())
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        Ok(self
            .roles
            .lock()
            .await
            .iter()
            .find(|role| role.role_id() == role_id)
            .cloned())
    }

    async fn list_role_permission_codes(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>> {
        Ok(self.stored_codes(role_id).await.into_iter().collect())
    }

    async fn replace_role_permission_codes(
        &self,
        role_id: RoleId,
        permission_codes: &BTreeSet<PermissionCode>,
        audit_event: AuditEvent,
    ) -> AppResult<()> {
        if self.fail_writes.load(Ordering::SeqCst) {
            return Err(AppError::Internal(
                "failed to replace role permissions: connection reset".to_owned(),
            ));
        }

        if !self
            .roles
            .lock()
            .await
            .iter()
            .any(|role| role.role_id() == role_id)
        {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        let mut grants = self.grants.lock().await;
        self.audit.append_event(audit_event).await?;
        grants.insert(role_id, permission_codes.clone());
        Ok(())
    }
}

#[async_trait]
impl RoleProvisioningRepository for FakeRoleStore {
    async fn ensure_role(&self, input: EnsureRoleInput) -> AppResult<EnsuredRole> {
        let mut roles = self.roles.lock().await;
        if let Some(role) = roles.iter().find(|role| role.code().as_str() == input.code) {
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
        roles.push(role.clone());
        self.grants
            .lock()
            .await
            .insert(role.role_id(), input.initial_permission_codes);

        Ok(EnsuredRole {
            role,
            created: true,
        })
    }

    async fn assign_role_to_subject(&self, subject: &str, role_id: RoleId) -> AppResult<bool> {
        let mut assignments = self.assignments.lock().await;
        if assignments
            .iter()
            .any(|(existing, existing_role)| existing == subject && *existing_role == role_id)
        {
            return Ok(false);
        }

        assignments.push((subject.to_owned(), role_id));
        Ok(true)
    }
}
