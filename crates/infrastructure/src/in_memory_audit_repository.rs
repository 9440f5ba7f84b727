use async_trait::async_trait;
use chrono::{DateTime, SecondsFormat, Utc};
use rolegrid_application::{
    AuditEvent, AuditLogEntry, AuditLogQuery, AuditLogRepository, AuditRepository,
};
use rolegrid_core::AppResult;
use tokio::sync::RwLock;
use uuid::Uuid;

use crate::postgres_audit_log_repository::{MAX_OFFSET, MAX_PAGE_SIZE};

#[derive(Debug, Clone)]
struct StoredAuditEvent {
    event_id: Uuid,
    event: AuditEvent,
    created_at: DateTime<Utc>,
}

/// In-memory append-only audit log.
#[derive(Debug, Default)]
pub struct InMemoryAuditRepository {
    events: RwLock<Vec<StoredAuditEvent>>,
}

impl InMemoryAuditRepository {
    /// Creates an empty audit log.
    #[must_use]
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl AuditRepository for InMemoryAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        self.events.write().await.push(StoredAuditEvent {
            event_id: Uuid::new_v4(),
            event,
            created_at: Utc::now(),
        });
        Ok(())
    }
}

#[async_trait]
impl AuditLogRepository for InMemoryAuditRepository {
    async fn list_recent_entries(&self, query: AuditLogQuery) -> AppResult<Vec<AuditLogEntry>> {
        let capped_limit = query.limit.clamp(1, MAX_PAGE_SIZE);
        let capped_offset = query.offset.min(MAX_OFFSET);
        let events = self.events.read().await;

        Ok(events
            .iter()
            .rev()
            .filter(|stored| {
                query
                    .action
                    .is_none_or(|action| action == stored.event.action)
            })
            .filter(|stored| {
                query
                    .subject
                    .as_deref()
                    .is_none_or(|subject| subject == stored.event.subject)
            })
            .skip(capped_offset)
            .take(capped_limit)
            .map(|stored| AuditLogEntry {
                event_id: stored.event_id.to_string(),
                subject: stored.event.subject.clone(),
                action: stored.event.action.as_str().to_owned(),
                resource_type: stored.event.resource_type.clone(),
                resource_id: stored.event.resource_id.clone(),
                detail: stored.event.detail.clone(),
                created_at: stored
                    .created_at
                    .to_rfc3339_opts(SecondsFormat::Secs, true),
            })
            .collect())
    }
}

#[cfg(test)]
mod tests {
    use rolegrid_application::{AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository};
    use rolegrid_domain::AuditAction;

    use super::InMemoryAuditRepository;

    fn event(subject: &str, action: AuditAction) -> AuditEvent {
        AuditEvent {
            subject: subject.to_owned(),
            action,
            resource_type: "rbac_role".to_owned(),
            resource_id: "role-1".to_owned(),
            detail: None,
        }
    }

    #[tokio::test]
    async fn list_filters_and_pages_newest_first() {
        let repository = InMemoryAuditRepository::new();
        for (subject, action) in [
            ("alice", AuditAction::RolePermissionsReplaced),
            ("bob", AuditAction::RolePermissionsReplaced),
            ("alice", AuditAction::RoleAssigned),
            ("alice", AuditAction::RolePermissionsReplaced),
        ] {
            assert!(repository.append_event(event(subject, action)).await.is_ok());
        }

        let entries = repository
            .list_recent_entries(AuditLogQuery {
                limit: 5,
                offset: 0,
                action: Some(AuditAction::RolePermissionsReplaced),
                subject: Some("alice".to_owned()),
            })
            .await
            .unwrap_or_default();
        assert_eq!(entries.len(), 2);
        assert!(entries.iter().all(|entry| entry.subject == "alice"));

        let second_page = repository
            .list_recent_entries(AuditLogQuery {
                limit: 1,
                offset: 1,
                ..AuditLogQuery::default()
            })
            .await
            .unwrap_or_default();
        assert_eq!(second_page.len(), 1);
        assert_eq!(second_page[0].action, "security.role.assigned");
    }

    #[tokio::test]
    async fn paging_applies_shared_caps() {
        let repository = InMemoryAuditRepository::new();
        for _ in 0..205 {
            assert!(
                repository
                    .append_event(event("alice", AuditAction::RolePermissionsReplaced))
                    .await
                    .is_ok()
            );
        }

        let empty_limit = repository
            .list_recent_entries(AuditLogQuery {
                limit: 0,
                ..AuditLogQuery::default()
            })
            .await
            .unwrap_or_default();
        assert_eq!(empty_limit.len(), 1);

        let oversized = repository
            .list_recent_entries(AuditLogQuery {
                limit: 1_000,
                ..AuditLogQuery::default()
            })
            .await
            .unwrap_or_default();
        assert_eq!(oversized.len(), 200);

        let far_offset = repository
            .list_recent_entries(AuditLogQuery {
                limit: 10,
                offset: 1_000_000,
                ..AuditLogQuery::default()
            })
            .await
            .unwrap_or_default();
        assert!(far_offset.is_empty());
    }
}
