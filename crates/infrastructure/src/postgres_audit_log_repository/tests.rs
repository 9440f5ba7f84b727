use rolegrid_application::{AuditEvent, AuditLogQuery, AuditLogRepository, AuditRepository};
use rolegrid_domain::AuditAction;
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresAuditLogRepository;
use crate::PostgresAuditRepository;

static MIGRATOR: Migrator = sqlx::migrate!("./migrations");

async fn test_pool() -> Option<PgPool> {
    let Ok(database_url) = std::env::var("DATABASE_URL") else {
        return None;
    };

    let pool = match PgPoolOptions::new()
        .max_connections(2)
        .connect(database_url.as_str())
        .await
    {
        Ok(pool) => pool,
        Err(error) => panic!("failed to connect to DATABASE_URL in test: {error}"),
    };

    if let Err(error) = MIGRATOR.run(&pool).await {
        panic!("failed to run migrations for postgres audit log tests: {error}");
    }

    Some(pool)
}

#[tokio::test]
async fn appended_events_are_listed_newest_first_with_filters() {
    let Some(pool) = test_pool().await else {
        return;
    };

    let writer = PostgresAuditRepository::new(pool.clone());
    let reader = PostgresAuditLogRepository::new(pool);
    let subject = format!("audit-{}", uuid::Uuid::new_v4());

    for (action, resource_id) in [
        (AuditAction::RoleAssigned, "first"),
        (AuditAction::RolePermissionsReplaced, "second"),
        (AuditAction::RolePermissionsReplaced, "third"),
    ] {
        let appended = writer
            .append_event(AuditEvent {
                subject: subject.clone(),
                action,
                resource_type: "rbac_role".to_owned(),
                resource_id: resource_id.to_owned(),
                detail: None,
            })
            .await;
        assert!(appended.is_ok());
        tokio::time::sleep(std::time::Duration::from_millis(5)).await;
    }

    let entries = reader
        .list_recent_entries(AuditLogQuery {
            limit: 10,
            offset: 0,
            action: Some(AuditAction::RolePermissionsReplaced),
            subject: Some(subject.clone()),
        })
        .await;
    assert!(entries.is_ok());
    let entries = entries.unwrap_or_default();

    let resource_ids: Vec<&str> = entries
        .iter()
        .map(|entry| entry.resource_id.as_str())
        .collect();
    assert_eq!(resource_ids, vec!["third", "second"]);
    assert!(
        entries
            .iter()
            .all(|entry| entry.action == "security.role_permissions.replaced")
    );
}
