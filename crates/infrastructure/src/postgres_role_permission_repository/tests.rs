use std::collections::BTreeSet;

use rolegrid_application::{
    AuditEvent, AuditLogQuery, AuditLogRepository, AuthorizationRepository, EnsureRoleInput,
    RolePermissionRepository, RoleProvisioningRepository,
};
use rolegrid_core::AppError;
use rolegrid_domain::{AuditAction, PermissionCode, RoleId};
use sqlx::PgPool;
use sqlx::migrate::Migrator;
use sqlx::postgres::PgPoolOptions;

use super::PostgresRolePermissionRepository;
use crate::{PostgresAuditLogRepository, PostgresAuthorizationRepository};

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
        panic!("failed to run migrations for postgres role permission tests: {error}");
    }

    Some(pool)
}

fn codes(values: &[&str]) -> BTreeSet<PermissionCode> {
    values
        .iter()
        .map(|value| PermissionCode::from_stored(*value))
        .collect()
}

fn role_input(code: &str, initial: &[&str]) -> EnsureRoleInput {
    EnsureRoleInput {
        code: code.to_owned(),
        name: format!("Role {code}"),
        description: None,
        is_system: false,
        initial_permission_codes: codes(initial),
    }
}

fn unique_code(prefix: &str) -> String {
    format!("{prefix}-{}", uuid::Uuid::new_v4())
}

fn replaced_event(role_id: RoleId, subject: &str, detail: Option<&str>) -> AuditEvent {
    AuditEvent {
        subject: subject.to_owned(),
        action: AuditAction::RolePermissionsReplaced,
        resource_type: "rbac_role".to_owned(),
        resource_id: role_id.to_string(),
        detail: detail.map(str::to_owned),
    }
}

#[tokio::test]
async fn ensure_role_grants_initial_codes_only_on_creation() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool);
    let code = unique_code("manager");

    let first = repository
        .ensure_role(role_input(&code, &["bulletins:view"]))
        .await;
    let Ok(first) = first else {
        panic!("role should be created");
    };
    assert!(first.created);

    let second = repository
        .ensure_role(role_input(&code, &["users:delete"]))
        .await;
    assert!(matches!(&second, Ok(value) if !value.created && value.role == first.role));

    let stored = repository
        .list_role_permission_codes(first.role.role_id())
        .await
        .unwrap_or_default();
    assert_eq!(stored, vec![PermissionCode::from_stored("bulletins:view")]);
}

#[tokio::test]
async fn replace_swaps_the_whole_grant_set() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool);
    let ensured = repository
        .ensure_role(role_input(
            &unique_code("clerk"),
            &["bulletins:view", "bulletins:edit"],
        ))
        .await;
    let Ok(ensured) = ensured else {
        panic!("role should be created");
    };
    let role_id = ensured.role.role_id();

    let replaced = repository
        .replace_role_permission_codes(
            role_id,
            &codes(&["users:view", "users:delete"]),
            replaced_event(role_id, "alice", None),
        )
        .await;
    assert!(replaced.is_ok());

    let stored = repository
        .list_role_permission_codes(role_id)
        .await
        .unwrap_or_default();
    assert_eq!(
        stored,
        vec![
            PermissionCode::from_stored("users:delete"),
            PermissionCode::from_stored("users:view"),
        ]
    );

    let cleared = repository
        .replace_role_permission_codes(
            role_id,
            &BTreeSet::new(),
            replaced_event(role_id, "alice", None),
        )
        .await;
    assert!(cleared.is_ok());
    assert!(
        repository
            .list_role_permission_codes(role_id)
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn replace_and_audit_commit_together() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool.clone());
    let audit_log = PostgresAuditLogRepository::new(pool);
    let ensured = repository
        .ensure_role(role_input(&unique_code("auditor"), &["bulletins:view"]))
        .await;
    let Ok(ensured) = ensured else {
        panic!("role should be created");
    };
    let role_id = ensured.role.role_id();
    let subject = unique_code("subject");

    let replaced = repository
        .replace_role_permission_codes(
            role_id,
            &codes(&["users:delete"]),
            replaced_event(role_id, &subject, Some("granted users:delete")),
        )
        .await;
    assert!(replaced.is_ok());

    let entries = audit_log
        .list_recent_entries(AuditLogQuery {
            subject: Some(subject),
            ..AuditLogQuery::default()
        })
        .await
        .unwrap_or_default();
    assert_eq!(entries.len(), 1);
    assert_eq!(entries[0].resource_id, role_id.to_string());
}

#[tokio::test]
async fn failed_audit_insert_rolls_back_the_grant_set() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool.clone());
    let audit_log = PostgresAuditLogRepository::new(pool);
    let ensured = repository
        .ensure_role(role_input(&unique_code("auditor"), &["bulletins:view"]))
        .await;
    let Ok(ensured) = ensured else {
        panic!("role should be created");
    };
    let role_id = ensured.role.role_id();
    let subject = unique_code("subject");

    // TEXT columns reject NUL bytes, so the audit insert fails after the grant rows are written.
    let result = repository
        .replace_role_permission_codes(
            role_id,
            &codes(&["users:delete"]),
            replaced_event(role_id, &subject, Some("granted\0users:delete")),
        )
        .await;
    assert!(matches!(result, Err(AppError::Internal(_))));

    let stored = repository
        .list_role_permission_codes(role_id)
        .await
        .unwrap_or_default();
    assert_eq!(stored, vec![PermissionCode::from_stored("bulletins:view")]);
    assert!(
        audit_log
            .list_recent_entries(AuditLogQuery {
                subject: Some(subject),
                ..AuditLogQuery::default()
            })
            .await
            .unwrap_or_default()
            .is_empty()
    );
}

#[tokio::test]
async fn replace_for_missing_role_is_not_found() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool);

    let result = repository
        .replace_role_permission_codes(
            RoleId::new(),
            &codes(&["users:view"]),
            replaced_event(RoleId::new(), "alice", None),
        )
        .await;
    assert!(matches!(result, Err(AppError::NotFound(_))));
}

#[tokio::test]
async fn assigned_subject_resolves_role_grants() {
    let Some(pool) = test_pool().await else {
        return;
    };
    let repository = PostgresRolePermissionRepository::new(pool.clone());
    let authorization = PostgresAuthorizationRepository::new(pool);
    let subject = unique_code("subject");

    let ensured = repository
        .ensure_role(role_input(
            &unique_code("viewer"),
            &["permissions:view", "roles:view"],
        ))
        .await;
    let Ok(ensured) = ensured else {
        panic!("role should be created");
    };

    let assigned = repository
        .assign_role_to_subject(&subject, ensured.role.role_id())
        .await;
    assert!(matches!(assigned, Ok(true)));
    let again = repository
        .assign_role_to_subject(&subject, ensured.role.role_id())
        .await;
    assert!(matches!(again, Ok(false)));

    let granted = authorization
        .list_permission_codes_for_subject(&subject)
        .await
        .unwrap_or_default();
    assert_eq!(
        granted,
        vec![
            PermissionCode::from_stored("permissions:view"),
            PermissionCode::from_stored("roles:view"),
        ]
    );

    let roles = repository.list_roles().await.unwrap_or_default();
    assert!(
        roles
            .iter()
            .any(|role| role.role_id() == ensured.role.role_id())
    );
}
