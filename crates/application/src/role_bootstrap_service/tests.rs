use std::sync::Arc;

use rolegrid_core::AppError;
use rolegrid_domain::{AuditAction, catalog_permission_codes};

use crate::{AuditEvent, RolePermissionRepository};
use crate::test_support::{FakeAuditRepository, FakeRoleStore, codes};

use super::{ADMINISTRATOR_ROLE_CODE, RoleBootstrapService};

fn bootstrap() -> (RoleBootstrapService, Arc<FakeRoleStore>, Arc<FakeAuditRepository>) {
    let store = Arc::new(FakeRoleStore::default());
    let audit = Arc::new(FakeAuditRepository::default());
    (
        RoleBootstrapService::new(store.clone(), audit.clone()),
        store,
        audit,
    )
}

#[tokio::test]
async fn first_run_creates_role_with_full_catalog() {
    let (service, store, audit) = bootstrap();

    let result = service.ensure_administrator("alice").await;
    assert!(result.is_ok());
    let Ok(result) = result else {
        return;
    };

    assert!(result.role_created);
    assert!(result.subject_assigned);
    assert!(result.role.is_system());
    assert_eq!(result.role.code().as_str(), ADMINISTRATOR_ROLE_CODE);
    assert_eq!(
        &store.stored_codes(result.role.role_id()).await,
        catalog_permission_codes()
    );

    let actions: Vec<AuditAction> = audit
        .events
        .lock()
        .await
        .iter()
        .map(|event| event.action)
        .collect();
    assert_eq!(
        actions,
        vec![AuditAction::RoleCreated, AuditAction::RoleAssigned]
    );
}

#[tokio::test]
async fn rerun_keeps_edited_grants() {
    let (service, store, _) = bootstrap();
    let first = service.ensure_administrator("alice").await;
    let Ok(first) = first else {
        panic!("first bootstrap should succeed");
    };

    let trimmed = codes(&["permissions:view", "permissions:edit"]);
    assert!(
        store
            .replace_role_permission_codes(
                first.role.role_id(),
                &trimmed,
                AuditEvent {
                    subject: "alice".to_owned(),
                    action: AuditAction::RolePermissionsReplaced,
                    resource_type: "rbac_role".to_owned(),
                    resource_id: first.role.role_id().to_string(),
                    detail: None,
                },
            )
            .await
            .is_ok()
    );

    let second = service.ensure_administrator("alice").await;
    assert!(matches!(
        &second,
        Ok(value) if !value.role_created && !value.subject_assigned
    ));
    assert_eq!(store.stored_codes(first.role.role_id()).await, trimmed);
}

#[tokio::test]
async fn blank_subject_is_rejected() {
    let (service, store, _) = bootstrap();

    let result = service.ensure_administrator("   ").await;
    assert!(matches!(result, Err(AppError::Validation(_))));
    assert!(store.roles.lock().await.is_empty());
}
