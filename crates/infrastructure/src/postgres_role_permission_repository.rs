use std::collections::BTreeSet;

use async_trait::async_trait;
use sqlx::{FromRow, PgPool, Postgres, Transaction};
use uuid::Uuid;

use rolegrid_application::{
    AuditEvent, EnsureRoleInput, EnsuredRole, RolePermissionRepository,
    RoleProvisioningRepository,
};
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::{PermissionCode, Role, RoleId};

use crate::postgres_audit_repository::insert_audit_event;

/// PostgreSQL-backed repository for roles and their grant sets.
#[derive(Clone)]
pub struct PostgresRolePermissionRepository {
    pool: PgPool,
}

impl PostgresRolePermissionRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[derive(Debug, FromRow)]
struct RoleRow {
    id: Uuid,
    code: String,
    name: String,
    description: Option<String>,
    is_system: bool,
}

impl RoleRow {
    fn into_role(self) -> AppResult<Role> {
        let id = self.id;
        Role::new(
            RoleId::from_uuid(id),
            self.code,
            self.name,
            self.description,
            self.is_system,
        )
        .map_err(|error| AppError::Internal(format!("failed to decode role '{id}': {error}")))
    }
}

#[async_trait]
impl RolePermissionRepository for PostgresRolePermissionRepository {
    async fn list_roles(&self) -> AppResult<Vec<Role>> {
        let rows = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, name, description, is_system
            FROM roles
            ORDER BY name, code
            "#,
        )
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to list roles: {error}")))?;

        rows.into_iter().map(RoleRow::into_role).collect()
    }

    async fn find_role(&self, role_id: RoleId) -> AppResult<Option<Role>> {
        sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, name, description, is_system
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to find role '{role_id}': {error}")))?
        .map(RoleRow::into_role)
        .transpose()
    }

    async fn list_role_permission_codes(&self, role_id: RoleId) -> AppResult<Vec<PermissionCode>> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT permission_code
            FROM role_permissions
            WHERE role_id = $1
            ORDER BY permission_code
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_all(&self.pool)
        .await
        .map_err(|error| {
            AppError::Internal(format!(
                "failed to load permissions of role '{role_id}': {error}"
            ))
        })?;

        Ok(codes.into_iter().map(PermissionCode::from_stored).collect())
    }

    async fn replace_role_permission_codes(
        &self,
        role_id: RoleId,
        permission_codes: &BTreeSet<PermissionCode>,
        audit_event: AuditEvent,
    ) -> AppResult<()> {
        let mut transaction = self.begin().await?;

        let locked = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE id = $1
            FOR UPDATE
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to lock role '{role_id}': {error}")))?;

        if locked.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        sqlx::query(
            r#"
            DELETE FROM role_permissions
            WHERE role_id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| {
            AppError::Internal(format!("failed to clear role permissions: {error}"))
        })?;

        insert_permission_codes(&mut transaction, role_id.as_uuid(), permission_codes).await?;
        insert_audit_event(&mut *transaction, &audit_event).await?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })
    }
}

#[async_trait]
impl RoleProvisioningRepository for PostgresRolePermissionRepository {
    async fn ensure_role(&self, input: EnsureRoleInput) -> AppResult<EnsuredRole> {
        let candidate = Role::new(
            RoleId::new(),
            input.code,
            input.name,
            input.description,
            input.is_system,
        )?;
        let mut transaction = self.begin().await?;

        let inserted = sqlx::query_scalar::<_, Uuid>(
            r#"
            INSERT INTO roles (id, code, name, description, is_system)
            VALUES ($1, $2, $3, $4, $5)
            ON CONFLICT (code) DO NOTHING
            RETURNING id
            "#,
        )
        .bind(candidate.role_id().as_uuid())
        .bind(candidate.code().as_str())
        .bind(candidate.name().as_str())
        .bind(candidate.description())
        .bind(candidate.is_system())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to create role: {error}")))?;

        let created = inserted.is_some();
        if let Some(role_id) = inserted {
            insert_permission_codes(&mut transaction, role_id, &input.initial_permission_codes)
                .await?;
        }

        let role = sqlx::query_as::<_, RoleRow>(
            r#"
            SELECT id, code, name, description, is_system
            FROM roles
            WHERE code = $1
            "#,
        )
        .bind(candidate.code().as_str())
        .fetch_one(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?
        .into_role()?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(EnsuredRole { role, created })
    }

    async fn assign_role_to_subject(&self, subject: &str, role_id: RoleId) -> AppResult<bool> {
        let mut transaction = self.begin().await?;

        let exists = sqlx::query_scalar::<_, Uuid>(
            r#"
            SELECT id
            FROM roles
            WHERE id = $1
            "#,
        )
        .bind(role_id.as_uuid())
        .fetch_optional(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to resolve role: {error}")))?;

        if exists.is_none() {
            return Err(AppError::NotFound(format!("role '{role_id}' does not exist")));
        }

        let result = sqlx::query(
            r#"
            INSERT INTO subject_roles (subject, role_id)
            VALUES ($1, $2)
            ON CONFLICT (subject, role_id) DO NOTHING
            "#,
        )
        .bind(subject)
        .bind(role_id.as_uuid())
        .execute(&mut *transaction)
        .await
        .map_err(|error| AppError::Internal(format!("failed to assign role: {error}")))?;

        transaction.commit().await.map_err(|error| {
            AppError::Internal(format!("failed to commit transaction: {error}"))
        })?;

        Ok(result.rows_affected() > 0)
    }
}

impl PostgresRolePermissionRepository {
    async fn begin(&self) -> AppResult<Transaction<'static, Postgres>> {
        self.pool
            .begin()
            .await
            .map_err(|error| AppError::Internal(format!("failed to begin transaction: {error}")))
    }
}

async fn insert_permission_codes(
    transaction: &mut Transaction<'static, Postgres>,
    role_id: Uuid,
    permission_codes: &BTreeSet<PermissionCode>,
) -> AppResult<()> {
    if permission_codes.is_empty() {
        return Ok(());
    }

    let codes: Vec<String> = permission_codes
        .iter()
        .map(|code| code.as_str().to_owned())
        .collect();

    sqlx::query(
        r#"
        INSERT INTO role_permissions (role_id, permission_code)
        SELECT $1, code
        FROM UNNEST($2::TEXT[]) AS code
        "#,
    )
    .bind(role_id)
    .bind(codes)
    .execute(&mut **transaction)
    .await
    .map_err(|error| AppError::Internal(format!("failed to persist role permissions: {error}")))?;

    Ok(())
}

#[cfg(test)]
mod tests;
