use async_trait::async_trait;
use sqlx::PgPool;

use rolegrid_application::AuthorizationRepository;
use rolegrid_core::{AppError, AppResult};
use rolegrid_domain::PermissionCode;

/// PostgreSQL-backed repository resolving a subject's effective grants.
#[derive(Clone)]
pub struct PostgresAuthorizationRepository {
    pool: PgPool,
}

impl PostgresAuthorizationRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuthorizationRepository for PostgresAuthorizationRepository {
    async fn list_permission_codes_for_subject(
        &self,
        subject: &str,
    ) -> AppResult<Vec<PermissionCode>> {
        let codes = sqlx::query_scalar::<_, String>(
            r#"
            SELECT DISTINCT grants.permission_code
            FROM subject_roles
            INNER JOIN role_permissions AS grants
                ON grants.role_id = subject_roles.role_id
            WHERE subject_roles.subject = $1
            ORDER BY grants.permission_code
            "#,
        )
        .bind(subject)
        .fetch_all(&self.pool)
        .await
        .map_err(|error| AppError::Internal(format!("failed to load permissions: {error}")))?;

        Ok(codes.into_iter().map(PermissionCode::from_stored).collect())
    }
}
