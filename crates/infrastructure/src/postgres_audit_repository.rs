use async_trait::async_trait;
use sqlx::{PgExecutor, PgPool};

use rolegrid_application::{AuditEvent, AuditRepository};
use rolegrid_core::{AppError, AppResult};

/// PostgreSQL-backed append-only audit repository.
#[derive(Clone)]
pub struct PostgresAuditRepository {
    pool: PgPool,
}

impl PostgresAuditRepository {
    /// Creates a repository with the provided connection pool.
    #[must_use]
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }
}

#[async_trait]
impl AuditRepository for PostgresAuditRepository {
    async fn append_event(&self, event: AuditEvent) -> AppResult<()> {
        insert_audit_event(&self.pool, &event).await
    }
}

/// Writes one audit row through any executor, so callers can join an open transaction.
pub(crate) async fn insert_audit_event<'e, E>(executor: E, event: &AuditEvent) -> AppResult<()>
where
    E: PgExecutor<'e>,
{
    sqlx::query(
        r#"
        INSERT INTO audit_log_entries (subject, action, resource_type, resource_id, detail)
        VALUES ($1, $2, $3, $4, $5)
        "#,
    )
    .bind(event.subject.as_str())
    .bind(event.action.as_str())
    .bind(event.resource_type.as_str())
    .bind(event.resource_id.as_str())
    .bind(event.detail.as_deref())
    .execute(executor)
    .await
    .map_err(|error| {
        AppError::Internal(format!(
            "failed to record audit event '{}': {error}",
            event.action.as_str()
        ))
    })?;

    Ok(())
}
