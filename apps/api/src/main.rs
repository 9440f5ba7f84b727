//! Rolegrid API composition root.

#![forbid(unsafe_code)]

mod api_config;
mod api_router;
mod api_services;
mod dto;
mod error;
mod handlers;
mod middleware;
mod state;

use rolegrid_application::RoleBootstrapService;
use rolegrid_core::AppError;
use rolegrid_infrastructure::InMemoryRolePermissionRepository;
use tracing::{info, warn};

use crate::api_config::{ApiConfig, StorageBackend, init_tracing};
use crate::api_services::{
    PortSet, build_app_state, connect_and_migrate, in_memory_ports, postgres_ports,
};

#[tokio::main]
async fn main() -> Result<(), AppError> {
    dotenvy::dotenv().ok();
    init_tracing();

    let config = ApiConfig::load()?;

    let ports: PortSet = match &config.storage {
        StorageBackend::Postgres { database_url } => {
            let pool = connect_and_migrate(database_url).await?;
            if config.migrate_only {
                info!("database migrations applied successfully");
                return Ok(());
            }
            postgres_ports(&pool)
        }
        StorageBackend::Memory { seed_path } => {
            let repository = match seed_path {
                Some(path) => InMemoryRolePermissionRepository::from_seed_file(path).await?,
                None => {
                    warn!("no ROLE_SEED_PATH configured, starting with an empty role store");
                    InMemoryRolePermissionRepository::new()
                }
            };
            in_memory_ports(repository)
        }
    };

    if let Some(subject) = config.bootstrap_admin_subject.as_deref() {
        let bootstrap = RoleBootstrapService::new(
            ports.role_provisioning_repository.clone(),
            ports.audit_repository.clone(),
        )
        .ensure_administrator(subject)
        .await?;
        info!(
            subject,
            role_created = bootstrap.role_created,
            subject_assigned = bootstrap.subject_assigned,
            "administrator role ensured"
        );
    }

    let app_state = build_app_state(
        ports,
        config.frontend_url.clone(),
        config.auth_subject_header.clone(),
    );
    let app = api_router::build_router(app_state, config.frontend_url.as_str())?;

    let address = config.socket_address()?;
    let listener = tokio::net::TcpListener::bind(address)
        .await
        .map_err(|error| AppError::Internal(format!("failed to bind API listener: {error}")))?;

    info!(%address, "rolegrid-api listening");

    axum::serve(listener, app)
        .await
        .map_err(|error| AppError::Internal(format!("API server failed: {error}")))
}
