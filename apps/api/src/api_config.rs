use std::env;
use std::net::{IpAddr, SocketAddr};
use std::path::PathBuf;
use std::str::FromStr;

use axum::http::HeaderName;
use rolegrid_core::AppError;
use tracing_subscriber::EnvFilter;

const DEFAULT_FRONTEND_URL: &str = "http://localhost:3000";
const DEFAULT_API_HOST: &str = "127.0.0.1";
const DEFAULT_API_PORT: u16 = 3001;
const DEFAULT_AUTH_SUBJECT_HEADER: &str = "x-auth-subject";

/// Where roles and grant sets are stored.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StorageBackend {
    Postgres { database_url: String },
    Memory { seed_path: Option<PathBuf> },
}

#[derive(Debug, Clone)]
pub struct ApiConfig {
    pub migrate_only: bool,
    pub storage: StorageBackend,
    pub frontend_url: String,
    pub api_host: String,
    pub api_port: u16,
    pub auth_subject_header: HeaderName,
    pub bootstrap_admin_subject: Option<String>,
}

impl ApiConfig {
    pub fn load() -> Result<Self, AppError> {
        Self::from_lookup(env::args().nth(1).as_deref(), |name| env::var(name).ok())
    }

    /// Parses configuration from the first CLI argument and a variable lookup.
    pub fn from_lookup(
        command: Option<&str>,
        lookup: impl Fn(&str) -> Option<String>,
    ) -> Result<Self, AppError> {
        let migrate_only = command == Some("migrate");
        let optional = |name: &str| lookup(name).filter(|value| !value.trim().is_empty());

        let storage = match optional("STORAGE_BACKEND")
            .unwrap_or_else(|| "postgres".to_owned())
            .as_str()
        {
            "postgres" => StorageBackend::Postgres {
                database_url: optional("DATABASE_URL").ok_or_else(|| {
                    AppError::Validation("DATABASE_URL is required".to_owned())
                })?,
            },
            "memory" => StorageBackend::Memory {
                seed_path: optional("ROLE_SEED_PATH").map(PathBuf::from),
            },
            other => {
                return Err(AppError::Validation(format!(
                    "STORAGE_BACKEND must be either 'postgres' or 'memory', got '{other}'"
                )));
            }
        };

        if migrate_only && !matches!(storage, StorageBackend::Postgres { .. }) {
            return Err(AppError::Validation(
                "the migrate command requires STORAGE_BACKEND=postgres".to_owned(),
            ));
        }

        let api_port = match optional("API_PORT") {
            Some(value) => value
                .parse::<u16>()
                .map_err(|error| AppError::Validation(format!("invalid API_PORT: {error}")))?,
            None => DEFAULT_API_PORT,
        };

        let auth_subject_header = optional("AUTH_SUBJECT_HEADER")
            .unwrap_or_else(|| DEFAULT_AUTH_SUBJECT_HEADER.to_owned());
        let auth_subject_header =
            HeaderName::from_str(auth_subject_header.trim()).map_err(|error| {
                AppError::Validation(format!(
                    "invalid AUTH_SUBJECT_HEADER '{auth_subject_header}': {error}"
                ))
            })?;

        Ok(Self {
            migrate_only,
            storage,
            frontend_url: optional("FRONTEND_URL")
                .unwrap_or_else(|| DEFAULT_FRONTEND_URL.to_owned()),
            api_host: optional("API_HOST").unwrap_or_else(|| DEFAULT_API_HOST.to_owned()),
            api_port,
            auth_subject_header,
            bootstrap_admin_subject: optional("BOOTSTRAP_ADMIN_SUBJECT")
                .map(|value| value.trim().to_owned()),
        })
    }

    pub fn socket_address(&self) -> Result<SocketAddr, AppError> {
        let host = IpAddr::from_str(&self.api_host).map_err(|error| {
            AppError::Internal(format!("invalid API_HOST '{}': {error}", self.api_host))
        })?;
        Ok(SocketAddr::from((host, self.api_port)))
    }
}

pub fn init_tracing() {
    let env_filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(env_filter)
        .with_target(false)
        .compact()
        .init();
}
