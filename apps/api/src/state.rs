use axum::http::HeaderName;
use rolegrid_application::{AuthorizationService, RolePermissionService};

/// Shared application state.
#[derive(Clone)]
pub struct AppState {
    pub authorization_service: AuthorizationService,
    pub role_permission_service: RolePermissionService,
    pub frontend_url: String,
    pub auth_subject_header: HeaderName,
}
