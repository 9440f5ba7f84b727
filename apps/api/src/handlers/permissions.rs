use std::str::FromStr;

use axum::Json;
use axum::extract::{Extension, Path, Query, State};
use rolegrid_application::SaveRolePermissionsInput;
use rolegrid_core::UserIdentity;
use rolegrid_domain::{AuditAction, RoleId};
use serde::Deserialize;

use crate::dto::{
    AuditLogEntryResponse, PermissionCatalogResponse, RolePermissionsResponse, RoleResponse,
    SaveRolePermissionsRequest, SavedRolePermissionsResponse,
};
use crate::error::ApiResult;
use crate::state::AppState;

#[derive(Debug, Default, Deserialize)]
pub struct AuditLogQuery {
    pub limit: Option<usize>,
    pub offset: Option<usize>,
    pub action: Option<String>,
    pub subject: Option<String>,
}

pub async fn catalog_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<PermissionCatalogResponse>> {
    let pages = state.role_permission_service.catalog(&user).await?;

    Ok(Json(PermissionCatalogResponse::from_pages(pages)))
}

pub async fn list_roles_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
) -> ApiResult<Json<Vec<RoleResponse>>> {
    let roles = state
        .role_permission_service
        .list_roles(&user)
        .await?
        .into_iter()
        .map(RoleResponse::from)
        .collect();

    Ok(Json(roles))
}

pub async fn role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
) -> ApiResult<Json<RolePermissionsResponse>> {
    let role_id = RoleId::from_str(role_id.as_str())?;
    let matrix = state
        .role_permission_service
        .load_role_permissions(&user, role_id)
        .await?;

    Ok(Json(RolePermissionsResponse::from(matrix)))
}

pub async fn save_role_permissions_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Path(role_id): Path<String>,
    Json(payload): Json<SaveRolePermissionsRequest>,
) -> ApiResult<Json<SavedRolePermissionsResponse>> {
    let role_id = RoleId::from_str(role_id.as_str())?;
    let saved = state
        .role_permission_service
        .save_role_permissions(
            &user,
            SaveRolePermissionsInput {
                role_id,
                rows: payload.rows.into_iter().map(Into::into).collect(),
            },
        )
        .await?;

    Ok(Json(SavedRolePermissionsResponse::from(saved)))
}

pub async fn list_audit_log_handler(
    State(state): State<AppState>,
    Extension(user): Extension<UserIdentity>,
    Query(query): Query<AuditLogQuery>,
) -> ApiResult<Json<Vec<AuditLogEntryResponse>>> {
    let action = query
        .action
        .as_deref()
        .map(AuditAction::from_str)
        .transpose()?;
    let defaults = rolegrid_application::AuditLogQuery::default();

    let entries = state
        .role_permission_service
        .list_audit_log(
            &user,
            rolegrid_application::AuditLogQuery {
                limit: query.limit.unwrap_or(defaults.limit),
                offset: query.offset.unwrap_or(defaults.offset),
                action,
                subject: query.subject,
            },
        )
        .await?
        .into_iter()
        .map(AuditLogEntryResponse::from)
        .collect();

    Ok(Json(entries))
}
