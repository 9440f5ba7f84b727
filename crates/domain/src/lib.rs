//! Domain entities and invariants.

#![forbid(unsafe_code)]

mod audit;
mod catalog;
mod permission_matrix;
mod role;

pub use audit::AuditAction;
pub use catalog::{
    PageDefinition, PermissionAction, PermissionCode, catalog_permission_codes, find_page,
    permission_pages, to_permission_code,
};
pub use permission_matrix::{
    EditMessage, PermissionEditBuffer, PermissionField, PermissionFormRow,
    merge_permissions_into_rows, rows_to_permission_codes, validate_catalog_rows,
};
pub use role::{Role, RoleId, RolePayload, RoleRecord};
