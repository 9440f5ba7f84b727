use std::collections::{BTreeSet, HashSet};

use rolegrid_core::{AppError, AppResult};
use serde::{Deserialize, Serialize};

use crate::catalog::{
    PermissionAction, PermissionCode, find_page, permission_pages, to_permission_code,
};

/// One editable row of the role permission matrix.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PermissionFormRow {
    /// Catalog page code.
    pub page_code: String,
    /// Human page label.
    pub page_name: String,
    /// Optional page description.
    pub page_description: Option<String>,
    /// Grants `<page>:view`.
    pub can_view: bool,
    /// Grants `<page>:create`.
    pub can_create: bool,
    /// Grants `<page>:edit`.
    pub can_edit: bool,
    /// Grants `<page>:delete`.
    pub can_delete: bool,
}

impl PermissionFormRow {
    /// Returns the flag backing one action.
    #[must_use]
    pub fn allows(&self, action: PermissionAction) -> bool {
        match action {
            PermissionAction::View => self.can_view,
            PermissionAction::Create => self.can_create,
            PermissionAction::Edit => self.can_edit,
            PermissionAction::Delete => self.can_delete,
        }
    }

    fn with_field(&self, field: PermissionField, value: bool) -> Self {
        let mut row = self.clone();
        match field {
            PermissionField::CanView => row.can_view = value,
            PermissionField::CanCreate => row.can_create = value,
            PermissionField::CanEdit => row.can_edit = value,
            PermissionField::CanDelete => row.can_delete = value,
        }
        row
    }
}

/// Boolean column of a [`PermissionFormRow`].
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionField {
    /// `can_view` column.
    CanView,
    /// `can_create` column.
    CanCreate,
    /// `can_edit` column.
    CanEdit,
    /// `can_delete` column.
    CanDelete,
}

impl PermissionField {
    /// Returns the column for an action.
    #[must_use]
    pub fn for_action(action: PermissionAction) -> Self {
        match action {
            PermissionAction::View => Self::CanView,
            PermissionAction::Create => Self::CanCreate,
            PermissionAction::Edit => Self::CanEdit,
            PermissionAction::Delete => Self::CanDelete,
        }
    }
}

/// Expands granted codes into one row per catalog page, in catalog order.
///
/// Duplicates collapse and codes outside the catalog are ignored.
#[must_use]
pub fn merge_permissions_into_rows<I, S>(permission_codes: I) -> Vec<PermissionFormRow>
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    let granted: HashSet<String> = permission_codes
        .into_iter()
        .map(|code| code.as_ref().to_owned())
        .collect();

    permission_pages()
        .iter()
        .map(|page| {
            let has = |action: PermissionAction| {
                granted.contains(page.permission_code(action).as_str())
            };
            PermissionFormRow {
                page_code: page.page_code().to_owned(),
                page_name: page.page_name().to_owned(),
                page_description: page.page_description().map(str::to_owned),
                can_view: has(PermissionAction::View),
                can_create: has(PermissionAction::Create),
                can_edit: has(PermissionAction::Edit),
                can_delete: has(PermissionAction::Delete),
            }
        })
        .collect()
}

/// Collects the complete grant set implied by the rows.
#[must_use]
pub fn rows_to_permission_codes(rows: &[PermissionFormRow]) -> BTreeSet<PermissionCode> {
    rows.iter()
        .flat_map(|row| {
            PermissionAction::all()
                .iter()
                .filter(move |action| row.allows(**action))
                .map(move |action| to_permission_code(&row.page_code, *action))
        })
        .collect()
}

/// Ensures submitted rows reference catalog pages, each at most once.
pub fn validate_catalog_rows(rows: &[PermissionFormRow]) -> AppResult<()> {
    let mut seen = HashSet::new();
    for row in rows {
        if find_page(row.page_code.as_str()).is_none() {
            return Err(AppError::Validation(format!(
                "page '{}' is not part of the permission catalog",
                row.page_code
            )));
        }
        if !seen.insert(row.page_code.as_str()) {
            return Err(AppError::Validation(format!(
                "page '{}' appears more than once",
                row.page_code
            )));
        }
    }

    Ok(())
}

/// Status line shown next to the save controls.
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
#[serde(tag = "kind", content = "text", rename_all = "snake_case")]
pub enum EditMessage {
    /// Last save succeeded.
    Success(String),
    /// Last save failed.
    Error(String),
}

/// Unsaved edits to one role's grant set, mirrored against the loaded snapshot.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PermissionEditBuffer {
    form_rows: Vec<PermissionFormRow>,
    initial_rows: Vec<PermissionFormRow>,
    message: Option<EditMessage>,
}

impl PermissionEditBuffer {
    /// Loads a grant set and snapshots it.
    #[must_use]
    pub fn from_permission_codes<I, S>(permission_codes: I) -> Self
    where
        I: IntoIterator<Item = S>,
        S: AsRef<str>,
    {
        let rows = merge_permissions_into_rows(permission_codes);
        Self {
            initial_rows: rows.clone(),
            form_rows: rows,
            message: None,
        }
    }

    /// Returns the rows being edited.
    #[must_use]
    pub fn form_rows(&self) -> &[PermissionFormRow] {
        &self.form_rows
    }

    /// Returns the snapshot taken at load time or after the last save.
    #[must_use]
    pub fn initial_rows(&self) -> &[PermissionFormRow] {
        &self.initial_rows
    }

    /// Returns the current status message.
    #[must_use]
    pub fn message(&self) -> Option<&EditMessage> {
        self.message.as_ref()
    }

    /// Sets one flag on one page. Unknown pages leave the buffer untouched.
    pub fn update_row(&mut self, page_code: &str, field: PermissionField, value: bool) {
        if !self.form_rows.iter().any(|row| row.page_code == page_code) {
            return;
        }

        self.form_rows = self
            .form_rows
            .iter()
            .map(|row| {
                if row.page_code == page_code {
                    row.with_field(field, value)
                } else {
                    row.clone()
                }
            })
            .collect();
    }

    /// Returns whether the edited rows differ from the snapshot.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.form_rows != self.initial_rows
    }

    /// Restores the snapshot and clears the status message.
    pub fn cancel(&mut self) {
        self.form_rows = self.initial_rows.clone();
        self.message = None;
    }

    /// Adopts the edited rows as the new snapshot after a successful save.
    pub fn mark_saved(&mut self, message: impl Into<String>) {
        self.initial_rows = self.form_rows.clone();
        self.message = Some(EditMessage::Success(message.into()));
    }

    /// Records a failed save. Both row sets stay as they are.
    pub fn record_error(&mut self, message: impl Into<String>) {
        self.message = Some(EditMessage::Error(message.into()));
    }

    /// Returns the grant set the edited rows would persist.
    #[must_use]
    pub fn pending_permission_codes(&self) -> BTreeSet<PermissionCode> {
        rows_to_permission_codes(&self.form_rows)
    }
}
