use rolegrid_core::{AppResult, UserIdentity};
use rolegrid_domain::{
    EditMessage, PermissionCode, PermissionEditBuffer, PermissionField, PermissionFormRow, Role,
    RoleId,
};
use tracing::{error, info, warn};

use crate::{RolePermissionService, SaveRolePermissionsInput, SavedRolePermissions};

const SAVE_SUCCESS_MESSAGE: &str = "Permissions saved.";

/// Result of switching the selected role.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub struct RoleSelection {
    /// Whether unsaved edits of the previous role were dropped.
    pub discarded_changes: bool,
}

/// Result of [`PermissionEditor::save`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum SaveOutcome {
    /// The grant set was replaced and the buffer re-snapshotted.
    Saved(SavedRolePermissions),
    /// The write failed; the edits are kept for a retry.
    Failed {
        /// Operator-facing message.
        error: String,
    },
    /// No role selected, no edits, or a save already in flight.
    NothingToSave,
}

/// One operator's editing session over role grant sets.
///
/// Operations run strictly in sequence: load, edit, then save or cancel.
pub struct PermissionEditor {
    service: RolePermissionService,
    actor: UserIdentity,
    roles: Vec<Role>,
    selected_role: Option<Role>,
    buffer: Option<PermissionEditBuffer>,
    is_pending: bool,
}

impl PermissionEditor {
    /// Opens a session and loads the role list.
    pub async fn open(service: RolePermissionService, actor: UserIdentity) -> AppResult<Self> {
        let roles = service.list_roles(&actor).await?;

        Ok(Self {
            service,
            actor,
            roles,
            selected_role: None,
            buffer: None,
            is_pending: false,
        })
    }

    /// Returns the roles available for selection.
    #[must_use]
    pub fn roles(&self) -> &[Role] {
        &self.roles
    }

    /// Returns the role being edited.
    #[must_use]
    pub fn selected_role(&self) -> Option<&Role> {
        self.selected_role.as_ref()
    }

    /// Returns the rows being edited.
    #[must_use]
    pub fn form_rows(&self) -> &[PermissionFormRow] {
        self.buffer
            .as_ref()
            .map(PermissionEditBuffer::form_rows)
            .unwrap_or_default()
    }

    /// Returns the status line of the last save.
    #[must_use]
    pub fn message(&self) -> Option<&EditMessage> {
        self.buffer.as_ref().and_then(PermissionEditBuffer::message)
    }

    /// Returns whether a save is in flight.
    #[must_use]
    pub fn is_pending(&self) -> bool {
        self.is_pending
    }

    /// Selects a role and reloads its grant set.
    ///
    /// The current buffer is always discarded, saved or not.
    pub async fn select_role(&mut self, role_id: RoleId) -> AppResult<RoleSelection> {
        let discarded_changes = self.has_changes();
        if discarded_changes {
            warn!(
                subject = self.actor.subject(),
                role_id = %role_id,
                "discarding unsaved permission edits on role switch"
            );
        }

        self.selected_role = None;
        self.buffer = None;

        let matrix = self
            .service
            .load_role_permissions(&self.actor, role_id)
            .await?;
        self.buffer = Some(PermissionEditBuffer::from_permission_codes(
            matrix.permission_codes.iter().map(PermissionCode::as_str),
        ));
        self.selected_role = Some(matrix.role);

        Ok(RoleSelection { discarded_changes })
    }

    /// Sets one flag of one page in the buffer.
    pub fn update_row(&mut self, page_code: &str, field: PermissionField, value: bool) {
        if let Some(buffer) = self.buffer.as_mut() {
            buffer.update_row(page_code, field, value);
        }
    }

    /// Returns whether the buffer differs from the last loaded or saved state.
    #[must_use]
    pub fn has_changes(&self) -> bool {
        self.buffer
            .as_ref()
            .is_some_and(PermissionEditBuffer::has_changes)
    }

    /// Returns whether the save control should be enabled.
    #[must_use]
    pub fn can_save(&self) -> bool {
        self.selected_role.is_some() && self.has_changes() && !self.is_pending
    }

    /// Restores the last loaded or saved state. Ignored while a save is in flight.
    pub fn cancel(&mut self) {
        if self.is_pending {
            return;
        }

        if let Some(buffer) = self.buffer.as_mut() {
            buffer.cancel();
        }
    }

    /// Persists the edited matrix as the role's complete grant set.
    pub async fn save(&mut self) -> SaveOutcome {
        if !self.can_save() {
            return SaveOutcome::NothingToSave;
        }
        let (Some(role), Some(buffer)) = (self.selected_role.as_ref(), self.buffer.as_ref())
        else {
            return SaveOutcome::NothingToSave;
        };

        let input = SaveRolePermissionsInput {
            role_id: role.role_id(),
            rows: buffer.form_rows().to_vec(),
        };

        self.is_pending = true;
        let result = self.service.save_role_permissions(&self.actor, input).await;
        self.is_pending = false;

        let Some(buffer) = self.buffer.as_mut() else {
            return SaveOutcome::NothingToSave;
        };

        match result {
            Ok(saved) => {
                buffer.mark_saved(SAVE_SUCCESS_MESSAGE);
                info!(
                    subject = self.actor.subject(),
                    role_id = %saved.role_id,
                    "role permissions saved from editor"
                );
                SaveOutcome::Saved(saved)
            }
            Err(app_error) => {
                if app_error.is_internal() {
                    error!(
                        error = %app_error,
                        subject = self.actor.subject(),
                        "role permission save failed"
                    );
                } else {
                    warn!(
                        error = %app_error,
                        subject = self.actor.subject(),
                        "role permission save rejected"
                    );
                }

                let message = app_error.public_message();
                buffer.record_error(message.clone());
                SaveOutcome::Failed { error: message }
            }
        }
    }
}
