use std::fmt::{Display, Formatter};
use std::str::FromStr;

use rolegrid_core::{AppError, AppResult, NonEmptyString};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// Role identifier.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct RoleId(Uuid);

impl RoleId {
    /// Creates a random role identifier.
    #[must_use]
    pub fn new() -> Self {
        Self(Uuid::new_v4())
    }

    /// Creates a role identifier from an existing UUID value.
    #[must_use]
    pub fn from_uuid(value: Uuid) -> Self {
        Self(value)
    }

    /// Returns the underlying UUID value.
    #[must_use]
    pub fn as_uuid(&self) -> Uuid {
        self.0
    }
}

impl Default for RoleId {
    fn default() -> Self {
        Self::new()
    }
}

impl Display for RoleId {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        write!(formatter, "{}", self.0)
    }
}

impl FromStr for RoleId {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        Uuid::parse_str(value)
            .map(Self)
            .map_err(|error| AppError::Validation(format!("invalid role id '{value}': {error}")))
    }
}

/// Assignable role in canonical shape.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct Role {
    role_id: RoleId,
    code: NonEmptyString,
    name: NonEmptyString,
    description: Option<String>,
    is_system: bool,
}

impl Role {
    /// Creates a validated role.
    pub fn new(
        role_id: RoleId,
        code: impl Into<String>,
        name: impl Into<String>,
        description: Option<String>,
        is_system: bool,
    ) -> AppResult<Self> {
        let description = description.and_then(|value| {
            let trimmed = value.trim().to_owned();
            (!trimmed.is_empty()).then_some(trimmed)
        });

        Ok(Self {
            role_id,
            code: NonEmptyString::new(code)?,
            name: NonEmptyString::new(name)?,
            description,
            is_system,
        })
    }

    /// Returns the role identifier.
    #[must_use]
    pub fn role_id(&self) -> RoleId {
        self.role_id
    }

    /// Returns the stable role code.
    #[must_use]
    pub fn code(&self) -> &NonEmptyString {
        &self.code
    }

    /// Returns the display name.
    #[must_use]
    pub fn name(&self) -> &NonEmptyString {
        &self.name
    }

    /// Returns the optional description.
    #[must_use]
    pub fn description(&self) -> Option<&str> {
        self.description.as_deref()
    }

    /// Returns whether the role is managed by the system.
    #[must_use]
    pub fn is_system(&self) -> bool {
        self.is_system
    }
}

/// Role fields as delivered by external data sources.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
pub struct RoleRecord {
    /// Role identifier.
    pub id: Uuid,
    /// Stable role code.
    pub code: String,
    /// Display name.
    pub name: String,
    /// Optional description.
    #[serde(default)]
    pub description: Option<String>,
    /// System-managed marker.
    #[serde(default)]
    pub is_system: bool,
}

/// Role payload that joined queries deliver either as an object or as a
/// one-element array.
#[derive(Debug, Clone, PartialEq, Eq, Deserialize)]
#[serde(untagged)]
pub enum RolePayload {
    /// Plain object shape.
    Single(RoleRecord),
    /// Array shape produced by relation joins.
    Wrapped(Vec<RoleRecord>),
}

impl RolePayload {
    /// Normalizes the payload into the canonical role shape.
    pub fn into_role(self) -> AppResult<Role> {
        let record = match self {
            Self::Single(record) => record,
            Self::Wrapped(records) => {
                let count = records.len();
                let mut records = records.into_iter();
                match (records.next(), count) {
                    (Some(record), 1) => record,
                    _ => {
                        return Err(AppError::Validation(format!(
                            "role payload must contain exactly one role, found {count}"
                        )));
                    }
                }
            }
        };

        Role::new(
            RoleId::from_uuid(record.id),
            record.code,
            record.name,
            record.description,
            record.is_system,
        )
    }
}
