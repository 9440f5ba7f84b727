use std::collections::BTreeSet;
use std::fmt::{Display, Formatter};
use std::str::FromStr;
use std::sync::LazyLock;

use rolegrid_core::AppError;
use serde::{Deserialize, Serialize};

/// Action that can be granted on a catalog page.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PermissionAction {
    /// Open the page and read its records.
    View,
    /// Create new records.
    Create,
    /// Modify existing records.
    Edit,
    /// Remove records.
    Delete,
}

impl PermissionAction {
    /// Returns the stable code segment for this action.
    #[must_use]
    pub fn as_str(&self) -> &'static str {
        match self {
            Self::View => "view",
            Self::Create => "create",
            Self::Edit => "edit",
            Self::Delete => "delete",
        }
    }

    /// Returns every action in matrix column order.
    #[must_use]
    pub fn all() -> &'static [Self] {
        const ALL: &[PermissionAction] = &[
            PermissionAction::View,
            PermissionAction::Create,
            PermissionAction::Edit,
            PermissionAction::Delete,
        ];

        ALL
    }
}

impl FromStr for PermissionAction {
    type Err = AppError;

    fn from_str(value: &str) -> Result<Self, Self::Err> {
        match value {
            "view" => Ok(Self::View),
            "create" => Ok(Self::Create),
            "edit" => Ok(Self::Edit),
            "delete" => Ok(Self::Delete),
            _ => Err(AppError::Validation(format!(
                "unknown permission action '{value}'"
            ))),
        }
    }
}

/// One administrable page of the dashboard.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct PageDefinition {
    page_code: &'static str,
    page_name: &'static str,
    page_description: Option<&'static str>,
}

impl PageDefinition {
    const fn new(
        page_code: &'static str,
        page_name: &'static str,
        page_description: Option<&'static str>,
    ) -> Self {
        Self {
            page_code,
            page_name,
            page_description,
        }
    }

    /// Returns the stable page code used as the permission prefix.
    #[must_use]
    pub fn page_code(&self) -> &'static str {
        self.page_code
    }

    /// Returns the human label.
    #[must_use]
    pub fn page_name(&self) -> &'static str {
        self.page_name
    }

    /// Returns the optional human description.
    #[must_use]
    pub fn page_description(&self) -> Option<&'static str> {
        self.page_description
    }

    /// Returns the permission code for one action on this page.
    #[must_use]
    pub fn permission_code(&self, action: PermissionAction) -> PermissionCode {
        to_permission_code(self.page_code, action)
    }
}

const PERMISSION_PAGES: &[PageDefinition] = &[
    PageDefinition::new(
        "requests",
        "Approval requests",
        Some("Submitted approval requests and their review trail"),
    ),
    PageDefinition::new(
        "bulletins",
        "Bulletin board",
        Some("Company announcements scoped to departments"),
    ),
    PageDefinition::new("users", "Employees", Some("Employee accounts and profiles")),
    PageDefinition::new("departments", "Departments", None),
    PageDefinition::new(
        "resources",
        "Resources",
        Some("Shared equipment, rooms and documents"),
    ),
    PageDefinition::new(
        "loans",
        "Loan disbursements",
        Some("Disbursement records and borrower notifications"),
    ),
    PageDefinition::new("roles", "Roles", Some("Role definitions and assignments")),
    PageDefinition::new(
        "permissions",
        "Permissions",
        Some("Page and action grants per role"),
    ),
    PageDefinition::new("statistics", "Statistics", None),
];

static CATALOG_PERMISSION_CODES: LazyLock<BTreeSet<PermissionCode>> = LazyLock::new(|| {
    PERMISSION_PAGES
        .iter()
        .flat_map(|page| {
            PermissionAction::all()
                .iter()
                .map(move |action| page.permission_code(*action))
        })
        .collect()
});

/// Returns the catalog pages in display order.
#[must_use]
pub fn permission_pages() -> &'static [PageDefinition] {
    PERMISSION_PAGES
}

/// Finds a catalog page by its code.
#[must_use]
pub fn find_page(page_code: &str) -> Option<&'static PageDefinition> {
    PERMISSION_PAGES
        .iter()
        .find(|page| page.page_code == page_code)
}

/// Returns every permission code the catalog can grant.
#[must_use]
pub fn catalog_permission_codes() -> &'static BTreeSet<PermissionCode> {
    &CATALOG_PERMISSION_CODES
}

/// Builds the permission code for a page and action.
///
/// Only the format is fixed here; callers are expected to pass catalog pages.
#[must_use]
pub fn to_permission_code(page_code: &str, action: PermissionAction) -> PermissionCode {
    PermissionCode(format!("{page_code}:{}", action.as_str()))
}

/// Opaque `"<page>:<action>"` token identifying one grantable capability.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(transparent)]
pub struct PermissionCode(String);

impl PermissionCode {
    /// Wraps a code read from storage or transport without interpreting it.
    #[must_use]
    pub fn from_stored(value: impl Into<String>) -> Self {
        Self(value.into())
    }

    /// Returns the underlying code.
    #[must_use]
    pub fn as_str(&self) -> &str {
        self.0.as_str()
    }

    /// Returns whether the catalog can grant this code.
    #[must_use]
    pub fn is_catalog_code(&self) -> bool {
        CATALOG_PERMISSION_CODES.contains(self)
    }
}

impl Display for PermissionCode {
    fn fmt(&self, formatter: &mut Formatter<'_>) -> std::fmt::Result {
        formatter.write_str(self.0.as_str())
    }
}

impl From<PermissionCode> for String {
    fn from(value: PermissionCode) -> Self {
        value.0
    }
}
