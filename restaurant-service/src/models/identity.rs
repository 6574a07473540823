//! Verified identities and the capability model behind authorization.
//!
//! Roles arrive from the identity provider as raw strings. They are mapped
//! onto [`PlatformRole`]s, and every role (platform or tenant-scoped)
//! resolves to a set of [`Capability`] grants. Authorization decisions test
//! capability containment, never role names.

use serde::{Deserialize, Serialize};

use crate::models::restaurant::TenantRole;

/// A verified identity supplied by the authentication boundary.
///
/// Never persisted; immutable for the duration of a request. `roles` holds
/// the provider's raw role strings — unknown strings are ignored.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Identity {
    pub subject_id: String,
    pub roles: Vec<String>,
}

impl Identity {
    pub fn new(subject_id: impl Into<String>, roles: Vec<String>) -> Self {
        Self {
            subject_id: subject_id.into(),
            roles,
        }
    }

    /// Platform-level roles this identity asserts.
    pub fn platform_roles(&self) -> Vec<PlatformRole> {
        self.roles
            .iter()
            .filter_map(|r| PlatformRole::parse(r))
            .collect()
    }

    /// Whether any platform-level role grants `capability` globally.
    pub fn has_capability(&self, capability: Capability) -> bool {
        self.platform_roles()
            .iter()
            .any(|role| role.grants(capability))
    }
}

/// Roles asserted globally by the identity provider, not scoped to any
/// restaurant.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum PlatformRole {
    /// `platform_admin` — the platform super-admin.
    Admin,
    /// `restaurant_manager` asserted globally.
    Manager,
    /// `staff` asserted globally.
    Staff,
}

impl PlatformRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            PlatformRole::Admin => "platform_admin",
            PlatformRole::Manager => "restaurant_manager",
            PlatformRole::Staff => "staff",
        }
    }

    /// Parse a provider role string. Unknown roles yield `None`.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "platform_admin" => Some(PlatformRole::Admin),
            "restaurant_manager" => Some(PlatformRole::Manager),
            "staff" => Some(PlatformRole::Staff),
            _ => None,
        }
    }

    /// Capabilities granted by this role across all restaurants.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            PlatformRole::Admin => &[
                Capability::ManageTenant,
                Capability::AssignManagers,
                Capability::AssignStaff,
                Capability::OperateOrders,
            ],
            PlatformRole::Manager => &[
                Capability::ManageTenant,
                Capability::AssignStaff,
                Capability::OperateOrders,
            ],
            PlatformRole::Staff => &[Capability::OperateOrders],
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

impl TenantRole {
    /// Capabilities granted by this assignment within its restaurant.
    pub fn capabilities(&self) -> &'static [Capability] {
        match self {
            TenantRole::Manager => &[
                Capability::ManageTenant,
                Capability::AssignStaff,
                Capability::OperateOrders,
            ],
            TenantRole::Staff => &[Capability::OperateOrders],
        }
    }

    pub fn grants(&self, capability: Capability) -> bool {
        self.capabilities().contains(&capability)
    }
}

/// Actions the gate can be asked to permit.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum Capability {
    /// Mutate a restaurant's own data: settings, catalog, inventory.
    ManageTenant,
    /// Replace the restaurant's manager assignment list.
    AssignManagers,
    /// Replace the restaurant's staff assignment list.
    AssignStaff,
    /// Create orders and move them through the status lifecycle.
    OperateOrders,
}

/// Named authorization presets used by the request layer.
///
/// Mutating operations gate on [`AccessLevel::ManagerOrAdmin`], read-mostly
/// and order operations on [`AccessLevel::StaffOrAbove`].
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum AccessLevel {
    ManagerOrAdmin,
    StaffOrAbove,
}

impl AccessLevel {
    pub fn required_capability(&self) -> Capability {
        match self {
            AccessLevel::ManagerOrAdmin => Capability::ManageTenant,
            AccessLevel::StaffOrAbove => Capability::OperateOrders,
        }
    }
}
