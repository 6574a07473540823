//! Restaurant (tenant) and tenant-scoped role assignment models.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// One restaurant — the unit of data isolation.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct Restaurant {
    pub restaurant_id: Uuid,
    pub name: String,
    pub slug: String,
    pub description: Option<String>,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Role a subject can hold within one restaurant.
///
/// Distinct from the global platform roles; never stores `platform_admin`.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum TenantRole {
    Manager,
    Staff,
}

impl TenantRole {
    pub fn as_str(&self) -> &'static str {
        match self {
            TenantRole::Manager => "manager",
            TenantRole::Staff => "staff",
        }
    }

    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "manager" => Some(TenantRole::Manager),
            "staff" => Some(TenantRole::Staff),
            _ => None,
        }
    }
}

impl std::fmt::Display for TenantRole {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// A persisted grant of [`TenantRole`] to a subject within one restaurant.
///
/// Unique per (restaurant_id, subject_id): reassigning a subject's role
/// replaces the prior row, it never appends.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct RoleAssignment {
    pub assignment_id: Uuid,
    pub restaurant_id: Uuid,
    /// Subject identifier from the identity provider.
    pub subject_id: String,
    pub role: TenantRole,
    pub granted_utc: DateTime<Utc>,
}

/// Input for creating a restaurant.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateRestaurant {
    #[validate(length(min = 1, max = 255))]
    pub name: String,
    #[validate(length(min = 1, max = 128))]
    pub slug: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}
