//! Menu item model — the catalog surface order validation reads.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use sqlx::FromRow;
use uuid::Uuid;
use validator::Validate;

/// A menu item scoped to one restaurant.
///
/// Only active items belonging to the requesting restaurant may be ordered.
/// Prices are decimal, never floating point.
#[derive(Debug, Clone, Serialize, Deserialize, FromRow)]
pub struct MenuItem {
    pub menu_item_id: Uuid,
    pub restaurant_id: Uuid,
    pub label: String,
    pub description: Option<String>,
    pub price: Decimal,
    pub is_active: bool,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// Input for creating a menu item.
#[derive(Debug, Clone, Deserialize, Validate)]
pub struct CreateMenuItem {
    #[validate(length(min = 1, max = 255))]
    pub label: String,
    #[validate(length(max = 1024))]
    pub description: Option<String>,
    pub price: Decimal,
    #[serde(default = "default_active")]
    pub is_active: bool,
}

fn default_active() -> bool {
    true
}

/// Partial update for a menu item. `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct UpdateMenuItem {
    pub label: Option<String>,
    pub description: Option<String>,
    pub price: Option<Decimal>,
    pub is_active: Option<bool>,
}
