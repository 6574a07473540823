//! The persistence boundary.
//!
//! Everything the core needs from a store: point lookups scoped to one
//! restaurant, inserts, a bulk replace for role reassignment, and two
//! operations with explicit atomicity contracts — order creation (all
//! lines or none) and the compare-and-set status update the transition
//! check relies on. [`super::PgStore`] implements it over Postgres;
//! [`super::MemoryStore`] over in-process maps.

use async_trait::async_trait;
use rust_decimal::Decimal;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use crate::models::order::{Order, OrderStatus};
use crate::models::restaurant::{CreateRestaurant, Restaurant, RoleAssignment, TenantRole};

/// A fully resolved order line, ready to persist.
///
/// `unit_price` has already been snapshotted from the menu item; the store
/// writes it verbatim.
#[derive(Debug, Clone)]
pub struct NewOrderLine {
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub options: Option<serde_json::Value>,
}

#[async_trait]
pub trait Store: Send + Sync {
    // -- restaurants ------------------------------------------------------

    /// Insert a restaurant. Fails with [`ServiceError::Conflict`] when the
    /// slug is already taken.
    async fn insert_restaurant(&self, input: &CreateRestaurant)
        -> Result<Restaurant, ServiceError>;

    async fn restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, ServiceError>;

    /// Delete a restaurant and, by cascade, its role assignments, menu
    /// items, orders and order lines. Returns whether a row was deleted.
    async fn delete_restaurant(&self, restaurant_id: Uuid) -> Result<bool, ServiceError>;

    // -- menu items -------------------------------------------------------

    async fn insert_menu_item(
        &self,
        restaurant_id: Uuid,
        input: &CreateMenuItem,
    ) -> Result<MenuItem, ServiceError>;

    async fn menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
    ) -> Result<Option<MenuItem>, ServiceError>;

    async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
        input: &UpdateMenuItem,
    ) -> Result<Option<MenuItem>, ServiceError>;

    async fn list_menu_items(&self, restaurant_id: Uuid) -> Result<Vec<MenuItem>, ServiceError>;

    // -- role assignments -------------------------------------------------

    async fn role_assignment(
        &self,
        restaurant_id: Uuid,
        subject_id: &str,
    ) -> Result<Option<RoleAssignment>, ServiceError>;

    /// Replace, atomically, all assignments of `role` within the restaurant
    /// with fresh rows for exactly `subject_ids`. Any prior row for one of
    /// those subjects — whatever its role — is removed first, so a subject
    /// holds at most one role per restaurant at all times.
    async fn replace_role_assignments(
        &self,
        restaurant_id: Uuid,
        role: TenantRole,
        subject_ids: &[String],
    ) -> Result<Vec<RoleAssignment>, ServiceError>;

    async fn list_role_assignments(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<RoleAssignment>, ServiceError>;

    // -- orders -----------------------------------------------------------

    /// Insert an order in [`OrderStatus::Draft`] together with all its
    /// lines, in one transaction. Line order is preserved.
    async fn insert_order(
        &self,
        restaurant_id: Uuid,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, ServiceError>;

    async fn order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, ServiceError>;

    async fn list_orders(&self, restaurant_id: Uuid) -> Result<Vec<Order>, ServiceError>;

    /// Set the order's status to `target` only if it is still `expected`.
    ///
    /// The check-and-set is a single atomic unit in every implementation;
    /// `None` means no row matched — the order is gone or its status moved
    /// since it was read. Only the status column is touched.
    async fn compare_and_set_order_status(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<Option<Order>, ServiceError>;
}
