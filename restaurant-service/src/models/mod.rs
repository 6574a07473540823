//! Domain models.

pub mod identity;
pub mod menu;
pub mod order;
pub mod restaurant;

pub use identity::{AccessLevel, Capability, Identity, PlatformRole};
pub use menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
pub use order::{CreateOrder, CreateOrderLine, Order, OrderLine, OrderStatus};
pub use restaurant::{CreateRestaurant, Restaurant, RoleAssignment, TenantRole};
