//! Services: the persistence boundary and the two core components built on
//! it — the authorization gate and the order lifecycle.

pub mod access;
pub mod database;
pub mod memory;
pub mod ordering;
pub mod store;

pub use access::{AccessGate, AccessGrant};
pub use database::PgStore;
pub use memory::MemoryStore;
pub use ordering::OrderService;
pub use store::{NewOrderLine, Store};
