//! Core of the restaurant backend: tenant-scoped access control and the
//! order lifecycle, over a pluggable persistence boundary.
//!
//! The request-handling layer (routing, serialization, token verification)
//! lives outside this crate; it hands in an already-verified [`Identity`]
//! and consumes the decisions and records exposed here.

pub mod config;
pub mod error;
pub mod models;
pub mod observability;
pub mod services;

pub use error::ServiceError;
pub use models::identity::{AccessLevel, Capability, Identity, PlatformRole};
pub use models::order::OrderStatus;
pub use models::restaurant::TenantRole;
pub use services::access::AccessGate;
pub use services::ordering::OrderService;
pub use services::store::Store;
