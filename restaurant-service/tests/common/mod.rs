//! Test helper module for restaurant-service integration tests.
//!
//! Builds the core services over the in-memory store and seeds tenants,
//! catalog items and identities.

#![allow(dead_code)]

use std::sync::Arc;

use rust_decimal::Decimal;
use uuid::Uuid;

use restaurant_service::models::menu::{CreateMenuItem, MenuItem};
use restaurant_service::models::restaurant::{CreateRestaurant, Restaurant};
use restaurant_service::observability;
use restaurant_service::services::{AccessGate, MemoryStore, OrderService, Store};
use restaurant_service::Identity;

/// Core services wired to one shared in-memory store.
pub struct TestApp {
    pub store: Arc<MemoryStore>,
    pub gate: AccessGate<MemoryStore>,
    pub orders: OrderService<MemoryStore>,
}

impl TestApp {
    pub fn new() -> Self {
        observability::init_tracing("warn");
        let store = Arc::new(MemoryStore::new());
        TestApp {
            gate: AccessGate::new(store.clone()),
            orders: OrderService::new(store.clone()),
            store,
        }
    }

    pub async fn seed_restaurant(&self, slug: &str) -> Restaurant {
        self.store
            .insert_restaurant(&CreateRestaurant {
                name: format!("Test Restaurant {slug}"),
                slug: slug.to_string(),
                description: None,
                is_active: true,
            })
            .await
            .expect("Failed to seed restaurant")
    }

    pub async fn seed_menu_item(
        &self,
        restaurant_id: Uuid,
        label: &str,
        price: &str,
        is_active: bool,
    ) -> MenuItem {
        self.store
            .insert_menu_item(
                restaurant_id,
                &CreateMenuItem {
                    label: label.to_string(),
                    description: None,
                    price: parse_price(price),
                    is_active,
                },
            )
            .await
            .expect("Failed to seed menu item")
    }
}

pub fn parse_price(price: &str) -> Decimal {
    price.parse().expect("invalid test price")
}

/// Identity holding the platform super-admin role.
pub fn platform_admin() -> Identity {
    Identity::new("admin-1", vec!["platform_admin".to_string()])
}

/// Identity holding the global restaurant_manager role.
pub fn global_manager() -> Identity {
    Identity::new("gm-1", vec!["restaurant_manager".to_string()])
}

/// Identity with no platform roles; access comes only from tenant
/// assignments seeded per test.
pub fn member(subject_id: &str) -> Identity {
    Identity::new(subject_id, vec![])
}
