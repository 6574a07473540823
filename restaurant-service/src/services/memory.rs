//! In-process implementation of the persistence boundary.
//!
//! Backs the integration test suites and local development without a
//! running Postgres. All state sits behind one async mutex, so the
//! atomicity contracts of [`Store`] (all-lines-or-nothing insert, atomic
//! compare-and-set, atomic role replacement) hold by construction.

use async_trait::async_trait;
use chrono::Utc;
use std::collections::{HashMap, HashSet};
use tokio::sync::Mutex;
use uuid::Uuid;

use crate::error::ServiceError;
use crate::models::menu::{CreateMenuItem, MenuItem, UpdateMenuItem};
use crate::models::order::{Order, OrderLine, OrderStatus};
use crate::models::restaurant::{CreateRestaurant, Restaurant, RoleAssignment, TenantRole};
use crate::services::store::{NewOrderLine, Store};

#[derive(Default)]
struct State {
    restaurants: HashMap<Uuid, Restaurant>,
    menu_items: HashMap<Uuid, MenuItem>,
    assignments: HashMap<Uuid, RoleAssignment>,
    orders: HashMap<Uuid, Order>,
}

#[derive(Default)]
pub struct MemoryStore {
    state: Mutex<State>,
}

impl MemoryStore {
    pub fn new() -> Self {
        Self::default()
    }
}

#[async_trait]
impl Store for MemoryStore {
    async fn insert_restaurant(
        &self,
        input: &CreateRestaurant,
    ) -> Result<Restaurant, ServiceError> {
        let mut state = self.state.lock().await;
        if state.restaurants.values().any(|r| r.slug == input.slug) {
            return Err(ServiceError::Conflict(format!(
                "restaurant with slug {:?} already exists",
                input.slug
            )));
        }
        let now = Utc::now();
        let restaurant = Restaurant {
            restaurant_id: Uuid::new_v4(),
            name: input.name.clone(),
            slug: input.slug.clone(),
            description: input.description.clone(),
            is_active: input.is_active,
            created_utc: now,
            updated_utc: now,
        };
        state
            .restaurants
            .insert(restaurant.restaurant_id, restaurant.clone());
        Ok(restaurant)
    }

    async fn restaurant(&self, restaurant_id: Uuid) -> Result<Option<Restaurant>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state.restaurants.get(&restaurant_id).cloned())
    }

    async fn delete_restaurant(&self, restaurant_id: Uuid) -> Result<bool, ServiceError> {
        let mut state = self.state.lock().await;
        if state.restaurants.remove(&restaurant_id).is_none() {
            return Ok(false);
        }
        state
            .menu_items
            .retain(|_, item| item.restaurant_id != restaurant_id);
        state
            .assignments
            .retain(|_, a| a.restaurant_id != restaurant_id);
        state
            .orders
            .retain(|_, o| o.restaurant_id != restaurant_id);
        Ok(true)
    }

    async fn insert_menu_item(
        &self,
        restaurant_id: Uuid,
        input: &CreateMenuItem,
    ) -> Result<MenuItem, ServiceError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let item = MenuItem {
            menu_item_id: Uuid::new_v4(),
            restaurant_id,
            label: input.label.clone(),
            description: input.description.clone(),
            price: input.price,
            is_active: input.is_active,
            created_utc: now,
            updated_utc: now,
        };
        state.menu_items.insert(item.menu_item_id, item.clone());
        Ok(item)
    }

    async fn menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
    ) -> Result<Option<MenuItem>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .menu_items
            .get(&menu_item_id)
            .filter(|item| item.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn update_menu_item(
        &self,
        restaurant_id: Uuid,
        menu_item_id: Uuid,
        input: &UpdateMenuItem,
    ) -> Result<Option<MenuItem>, ServiceError> {
        let mut state = self.state.lock().await;
        let Some(item) = state
            .menu_items
            .get_mut(&menu_item_id)
            .filter(|item| item.restaurant_id == restaurant_id)
        else {
            return Ok(None);
        };
        if let Some(label) = &input.label {
            item.label = label.clone();
        }
        if let Some(description) = &input.description {
            item.description = Some(description.clone());
        }
        if let Some(price) = input.price {
            item.price = price;
        }
        if let Some(is_active) = input.is_active {
            item.is_active = is_active;
        }
        item.updated_utc = Utc::now();
        Ok(Some(item.clone()))
    }

    async fn list_menu_items(&self, restaurant_id: Uuid) -> Result<Vec<MenuItem>, ServiceError> {
        let state = self.state.lock().await;
        let mut items: Vec<MenuItem> = state
            .menu_items
            .values()
            .filter(|item| item.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        items.sort_by(|a, b| a.label.cmp(&b.label));
        Ok(items)
    }

    async fn role_assignment(
        &self,
        restaurant_id: Uuid,
        subject_id: &str,
    ) -> Result<Option<RoleAssignment>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .assignments
            .values()
            .find(|a| a.restaurant_id == restaurant_id && a.subject_id == subject_id)
            .cloned())
    }

    async fn replace_role_assignments(
        &self,
        restaurant_id: Uuid,
        role: TenantRole,
        subject_ids: &[String],
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        let mut state = self.state.lock().await;
        // A repeated subject would land two rows on the same
        // (restaurant, subject) pair, which Postgres rejects through
        // ix_restaurant_users_restaurant_subject. Refuse it here before
        // touching any state so the replacement stays all-or-nothing.
        let mut seen = HashSet::with_capacity(subject_ids.len());
        for subject_id in subject_ids {
            if !seen.insert(subject_id.as_str()) {
                return Err(ServiceError::Conflict(format!(
                    "subject {subject_id:?} appears more than once in the role assignment list"
                )));
            }
        }
        state.assignments.retain(|_, a| {
            a.restaurant_id != restaurant_id
                || (a.role != role && !subject_ids.contains(&a.subject_id))
        });
        let mut assignments = Vec::with_capacity(subject_ids.len());
        for subject_id in subject_ids {
            let assignment = RoleAssignment {
                assignment_id: Uuid::new_v4(),
                restaurant_id,
                subject_id: subject_id.clone(),
                role,
                granted_utc: Utc::now(),
            };
            state
                .assignments
                .insert(assignment.assignment_id, assignment.clone());
            assignments.push(assignment);
        }
        Ok(assignments)
    }

    async fn list_role_assignments(
        &self,
        restaurant_id: Uuid,
    ) -> Result<Vec<RoleAssignment>, ServiceError> {
        let state = self.state.lock().await;
        let mut assignments: Vec<RoleAssignment> = state
            .assignments
            .values()
            .filter(|a| a.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        assignments.sort_by(|a, b| {
            a.role
                .as_str()
                .cmp(b.role.as_str())
                .then_with(|| a.subject_id.cmp(&b.subject_id))
        });
        Ok(assignments)
    }

    async fn insert_order(
        &self,
        restaurant_id: Uuid,
        lines: Vec<NewOrderLine>,
    ) -> Result<Order, ServiceError> {
        let mut state = self.state.lock().await;
        let now = Utc::now();
        let order_id = Uuid::new_v4();
        let lines = lines
            .into_iter()
            .map(|line| OrderLine {
                line_id: Uuid::new_v4(),
                order_id,
                menu_item_id: line.menu_item_id,
                quantity: line.quantity,
                unit_price: line.unit_price,
                options: line.options,
            })
            .collect();
        let order = Order {
            order_id,
            restaurant_id,
            status: OrderStatus::Draft,
            lines,
            created_utc: now,
            updated_utc: now,
        };
        state.orders.insert(order_id, order.clone());
        Ok(order)
    }

    async fn order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
    ) -> Result<Option<Order>, ServiceError> {
        let state = self.state.lock().await;
        Ok(state
            .orders
            .get(&order_id)
            .filter(|o| o.restaurant_id == restaurant_id)
            .cloned())
    }

    async fn list_orders(&self, restaurant_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        let state = self.state.lock().await;
        let mut orders: Vec<Order> = state
            .orders
            .values()
            .filter(|o| o.restaurant_id == restaurant_id)
            .cloned()
            .collect();
        orders.sort_by_key(|o| o.created_utc);
        Ok(orders)
    }

    async fn compare_and_set_order_status(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        expected: OrderStatus,
        target: OrderStatus,
    ) -> Result<Option<Order>, ServiceError> {
        let mut state = self.state.lock().await;
        let Some(order) = state
            .orders
            .get_mut(&order_id)
            .filter(|o| o.restaurant_id == restaurant_id && o.status == expected)
        else {
            return Ok(None);
        };
        order.status = target;
        order.updated_utc = Utc::now();
        Ok(Some(order.clone()))
    }
}
