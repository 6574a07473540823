//! The order lifecycle: catalog-validated creation and the status state
//! machine, committed atomically at the persistence boundary.

use std::sync::Arc;
use tracing::{info, instrument, warn};
use uuid::Uuid;
use validator::Validate;

use crate::error::ServiceError;
use crate::models::order::{CreateOrder, Order, OrderStatus};
use crate::services::store::{NewOrderLine, Store};

pub struct OrderService<S> {
    store: Arc<S>,
}

impl<S: Store> OrderService<S> {
    pub fn new(store: Arc<S>) -> Self {
        Self { store }
    }

    /// Create an order in `draft` from the supplied lines.
    ///
    /// Validation is all-or-nothing: every line must name an active menu
    /// item of this restaurant or nothing is persisted. Each created line
    /// snapshots the item's current price as its `unit_price`; the
    /// `options` payload passes through uninterpreted.
    #[instrument(skip(self, input), fields(restaurant_id = %restaurant_id, lines = input.lines.len()))]
    pub async fn create_order(
        &self,
        restaurant_id: Uuid,
        input: &CreateOrder,
    ) -> Result<Order, ServiceError> {
        input.validate()?;

        if self.store.restaurant(restaurant_id).await?.is_none() {
            return Err(ServiceError::NotFound("Restaurant"));
        }

        // Resolve every line before writing anything.
        let mut lines = Vec::with_capacity(input.lines.len());
        for line in &input.lines {
            let item = self
                .store
                .menu_item(restaurant_id, line.menu_item_id)
                .await?
                .filter(|item| item.is_active)
                .ok_or_else(|| {
                    warn!(menu_item_id = %line.menu_item_id, "Order line rejected");
                    ServiceError::InvalidReference {
                        menu_item_id: line.menu_item_id,
                    }
                })?;
            lines.push(NewOrderLine {
                menu_item_id: item.menu_item_id,
                quantity: line.quantity,
                unit_price: item.price,
                options: line.options.clone(),
            });
        }

        let order = self.store.insert_order(restaurant_id, lines).await?;
        info!(order_id = %order.order_id, lines = order.lines.len(), "Order created");
        Ok(order)
    }

    /// Fetch one order with its lines.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, order_id = %order_id))]
    pub async fn order(&self, restaurant_id: Uuid, order_id: Uuid) -> Result<Order, ServiceError> {
        self.store
            .order(restaurant_id, order_id)
            .await?
            .ok_or(ServiceError::NotFound("Order"))
    }

    /// List a restaurant's orders, oldest first.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id))]
    pub async fn list_orders(&self, restaurant_id: Uuid) -> Result<Vec<Order>, ServiceError> {
        self.store.list_orders(restaurant_id).await
    }

    /// Move an order to `target` if the state machine allows it.
    ///
    /// The commit compares against the status that was read, so two
    /// concurrent transitions cannot both win from the same stale state:
    /// the loser re-reads and fails against the current status.
    #[instrument(skip(self), fields(restaurant_id = %restaurant_id, order_id = %order_id, target = %target))]
    pub async fn transition_order(
        &self,
        restaurant_id: Uuid,
        order_id: Uuid,
        target: OrderStatus,
    ) -> Result<Order, ServiceError> {
        let current = self
            .store
            .order(restaurant_id, order_id)
            .await?
            .ok_or(ServiceError::NotFound("Order"))?
            .status;

        if !current.can_transition(target) {
            warn!(from = %current, to = %target, "Transition rejected");
            return Err(ServiceError::InvalidTransition {
                from: current,
                to: target,
            });
        }

        match self
            .store
            .compare_and_set_order_status(restaurant_id, order_id, current, target)
            .await?
        {
            Some(order) => {
                info!(from = %current, to = %target, "Order transitioned");
                Ok(order)
            }
            None => {
                // Lost a race (or the order vanished): report against the
                // state as it stands now.
                let now_current = self
                    .store
                    .order(restaurant_id, order_id)
                    .await?
                    .ok_or(ServiceError::NotFound("Order"))?
                    .status;
                warn!(expected = %current, found = %now_current, "Concurrent status change detected");
                if !now_current.can_transition(target) {
                    Err(ServiceError::InvalidTransition {
                        from: now_current,
                        to: target,
                    })
                } else {
                    Err(ServiceError::Conflict(format!(
                        "order {order_id} changed from {current} to {now_current} concurrently"
                    )))
                }
            }
        }
    }
}
