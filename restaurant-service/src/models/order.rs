//! Order model and the status state machine.

use chrono::{DateTime, Utc};
use rust_decimal::Decimal;
use serde::{Deserialize, Serialize};
use uuid::Uuid;
use validator::Validate;

/// Order status.
///
/// ```text
/// draft      -> confirmed, cancelled
/// confirmed  -> preparing, cancelled
/// preparing  -> ready, cancelled
/// ready      -> delivered
/// delivered  -> (terminal)
/// cancelled  -> (terminal)
/// ```
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "snake_case")]
pub enum OrderStatus {
    Draft,
    Confirmed,
    Preparing,
    Ready,
    Delivered,
    Cancelled,
}

impl OrderStatus {
    pub fn as_str(&self) -> &'static str {
        match self {
            OrderStatus::Draft => "draft",
            OrderStatus::Confirmed => "confirmed",
            OrderStatus::Preparing => "preparing",
            OrderStatus::Ready => "ready",
            OrderStatus::Delivered => "delivered",
            OrderStatus::Cancelled => "cancelled",
        }
    }

    /// Parse a stored status. Unknown values yield `None` rather than a
    /// default; a status outside the enumeration is a corrupt row.
    pub fn parse(s: &str) -> Option<Self> {
        match s {
            "draft" => Some(OrderStatus::Draft),
            "confirmed" => Some(OrderStatus::Confirmed),
            "preparing" => Some(OrderStatus::Preparing),
            "ready" => Some(OrderStatus::Ready),
            "delivered" => Some(OrderStatus::Delivered),
            "cancelled" => Some(OrderStatus::Cancelled),
            _ => None,
        }
    }

    /// Statuses reachable from this one in a single transition.
    pub fn allowed_next(&self) -> &'static [OrderStatus] {
        match self {
            OrderStatus::Draft => &[OrderStatus::Confirmed, OrderStatus::Cancelled],
            OrderStatus::Confirmed => &[OrderStatus::Preparing, OrderStatus::Cancelled],
            OrderStatus::Preparing => &[OrderStatus::Ready, OrderStatus::Cancelled],
            OrderStatus::Ready => &[OrderStatus::Delivered],
            OrderStatus::Delivered | OrderStatus::Cancelled => &[],
        }
    }

    pub fn can_transition(&self, next: OrderStatus) -> bool {
        self.allowed_next().contains(&next)
    }

    /// No transition is defined out of a terminal status.
    pub fn is_terminal(&self) -> bool {
        self.allowed_next().is_empty()
    }
}

impl std::fmt::Display for OrderStatus {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.as_str())
    }
}

/// An order scoped to one restaurant.
///
/// Created in [`OrderStatus::Draft`]; the status only ever changes through
/// the lifecycle service's transition check.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Order {
    pub order_id: Uuid,
    pub restaurant_id: Uuid,
    pub status: OrderStatus,
    pub lines: Vec<OrderLine>,
    pub created_utc: DateTime<Utc>,
    pub updated_utc: DateTime<Utc>,
}

/// One quantity of one menu item within an order.
///
/// `unit_price` is snapshotted from the menu item at creation time and is
/// immune to later price changes. `options` is an opaque selection payload
/// this service does not interpret.
#[derive(Debug, Clone, Serialize, Deserialize, sqlx::FromRow)]
pub struct OrderLine {
    pub line_id: Uuid,
    pub order_id: Uuid,
    pub menu_item_id: Uuid,
    pub quantity: i32,
    pub unit_price: Decimal,
    pub options: Option<serde_json::Value>,
}

/// Input for creating an order.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrder {
    #[validate(length(min = 1), nested)]
    pub lines: Vec<CreateOrderLine>,
}

/// One requested line.
#[derive(Debug, Clone, Serialize, Deserialize, Validate)]
pub struct CreateOrderLine {
    pub menu_item_id: Uuid,
    #[validate(range(min = 1))]
    pub quantity: i32,
    pub options: Option<serde_json::Value>,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_happy_path_transitions() {
        assert!(OrderStatus::Draft.can_transition(OrderStatus::Confirmed));
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Preparing));
        assert!(OrderStatus::Preparing.can_transition(OrderStatus::Ready));
        assert!(OrderStatus::Ready.can_transition(OrderStatus::Delivered));
    }

    #[test]
    fn test_cancellation_paths() {
        assert!(OrderStatus::Draft.can_transition(OrderStatus::Cancelled));
        assert!(OrderStatus::Confirmed.can_transition(OrderStatus::Cancelled));
        assert!(OrderStatus::Preparing.can_transition(OrderStatus::Cancelled));
        // A ready order can no longer be cancelled.
        assert!(!OrderStatus::Ready.can_transition(OrderStatus::Cancelled));
    }

    #[test]
    fn test_terminal_statuses() {
        assert!(OrderStatus::Delivered.is_terminal());
        assert!(OrderStatus::Cancelled.is_terminal());
        for target in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!OrderStatus::Delivered.can_transition(target));
            assert!(!OrderStatus::Cancelled.can_transition(target));
        }
    }

    #[test]
    fn test_nothing_transitions_into_draft() {
        for from in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert!(!from.can_transition(OrderStatus::Draft));
        }
    }

    #[test]
    fn test_no_backwards_transitions() {
        assert!(!OrderStatus::Ready.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Preparing.can_transition(OrderStatus::Confirmed));
        assert!(!OrderStatus::Confirmed.can_transition(OrderStatus::Ready));
    }

    #[test]
    fn test_status_round_trips_through_storage_form() {
        for status in [
            OrderStatus::Draft,
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
            OrderStatus::Cancelled,
        ] {
            assert_eq!(OrderStatus::parse(status.as_str()), Some(status));
        }
        assert_eq!(OrderStatus::parse("shipped"), None);
    }

    #[test]
    fn test_create_order_round_trips_through_json() {
        let input = CreateOrder {
            lines: vec![CreateOrderLine {
                menu_item_id: Uuid::new_v4(),
                quantity: 2,
                options: Some(serde_json::json!({"size": "large"})),
            }],
        };
        let json = serde_json::to_string(&input).unwrap();
        let reread: CreateOrder = serde_json::from_str(&json).unwrap();
        assert_eq!(reread.lines.len(), 1);
        assert_eq!(reread.lines[0].menu_item_id, input.lines[0].menu_item_id);
        assert_eq!(reread.lines[0].quantity, 2);
        assert_eq!(reread.lines[0].options, input.lines[0].options);
    }
}
