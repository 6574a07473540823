//! Order status lifecycle: the transition table enforced against stored
//! state, and lost races surfacing as failures.

mod common;

use common::TestApp;
use restaurant_service::models::order::{CreateOrder, CreateOrderLine, Order};
use restaurant_service::{OrderStatus, ServiceError};
use uuid::Uuid;

async fn seed_order(app: &TestApp) -> Order {
    let restaurant = app.seed_restaurant("bistro").await;
    let dish = app
        .seed_menu_item(restaurant.restaurant_id, "Dish", "9.50", true)
        .await;
    app.orders
        .create_order(
            restaurant.restaurant_id,
            &CreateOrder {
                lines: vec![CreateOrderLine {
                    menu_item_id: dish.menu_item_id,
                    quantity: 1,
                    options: None,
                }],
            },
        )
        .await
        .unwrap()
}

async fn drive_to(app: &TestApp, order: &Order, path: &[OrderStatus]) -> Order {
    let mut current = order.clone();
    for target in path {
        current = app
            .orders
            .transition_order(order.restaurant_id, order.order_id, *target)
            .await
            .unwrap();
    }
    current
}

#[tokio::test]
async fn happy_path_reaches_delivered() {
    let app = TestApp::new();
    let order = seed_order(&app).await;

    let delivered = drive_to(
        &app,
        &order,
        &[
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ],
    )
    .await;
    assert_eq!(delivered.status, OrderStatus::Delivered);
    // Lines and the captured price are untouched by transitions.
    assert_eq!(delivered.lines.len(), 1);
    assert_eq!(delivered.lines[0].unit_price, common::parse_price("9.50"));
}

#[tokio::test]
async fn cancellation_is_reachable_until_ready() {
    let app = TestApp::new();

    let order = seed_order(&app).await;
    let cancelled = drive_to(&app, &order, &[OrderStatus::Cancelled]).await;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);

    let order = seed_order_in(&app, "second").await;
    let cancelled = drive_to(
        &app,
        &order,
        &[OrderStatus::Confirmed, OrderStatus::Cancelled],
    )
    .await;
    assert_eq!(cancelled.status, OrderStatus::Cancelled);
}

async fn seed_order_in(app: &TestApp, slug: &str) -> Order {
    let restaurant = app.seed_restaurant(slug).await;
    let dish = app
        .seed_menu_item(restaurant.restaurant_id, "Dish", "9.50", true)
        .await;
    app.orders
        .create_order(
            restaurant.restaurant_id,
            &CreateOrder {
                lines: vec![CreateOrderLine {
                    menu_item_id: dish.menu_item_id,
                    quantity: 1,
                    options: None,
                }],
            },
        )
        .await
        .unwrap()
}

#[tokio::test]
async fn ready_cannot_go_back_to_confirmed() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    drive_to(
        &app,
        &order,
        &[
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ],
    )
    .await;

    let result = app
        .orders
        .transition_order(order.restaurant_id, order.order_id, OrderStatus::Confirmed)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::InvalidTransition {
            from: OrderStatus::Ready,
            to: OrderStatus::Confirmed,
        })
    ));
}

#[tokio::test]
async fn terminal_states_reject_every_transition() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    drive_to(
        &app,
        &order,
        &[
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
            OrderStatus::Delivered,
        ],
    )
    .await;

    for target in [
        OrderStatus::Draft,
        OrderStatus::Confirmed,
        OrderStatus::Preparing,
        OrderStatus::Ready,
        OrderStatus::Delivered,
        OrderStatus::Cancelled,
    ] {
        let result = app
            .orders
            .transition_order(order.restaurant_id, order.order_id, target)
            .await;
        assert!(matches!(
            result,
            Err(ServiceError::InvalidTransition {
                from: OrderStatus::Delivered,
                ..
            })
        ));
    }
}

#[tokio::test]
async fn transitions_into_draft_are_rejected() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    drive_to(&app, &order, &[OrderStatus::Confirmed]).await;

    let result = app
        .orders
        .transition_order(order.restaurant_id, order.order_id, OrderStatus::Draft)
        .await;
    assert!(matches!(
        result,
        Err(ServiceError::InvalidTransition {
            from: OrderStatus::Confirmed,
            to: OrderStatus::Draft,
        })
    ));
}

#[tokio::test]
async fn unknown_order_is_not_found() {
    let app = TestApp::new();
    let restaurant = app.seed_restaurant("bistro").await;

    let result = app
        .orders
        .transition_order(restaurant.restaurant_id, Uuid::new_v4(), OrderStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound("Order"))));
}

#[tokio::test]
async fn order_under_wrong_restaurant_is_not_found() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    let other = app.seed_restaurant("other").await;

    let result = app
        .orders
        .transition_order(other.restaurant_id, order.order_id, OrderStatus::Confirmed)
        .await;
    assert!(matches!(result, Err(ServiceError::NotFound("Order"))));
}

#[tokio::test]
async fn concurrent_identical_transitions_have_one_winner() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    drive_to(
        &app,
        &order,
        &[
            OrderStatus::Confirmed,
            OrderStatus::Preparing,
            OrderStatus::Ready,
        ],
    )
    .await;

    // ready -> delivered from both sides; delivered is terminal, so the
    // second attempt cannot win regardless of interleaving.
    let (a, b) = tokio::join!(
        app.orders
            .transition_order(order.restaurant_id, order.order_id, OrderStatus::Delivered),
        app.orders
            .transition_order(order.restaurant_id, order.order_id, OrderStatus::Delivered),
    );

    let winners = [&a, &b].iter().filter(|r| r.is_ok()).count();
    assert_eq!(winners, 1, "exactly one transition must win");

    let loser = if a.is_err() { a } else { b };
    match loser {
        Err(ServiceError::InvalidTransition { from, .. }) => {
            assert_eq!(from, OrderStatus::Delivered)
        }
        Err(ServiceError::Conflict(_)) => {}
        other => panic!("loser must fail with InvalidTransition or Conflict, got {other:?}"),
    }

    let reread = app
        .orders
        .order(order.restaurant_id, order.order_id)
        .await
        .unwrap();
    assert_eq!(reread.status, OrderStatus::Delivered);
}

#[tokio::test]
async fn diverging_concurrent_transitions_never_apply_a_stale_read() {
    let app = TestApp::new();
    let order = seed_order(&app).await;
    drive_to(&app, &order, &[OrderStatus::Confirmed]).await;

    // confirmed -> preparing vs confirmed -> cancelled. At least one must
    // win; if both succeed the interleaving was the legal chain
    // confirmed -> preparing -> cancelled, so the final status always
    // reflects a valid path.
    let (a, b) = tokio::join!(
        app.orders
            .transition_order(order.restaurant_id, order.order_id, OrderStatus::Preparing),
        app.orders
            .transition_order(order.restaurant_id, order.order_id, OrderStatus::Cancelled),
    );

    assert!(a.is_ok() || b.is_ok());
    let final_status = app
        .orders
        .order(order.restaurant_id, order.order_id)
        .await
        .unwrap()
        .status;
    match (a.is_ok(), b.is_ok()) {
        (true, true) => assert_eq!(final_status, OrderStatus::Cancelled),
        (true, false) => {
            assert_eq!(final_status, OrderStatus::Preparing);
            assert!(matches!(
                b,
                Err(ServiceError::InvalidTransition { .. }) | Err(ServiceError::Conflict(_))
            ));
        }
        (false, true) => {
            assert_eq!(final_status, OrderStatus::Cancelled);
            assert!(matches!(
                a,
                Err(ServiceError::InvalidTransition { .. }) | Err(ServiceError::Conflict(_))
            ));
        }
        (false, false) => unreachable!(),
    }
}
