use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use mongodb::bson::oid::ObjectId;

use marketplace::api::orders::{
    CreateOrderItemRequest, CreateOrderRequest, UpdateOrderStatusRequest, available_deliveries,
    create_order, order_by_id, orders_by_customer, orders_by_restaurant, update_order_status,
};
use marketplace::error::ApiError;
use marketplace::model::OrderStatus;
use marketplace::model::mongo_model::{User, chrono_datetime};
use marketplace::model::{ApprovalStatus, Role};

use super::mocks::*;

fn item(name: &str, price: f64, quantity: u32) -> CreateOrderItemRequest {
    CreateOrderItemRequest {
        menu_item_id: ObjectId::new().to_hex(),
        name: name.to_string(),
        price,
        quantity,
    }
}

fn create_request(restaurant_id: ObjectId, items: Vec<CreateOrderItemRequest>, total: f64) -> CreateOrderRequest {
    CreateOrderRequest {
        restaurant_id: Some(restaurant_id.to_hex()),
        items,
        total_amount: Some(total),
        delivery_address: Some("56 Quezon Blvd".to_string()),
        special_instructions: None,
    }
}

async fn set_status(
    ctx: &TestContext,
    as_user: &User,
    order_id: ObjectId,
    status: &str,
) -> Result<Json<marketplace::api::orders::OrderResponse>, ApiError> {
    update_order_status(
        State(ctx.state.clone()),
        actor(as_user),
        Path(order_id.to_hex()),
        Json(UpdateOrderStatusRequest {
            status: status.to_string(),
        }),
    )
    .await
}

#[tokio::test]
async fn create_order_round_trips_items_and_total() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;

    let request = create_request(
        restaurant._id,
        vec![item("Burger", 100.0, 2), item("Fries", 50.0, 1)],
        250.0,
    );
    let (status, Json(response)) =
        create_order(State(ctx.state.clone()), actor(&customer), Json(request))
            .await
            .expect("order should be created");
    assert_eq!(status, StatusCode::CREATED);
    assert_eq!(response.order.status, OrderStatus::Pending);
    assert!(response.order.rider.is_none());

    // Read it back through the single-order endpoint
    let Json(fetched) = order_by_id(
        State(ctx.state.clone()),
        actor(&customer),
        Path(response.order.id.clone()),
    )
    .await
    .expect("order should be readable by its customer");

    assert_eq!(fetched.total_amount, 250.0);
    assert_eq!(fetched.items.len(), 2);
    assert_eq!(fetched.items[0].name, "Burger");
    assert_eq!(fetched.items[0].price, 100.0);
    assert_eq!(fetched.items[0].quantity, 2);
    assert_eq!(fetched.items[1].price, 50.0);
    assert_eq!(fetched.items[1].quantity, 1);
    assert_eq!(fetched.customer.id, customer._id.to_hex());
    assert_eq!(fetched.restaurant.id, restaurant._id.to_hex());
}

#[tokio::test]
async fn create_order_rejects_empty_items() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    seed_user(&ctx, &customer).await;

    let request = create_request(ObjectId::new(), vec![], 100.0);
    let err = create_order(State(ctx.state.clone()), actor(&customer), Json(request))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn create_order_rejects_missing_restaurant_reference() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    seed_user(&ctx, &customer).await;

    let mut request = create_request(ObjectId::new(), vec![item("Burger", 100.0, 1)], 100.0);
    request.restaurant_id = None;
    let err = create_order(State(ctx.state.clone()), actor(&customer), Json(request))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn create_order_requires_customer_role() {
    let ctx = test_context();
    let rider = user_fixture(Role::Rider, ApprovalStatus::Approved);
    seed_user(&ctx, &rider).await;

    let request = create_request(ObjectId::new(), vec![item("Burger", 100.0, 1)], 100.0);
    let err = create_order(State(ctx.state.clone()), actor(&rider), Json(request))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn create_order_defaults_delivery_address_to_placeholder() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;

    let mut request = create_request(restaurant._id, vec![item("Burger", 100.0, 1)], 100.0);
    request.delivery_address = None;
    let (_, Json(response)) =
        create_order(State(ctx.state.clone()), actor(&customer), Json(request))
            .await
            .expect("order should be created");
    assert_eq!(response.order.delivery_address, "Not specified");
}

#[tokio::test]
async fn full_lifecycle_scenario() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let other_owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let rider_d = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let rider_e = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    let other_restaurant = restaurant_fixture(&other_owner);
    for user in [&customer, &owner, &other_owner, &rider_d, &rider_e] {
        seed_user(&ctx, user).await;
    }
    seed_restaurant(&ctx, &restaurant).await;
    seed_restaurant(&ctx, &other_restaurant).await;

    let request = create_request(restaurant._id, vec![item("Sisig", 300.0, 1)], 300.0);
    let (_, Json(created)) =
        create_order(State(ctx.state.clone()), actor(&customer), Json(request))
            .await
            .expect("order created");
    let order_id = ObjectId::parse_str(&created.order.id).unwrap();

    // The owning restaurant moves the order forward
    let Json(updated) = set_status(&ctx, &owner, order_id, "preparing")
        .await
        .expect("owner may set preparing");
    assert_eq!(updated.order.status, OrderStatus::Preparing);

    // A different restaurant's owner is rejected
    let err = set_status(&ctx, &other_owner, order_id, "ready")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    let Json(updated) = set_status(&ctx, &owner, order_id, "ready")
        .await
        .expect("owner may set ready");
    assert_eq!(updated.order.status, OrderStatus::Ready);

    // Rider D accepts; rider E is too late
    use marketplace::api::orders::{AssignRiderRequest, assign_rider};
    let Json(assigned) = assign_rider(
        State(ctx.state.clone()),
        actor(&rider_d),
        Path(order_id.to_hex()),
        Json(AssignRiderRequest {
            rider_id: rider_d._id.to_hex(),
        }),
    )
    .await
    .expect("rider D accepts the delivery");
    assert_eq!(
        assigned.order.rider.as_ref().map(|r| r.id.clone()),
        Some(rider_d._id.to_hex())
    );
    // Assignment does not advance the status by itself
    assert_eq!(assigned.order.status, OrderStatus::Ready);

    let err = assign_rider(
        State(ctx.state.clone()),
        actor(&rider_e),
        Path(order_id.to_hex()),
        Json(AssignRiderRequest {
            rider_id: rider_e._id.to_hex(),
        }),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    let Json(delivered) = set_status(&ctx, &rider_d, order_id, "delivered")
        .await
        .expect("assigned rider delivers");
    assert_eq!(delivered.order.status, OrderStatus::Delivered);
    let delivered_at = delivered.order.delivered_at.expect("deliveredAt stamped");
    assert!(delivered_at >= delivered.order.created_at);
}

#[tokio::test]
async fn restaurant_cannot_set_rider_statuses() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    seed_order(&ctx, &order).await;

    for target in ["picked_up", "out_for_delivery", "delivered"] {
        let err = set_status(&ctx, &owner, order._id, target).await.unwrap_err();
        assert!(
            matches!(err, ApiError::Authorization(_)),
            "restaurant setting '{target}' must be an authorization failure"
        );
    }
}

#[tokio::test]
async fn customer_cannot_update_status() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    let err = set_status(&ctx, &customer, order._id, "accepted")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn unassigned_rider_cannot_update_status() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let rider = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_user(&ctx, &rider).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    seed_order(&ctx, &order).await;

    let err = set_status(&ctx, &rider, order._id, "picked_up")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn delivered_is_terminal_and_stamped_once() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let rider = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_user(&ctx, &rider).await;
    seed_restaurant(&ctx, &restaurant).await;
    let mut order = order_fixture(&customer, &restaurant, OrderStatus::OutForDelivery);
    order.rider_id = Some(rider._id);
    seed_order(&ctx, &order).await;

    let Json(delivered) = set_status(&ctx, &rider, order._id, "delivered")
        .await
        .expect("first delivery succeeds");
    let first_stamp = delivered.order.delivered_at.expect("deliveredAt stamped");

    let err = set_status(&ctx, &rider, order._id, "delivered")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));

    // The stamp did not move
    let stored = ctx
        .state
        .orders
        .order_by_id(order._id)
        .await
        .unwrap()
        .unwrap();
    assert_eq!(chrono_datetime(stored.delivered_at.unwrap()), first_stamp);
}

#[tokio::test]
async fn rejected_is_terminal() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    set_status(&ctx, &owner, order._id, "rejected")
        .await
        .expect("owner may reject a pending order");

    for target in ["accepted", "preparing", "ready"] {
        let err = set_status(&ctx, &owner, order._id, target).await.unwrap_err();
        assert!(matches!(err, ApiError::Conflict(_)));
    }
}

#[tokio::test]
async fn status_cannot_move_backwards() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    seed_order(&ctx, &order).await;

    let err = set_status(&ctx, &owner, order._id, "preparing")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Conflict(_)));
}

#[tokio::test]
async fn invalid_status_token_is_a_validation_error() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    let err = set_status(&ctx, &owner, order._id, "on_the_way")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Validation(_)));
}

#[tokio::test]
async fn updating_unknown_order_is_not_found() {
    let ctx = test_context();
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &owner).await;
    seed_restaurant(&ctx, &restaurant).await;

    let err = set_status(&ctx, &owner, ObjectId::new(), "accepted")
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::NotFound(_)));
}

#[tokio::test]
async fn available_deliveries_returns_ready_unassigned_oldest_first() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let rider = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let other_rider = user_fixture(Role::Rider, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    seed_user(&ctx, &customer).await;
    seed_user(&ctx, &owner).await;
    seed_user(&ctx, &rider).await;
    seed_user(&ctx, &other_rider).await;
    seed_restaurant(&ctx, &restaurant).await;

    let mut older_ready = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    backdate(&mut older_ready, 300);
    let mut newer_ready = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    backdate(&mut newer_ready, 60);
    let mut assigned = order_fixture(&customer, &restaurant, OrderStatus::Ready);
    assigned.rider_id = Some(other_rider._id);
    let pending = order_fixture(&customer, &restaurant, OrderStatus::Pending);

    for order in [&older_ready, &newer_ready, &assigned, &pending] {
        seed_order(&ctx, order).await;
    }

    let Json(response) = available_deliveries(State(ctx.state.clone()), actor(&rider))
        .await
        .expect("riders may list available deliveries");

    let ids: Vec<_> = response.orders.iter().map(|order| order.id.clone()).collect();
    assert_eq!(ids, vec![older_ready._id.to_hex(), newer_ready._id.to_hex()]);
    for order in &response.orders {
        assert_eq!(order.status, OrderStatus::Ready);
        assert!(order.rider.is_none());
    }
}

#[tokio::test]
async fn available_deliveries_requires_rider_role() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    seed_user(&ctx, &customer).await;

    let err = available_deliveries(State(ctx.state.clone()), actor(&customer))
        .await
        .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn customer_orders_are_scoped_to_the_customer_or_admin() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let other_customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let admin = user_fixture(Role::Admin, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    for user in [&customer, &other_customer, &admin, &owner] {
        seed_user(&ctx, user).await;
    }
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    let Json(own) = orders_by_customer(
        State(ctx.state.clone()),
        actor(&customer),
        Path(customer._id.to_hex()),
    )
    .await
    .expect("a customer may list their own orders");
    assert_eq!(own.orders.len(), 1);

    let err = orders_by_customer(
        State(ctx.state.clone()),
        actor(&other_customer),
        Path(customer._id.to_hex()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));

    let Json(as_admin) = orders_by_customer(
        State(ctx.state.clone()),
        actor(&admin),
        Path(customer._id.to_hex()),
    )
    .await
    .expect("an admin may list any customer's orders");
    assert_eq!(as_admin.orders.len(), 1);
}

#[tokio::test]
async fn restaurant_orders_require_ownership() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let other_owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    let other_restaurant = restaurant_fixture(&other_owner);
    for user in [&customer, &owner, &other_owner] {
        seed_user(&ctx, user).await;
    }
    seed_restaurant(&ctx, &restaurant).await;
    seed_restaurant(&ctx, &other_restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    let Json(own) = orders_by_restaurant(
        State(ctx.state.clone()),
        actor(&owner),
        Path(restaurant._id.to_hex()),
    )
    .await
    .expect("the owner may list their restaurant's orders");
    assert_eq!(own.orders.len(), 1);

    let err = orders_by_restaurant(
        State(ctx.state.clone()),
        actor(&other_owner),
        Path(restaurant._id.to_hex()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}

#[tokio::test]
async fn single_order_read_is_limited_to_participants() {
    let ctx = test_context();
    let customer = user_fixture(Role::Customer, ApprovalStatus::Active);
    let bystander = user_fixture(Role::Customer, ApprovalStatus::Active);
    let owner = user_fixture(Role::Restaurant, ApprovalStatus::Approved);
    let restaurant = restaurant_fixture(&owner);
    for user in [&customer, &bystander, &owner] {
        seed_user(&ctx, user).await;
    }
    seed_restaurant(&ctx, &restaurant).await;
    let order = order_fixture(&customer, &restaurant, OrderStatus::Pending);
    seed_order(&ctx, &order).await;

    order_by_id(
        State(ctx.state.clone()),
        actor(&owner),
        Path(order._id.to_hex()),
    )
    .await
    .expect("the restaurant owner is a participant");

    let err = order_by_id(
        State(ctx.state.clone()),
        actor(&bystander),
        Path(order._id.to_hex()),
    )
    .await
    .unwrap_err();
    assert!(matches!(err, ApiError::Authorization(_)));
}
