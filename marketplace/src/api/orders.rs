//! Order lifecycle handlers: creation, status transitions, rider assignment,
//! and the filtered order reads.

use std::collections::HashMap;

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use chrono::Utc;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, parse_object_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::model::mongo_model::Order;
use crate::model::{
    CustomerSummary, OrderItem, OrderStatus, OrderView, RestaurantSummary, RiderSummary, Role,
};
use crate::policy;
use crate::relay::{StatusEvent, order_channel};

const PLACEHOLDER_TEXT: &str = "Not specified";

// --- Requests and responses -------------------------------------------------

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderItemRequest {
    pub menu_item_id: String,
    pub name: String,
    pub price: f64,
    #[serde(default = "default_quantity")]
    pub quantity: u32,
}

fn default_quantity() -> u32 {
    1
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CreateOrderRequest {
    pub restaurant_id: Option<String>,
    #[serde(default)]
    pub items: Vec<CreateOrderItemRequest>,
    pub total_amount: Option<f64>,
    pub delivery_address: Option<String>,
    pub special_instructions: Option<String>,
}

#[derive(Debug, Deserialize)]
pub struct UpdateOrderStatusRequest {
    pub status: String,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AssignRiderRequest {
    pub rider_id: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderResponse {
    pub message: String,
    pub order: OrderView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrdersResponse {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct DeliveriesResponse {
    pub deliveries: Vec<OrderView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct HistoryResponse {
    pub history: Vec<OrderView>,
}

// --- View assembly ----------------------------------------------------------

/// Join one order with its customer/restaurant/rider summaries.
pub(crate) async fn order_view(state: &AppState, order: &Order) -> ApiResult<OrderView> {
    let mut views = order_views(state, std::slice::from_ref(order)).await?;
    Ok(views.remove(0))
}

/// Join a batch of orders with readable summaries, resolving each referenced
/// principal/restaurant once per call.
pub(crate) async fn order_views(state: &AppState, orders: &[Order]) -> ApiResult<Vec<OrderView>> {
    let mut customers: HashMap<ObjectId, CustomerSummary> = HashMap::new();
    let mut restaurants: HashMap<ObjectId, RestaurantSummary> = HashMap::new();
    let mut riders: HashMap<ObjectId, RiderSummary> = HashMap::new();

    let mut views = Vec::with_capacity(orders.len());
    for order in orders {
        if !customers.contains_key(&order.customer_id) {
            let user = state
                .identity
                .user_by_id(order.customer_id)
                .await?
                .ok_or_else(|| {
                    ApiError::Upstream(format!(
                        "order {} references missing customer",
                        order._id.to_hex()
                    ))
                })?;
            customers.insert(order.customer_id, CustomerSummary::from(&user));
        }
        if !restaurants.contains_key(&order.restaurant_id) {
            let restaurant = state
                .catalog
                .restaurant_by_id(order.restaurant_id)
                .await?
                .ok_or_else(|| {
                    ApiError::Upstream(format!(
                        "order {} references missing restaurant",
                        order._id.to_hex()
                    ))
                })?;
            restaurants.insert(order.restaurant_id, RestaurantSummary::from(&restaurant));
        }
        if let Some(rider_id) = order.rider_id {
            if !riders.contains_key(&rider_id) {
                let rider = state.identity.user_by_id(rider_id).await?.ok_or_else(|| {
                    ApiError::Upstream(format!(
                        "order {} references missing rider",
                        order._id.to_hex()
                    ))
                })?;
                riders.insert(rider_id, RiderSummary::from(&rider));
            }
        }

        views.push(OrderView::assemble(
            order,
            customers[&order.customer_id].clone(),
            restaurants[&order.restaurant_id].clone(),
            order.rider_id.map(|id| riders[&id].clone()),
        ));
    }
    Ok(views)
}

/// Participant gate shared by the single-order read and the location reads:
/// the order's customer, its restaurant's owner, its assigned rider, or an
/// admin. Restaurant ownership goes through the owned-restaurant lookup.
pub(crate) async fn ensure_order_participant(
    state: &AppState,
    actor: &AuthUser,
    order: &Order,
) -> ApiResult<()> {
    if actor.role == Role::Admin {
        return Ok(());
    }
    if order.customer_id == actor.id {
        return Ok(());
    }
    if order.rider_id == Some(actor.id) {
        return Ok(());
    }
    if actor.role == Role::Restaurant {
        if let Some(owned) = state.catalog.restaurant_by_owner(actor.id).await? {
            if owned._id == order.restaurant_id {
                return Ok(());
            }
        }
    }
    Err(ApiError::Authorization(
        "not authorized to view this order".to_string(),
    ))
}

// --- Handlers ---------------------------------------------------------------

pub async fn create_order(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(request): Json<CreateOrderRequest>,
) -> ApiResult<(StatusCode, Json<OrderResponse>)> {
    actor.require_role(Role::Customer, "place orders")?;

    let (Some(restaurant_id), Some(total_amount)) =
        (request.restaurant_id.as_deref(), request.total_amount)
    else {
        return Err(ApiError::Validation("missing required fields".to_string()));
    };
    if request.items.is_empty() || total_amount <= 0.0 {
        return Err(ApiError::Validation("missing required fields".to_string()));
    }

    let restaurant_id = parse_object_id(restaurant_id)?;
    state
        .catalog
        .restaurant_by_id(restaurant_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("restaurant not found".to_string()))?;

    let mut items = Vec::with_capacity(request.items.len());
    for item in &request.items {
        if item.quantity < 1 {
            return Err(ApiError::Validation(
                "item quantity must be at least 1".to_string(),
            ));
        }
        items.push(OrderItem {
            menu_item_id: parse_object_id(&item.menu_item_id)?,
            name: item.name.clone(),
            price: item.price,
            quantity: item.quantity,
        });
    }

    let delivery_address = request
        .delivery_address
        .filter(|address| !address.trim().is_empty())
        .unwrap_or_else(|| PLACEHOLDER_TEXT.to_string());
    let customer_phone = if actor.phone.trim().is_empty() {
        PLACEHOLDER_TEXT.to_string()
    } else {
        actor.phone.clone()
    };

    let now = BsonDateTime::now();
    let order = Order {
        _id: ObjectId::new(),
        customer_id: actor.id,
        restaurant_id,
        rider_id: None,
        items,
        total_amount,
        status: OrderStatus::Pending,
        delivery_address,
        customer_phone,
        special_instructions: request.special_instructions.unwrap_or_default(),
        position_updates: Vec::new(),
        delivered_at: None,
        created_at: now,
        updated_at: now,
    };
    state.orders.insert_order(&order).await?;
    tracing::info!(order_id = %order._id, customer_id = %actor.id, "order placed");

    let view = order_view(&state, &order).await?;
    Ok((
        StatusCode::CREATED,
        Json(OrderResponse {
            message: "Order placed successfully".to_string(),
            order: view,
        }),
    ))
}

pub async fn update_order_status(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(order_id): Path<String>,
    Json(request): Json<UpdateOrderStatusRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order_id = parse_object_id(&order_id)?;
    let target: OrderStatus = request
        .status
        .parse()
        .map_err(|_| ApiError::Validation(format!("invalid status value '{}'", request.status)))?;

    let order = state
        .orders
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    match actor.role {
        Role::Restaurant => {
            // Resolve the restaurant this actor owns; actor ids are never
            // compared to the order's restaurant reference directly.
            let owned = state
                .catalog
                .restaurant_by_owner(actor.id)
                .await?
                .ok_or_else(|| {
                    ApiError::NotFound("no restaurant registered for this user".to_string())
                })?;
            if owned._id != order.restaurant_id {
                return Err(ApiError::Authorization(
                    "order does not belong to this restaurant".to_string(),
                ));
            }
        }
        Role::Rider => {
            if order.rider_id != Some(actor.id) {
                return Err(ApiError::Authorization(
                    "you are not assigned to this delivery".to_string(),
                ));
            }
        }
        _ => {
            return Err(ApiError::Authorization(
                "user role not authorized to update order status".to_string(),
            ));
        }
    }

    policy::authorize_transition(actor.role, order.status, target)?;

    let delivered_at = (target == OrderStatus::Delivered).then(Utc::now);
    let updated = state.orders.set_status(order_id, target, delivered_at).await?;
    tracing::info!(order_id = %order_id, status = %target, "order status updated");

    let event = StatusEvent {
        order_id: order_id.to_hex(),
        status: target,
        timestamp: Utc::now(),
    };
    if let Ok(payload) = serde_json::to_value(&event) {
        state.relay.publish(&order_channel(&order_id), payload);
    }

    let view = order_view(&state, &updated).await?;
    Ok(Json(OrderResponse {
        message: format!("Order status updated to '{target}'"),
        order: view,
    }))
}

pub async fn assign_rider(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(order_id): Path<String>,
    Json(request): Json<AssignRiderRequest>,
) -> ApiResult<Json<OrderResponse>> {
    let order_id = parse_object_id(&order_id)?;
    let rider_id = parse_object_id(&request.rider_id)?;

    // A rider may only accept on their own behalf
    if actor.role != Role::Rider || actor.id != rider_id {
        return Err(ApiError::Authorization(
            "cannot accept a delivery on behalf of a different user".to_string(),
        ));
    }

    match state.orders.try_assign_rider(order_id, rider_id).await? {
        Some(order) => {
            tracing::info!(order_id = %order_id, rider_id = %rider_id, "delivery accepted");
            let view = order_view(&state, &order).await?;
            Ok(Json(OrderResponse {
                message: "Delivery accepted".to_string(),
                order: view,
            }))
        }
        None => match state.orders.order_by_id(order_id).await? {
            None => Err(ApiError::NotFound("order not found".to_string())),
            Some(_) => Err(ApiError::Conflict(
                "order is not available for assignment".to_string(),
            )),
        },
    }
}

pub async fn available_deliveries(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<OrdersResponse>> {
    actor.require_role(Role::Rider, "view available deliveries")?;
    let orders = state.orders.available_deliveries().await?;
    Ok(Json(OrdersResponse {
        orders: order_views(&state, &orders).await?,
    }))
}

pub async fn deliveries_by_rider(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(rider_id): Path<String>,
) -> ApiResult<Json<DeliveriesResponse>> {
    let rider_id = parse_object_id(&rider_id)?;
    if actor.role != Role::Rider || actor.id != rider_id {
        return Err(ApiError::Authorization(
            "you can only view your own assigned deliveries".to_string(),
        ));
    }
    let orders = state.orders.deliveries_by_rider(rider_id).await?;
    Ok(Json(DeliveriesResponse {
        deliveries: order_views(&state, &orders).await?,
    }))
}

pub async fn delivery_history_by_rider(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(rider_id): Path<String>,
) -> ApiResult<Json<HistoryResponse>> {
    let rider_id = parse_object_id(&rider_id)?;
    if actor.role != Role::Rider || actor.id != rider_id {
        return Err(ApiError::Authorization(
            "you can only view your own delivery history".to_string(),
        ));
    }
    let orders = state.orders.delivery_history_by_rider(rider_id).await?;
    Ok(Json(HistoryResponse {
        history: order_views(&state, &orders).await?,
    }))
}

pub async fn orders_by_restaurant(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(restaurant_id): Path<String>,
) -> ApiResult<Json<OrdersResponse>> {
    let restaurant_id = parse_object_id(&restaurant_id)?;
    if actor.role != Role::Admin {
        let owned = state
            .catalog
            .restaurant_by_owner(actor.id)
            .await?
            .ok_or_else(|| {
                ApiError::Authorization(
                    "you don't have access to this restaurant's orders".to_string(),
                )
            })?;
        if owned._id != restaurant_id {
            return Err(ApiError::Authorization(
                "you don't have access to this restaurant's orders".to_string(),
            ));
        }
    }
    let orders = state.orders.orders_by_restaurant(restaurant_id).await?;
    Ok(Json(OrdersResponse {
        orders: order_views(&state, &orders).await?,
    }))
}

pub async fn orders_by_customer(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(customer_id): Path<String>,
) -> ApiResult<Json<OrdersResponse>> {
    let customer_id = parse_object_id(&customer_id)?;
    if actor.role != Role::Admin && actor.id != customer_id {
        return Err(ApiError::Authorization(
            "you can only view your own orders".to_string(),
        ));
    }
    let orders = state.orders.orders_by_customer(customer_id).await?;
    Ok(Json(OrdersResponse {
        orders: order_views(&state, &orders).await?,
    }))
}

pub async fn order_by_id(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderView>> {
    let order_id = parse_object_id(&order_id)?;
    let order = state
        .orders
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;
    ensure_order_participant(&state, &actor, &order).await?;
    Ok(Json(order_view(&state, &order).await?))
}
