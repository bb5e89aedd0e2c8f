//! Admin oversight: aggregate read views and the approval workflow over
//! restaurants and riders.

use axum::Json;
use axum::extract::{Path, State};
use serde::{Deserialize, Serialize};

use crate::api::orders::order_views;
use crate::api::{AppState, parse_object_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::model::{ApprovalStatus, OrderStatus, OrderView, RestaurantView, Role, UserView};

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct DashboardStats {
    pub total_users: usize,
    pub total_restaurants: usize,
    pub total_orders: usize,
    pub total_riders: usize,
    pub pending_restaurants: usize,
    pub pending_riders: usize,
    pub approved_restaurants: usize,
    pub approved_riders: usize,
    pub total_revenue: f64,
    pub completed_orders: usize,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct UsersResponse {
    pub users: Vec<UserView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct AdminOrdersResponse {
    pub orders: Vec<OrderView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantsResponse {
    pub restaurants: Vec<RestaurantView>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RidersResponse {
    pub riders: Vec<UserView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PendingApprovalsResponse {
    pub pending_restaurants: Vec<RestaurantView>,
    pub pending_riders: Vec<UserView>,
}

#[derive(Debug, Deserialize)]
pub struct ApprovalRequest {
    pub status: String,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantApprovalResponse {
    pub message: String,
    pub restaurant: RestaurantView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RiderApprovalResponse {
    pub message: String,
    pub rider: UserView,
}

/// Parse an approval decision body; only `approved` and `rejected` are legal.
fn parse_decision(raw: &str) -> ApiResult<ApprovalStatus> {
    match raw.parse::<ApprovalStatus>() {
        Ok(status @ (ApprovalStatus::Approved | ApprovalStatus::Rejected)) => Ok(status),
        _ => Err(ApiError::Validation(
            "invalid status, use 'approved' or 'rejected'".to_string(),
        )),
    }
}

pub async fn dashboard_stats(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<DashboardStats>> {
    actor.require_role(Role::Admin, "view dashboard statistics")?;

    let users = state.identity.all_users().await?;
    let restaurants = state.catalog.all_restaurants().await?;
    let orders = state.orders.all_orders().await?;

    let riders: Vec<_> = users
        .iter()
        .filter(|user| user.role == Role::Rider)
        .collect();
    let delivered: Vec<_> = orders
        .iter()
        .filter(|order| order.status == OrderStatus::Delivered)
        .collect();

    Ok(Json(DashboardStats {
        total_users: users.len(),
        total_restaurants: restaurants.len(),
        total_orders: orders.len(),
        total_riders: riders.len(),
        pending_restaurants: restaurants
            .iter()
            .filter(|restaurant| restaurant.status == ApprovalStatus::Pending)
            .count(),
        pending_riders: riders
            .iter()
            .filter(|rider| rider.status == ApprovalStatus::Pending)
            .count(),
        approved_restaurants: restaurants
            .iter()
            .filter(|restaurant| restaurant.status == ApprovalStatus::Approved)
            .count(),
        approved_riders: riders
            .iter()
            .filter(|rider| rider.status == ApprovalStatus::Approved)
            .count(),
        total_revenue: delivered.iter().map(|order| order.total_amount).sum(),
        completed_orders: delivered.len(),
    }))
}

pub async fn all_users(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<UsersResponse>> {
    actor.require_role(Role::Admin, "list users")?;
    let users = state.identity.all_users().await?;
    Ok(Json(UsersResponse {
        users: users.iter().map(UserView::from).collect(),
    }))
}

pub async fn all_orders(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<AdminOrdersResponse>> {
    actor.require_role(Role::Admin, "list orders")?;
    let orders = state.orders.all_orders().await?;
    Ok(Json(AdminOrdersResponse {
        orders: order_views(&state, &orders).await?,
    }))
}

pub async fn all_restaurants(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<RestaurantsResponse>> {
    actor.require_role(Role::Admin, "list restaurants")?;
    let restaurants = state.catalog.all_restaurants().await?;
    Ok(Json(RestaurantsResponse {
        restaurants: restaurants.iter().map(RestaurantView::from).collect(),
    }))
}

pub async fn all_riders(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<RidersResponse>> {
    actor.require_role(Role::Admin, "list riders")?;
    let riders = state.identity.riders().await?;
    Ok(Json(RidersResponse {
        riders: riders.iter().map(UserView::from).collect(),
    }))
}

pub async fn pending_approvals(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<PendingApprovalsResponse>> {
    actor.require_role(Role::Admin, "view pending approvals")?;
    let pending_restaurants = state.catalog.pending_restaurants().await?;
    let pending_riders = state.identity.pending_riders().await?;
    Ok(Json(PendingApprovalsResponse {
        pending_restaurants: pending_restaurants.iter().map(RestaurantView::from).collect(),
        pending_riders: pending_riders.iter().map(UserView::from).collect(),
    }))
}

pub async fn update_restaurant_status(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> ApiResult<Json<RestaurantApprovalResponse>> {
    actor.require_role(Role::Admin, "approve restaurants")?;
    let id = parse_object_id(&id)?;
    let decision = parse_decision(&request.status)?;

    let restaurant = state
        .catalog
        .set_restaurant_status(id, decision, decision == ApprovalStatus::Approved)
        .await?;

    // Second half of the dual-write: mirror the decision onto the owner's
    // user record. There is no transaction spanning the two documents; a
    // failure here is reported and left for a retry, not rolled back.
    if let Err(err) = state
        .identity
        .set_user_status(restaurant.owner_id, decision)
        .await
    {
        tracing::error!(
            error = %err,
            restaurant_id = %id,
            owner_id = %restaurant.owner_id,
            "restaurant status updated but owner status update failed"
        );
        return Err(ApiError::Upstream(
            "restaurant updated but owner approval update failed".to_string(),
        ));
    }

    tracing::info!(restaurant_id = %id, status = %decision, "restaurant approval updated");
    Ok(Json(RestaurantApprovalResponse {
        message: format!("Restaurant {decision} successfully"),
        restaurant: RestaurantView::from(&restaurant),
    }))
}

pub async fn update_rider_status(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<String>,
    Json(request): Json<ApprovalRequest>,
) -> ApiResult<Json<RiderApprovalResponse>> {
    actor.require_role(Role::Admin, "approve riders")?;
    let id = parse_object_id(&id)?;
    let decision = parse_decision(&request.status)?;

    let rider = state
        .identity
        .user_by_id(id)
        .await?
        .filter(|user| user.role == Role::Rider)
        .ok_or_else(|| ApiError::NotFound("rider not found".to_string()))?;

    state.identity.set_user_status(rider._id, decision).await?;
    tracing::info!(rider_id = %id, status = %decision, "rider approval updated");

    let mut rider = rider;
    rider.status = decision;
    Ok(Json(RiderApprovalResponse {
        message: format!("Rider {decision} successfully"),
        rider: UserView::from(&rider),
    }))
}
