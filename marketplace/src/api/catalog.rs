//! Restaurant and menu handlers. Menu mutations are scoped to the actor's
//! owned restaurant, resolved by lookup rather than id comparison.

use axum::Json;
use axum::extract::{Path, State};
use axum::http::StatusCode;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::api::{AppState, parse_object_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::model::mongo_model::{MenuItem, Restaurant};
use crate::model::{ApprovalStatus, MenuItemUpdate, MenuItemView, RestaurantView, Role};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RegisterRestaurantRequest {
    pub name: String,
    #[serde(default)]
    pub address: String,
    #[serde(default)]
    pub description: String,
    #[serde(default)]
    pub category: String,
    pub image: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct RestaurantResponse {
    pub message: String,
    pub restaurant: RestaurantView,
}

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct AddMenuItemRequest {
    pub name: String,
    #[serde(default)]
    pub description: String,
    pub price: Option<f64>,
    #[serde(default)]
    pub category: String,
    pub image: Option<String>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemResponse {
    pub message: String,
    pub menu_item: MenuItemView,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct MenuItemDeletedResponse {
    pub message: String,
}

pub async fn register_restaurant(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(request): Json<RegisterRestaurantRequest>,
) -> ApiResult<(StatusCode, Json<RestaurantResponse>)> {
    if request.name.trim().is_empty() {
        return Err(ApiError::Validation(
            "restaurant name is required".to_string(),
        ));
    }
    if state.catalog.restaurant_by_owner(actor.id).await?.is_some() {
        return Err(ApiError::Validation(
            "you already have a registered restaurant".to_string(),
        ));
    }

    let now = BsonDateTime::now();
    let restaurant = Restaurant {
        _id: ObjectId::new(),
        owner_id: actor.id,
        name: request.name.trim().to_string(),
        description: request.description,
        phone: actor.phone.clone(),
        address: request.address,
        category: request.category,
        latitude: request.latitude,
        longitude: request.longitude,
        image: request.image.unwrap_or_default(),
        status: ApprovalStatus::Pending,
        is_active: true,
        created_at: now,
        updated_at: now,
    };
    state.catalog.insert_restaurant(&restaurant).await?;
    tracing::info!(restaurant_id = %restaurant._id, owner_id = %actor.id, "restaurant registered");

    Ok((
        StatusCode::CREATED,
        Json(RestaurantResponse {
            message: "Restaurant registered successfully! Waiting for admin approval.".to_string(),
            restaurant: RestaurantView::from(&restaurant),
        }),
    ))
}

/// Customer-facing listing: approved, active restaurants only.
pub async fn list_restaurants(
    State(state): State<AppState>,
    _actor: AuthUser,
) -> ApiResult<Json<Vec<RestaurantView>>> {
    let restaurants = state.catalog.approved_restaurants().await?;
    Ok(Json(restaurants.iter().map(RestaurantView::from).collect()))
}

pub async fn my_restaurants(
    State(state): State<AppState>,
    actor: AuthUser,
) -> ApiResult<Json<Vec<RestaurantView>>> {
    let restaurants = state
        .catalog
        .restaurant_by_owner(actor.id)
        .await?
        .map(|restaurant| vec![RestaurantView::from(&restaurant)])
        .unwrap_or_default();
    Ok(Json(restaurants))
}

pub async fn restaurant_by_id(
    State(state): State<AppState>,
    _actor: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<RestaurantView>> {
    let id = parse_object_id(&id)?;
    let restaurant = state
        .catalog
        .restaurant_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("restaurant not found".to_string()))?;
    Ok(Json(RestaurantView::from(&restaurant)))
}

/// Resolve the restaurant owned by the acting principal.
async fn owned_restaurant(state: &AppState, actor: &AuthUser) -> ApiResult<Restaurant> {
    actor.require_role(Role::Restaurant, "manage menu items")?;
    state
        .catalog
        .restaurant_by_owner(actor.id)
        .await?
        .ok_or_else(|| ApiError::NotFound("no restaurant registered for this user".to_string()))
}

pub async fn add_menu_item(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(request): Json<AddMenuItemRequest>,
) -> ApiResult<(StatusCode, Json<MenuItemResponse>)> {
    let restaurant = owned_restaurant(&state, &actor).await?;

    if request.name.trim().is_empty() {
        return Err(ApiError::Validation("name is required".to_string()));
    }
    let price = request
        .price
        .ok_or_else(|| ApiError::Validation("price is required".to_string()))?;
    if price <= 0.0 {
        return Err(ApiError::Validation(
            "price must be greater than zero".to_string(),
        ));
    }

    let now = BsonDateTime::now();
    let item = MenuItem {
        _id: ObjectId::new(),
        restaurant_id: restaurant._id,
        name: request.name.trim().to_string(),
        description: request.description,
        price,
        category: request.category,
        image: request.image.unwrap_or_default(),
        is_available: true,
        created_at: now,
        updated_at: now,
    };
    state.catalog.insert_menu_item(&item).await?;

    Ok((
        StatusCode::CREATED,
        Json(MenuItemResponse {
            message: "Menu item added successfully".to_string(),
            menu_item: MenuItemView::from(&item),
        }),
    ))
}

pub async fn menu_by_restaurant(
    State(state): State<AppState>,
    _actor: AuthUser,
    Path(restaurant_id): Path<String>,
) -> ApiResult<Json<Vec<MenuItemView>>> {
    let restaurant_id = parse_object_id(&restaurant_id)?;
    let items = state
        .catalog
        .available_menu_by_restaurant(restaurant_id)
        .await?;
    Ok(Json(items.iter().map(MenuItemView::from).collect()))
}

/// Fetch a menu item and check it belongs to the actor's owned restaurant.
async fn owned_menu_item(state: &AppState, actor: &AuthUser, id: ObjectId) -> ApiResult<MenuItem> {
    let restaurant = owned_restaurant(state, actor).await?;
    let item = state
        .catalog
        .menu_item_by_id(id)
        .await?
        .ok_or_else(|| ApiError::NotFound("menu item not found".to_string()))?;
    if item.restaurant_id != restaurant._id {
        return Err(ApiError::Authorization(
            "menu item does not belong to your restaurant".to_string(),
        ));
    }
    Ok(item)
}

pub async fn update_menu_item(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<String>,
    Json(update): Json<MenuItemUpdate>,
) -> ApiResult<Json<MenuItemResponse>> {
    let id = parse_object_id(&id)?;
    owned_menu_item(&state, &actor, id).await?;

    if let Some(price) = update.price {
        if price <= 0.0 {
            return Err(ApiError::Validation(
                "price must be greater than zero".to_string(),
            ));
        }
    }

    let updated = state.catalog.update_menu_item(id, update).await?;
    Ok(Json(MenuItemResponse {
        message: "Menu item updated".to_string(),
        menu_item: MenuItemView::from(&updated),
    }))
}

pub async fn delete_menu_item(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MenuItemDeletedResponse>> {
    let id = parse_object_id(&id)?;
    owned_menu_item(&state, &actor, id).await?;
    state.catalog.delete_menu_item(id).await?;
    Ok(Json(MenuItemDeletedResponse {
        message: "Menu item deleted".to_string(),
    }))
}

pub async fn toggle_menu_availability(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(id): Path<String>,
) -> ApiResult<Json<MenuItemResponse>> {
    let id = parse_object_id(&id)?;
    let item = owned_menu_item(&state, &actor, id).await?;

    let updated = state
        .catalog
        .set_menu_item_availability(id, !item.is_available)
        .await?;
    let verb = if updated.is_available {
        "enabled"
    } else {
        "disabled"
    };
    Ok(Json(MenuItemResponse {
        message: format!("Menu item {verb} successfully"),
        menu_item: MenuItemView::from(&updated),
    }))
}
