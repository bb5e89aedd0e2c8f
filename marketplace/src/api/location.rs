//! Location relay handlers: rider position writes fan out to order-scoped
//! subscribers; reads return the last-known positions of all three parties.

use axum::Json;
use axum::extract::{Path, State};
use chrono::Utc;
use serde::{Deserialize, Serialize};

use crate::api::orders::ensure_order_participant;
use crate::api::{AppState, parse_object_id};
use crate::auth::AuthUser;
use crate::error::{ApiError, ApiResult};
use crate::model::PositionSampleView;
use crate::model::mongo_model::{PositionSample, bson_datetime};
use crate::relay::{PositionEvent, order_channel};

#[derive(Debug, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderLocationRequest {
    pub order_id: String,
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LatLng {
    pub latitude: f64,
    pub longitude: f64,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct LocationUpdatedResponse {
    pub message: String,
    pub location: LatLng,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PartyLocation {
    pub name: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub address: String,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderLocation {
    pub name: String,
    pub vehicle_type: Option<String>,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    /// Last reported position sample, absent when the rider has never
    /// reported one for this order.
    pub current_location: Option<PositionSampleView>,
}

#[derive(Debug, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderLocations {
    pub customer: PartyLocation,
    pub restaurant: PartyLocation,
    pub rider: Option<RiderLocation>,
}

#[derive(Debug, Serialize, Deserialize)]
pub struct OrderLocationsResponse {
    pub locations: OrderLocations,
}

pub async fn record_rider_location(
    State(state): State<AppState>,
    actor: AuthUser,
    Json(request): Json<RiderLocationRequest>,
) -> ApiResult<Json<LocationUpdatedResponse>> {
    let order_id = parse_object_id(&request.order_id)?;
    if !(-90.0..=90.0).contains(&request.latitude)
        || !(-180.0..=180.0).contains(&request.longitude)
    {
        return Err(ApiError::Validation(
            "latitude or longitude out of range".to_string(),
        ));
    }

    let order = state
        .orders
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    if order.rider_id != Some(actor.id) {
        return Err(ApiError::Authorization(
            "not authorized to update location for this order".to_string(),
        ));
    }

    let timestamp = Utc::now();
    let sample = PositionSample {
        latitude: request.latitude,
        longitude: request.longitude,
        timestamp: bson_datetime(timestamp),
    };
    state.orders.append_position(order_id, sample).await?;

    // Best-effort fan-out; a publish problem never fails the write
    let event = PositionEvent {
        order_id: order_id.to_hex(),
        latitude: request.latitude,
        longitude: request.longitude,
        timestamp,
    };
    if let Ok(payload) = serde_json::to_value(&event) {
        state.relay.publish(&order_channel(&order_id), payload);
    }

    Ok(Json(LocationUpdatedResponse {
        message: "Location updated successfully".to_string(),
        location: LatLng {
            latitude: request.latitude,
            longitude: request.longitude,
        },
    }))
}

pub async fn get_order_locations(
    State(state): State<AppState>,
    actor: AuthUser,
    Path(order_id): Path<String>,
) -> ApiResult<Json<OrderLocationsResponse>> {
    let order_id = parse_object_id(&order_id)?;
    let order = state
        .orders
        .order_by_id(order_id)
        .await?
        .ok_or_else(|| ApiError::NotFound("order not found".to_string()))?;

    ensure_order_participant(&state, &actor, &order).await?;

    let customer = state
        .identity
        .user_by_id(order.customer_id)
        .await?
        .ok_or_else(|| ApiError::Upstream("order references missing customer".to_string()))?;
    let restaurant = state
        .catalog
        .restaurant_by_id(order.restaurant_id)
        .await?
        .ok_or_else(|| ApiError::Upstream("order references missing restaurant".to_string()))?;

    let rider = match order.rider_id {
        Some(rider_id) => {
            let rider = state
                .identity
                .user_by_id(rider_id)
                .await?
                .ok_or_else(|| ApiError::Upstream("order references missing rider".to_string()))?;
            Some(RiderLocation {
                name: rider.name,
                vehicle_type: rider.vehicle_type,
                latitude: rider.latitude,
                longitude: rider.longitude,
                current_location: order.position_updates.last().map(Into::into),
            })
        }
        None => None,
    };

    Ok(Json(OrderLocationsResponse {
        locations: OrderLocations {
            customer: PartyLocation {
                name: customer.name,
                latitude: customer.latitude,
                longitude: customer.longitude,
                address: customer.address,
            },
            restaurant: PartyLocation {
                name: restaurant.name,
                latitude: restaurant.latitude,
                longitude: restaurant.longitude,
                address: restaurant.address,
            },
            rider,
        },
    }))
}
