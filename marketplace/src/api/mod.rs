pub mod admin;
pub mod auth;
pub mod catalog;
pub mod location;
pub mod orders;

use std::sync::Arc;

use axum::Router;
use axum::http::StatusCode;
use axum::response::IntoResponse;
use axum::routing::{get, patch, post, put};
use common::config::AuthConfig;
use mongodb::bson::oid::ObjectId;

use crate::error::{ApiError, ApiResult};
use crate::relay::EventChannel;
use crate::storage::{CatalogStorage, IdentityStorage, OrderStorage};

/// Shared handler state: storage seams, the event relay, and auth settings,
/// all injected by the process entry point.
#[derive(Clone)]
pub struct AppState {
    pub identity: Arc<dyn IdentityStorage>,
    pub catalog: Arc<dyn CatalogStorage>,
    pub orders: Arc<dyn OrderStorage>,
    pub relay: Arc<dyn EventChannel>,
    pub auth: AuthConfig,
}

impl AppState {
    pub fn new(
        identity: Arc<dyn IdentityStorage>,
        catalog: Arc<dyn CatalogStorage>,
        orders: Arc<dyn OrderStorage>,
        relay: Arc<dyn EventChannel>,
        auth: AuthConfig,
    ) -> Self {
        Self {
            identity,
            catalog,
            orders,
            relay,
            auth,
        }
    }
}

pub fn parse_object_id(raw: &str) -> ApiResult<ObjectId> {
    ObjectId::parse_str(raw).map_err(|_| ApiError::Validation(format!("invalid id '{raw}'")))
}

pub async fn health_check() -> impl IntoResponse {
    (StatusCode::OK, "OK").into_response()
}

pub fn router(state: AppState) -> Router {
    Router::new()
        .route("/health", get(health_check))
        .route("/api/auth/register", post(auth::register))
        .route("/api/auth/login", post(auth::login))
        .route("/api/orders", post(orders::create_order))
        .route(
            "/api/orders/available-deliveries",
            get(orders::available_deliveries),
        )
        .route(
            "/api/orders/customer/{customer_id}",
            get(orders::orders_by_customer),
        )
        .route(
            "/api/orders/restaurant/{restaurant_id}",
            get(orders::orders_by_restaurant),
        )
        .route(
            "/api/orders/rider/{rider_id}/deliveries",
            get(orders::deliveries_by_rider),
        )
        .route(
            "/api/orders/rider/{rider_id}/history",
            get(orders::delivery_history_by_rider),
        )
        .route(
            "/api/orders/{order_id}/assign-rider",
            patch(orders::assign_rider),
        )
        .route(
            "/api/orders/{order_id}",
            get(orders::order_by_id).patch(orders::update_order_status),
        )
        .route("/api/location/rider", post(location::record_rider_location))
        .route(
            "/api/location/order/{order_id}",
            get(location::get_order_locations),
        )
        .route(
            "/api/restaurants",
            get(catalog::list_restaurants).post(catalog::register_restaurant),
        )
        .route("/api/restaurants/mine", get(catalog::my_restaurants))
        .route("/api/restaurants/{id}", get(catalog::restaurant_by_id))
        .route("/api/menu", post(catalog::add_menu_item))
        .route(
            "/api/menu/restaurant/{restaurant_id}",
            get(catalog::menu_by_restaurant),
        )
        .route(
            "/api/menu/{id}",
            put(catalog::update_menu_item).delete(catalog::delete_menu_item),
        )
        .route(
            "/api/menu/{id}/availability",
            patch(catalog::toggle_menu_availability),
        )
        .route("/api/admin/stats", get(admin::dashboard_stats))
        .route("/api/admin/users", get(admin::all_users))
        .route("/api/admin/orders", get(admin::all_orders))
        .route("/api/admin/restaurants", get(admin::all_restaurants))
        .route("/api/admin/riders", get(admin::all_riders))
        .route("/api/admin/pending", get(admin::pending_approvals))
        .route(
            "/api/admin/restaurants/{id}/status",
            patch(admin::update_restaurant_status),
        )
        .route(
            "/api/admin/riders/{id}/status",
            patch(admin::update_rider_status),
        )
        .with_state(state)
}
