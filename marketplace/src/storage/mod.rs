// Storage trait seams and the MongoDB implementation
pub mod mongo;

mod catalog;
mod identity;
mod orders;

pub use mongo::MongoStorage;

use async_trait::async_trait;
use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;

use crate::error::ApiResult;
use crate::model::mongo_model::{MenuItem, Order, PositionSample, Restaurant, User};
use crate::model::{ApprovalStatus, MenuItemUpdate, OrderStatus};

#[async_trait]
pub trait IdentityStorage: Send + Sync {
    async fn insert_user(&self, user: &User) -> ApiResult<ObjectId>;

    async fn user_by_id(&self, id: ObjectId) -> ApiResult<Option<User>>;

    async fn user_by_email(&self, email: &str) -> ApiResult<Option<User>>;

    /// All users, newest first.
    async fn all_users(&self) -> ApiResult<Vec<User>>;

    /// All rider-role users, newest first.
    async fn riders(&self) -> ApiResult<Vec<User>>;

    async fn pending_riders(&self) -> ApiResult<Vec<User>>;

    async fn set_user_status(&self, id: ObjectId, status: ApprovalStatus) -> ApiResult<()>;
}

#[async_trait]
pub trait CatalogStorage: Send + Sync {
    async fn insert_restaurant(&self, restaurant: &Restaurant) -> ApiResult<ObjectId>;

    async fn restaurant_by_id(&self, id: ObjectId) -> ApiResult<Option<Restaurant>>;

    /// The restaurant owned by a principal, if any. Ownership questions go
    /// through this lookup; actor ids are never compared to restaurant ids.
    async fn restaurant_by_owner(&self, owner_id: ObjectId) -> ApiResult<Option<Restaurant>>;

    async fn approved_restaurants(&self) -> ApiResult<Vec<Restaurant>>;

    async fn all_restaurants(&self) -> ApiResult<Vec<Restaurant>>;

    async fn pending_restaurants(&self) -> ApiResult<Vec<Restaurant>>;

    async fn set_restaurant_status(
        &self,
        id: ObjectId,
        status: ApprovalStatus,
        is_active: bool,
    ) -> ApiResult<Restaurant>;

    async fn insert_menu_item(&self, item: &MenuItem) -> ApiResult<ObjectId>;

    async fn menu_item_by_id(&self, id: ObjectId) -> ApiResult<Option<MenuItem>>;

    /// Menu items for a restaurant, filtered to currently available ones.
    async fn available_menu_by_restaurant(&self, restaurant_id: ObjectId)
    -> ApiResult<Vec<MenuItem>>;

    async fn update_menu_item(&self, id: ObjectId, update: MenuItemUpdate) -> ApiResult<MenuItem>;

    async fn delete_menu_item(&self, id: ObjectId) -> ApiResult<()>;

    async fn set_menu_item_availability(
        &self,
        id: ObjectId,
        is_available: bool,
    ) -> ApiResult<MenuItem>;
}

#[async_trait]
pub trait OrderStorage: Send + Sync {
    async fn insert_order(&self, order: &Order) -> ApiResult<ObjectId>;

    async fn order_by_id(&self, id: ObjectId) -> ApiResult<Option<Order>>;

    /// Orders for a restaurant, newest first.
    async fn orders_by_restaurant(&self, restaurant_id: ObjectId) -> ApiResult<Vec<Order>>;

    /// Orders placed by a customer, newest first.
    async fn orders_by_customer(&self, customer_id: ObjectId) -> ApiResult<Vec<Order>>;

    /// Every order, newest first.
    async fn all_orders(&self) -> ApiResult<Vec<Order>>;

    /// Orders that are `ready` with no rider assigned, oldest first so the
    /// earliest-ready orders surface to riders first.
    async fn available_deliveries(&self) -> ApiResult<Vec<Order>>;

    /// A rider's active deliveries (ready/picked_up/out_for_delivery), newest
    /// first.
    async fn deliveries_by_rider(&self, rider_id: ObjectId) -> ApiResult<Vec<Order>>;

    /// A rider's delivered orders, by delivery time descending (falling back
    /// to creation time).
    async fn delivery_history_by_rider(&self, rider_id: ObjectId) -> ApiResult<Vec<Order>>;

    /// Overwrite the order status, stamping `delivered_at` when provided.
    /// Returns the updated order.
    async fn set_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> ApiResult<Order>;

    /// Atomically bind a rider to an order that is still `ready` and
    /// unassigned. The precondition check and the write are one document
    /// operation; `Ok(None)` means the order was not in that state (or does
    /// not exist) and nothing was mutated.
    async fn try_assign_rider(
        &self,
        order_id: ObjectId,
        rider_id: ObjectId,
    ) -> ApiResult<Option<Order>>;

    /// Append a position sample to the order's history.
    async fn append_position(&self, order_id: ObjectId, sample: PositionSample) -> ApiResult<()>;
}
