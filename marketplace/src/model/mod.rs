use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use strum_macros::{Display as EnumDisplay, EnumString};

pub mod mongo_model;

use mongo_model::{Order, Restaurant, User};

/// Principal roles. Fixed at registration, carried in the bearer token.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum Role {
    Customer,
    Restaurant,
    Rider,
    Admin,
}

/// Canonical order status vocabulary; every persisted status and every
/// requested transition is validated against this set.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize, EnumDisplay, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum OrderStatus {
    Pending,
    Accepted,
    Preparing,
    Ready,
    Rejected,
    PickedUp,
    OutForDelivery,
    Delivered,
}

impl OrderStatus {
    /// Position in the forward-only lifecycle. `Rejected` shares the rank of
    /// `Accepted`: both branch directly off `Pending` and nothing may move
    /// between them.
    pub fn rank(self) -> u8 {
        match self {
            OrderStatus::Pending => 0,
            OrderStatus::Accepted | OrderStatus::Rejected => 1,
            OrderStatus::Preparing => 2,
            OrderStatus::Ready => 3,
            OrderStatus::PickedUp => 4,
            OrderStatus::OutForDelivery => 5,
            OrderStatus::Delivered => 6,
        }
    }

    /// Terminal states admit no further transition.
    pub fn is_terminal(self) -> bool {
        matches!(self, OrderStatus::Rejected | OrderStatus::Delivered)
    }
}

/// Approval state for users and restaurants. Customers start `Active`;
/// restaurant and rider registrations start `Pending` until an admin decides.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize, EnumDisplay, EnumString)]
#[serde(rename_all = "snake_case")]
#[strum(serialize_all = "snake_case")]
pub enum ApprovalStatus {
    Pending,
    Approved,
    Rejected,
    Active,
}

/// A line item snapshot taken at order creation; name and price are copied
/// from the menu item so later menu edits do not rewrite order history.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderItem {
    pub menu_item_id: ObjectId,
    pub name: String,
    pub price: f64,
    pub quantity: u32,
}

/// Partial update for a menu item; `None` fields are left untouched.
#[derive(Debug, Clone, Default, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemUpdate {
    pub name: Option<String>,
    pub description: Option<String>,
    pub price: Option<f64>,
    pub category: Option<String>,
    pub image: Option<String>,
    pub is_available: Option<bool>,
}

/// A single rider position sample as exposed on the wire.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionSampleView {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

impl From<&mongo_model::PositionSample> for PositionSampleView {
    fn from(sample: &mongo_model::PositionSample) -> Self {
        Self {
            latitude: sample.latitude,
            longitude: sample.longitude,
            timestamp: mongo_model::chrono_datetime(sample.timestamp),
        }
    }
}

// --- Wire views -------------------------------------------------------------
//
// Documents carry ObjectIds and BSON datetimes; everything returned to a
// client goes through these view structs with hex ids and RFC 3339 times.

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct UserView {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub role: Role,
    pub status: ApprovalStatus,
}

impl From<&User> for UserView {
    fn from(user: &User) -> Self {
        Self {
            id: user._id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            address: user.address.clone(),
            latitude: user.latitude,
            longitude: user.longitude,
            role: user.role,
            status: user.status,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantView {
    pub id: String,
    pub owner_id: String,
    pub name: String,
    pub description: String,
    pub phone: String,
    pub address: String,
    pub category: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub image: String,
    pub status: ApprovalStatus,
    pub is_active: bool,
}

impl From<&Restaurant> for RestaurantView {
    fn from(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant._id.to_hex(),
            owner_id: restaurant.owner_id.to_hex(),
            name: restaurant.name.clone(),
            description: restaurant.description.clone(),
            phone: restaurant.phone.clone(),
            address: restaurant.address.clone(),
            category: restaurant.category.clone(),
            latitude: restaurant.latitude,
            longitude: restaurant.longitude,
            image: restaurant.image.clone(),
            status: restaurant.status,
            is_active: restaurant.is_active,
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct MenuItemView {
    pub id: String,
    pub restaurant_id: String,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    pub is_available: bool,
}

impl From<&mongo_model::MenuItem> for MenuItemView {
    fn from(item: &mongo_model::MenuItem) -> Self {
        Self {
            id: item._id.to_hex(),
            restaurant_id: item.restaurant_id.to_hex(),
            name: item.name.clone(),
            description: item.description.clone(),
            price: item.price,
            category: item.category.clone(),
            image: item.image.clone(),
            is_available: item.is_available,
        }
    }
}

/// Readable summary of the customer joined onto an order.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct CustomerSummary {
    pub id: String,
    pub name: String,
    pub email: String,
    pub phone: String,
}

impl From<&User> for CustomerSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user._id.to_hex(),
            name: user.name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RestaurantSummary {
    pub id: String,
    pub name: String,
    pub address: String,
    pub phone: String,
}

impl From<&Restaurant> for RestaurantSummary {
    fn from(restaurant: &Restaurant) -> Self {
        Self {
            id: restaurant._id.to_hex(),
            name: restaurant.name.clone(),
            address: restaurant.address.clone(),
            phone: restaurant.phone.clone(),
        }
    }
}

#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct RiderSummary {
    pub id: String,
    pub name: String,
    pub phone: String,
    pub vehicle_type: Option<String>,
}

impl From<&User> for RiderSummary {
    fn from(user: &User) -> Self {
        Self {
            id: user._id.to_hex(),
            name: user.name.clone(),
            phone: user.phone.clone(),
            vehicle_type: user.vehicle_type.clone(),
        }
    }
}

/// An order joined with its customer/restaurant/rider summaries; the shape
/// every order-returning operation responds with.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct OrderView {
    pub id: String,
    pub customer: CustomerSummary,
    pub restaurant: RestaurantSummary,
    pub rider: Option<RiderSummary>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub customer_phone: String,
    pub special_instructions: String,
    pub position_updates: Vec<PositionSampleView>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    pub delivered_at: Option<DateTime<Utc>>,
}

impl OrderView {
    pub fn assemble(
        order: &Order,
        customer: CustomerSummary,
        restaurant: RestaurantSummary,
        rider: Option<RiderSummary>,
    ) -> Self {
        Self {
            id: order._id.to_hex(),
            customer,
            restaurant,
            rider,
            items: order.items.clone(),
            total_amount: order.total_amount,
            status: order.status,
            delivery_address: order.delivery_address.clone(),
            customer_phone: order.customer_phone.clone(),
            special_instructions: order.special_instructions.clone(),
            position_updates: order.position_updates.iter().map(Into::into).collect(),
            created_at: mongo_model::chrono_datetime(order.created_at),
            updated_at: mongo_model::chrono_datetime(order.updated_at),
            delivered_at: order.delivered_at.map(mongo_model::chrono_datetime),
        }
    }
}
