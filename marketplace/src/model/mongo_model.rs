use chrono::{DateTime, Utc};
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};

use crate::model::{ApprovalStatus, OrderItem, OrderStatus, Role};

pub fn bson_datetime(dt: DateTime<Utc>) -> BsonDateTime {
    BsonDateTime::from_millis(dt.timestamp_millis())
}

pub fn chrono_datetime(dt: BsonDateTime) -> DateTime<Utc> {
    DateTime::from_timestamp_millis(dt.timestamp_millis())
        .expect("BSON datetimes are within chrono's range")
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct User {
    pub _id: ObjectId,
    pub name: String,
    pub email: String,
    pub password_hash: String,
    pub role: Role,
    pub status: ApprovalStatus,
    pub phone: String,
    pub address: String,
    pub latitude: Option<f64>,
    pub longitude: Option<f64>,
    pub vehicle_type: Option<String>,
    pub license_plate: Option<String>,
    pub is_active: bool,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Restaurant {
    pub _id: ObjectId,
    pub owner_id: ObjectId,
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
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct MenuItem {
    pub _id: ObjectId,
    pub restaurant_id: ObjectId,
    pub name: String,
    pub description: String,
    pub price: f64,
    pub category: String,
    pub image: String,
    pub is_available: bool,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}

/// One rider position sample; the order keeps an append-only list of these.
#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct PositionSample {
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: BsonDateTime,
}

#[derive(Clone, Debug, PartialEq, Serialize, Deserialize)]
pub struct Order {
    pub _id: ObjectId,
    pub customer_id: ObjectId,
    pub restaurant_id: ObjectId,
    /// Unset until a rider accepts; immutable once set.
    pub rider_id: Option<ObjectId>,
    pub items: Vec<OrderItem>,
    pub total_amount: f64,
    pub status: OrderStatus,
    pub delivery_address: String,
    pub customer_phone: String,
    pub special_instructions: String,
    pub position_updates: Vec<PositionSample>,
    /// Stamped exactly once, on the transition into `delivered`.
    pub delivered_at: Option<BsonDateTime>,
    pub created_at: BsonDateTime,
    pub updated_at: BsonDateTime,
}
