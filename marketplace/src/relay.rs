//! Best-effort event relay for order-scoped observers.
//!
//! The lifecycle and location components only ever call `publish`; transport
//! details stay behind the trait. Delivery is at-most-once and fire-and-forget:
//! publishing never blocks and never fails the calling operation.

use std::collections::HashMap;
use std::sync::Mutex;

use chrono::{DateTime, Utc};
use mongodb::bson::oid::ObjectId;
use serde::{Deserialize, Serialize};
use serde_json::Value;
use tokio::sync::broadcast;

/// Channel key for an order's observers.
pub fn order_channel(order_id: &ObjectId) -> String {
    format!("order_{}", order_id.to_hex())
}

/// Payload published whenever a rider reports a position for an order.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct PositionEvent {
    pub order_id: String,
    pub latitude: f64,
    pub longitude: f64,
    pub timestamp: DateTime<Utc>,
}

/// Payload published whenever an order's status changes.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
#[serde(rename_all = "camelCase")]
pub struct StatusEvent {
    pub order_id: String,
    pub status: crate::model::OrderStatus,
    pub timestamp: DateTime<Utc>,
}

pub trait EventChannel: Send + Sync {
    /// Publish a payload to every current subscriber of `channel`. Dropped
    /// silently when nobody is listening.
    fn publish(&self, channel: &str, payload: Value);

    /// Subscribe to a channel; only payloads published after this call are
    /// received.
    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value>;
}

/// In-process relay over per-channel tokio broadcast senders.
pub struct BroadcastRelay {
    channels: Mutex<HashMap<String, broadcast::Sender<Value>>>,
    capacity: usize,
}

impl BroadcastRelay {
    pub fn new(capacity: usize) -> Self {
        Self {
            channels: Mutex::new(HashMap::new()),
            capacity,
        }
    }

    fn sender(&self, channel: &str) -> broadcast::Sender<Value> {
        let mut channels = self.channels.lock().expect("relay channel map poisoned");
        channels
            .entry(channel.to_string())
            .or_insert_with(|| broadcast::channel(self.capacity).0)
            .clone()
    }
}

impl EventChannel for BroadcastRelay {
    fn publish(&self, channel: &str, payload: Value) {
        // A send error only means there are no subscribers right now
        let _ = self.sender(channel).send(payload);
    }

    fn subscribe(&self, channel: &str) -> broadcast::Receiver<Value> {
        self.sender(channel).subscribe()
    }
}
