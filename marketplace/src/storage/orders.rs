use async_trait::async_trait;
use chrono::{DateTime, Utc};
use futures::TryStreamExt;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::oid::ObjectId;
use mongodb::bson::{Bson, doc, to_bson};
use mongodb::options::ReturnDocument;

use crate::error::{ApiError, ApiResult};
use crate::model::OrderStatus;
use crate::model::mongo_model::{Order, PositionSample, bson_datetime};
use crate::storage::{MongoStorage, OrderStorage};

#[async_trait]
impl OrderStorage for MongoStorage {
    async fn insert_order(&self, order: &Order) -> ApiResult<ObjectId> {
        self.orders().insert_one(order).await?;
        Ok(order._id)
    }

    async fn order_by_id(&self, id: ObjectId) -> ApiResult<Option<Order>> {
        Ok(self.orders().find_one(doc! { "_id": id }).await?)
    }

    async fn orders_by_restaurant(&self, restaurant_id: ObjectId) -> ApiResult<Vec<Order>> {
        let orders = self
            .orders()
            .find(doc! { "restaurant_id": restaurant_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn orders_by_customer(&self, customer_id: ObjectId) -> ApiResult<Vec<Order>> {
        let orders = self
            .orders()
            .find(doc! { "customer_id": customer_id })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn all_orders(&self) -> ApiResult<Vec<Order>> {
        let orders = self
            .orders()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn available_deliveries(&self) -> ApiResult<Vec<Order>> {
        let orders = self
            .orders()
            .find(doc! {
                "status": OrderStatus::Ready.to_string(),
                "rider_id": Bson::Null,
            })
            .sort(doc! { "created_at": 1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn deliveries_by_rider(&self, rider_id: ObjectId) -> ApiResult<Vec<Order>> {
        let active = [
            OrderStatus::Ready,
            OrderStatus::PickedUp,
            OrderStatus::OutForDelivery,
        ]
        .map(|status| status.to_string());
        let orders = self
            .orders()
            .find(doc! {
                "rider_id": rider_id,
                "status": { "$in": active.to_vec() },
            })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn delivery_history_by_rider(&self, rider_id: ObjectId) -> ApiResult<Vec<Order>> {
        let orders = self
            .orders()
            .find(doc! {
                "rider_id": rider_id,
                "status": OrderStatus::Delivered.to_string(),
            })
            .sort(doc! { "delivered_at": -1, "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(orders)
    }

    async fn set_status(
        &self,
        id: ObjectId,
        status: OrderStatus,
        delivered_at: Option<DateTime<Utc>>,
    ) -> ApiResult<Order> {
        let mut set = doc! {
            "status": status.to_string(),
            "updated_at": BsonDateTime::now(),
        };
        if let Some(at) = delivered_at {
            set.insert("delivered_at", bson_datetime(at));
        }

        self.orders()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("order {} not found", id.to_hex())))
    }

    async fn try_assign_rider(
        &self,
        order_id: ObjectId,
        rider_id: ObjectId,
    ) -> ApiResult<Option<Order>> {
        // The ready-and-unassigned precondition and the assignment are one
        // document operation; concurrent accepts race on the filter, and the
        // server lets exactly one of them match.
        let updated = self
            .orders()
            .find_one_and_update(
                doc! {
                    "_id": order_id,
                    "status": OrderStatus::Ready.to_string(),
                    "rider_id": Bson::Null,
                },
                doc! { "$set": {
                    "rider_id": rider_id,
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?;
        Ok(updated)
    }

    async fn append_position(&self, order_id: ObjectId, sample: PositionSample) -> ApiResult<()> {
        let result = self
            .orders()
            .update_one(
                doc! { "_id": order_id },
                doc! {
                    "$push": { "position_updates": to_bson(&sample)? },
                    "$set": { "updated_at": BsonDateTime::now() },
                },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(ApiError::NotFound(format!(
                "order {} not found",
                order_id.to_hex()
            )));
        }
        Ok(())
    }
}
