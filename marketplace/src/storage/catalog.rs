use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;
use mongodb::options::ReturnDocument;

use crate::error::{ApiError, ApiResult};
use crate::model::mongo_model::{MenuItem, Restaurant};
use crate::model::{ApprovalStatus, MenuItemUpdate};
use crate::storage::{CatalogStorage, MongoStorage};

#[async_trait]
impl CatalogStorage for MongoStorage {
    async fn insert_restaurant(&self, restaurant: &Restaurant) -> ApiResult<ObjectId> {
        self.restaurants().insert_one(restaurant).await?;
        Ok(restaurant._id)
    }

    async fn restaurant_by_id(&self, id: ObjectId) -> ApiResult<Option<Restaurant>> {
        Ok(self.restaurants().find_one(doc! { "_id": id }).await?)
    }

    async fn restaurant_by_owner(&self, owner_id: ObjectId) -> ApiResult<Option<Restaurant>> {
        Ok(self
            .restaurants()
            .find_one(doc! { "owner_id": owner_id })
            .await?)
    }

    async fn approved_restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        let restaurants = self
            .restaurants()
            .find(doc! { "status": ApprovalStatus::Approved.to_string(), "is_active": true })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(restaurants)
    }

    async fn all_restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        let restaurants = self
            .restaurants()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(restaurants)
    }

    async fn pending_restaurants(&self) -> ApiResult<Vec<Restaurant>> {
        let restaurants = self
            .restaurants()
            .find(doc! { "status": ApprovalStatus::Pending.to_string() })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(restaurants)
    }

    async fn set_restaurant_status(
        &self,
        id: ObjectId,
        status: ApprovalStatus,
        is_active: bool,
    ) -> ApiResult<Restaurant> {
        self.restaurants()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": status.to_string(),
                    "is_active": is_active,
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("restaurant {} not found", id.to_hex())))
    }

    async fn insert_menu_item(&self, item: &MenuItem) -> ApiResult<ObjectId> {
        self.menu_items().insert_one(item).await?;
        Ok(item._id)
    }

    async fn menu_item_by_id(&self, id: ObjectId) -> ApiResult<Option<MenuItem>> {
        Ok(self.menu_items().find_one(doc! { "_id": id }).await?)
    }

    async fn available_menu_by_restaurant(
        &self,
        restaurant_id: ObjectId,
    ) -> ApiResult<Vec<MenuItem>> {
        let items = self
            .menu_items()
            .find(doc! { "restaurant_id": restaurant_id, "is_available": true })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(items)
    }

    async fn update_menu_item(&self, id: ObjectId, update: MenuItemUpdate) -> ApiResult<MenuItem> {
        let mut set = doc! { "updated_at": BsonDateTime::now() };
        if let Some(name) = update.name {
            set.insert("name", name);
        }
        if let Some(description) = update.description {
            set.insert("description", description);
        }
        if let Some(price) = update.price {
            set.insert("price", price);
        }
        if let Some(category) = update.category {
            set.insert("category", category);
        }
        if let Some(image) = update.image {
            set.insert("image", image);
        }
        if let Some(is_available) = update.is_available {
            set.insert("is_available", is_available);
        }

        self.menu_items()
            .find_one_and_update(doc! { "_id": id }, doc! { "$set": set })
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("menu item {} not found", id.to_hex())))
    }

    async fn delete_menu_item(&self, id: ObjectId) -> ApiResult<()> {
        let result = self.menu_items().delete_one(doc! { "_id": id }).await?;
        if result.deleted_count == 0 {
            return Err(ApiError::NotFound(format!(
                "menu item {} not found",
                id.to_hex()
            )));
        }
        Ok(())
    }

    async fn set_menu_item_availability(
        &self,
        id: ObjectId,
        is_available: bool,
    ) -> ApiResult<MenuItem> {
        self.menu_items()
            .find_one_and_update(
                doc! { "_id": id },
                doc! { "$set": {
                    "is_available": is_available,
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .return_document(ReturnDocument::After)
            .await?
            .ok_or_else(|| ApiError::NotFound(format!("menu item {} not found", id.to_hex())))
    }
}
