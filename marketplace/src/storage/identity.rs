use async_trait::async_trait;
use futures::TryStreamExt;
use mongodb::bson::DateTime as BsonDateTime;
use mongodb::bson::doc;
use mongodb::bson::oid::ObjectId;

use crate::error::{ApiError, ApiResult};
use crate::model::mongo_model::User;
use crate::model::{ApprovalStatus, Role};
use crate::storage::{IdentityStorage, MongoStorage};

#[async_trait]
impl IdentityStorage for MongoStorage {
    async fn insert_user(&self, user: &User) -> ApiResult<ObjectId> {
        self.users().insert_one(user).await?;
        Ok(user._id)
    }

    async fn user_by_id(&self, id: ObjectId) -> ApiResult<Option<User>> {
        Ok(self.users().find_one(doc! { "_id": id }).await?)
    }

    async fn user_by_email(&self, email: &str) -> ApiResult<Option<User>> {
        Ok(self.users().find_one(doc! { "email": email }).await?)
    }

    async fn all_users(&self) -> ApiResult<Vec<User>> {
        let users = self
            .users()
            .find(doc! {})
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(users)
    }

    async fn riders(&self) -> ApiResult<Vec<User>> {
        let riders = self
            .users()
            .find(doc! { "role": Role::Rider.to_string() })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(riders)
    }

    async fn pending_riders(&self) -> ApiResult<Vec<User>> {
        let riders = self
            .users()
            .find(doc! {
                "role": Role::Rider.to_string(),
                "status": ApprovalStatus::Pending.to_string(),
            })
            .sort(doc! { "created_at": -1 })
            .await?
            .try_collect()
            .await?;
        Ok(riders)
    }

    async fn set_user_status(&self, id: ObjectId, status: ApprovalStatus) -> ApiResult<()> {
        let result = self
            .users()
            .update_one(
                doc! { "_id": id },
                doc! { "$set": {
                    "status": status.to_string(),
                    "updated_at": BsonDateTime::now(),
                } },
            )
            .await?;
        if result.matched_count == 0 {
            return Err(ApiError::NotFound(format!("user {} not found", id.to_hex())));
        }
        Ok(())
    }
}
