use mongodb::bson::doc;
use mongodb::{Client, Collection, Database};

use crate::error::ApiResult;
use crate::model::mongo_model::{MenuItem, Order, Restaurant, User};

/// MongoDB-backed storage with an explicit lifecycle: the process entry point
/// constructs it, health-checks it, injects it wherever storage is needed,
/// and closes it on shutdown. No connection state lives outside this struct.
#[derive(Clone)]
pub struct MongoStorage {
    client: Client,
    database: Database,
}

impl MongoStorage {
    pub async fn connect(conn_str: &str, db_name: &str) -> ApiResult<Self> {
        let client = Client::with_uri_str(conn_str).await?;
        let database = client.database(db_name);
        tracing::info!(database = db_name, "connected to mongodb");
        Ok(Self { client, database })
    }

    /// Round-trip a ping so a broken connection fails at startup instead of
    /// on the first request.
    pub async fn health_check(&self) -> ApiResult<()> {
        self.database.run_command(doc! { "ping": 1 }).await?;
        Ok(())
    }

    pub async fn close(&self) {
        self.client.clone().shutdown().await;
        tracing::info!("mongodb connection closed");
    }

    pub(crate) fn users(&self) -> Collection<User> {
        self.database.collection("users")
    }

    pub(crate) fn restaurants(&self) -> Collection<Restaurant> {
        self.database.collection("restaurants")
    }

    pub(crate) fn menu_items(&self) -> Collection<MenuItem> {
        self.database.collection("menu_items")
    }

    pub(crate) fn orders(&self) -> Collection<Order> {
        self.database.collection("orders")
    }
}
