use std::error::Error;
use std::sync::Arc;

use marketplace::api::AppState;
use marketplace::executable_utils::{initialize_executable, initialize_tracing, run_backend};
use marketplace::relay::BroadcastRelay;
use marketplace::storage::MongoStorage;

#[tokio::main]
async fn main() -> Result<(), Box<dyn Error + Send + Sync>> {
    println!("Starting backend...");
    let config = initialize_executable()?;
    initialize_tracing(&config.backend.log_level);

    let storage = Arc::new(
        MongoStorage::connect(&config.common.mongo_url, &config.common.database_name).await?,
    );
    storage.health_check().await?;

    let state = AppState::new(
        storage.clone(),
        storage.clone(),
        storage.clone(),
        Arc::new(BroadcastRelay::new(64)),
        config.auth.clone(),
    );
    run_backend(config.backend, state).await?;

    storage.close().await;
    Ok(())
}
