/// Shared test helpers for cross-crate use.
///
/// Centralized utilities used by the `marketplace` test suites to avoid
/// duplicated fixture plumbing.
use std::sync::atomic::{AtomicU64, Ordering};
use std::time::{SystemTime, UNIX_EPOCH};

// Global counter for truly unique test identifiers across parallel tests
static GLOBAL_TEST_COUNTER: AtomicU64 = AtomicU64::new(1);

/// Generate globally unique test identifiers that won't conflict across parallel tests.
///
/// Combines a timestamp with an atomic counter so IDs stay unique even when
/// tests run in parallel across threads.
pub fn generate_unique_id(prefix: &str) -> String {
    let timestamp = SystemTime::now()
        .duration_since(UNIX_EPOCH)
        .unwrap()
        .as_millis();
    let counter = GLOBAL_TEST_COUNTER.fetch_add(1, Ordering::SeqCst);
    format!("{}-{}-{}", prefix, timestamp, counter)
}

/// Generate a unique email address for registration tests.
pub fn generate_unique_email(prefix: &str) -> String {
    format!("{}@example.com", generate_unique_id(prefix).to_lowercase())
}

/// Get the test MongoDB URL from environment or default.
pub fn get_test_mongo_url() -> String {
    std::env::var("MONGO_URL").unwrap_or_else(|_| "mongodb://localhost:27017".to_string())
}
