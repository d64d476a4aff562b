//! Token issuance records.

use std::time::Duration;

use keyward_core::{Collection, SharedStore, StoreResult, TokenRecord};
use uuid::Uuid;

use super::with_timeout;

/// Repository for the `tokens` collection. Records are append-only.
#[derive(Clone)]
pub struct TokenRepository {
    store: SharedStore,
    timeout: Duration,
}

impl TokenRepository {
    pub fn new(store: SharedStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    pub async fn create(&self, record: &TokenRecord) -> StoreResult<Uuid> {
        let document = serde_json::to_value(record)?;
        with_timeout(self.timeout, self.store.insert_one(Collection::Tokens, document)).await
    }
}
