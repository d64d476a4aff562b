//! User persistence.

use std::time::Duration;

use keyward_core::{Collection, Filter, SharedStore, StoreResult, User};
use uuid::Uuid;

use super::{decode, with_timeout};

/// Repository for the `users` collection.
#[derive(Clone)]
pub struct UserRepository {
    store: SharedStore,
    timeout: Duration,
}

impl UserRepository {
    pub fn new(store: SharedStore, timeout: Duration) -> Self {
        Self { store, timeout }
    }

    /// Find a user by exact email.
    ///
    /// Returns `None` when no document matches or the stored document cannot be decoded.
    pub async fn find_by_email(&self, email: &str) -> StoreResult<Option<User>> {
        let filter = Filter::all().eq("email", email);
        let document = with_timeout(self.timeout, self.store.find_one(Collection::Users, &filter)).await?;

        Ok(document.and_then(|doc| decode(Collection::Users, doc)))
    }

    /// Insert a new user. A taken email surfaces as [`StoreError::Duplicate`](keyward_core::StoreError::Duplicate).
    pub async fn create(&self, user: &User) -> StoreResult<Uuid> {
        let document = serde_json::to_value(user)?;
        with_timeout(self.timeout, self.store.insert_one(Collection::Users, document)).await
    }

    /// All users in insertion order. No pagination.
    pub async fn find_all(&self) -> StoreResult<Vec<User>> {
        let documents =
            with_timeout(self.timeout, self.store.find_all(Collection::Users, &Filter::all())).await?;

        Ok(documents
            .into_iter()
            .filter_map(|doc| decode(Collection::Users, doc))
            .collect())
    }
}
