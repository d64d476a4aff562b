//! Typed repositories over the document store.
//!
//! 핸들러는 [`DocumentStore`](keyward_core::DocumentStore)를 직접 다루지 않고
//! 이 모듈의 저장소를 통해 타입이 있는 모델을 주고받습니다.
//! 모든 호출은 호출 단위 타임아웃으로 감싸집니다.

mod tokens;
mod users;

pub use tokens::TokenRepository;
pub use users::UserRepository;

use std::future::Future;
use std::time::Duration;

use keyward_core::{Collection, StoreError, StoreResult};
use serde::de::DeserializeOwned;
use serde_json::Value;
use tracing::warn;

/// Run a store call under a deadline, mapping elapsed time to [`StoreError::Timeout`].
async fn with_timeout<T, F>(timeout: Duration, fut: F) -> StoreResult<T>
where
    F: Future<Output = StoreResult<T>>,
{
    tokio::time::timeout(timeout, fut)
        .await
        .map_err(|_| StoreError::Timeout(timeout))?
}

/// Decode a stored document; a document that does not fit the model is logged and skipped.
fn decode<T: DeserializeOwned>(collection: Collection, document: Value) -> Option<T> {
    match serde_json::from_value(document) {
        Ok(model) => Some(model),
        Err(e) => {
            warn!(collection = %collection, error = %e, "Skipping undecodable document");
            None
        }
    }
}
