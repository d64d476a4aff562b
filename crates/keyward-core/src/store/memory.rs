//! 인메모리 문서 저장소.
//!
//! PostgreSQL 구현과 동일한 의미(삽입 순서, 유니크 키, 정확 일치 필터)를 가지며
//! 개발 모드와 테스트에서 사용됩니다.

use std::collections::HashMap;

use async_trait::async_trait;
use serde_json::Value;
use tokio::sync::RwLock;
use uuid::Uuid;

use super::{assign_id, Collection, DocumentStore, Filter};
use crate::error::{StoreError, StoreResult};

/// 인메모리 문서 저장소.
#[derive(Debug, Default)]
pub struct MemoryDocumentStore {
    collections: RwLock<HashMap<Collection, Vec<Value>>>,
}

impl MemoryDocumentStore {
    pub fn new() -> Self {
        Self::default()
    }

    /// 컬렉션의 문서 수.
    pub async fn len(&self, collection: Collection) -> usize {
        self.collections
            .read()
            .await
            .get(&collection)
            .map_or(0, Vec::len)
    }
}

#[async_trait]
impl DocumentStore for MemoryDocumentStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .and_then(|docs| docs.iter().find(|doc| filter.matches(doc)))
            .cloned())
    }

    async fn insert_one(&self, collection: Collection, mut document: Value) -> StoreResult<Uuid> {
        let id = assign_id(&mut document)?;

        let mut collections = self.collections.write().await;
        let docs = collections.entry(collection).or_default();

        for key in collection.unique_keys() {
            let Some(value) = document.get(*key) else {
                continue;
            };
            if docs.iter().any(|existing| existing.get(*key) == Some(value)) {
                return Err(StoreError::Duplicate {
                    collection: collection.name(),
                    key: *key,
                });
            }
        }

        let id_taken = docs
            .iter()
            .any(|existing| existing.get(super::ID_FIELD) == document.get(super::ID_FIELD));
        if id_taken {
            return Err(StoreError::Duplicate {
                collection: collection.name(),
                key: super::ID_FIELD,
            });
        }

        docs.push(document);
        Ok(id)
    }

    async fn find_all(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let collections = self.collections.read().await;
        Ok(collections
            .get(&collection)
            .map(|docs| docs.iter().filter(|doc| filter.matches(doc)).cloned().collect())
            .unwrap_or_default())
    }

    async fn ping(&self) -> StoreResult<()> {
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "memory"
    }
}
