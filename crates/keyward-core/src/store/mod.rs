//! 문서 저장소 추상화.
//!
//! 컬렉션 단위로 JSON 문서를 저장하고, 정확 일치 필터로 조회합니다.
//!
//! # 구성 요소
//!
//! - [`DocumentStore`]: 저장소 트레이트
//! - [`Filter`]: 키/값 정확 일치 조건의 논리곱
//! - [`MemoryDocumentStore`]: 인메모리 구현 (개발/테스트용)
//! - [`PgDocumentStore`]: PostgreSQL JSONB 구현 (`sqlx-support` feature)
//! - [`RetryPolicy`]: 시작 시 연결 재시도 정책

mod memory;
#[cfg(feature = "sqlx-support")]
mod postgres;
mod retry;

pub use memory::MemoryDocumentStore;
#[cfg(feature = "sqlx-support")]
pub use postgres::PgDocumentStore;
pub use retry::{retry_with_backoff, RetryPolicy};

use std::sync::Arc;

use async_trait::async_trait;
use serde_json::{Map, Value};
use uuid::Uuid;

use crate::error::{StoreError, StoreResult};

/// 문서 식별자 필드명.
pub const ID_FIELD: &str = "_id";

/// 저장소 컬렉션.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Collection {
    Users,
    Tokens,
}

impl Collection {
    /// 모든 컬렉션.
    pub const ALL: [Collection; 2] = [Collection::Users, Collection::Tokens];

    /// 컬렉션(테이블) 이름.
    pub fn name(&self) -> &'static str {
        match self {
            Collection::Users => "users",
            Collection::Tokens => "tokens",
        }
    }

    /// 컬렉션 내에서 유일해야 하는 최상위 키.
    pub fn unique_keys(&self) -> &'static [&'static str] {
        match self {
            Collection::Users => &["email"],
            Collection::Tokens => &[],
        }
    }
}

impl std::fmt::Display for Collection {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.name())
    }
}

/// 정확 일치 조건의 논리곱.
///
/// 값은 스칼라(문자열, 숫자, 불리언)를 전제로 합니다. 빈 필터는 모든 문서와 일치합니다.
#[derive(Debug, Clone, Default, PartialEq)]
pub struct Filter {
    pairs: Vec<(String, Value)>,
}

impl Filter {
    /// 빈 필터 (전체 일치).
    pub fn all() -> Self {
        Self::default()
    }

    /// `key == value` 조건 추가.
    #[must_use]
    pub fn eq(mut self, key: impl Into<String>, value: impl Into<Value>) -> Self {
        self.pairs.push((key.into(), value.into()));
        self
    }

    pub fn is_empty(&self) -> bool {
        self.pairs.is_empty()
    }

    pub fn pairs(&self) -> &[(String, Value)] {
        &self.pairs
    }

    /// JSON 객체로 변환 (JSONB 포함 연산자용).
    pub fn to_json(&self) -> Value {
        let map: Map<String, Value> = self.pairs.iter().cloned().collect();
        Value::Object(map)
    }

    /// 문서가 모든 조건을 만족하는지 확인.
    pub fn matches(&self, document: &Value) -> bool {
        self.pairs
            .iter()
            .all(|(key, value)| document.get(key) == Some(value))
    }
}

/// 문서 저장소.
///
/// 구현체는 여러 요청에서 동시에 공유되므로 `Send + Sync`여야 합니다.
#[async_trait]
pub trait DocumentStore: Send + Sync {
    /// 필터와 일치하는 첫 번째 문서 (삽입 순서 기준).
    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Value>>;

    /// 문서 하나를 삽입하고 `_id`를 반환.
    ///
    /// 문서에 `_id`가 없으면 새로 생성하여 채웁니다.
    /// 유니크 키 충돌 시 [`StoreError::Duplicate`]를 반환합니다.
    async fn insert_one(&self, collection: Collection, document: Value) -> StoreResult<Uuid>;

    /// 필터와 일치하는 모든 문서. 페이지네이션 없음.
    async fn find_all(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>>;

    /// 연결 상태 확인.
    async fn ping(&self) -> StoreResult<()>;

    /// 백엔드 이름 (로그/헬스 체크용).
    fn backend_name(&self) -> &'static str;
}

/// 공유 저장소 핸들.
pub type SharedStore = Arc<dyn DocumentStore>;

/// 삽입할 문서의 `_id`를 확정합니다.
///
/// 기존 `_id`가 있으면 UUID로 파싱하고, 없으면 생성하여 문서에 기록합니다.
pub(crate) fn assign_id(document: &mut Value) -> StoreResult<Uuid> {
    let object = document
        .as_object_mut()
        .ok_or_else(|| StoreError::InvalidDocument("document must be a JSON object".to_string()))?;

    match object.get(ID_FIELD) {
        Some(Value::String(raw)) => Uuid::parse_str(raw)
            .map_err(|e| StoreError::InvalidDocument(format!("invalid _id: {}", e))),
        Some(other) => Err(StoreError::InvalidDocument(format!(
            "_id must be a UUID string, got {}",
            other
        ))),
        None => {
            let id = Uuid::new_v4();
            object.insert(ID_FIELD.to_string(), Value::String(id.to_string()));
            Ok(id)
        }
    }
}
