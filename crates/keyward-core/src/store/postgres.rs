//! PostgreSQL JSONB 문서 저장소.
//!
//! 컬렉션마다 `(id UUID, document JSONB, created_at TIMESTAMPTZ)` 테이블 하나를 사용합니다.
//! 필터는 JSONB 포함 연산자(`document @> $1`)로 평가되므로 스칼라 값에 대해
//! 정확 일치의 논리곱과 같습니다.

use std::time::Duration;

use async_trait::async_trait;
use serde_json::Value;
use sqlx::postgres::PgPoolOptions;
use sqlx::types::Json;
use sqlx::PgPool;
use tracing::{debug, info};
use uuid::Uuid;

use super::{assign_id, retry_with_backoff, Collection, DocumentStore, Filter, RetryPolicy};
use crate::config::DatabaseConfig;
use crate::error::{StoreError, StoreResult};

/// PostgreSQL 기반 문서 저장소.
#[derive(Debug, Clone)]
pub struct PgDocumentStore {
    pool: PgPool,
}

impl PgDocumentStore {
    /// 기존 커넥션 풀로 생성.
    pub fn new(pool: PgPool) -> Self {
        Self { pool }
    }

    /// 설정에 따라 연결합니다.
    ///
    /// 연결과 `SELECT 1` 확인을 하나의 시도로 보고, [`RetryPolicy`]에 따라
    /// 제한된 횟수만 재시도합니다. 모두 실패하면 [`StoreError::Connection`]을 반환합니다.
    pub async fn connect(config: &DatabaseConfig) -> StoreResult<Self> {
        let url = config
            .url
            .as_deref()
            .ok_or_else(|| StoreError::Connection("database.url is not set".to_string()))?;
        let policy = config.retry_policy();
        let max_connections = config.max_connections;
        let acquire_timeout = Duration::from_secs(config.connect_timeout_secs);

        let pool = retry_with_backoff(&policy, "postgres_connect", || async move {
            let pool = PgPoolOptions::new()
                .max_connections(max_connections)
                .acquire_timeout(acquire_timeout)
                .connect(url)
                .await?;
            sqlx::query("SELECT 1").execute(&pool).await?;
            Ok::<_, sqlx::Error>(pool)
        })
        .await
        .map_err(|e| StoreError::Connection(e.to_string()))?;

        info!(max_connections, "Connected to PostgreSQL");
        Ok(Self { pool })
    }

    /// 컬렉션 테이블과 인덱스를 생성합니다 (이미 있으면 무시).
    pub async fn ensure_schema(&self) -> StoreResult<()> {
        for collection in Collection::ALL {
            let table = collection.name();

            sqlx::query(&format!(
                r#"
                CREATE TABLE IF NOT EXISTS {table} (
                    id UUID PRIMARY KEY,
                    document JSONB NOT NULL,
                    created_at TIMESTAMPTZ NOT NULL DEFAULT NOW()
                )
                "#
            ))
            .execute(&self.pool)
            .await?;

            sqlx::query(&format!(
                "CREATE INDEX IF NOT EXISTS {table}_document_idx ON {table} USING GIN (document jsonb_path_ops)"
            ))
            .execute(&self.pool)
            .await?;

            for key in collection.unique_keys() {
                sqlx::query(&format!(
                    "CREATE UNIQUE INDEX IF NOT EXISTS {table}_{key}_key ON {table} ((document->>'{key}'))"
                ))
                .execute(&self.pool)
                .await?;
            }

            debug!(table, "Collection schema ensured");
        }

        Ok(())
    }

    pub fn pool(&self) -> &PgPool {
        &self.pool
    }

    fn map_insert_error(collection: Collection, err: sqlx::Error) -> StoreError {
        if let sqlx::Error::Database(db_err) = &err {
            if db_err.is_unique_violation() {
                let key = db_err
                    .constraint()
                    .and_then(|constraint| {
                        collection
                            .unique_keys()
                            .iter()
                            .copied()
                            .find(|key| constraint.ends_with(&format!("_{}_key", key)))
                    })
                    .unwrap_or(super::ID_FIELD);
                return StoreError::Duplicate {
                    collection: collection.name(),
                    key,
                };
            }
        }
        StoreError::from(err)
    }
}

#[async_trait]
impl DocumentStore for PgDocumentStore {
    async fn find_one(&self, collection: Collection, filter: &Filter) -> StoreResult<Option<Value>> {
        let sql = format!(
            "SELECT document FROM {} WHERE document @> $1 ORDER BY created_at, id LIMIT 1",
            collection.name()
        );

        let row: Option<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(Json(filter.to_json()))
            .fetch_optional(&self.pool)
            .await?;

        Ok(row.map(|Json(document)| document))
    }

    async fn insert_one(&self, collection: Collection, mut document: Value) -> StoreResult<Uuid> {
        let id = assign_id(&mut document)?;
        let sql = format!("INSERT INTO {} (id, document) VALUES ($1, $2)", collection.name());

        sqlx::query(&sql)
            .bind(id)
            .bind(Json(&document))
            .execute(&self.pool)
            .await
            .map_err(|e| Self::map_insert_error(collection, e))?;

        Ok(id)
    }

    async fn find_all(&self, collection: Collection, filter: &Filter) -> StoreResult<Vec<Value>> {
        let sql = format!(
            "SELECT document FROM {} WHERE document @> $1 ORDER BY created_at, id",
            collection.name()
        );

        let rows: Vec<Json<Value>> = sqlx::query_scalar(&sql)
            .bind(Json(filter.to_json()))
            .fetch_all(&self.pool)
            .await?;

        Ok(rows.into_iter().map(|Json(document)| document).collect())
    }

    async fn ping(&self) -> StoreResult<()> {
        sqlx::query("SELECT 1").execute(&self.pool).await?;
        Ok(())
    }

    fn backend_name(&self) -> &'static str {
        "postgres"
    }
}
