//! 모든 핸들러에서 공유되는 애플리케이션 상태.
//!
//! AppState는 Clone 비용이 낮도록 내부 자원을 모두 `Arc`로 보관합니다.

use std::sync::Arc;
use std::time::Duration;

use keyward_core::{JwtConfig, MemoryDocumentStore, SharedStore};
use metrics_exporter_prometheus::PrometheusHandle;
use tracing::warn;

use crate::auth::TokenService;
use crate::repository::{TokenRepository, UserRepository};

/// 저장소 호출 기본 타임아웃.
pub const DEFAULT_QUERY_TIMEOUT: Duration = Duration::from_secs(30);

/// 애플리케이션 공유 상태.
///
/// Axum의 State extractor를 통해 핸들러에 주입됩니다.
#[derive(Clone)]
pub struct AppState {
    /// 문서 저장소 (PostgreSQL 또는 인메모리)
    pub store: SharedStore,

    /// 사용자 저장소
    pub users: UserRepository,

    /// 토큰 발급 기록 저장소
    pub tokens: TokenRepository,

    /// JWT 발급/검증
    pub token_service: Arc<TokenService>,

    /// 회원가입 시 부여할 역할
    pub default_roles: Arc<[String]>,

    /// Prometheus 핸들 (`/metrics` 렌더링)
    pub metrics: Option<PrometheusHandle>,

    /// 서버 시작 시간 (업타임 계산용)
    pub started_at: chrono::DateTime<chrono::Utc>,

    /// API 버전
    pub version: String,
}

impl AppState {
    /// 새로운 AppState 생성.
    ///
    /// # Arguments
    ///
    /// * `store` - 문서 저장소
    /// * `token_service` - 토큰 서비스
    /// * `query_timeout` - 저장소 호출 단위 타임아웃
    pub fn new(store: SharedStore, token_service: TokenService, query_timeout: Duration) -> Self {
        Self {
            users: UserRepository::new(store.clone(), query_timeout),
            tokens: TokenRepository::new(store.clone(), query_timeout),
            store,
            token_service: Arc::new(token_service),
            default_roles: Arc::from(Vec::new()),
            metrics: None,
            started_at: chrono::Utc::now(),
            version: env!("CARGO_PKG_VERSION").to_string(),
        }
    }

    /// 인메모리 저장소를 사용하는 상태.
    ///
    /// 개발 모드(`database.backend = "memory"`)와 테스트에서 사용합니다.
    pub fn in_memory(jwt: &JwtConfig) -> Self {
        Self::new(
            Arc::new(MemoryDocumentStore::new()),
            TokenService::new(jwt),
            DEFAULT_QUERY_TIMEOUT,
        )
    }

    /// 회원가입 기본 역할 설정.
    #[must_use]
    pub fn with_default_roles(mut self, roles: Vec<String>) -> Self {
        self.default_roles = Arc::from(roles);
        self
    }

    /// Prometheus 핸들 설정.
    #[must_use]
    pub fn with_metrics(mut self, handle: PrometheusHandle) -> Self {
        self.metrics = Some(handle);
        self
    }

    /// 서버 업타임 (초).
    pub fn uptime_secs(&self) -> i64 {
        (chrono::Utc::now() - self.started_at).num_seconds()
    }

    /// 저장소 연결 상태 확인.
    pub async fn is_store_healthy(&self) -> bool {
        match tokio::time::timeout(Duration::from_secs(5), self.store.ping()).await {
            Ok(Ok(())) => true,
            Ok(Err(e)) => {
                warn!(backend = self.store.backend_name(), error = %e, "Store ping failed");
                false
            }
            Err(_) => {
                warn!(backend = self.store.backend_name(), "Store ping timed out");
                false
            }
        }
    }
}
