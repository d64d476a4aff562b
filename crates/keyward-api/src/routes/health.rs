//! 헬스 체크 및 정적 endpoint.
//!
//! 로드밸런서나 오케스트레이션 시스템(Kubernetes 등)에서 사용됩니다.

use std::sync::Arc;

use axum::{
    extract::State,
    http::{header::CONTENT_TYPE, StatusCode},
    response::{IntoResponse, Response},
};
use serde::{Deserialize, Serialize};

use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::state::AppState;

/// liveness 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct StatusResponse {
    /// 항상 "ok"
    pub status: String,
    pub version: String,
    /// 서버 업타임(초)
    pub uptime_secs: i64,
}

/// readiness 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct ReadyResponse {
    /// "ready" | "unavailable"
    pub status: String,
    pub version: String,
    pub uptime_secs: i64,
    /// 현재 시간 (ISO 8601)
    pub timestamp: String,
    pub store: ComponentStatus,
}

/// 컴포넌트 상태.
#[derive(Debug, Serialize, Deserialize)]
pub struct ComponentStatus {
    /// 백엔드 이름 ("postgres" | "memory")
    pub backend: String,
    /// "up" | "down"
    pub status: String,
}

impl ComponentStatus {
    pub fn up(backend: &str) -> Self {
        Self {
            backend: backend.to_string(),
            status: "up".to_string(),
        }
    }

    pub fn down(backend: &str) -> Self {
        Self {
            backend: backend.to_string(),
            status: "down".to_string(),
        }
    }
}

/// GET /
pub async fn home() -> ApiResponse<()> {
    ApiResponse::message(StatusCode::OK, "Hello!")
}

/// 간단한 헬스 체크 (liveness probe용).
///
/// GET /status
pub async fn status(State(state): State<Arc<AppState>>) -> ApiResponse<StatusResponse> {
    ApiResponse::ok(StatusResponse {
        status: "ok".to_string(),
        version: state.version.clone(),
        uptime_secs: state.uptime_secs(),
    })
}

/// 상세 헬스 체크 (readiness probe용).
///
/// 저장소 ping이 실패하면 503을 반환합니다.
/// GET /status/ready
pub async fn ready(State(state): State<Arc<AppState>>) -> ApiResponse<ReadyResponse> {
    let backend = state.store.backend_name();
    let healthy = state.is_store_healthy().await;

    let (status_code, status, store) = if healthy {
        (StatusCode::OK, "ready", ComponentStatus::up(backend))
    } else {
        (
            StatusCode::SERVICE_UNAVAILABLE,
            "unavailable",
            ComponentStatus::down(backend),
        )
    };

    let response = ApiResponse::with_status(
        status_code,
        ReadyResponse {
            status: status.to_string(),
            version: state.version.clone(),
            uptime_secs: state.uptime_secs(),
            timestamp: chrono::Utc::now().to_rfc3339(),
            store,
        },
    );

    if healthy {
        response
    } else {
        response.with_message("document store unavailable")
    }
}

/// Prometheus 메트릭 (text exposition format).
///
/// GET /metrics
pub async fn metrics(State(state): State<Arc<AppState>>) -> ApiResult<Response> {
    let handle = state
        .metrics
        .as_ref()
        .ok_or_else(|| ApiError::Unavailable("metrics recorder not installed".to_string()))?;

    Ok((
        [(CONTENT_TYPE, "text/plain; version=0.0.4")],
        handle.render(),
    )
        .into_response())
}
