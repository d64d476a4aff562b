//! API 라우트.
//!
//! 모든 엔드포인트는 [`api_registry`]에 한 번 선언됩니다.
//!
//! # 라우트 구조
//!
//! | Method | Path | 인증 | 허용 역할 |
//! |---|---|---|---|
//! | GET | `/` | - | - |
//! | GET | `/status` | - | - |
//! | GET | `/status/ready` | - | - |
//! | GET | `/metrics` | - | - |
//! | POST | `/account/create` | - | - |
//! | POST | `/account/auth` | - | - |
//! | GET | `/account/refresh-token` | 쿠키 | - |
//! | GET | `/user/customer-records` | O | 전체 |
//! | GET | `/secured/role-1` | O | SUPERVISOR |
//! | GET | `/secured/role-2` | O | SALES_PERSON |
//! | GET | `/secured/role-1-and-2` | O | SUPERVISOR, SALES_PERSON |
//!
//! 모든 경로 앞에는 설정된 base path가 붙습니다.

pub mod account;
pub mod health;
pub mod secured;
pub mod user;

pub use account::{AccessToken, AuthRequest, CreateAccountRequest, TokenPair};
pub use health::{ComponentStatus, ReadyResponse, StatusResponse};
pub use secured::AccessGranted;

use std::sync::Arc;

use axum::http::{Method, Uri};
use axum::{middleware, Router};
use keyward_core::{SALES_PERSON, SUPERVISOR};
use tracing::info;

use crate::auth::{authorize, AuthGate, RegistryError, RouteDescriptor, RouteRegistry, Verb};
use crate::error::ApiError;
use crate::state::AppState;

/// 전체 라우트 선언.
pub fn api_registry(base_path: &str) -> RouteRegistry<Arc<AppState>> {
    RouteRegistry::new(base_path)
        .route(RouteDescriptor::public(Verb::Get, "/", health::home))
        .route(RouteDescriptor::public(Verb::Get, "/status", health::status))
        .route(RouteDescriptor::public(Verb::Get, "/status/ready", health::ready))
        .route(RouteDescriptor::public(Verb::Get, "/metrics", health::metrics))
        // 계정
        .route(RouteDescriptor::public(Verb::Post, "/account/create", account::create_account))
        .route(RouteDescriptor::public(Verb::Post, "/account/auth", account::authenticate))
        .route(RouteDescriptor::public(
            Verb::Get,
            "/account/refresh-token",
            account::refresh_token,
        ))
        // 인증 필요
        .route(RouteDescriptor::secured(
            Verb::Get,
            "/user/customer-records",
            &[],
            user::customer_records,
        ))
        .route(RouteDescriptor::secured(
            Verb::Get,
            "/secured/role-1",
            &[SUPERVISOR],
            secured::access_granted,
        ))
        .route(RouteDescriptor::secured(
            Verb::Get,
            "/secured/role-2",
            &[SALES_PERSON],
            secured::access_granted,
        ))
        .route(RouteDescriptor::secured(
            Verb::Get,
            "/secured/role-1-and-2",
            &[SUPERVISOR, SALES_PERSON],
            secured::access_granted,
        ))
}

/// 등록되지 않은 경로. 인가 미들웨어가 먼저 거부하므로 평소에는 도달하지 않습니다.
async fn not_registered(method: Method, uri: Uri) -> ApiError {
    ApiError::RouteNotRegistered {
        method,
        path: uri.path().to_string(),
    }
}

/// 전체 API 라우터 생성.
///
/// 레지스트리를 검증하고 인가 미들웨어를 라우터 전체(fallback 포함)에 적용합니다.
pub fn create_api_router(state: Arc<AppState>, base_path: &str) -> Result<Router, RegistryError> {
    let (router, table) = api_registry(base_path).build()?;
    let gate = AuthGate::new(Arc::new(table), state.token_service.clone());

    info!(
        routes = gate.table().len(),
        secured = gate.table().iter().filter(|route| route.secure).count(),
        base_path,
        "Route registry built"
    );

    Ok(router
        .fallback(not_registered)
        .layer(middleware::from_fn_with_state(gate, authorize))
        .with_state(state))
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::body::Body;
    use axum::http::{Request, StatusCode};
    use keyward_core::JwtConfig;
    use tower::ServiceExt;

    fn state() -> Arc<AppState> {
        Arc::new(AppState::in_memory(&JwtConfig::new(
            "routes-test-secret-key-minimum-32-chars",
        )))
    }

    #[test]
    fn test_registry_is_valid() {
        let (_, table) = api_registry("").build().unwrap();
        assert_eq!(table.len(), 11);
        assert_eq!(table.iter().filter(|r| r.secure).count(), 4);
    }

    #[tokio::test]
    async fn test_base_path_prefixes_routes() {
        let app = create_api_router(state(), "/api").unwrap();

        let response = app
            .clone()
            .oneshot(Request::builder().uri("/api/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::OK);

        let response = app
            .oneshot(Request::builder().uri("/status").body(Body::empty()).unwrap())
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::NOT_FOUND);
    }

    #[tokio::test]
    async fn test_secured_route_requires_token() {
        let app = create_api_router(state(), "").unwrap();

        let response = app
            .oneshot(
                Request::builder()
                    .uri("/user/customer-records")
                    .body(Body::empty())
                    .unwrap(),
            )
            .await
            .unwrap();
        assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    }
}
