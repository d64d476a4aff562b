//! 인가 미들웨어.
//!
//! 요청마다 [`RouteTable`]에서 정책을 찾고, 보안 라우트면 access token과 역할을
//! 확인한 뒤에만 핸들러로 넘깁니다. 판단 순서:
//!
//! 1. `OPTIONS` 요청은 그대로 통과
//! 2. 등록되지 않은 경로는 404, 경로는 있으나 메서드가 다르면 405
//! 3. 공개 라우트는 통과
//! 4. `Authorization` 헤더 누락 → 401
//! 5. Bearer 토큰 검증 실패 → 401 (만료면 `X-Token-Expired: true`)
//! 6. 허용 역할이 있으면 교집합 확인, 없으면 401
//!
//! 통과한 보안 요청에는 [`AuthenticatedUser`]가 extension으로 붙습니다.

use std::sync::Arc;

use axum::{
    extract::{FromRequestParts, Request, State},
    http::{header::AUTHORIZATION, request::Parts, HeaderMap, Method},
    middleware::Next,
    response::{IntoResponse, Response},
};
use keyward_core::UserProfile;
use tracing::{debug, error};

use super::jwt::{TokenError, TokenService, TokenUse};
use super::registry::{RouteMatch, RoutePolicy, RouteTable};
use crate::error::ApiError;
use crate::metrics::record_access_denied;

/// 인증된 요청의 사용자.
#[derive(Debug, Clone)]
pub struct AuthenticatedUser(pub UserProfile);

impl<S> FromRequestParts<S> for AuthenticatedUser
where
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request_parts(parts: &mut Parts, _state: &S) -> Result<Self, Self::Rejection> {
        parts
            .extensions
            .get::<AuthenticatedUser>()
            .cloned()
            .ok_or_else(|| ApiError::AccessDenied("authentication required".to_string()))
    }
}

/// 미들웨어 상태: 정책 테이블과 토큰 서비스.
#[derive(Clone)]
pub struct AuthGate {
    table: Arc<RouteTable>,
    tokens: Arc<TokenService>,
}

impl AuthGate {
    pub fn new(table: Arc<RouteTable>, tokens: Arc<TokenService>) -> Self {
        Self { table, tokens }
    }

    pub fn table(&self) -> &RouteTable {
        &self.table
    }

    /// 보안 라우트에 대한 인증/인가.
    fn authenticate(&self, headers: &HeaderMap, policy: &RoutePolicy) -> Result<UserProfile, ApiError> {
        let header = headers.get(AUTHORIZATION).ok_or_else(|| {
            record_access_denied("missing_token");
            ApiError::AccessDenied("'Authorization' not found in the HTTP Request Header".to_string())
        })?;

        let token = header
            .to_str()
            .ok()
            .and_then(bearer_token)
            .ok_or_else(|| {
                record_access_denied("invalid_token");
                ApiError::AccessDenied(
                    "access denied. Authorization header must use the Bearer scheme".to_string(),
                )
            })?;

        let (_, profile) = self
            .tokens
            .verify::<UserProfile>(token, TokenUse::Access)
            .map_err(|e| match e {
                TokenError::Expired => {
                    record_access_denied("expired");
                    ApiError::TokenExpired
                }
                other => {
                    record_access_denied("invalid_token");
                    debug!(error = %other, path = %policy.path, "Access token rejected");
                    ApiError::AccessDenied(format!("access denied. {}", other))
                }
            })?;

        if !policy.permitted_roles.is_empty() && !profile.has_any_role(&policy.permitted_roles) {
            record_access_denied("role_mismatch");
            debug!(
                email = %profile.email,
                path = %policy.path,
                "Role check failed"
            );
            return Err(ApiError::AccessDenied(
                "unauthorised access to this URL".to_string(),
            ));
        }

        Ok(profile)
    }
}

/// `Bearer <token>`에서 토큰 부분을 꺼냅니다. 스킴 이름은 대소문자를 구분하지 않습니다.
fn bearer_token(value: &str) -> Option<&str> {
    let (scheme, token) = value.trim().split_once(' ')?;
    let token = token.trim();
    (scheme.eq_ignore_ascii_case("bearer") && !token.is_empty()).then_some(token)
}

/// 인가 미들웨어.
///
/// `axum::middleware::from_fn_with_state(gate, authorize)`로 라우터 전체에 적용합니다.
/// fallback보다 나중에 적용해야 등록되지 않은 경로에도 실행됩니다.
pub async fn authorize(State(gate): State<AuthGate>, mut request: Request, next: Next) -> Response {
    if request.method() == Method::OPTIONS {
        return next.run(request).await;
    }

    let method = request.method().clone();
    let path = request.uri().path().to_string();

    let policy = match gate.table.lookup(&method, &path) {
        RouteMatch::Found(policy) => policy,
        RouteMatch::MethodNotAllowed => {
            record_access_denied("method");
            return ApiError::MethodNotAllowed { method, path }.into_response();
        }
        RouteMatch::NotRegistered => {
            record_access_denied("unregistered");
            error!(%method, path = %path, "No route descriptor for request; rejecting");
            return ApiError::RouteNotRegistered { method, path }.into_response();
        }
    };

    if !policy.secure {
        return next.run(request).await;
    }

    match gate.authenticate(request.headers(), policy) {
        Ok(profile) => {
            request.extensions_mut().insert(AuthenticatedUser(profile));
            next.run(request).await
        }
        Err(e) => e.into_response(),
    }
}
