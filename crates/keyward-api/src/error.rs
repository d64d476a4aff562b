//! API 응답 봉투와 에러 타입.
//!
//! 모든 JSON 응답은 같은 형식을 사용합니다:
//!
//! ```json
//! {
//!   "is_error": false,
//!   "message": "Request Completed",
//!   "data": { "...": "..." }
//! }
//! ```
//!
//! 5xx 에러는 상세 원인을 로그로만 남기고, 응답에는 재시도 안내 문구만 담습니다.

use axum::http::{HeaderName, HeaderValue, Method, StatusCode};
use axum::response::{IntoResponse, Response};
use axum::Json;
use keyward_core::StoreError;
use serde::{Deserialize, Serialize};
use tracing::{error, warn};

use crate::auth::{PasswordError, TokenError};

/// 만료된 토큰으로 거부된 응답에 붙는 헤더.
pub const TOKEN_EXPIRED_HEADER: HeaderName = HeaderName::from_static("x-token-expired");

/// 성공 응답의 기본 메시지.
pub const REQUEST_COMPLETED: &str = "Request Completed";

/// 응답 봉투.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(bound(serialize = "T: Serialize", deserialize = "T: Deserialize<'de>"))]
pub struct ResponseBody<T> {
    pub is_error: bool,
    pub message: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub data: Option<T>,
}

/// 상태 코드와 봉투를 함께 담는 성공 응답.
#[derive(Debug)]
pub struct ApiResponse<T> {
    status: StatusCode,
    body: ResponseBody<T>,
}

impl<T: Serialize> ApiResponse<T> {
    /// 200 OK.
    pub fn ok(data: T) -> Self {
        Self::with_status(StatusCode::OK, data)
    }

    /// 201 Created.
    pub fn created(data: T) -> Self {
        Self::with_status(StatusCode::CREATED, data)
    }

    pub fn with_status(status: StatusCode, data: T) -> Self {
        Self {
            status,
            body: ResponseBody {
                is_error: false,
                message: REQUEST_COMPLETED.to_string(),
                data: Some(data),
            },
        }
    }

    #[must_use]
    pub fn with_message(mut self, message: impl Into<String>) -> Self {
        self.body.message = message.into();
        self
    }
}

impl ApiResponse<()> {
    /// 데이터 없이 메시지만 담은 응답.
    pub fn message(status: StatusCode, message: impl Into<String>) -> Self {
        Self {
            status,
            body: ResponseBody {
                is_error: false,
                message: message.into(),
                data: None,
            },
        }
    }
}

impl<T: Serialize> IntoResponse for ApiResponse<T> {
    fn into_response(self) -> Response {
        (self.status, Json(self.body)).into_response()
    }
}

/// 핸들러와 미들웨어가 반환하는 에러.
#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    /// 요청 본문이 없거나 형식/필드 검증에 실패
    #[error("{0}")]
    Validation(String),

    /// 고유해야 하는 값이 이미 존재
    #[error("{0}")]
    DuplicateResource(String),

    /// 인증 실패 (잘못된 자격 증명, 토큰 누락/무효, 쿠키 누락, 역할 불일치)
    #[error("{0}")]
    AccessDenied(String),

    #[error("unauthorized. Token expired")]
    TokenExpired,

    #[error("route not registered: {method} {path}")]
    RouteNotRegistered { method: Method, path: String },

    #[error("method {method} not allowed for {path}")]
    MethodNotAllowed { method: Method, path: String },

    #[error("unable to hash password. Please try again later")]
    Hashing(#[source] PasswordError),

    #[error("unable to generate token. Please try again later")]
    Signing(#[source] TokenError),

    #[error("unable to complete request. Please try again later")]
    Persistence(#[from] StoreError),

    /// 의존 구성 요소를 사용할 수 없음
    #[error("{0}")]
    Unavailable(String),

    #[error("internal server error")]
    Internal(String),
}

impl ApiError {
    /// 이 에러에 대응하는 HTTP 상태 코드.
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Validation(_) => StatusCode::BAD_REQUEST,
            Self::DuplicateResource(_) => StatusCode::CONFLICT,
            Self::AccessDenied(_) | Self::TokenExpired => StatusCode::UNAUTHORIZED,
            Self::RouteNotRegistered { .. } => StatusCode::NOT_FOUND,
            Self::MethodNotAllowed { .. } => StatusCode::METHOD_NOT_ALLOWED,
            Self::Unavailable(_) => StatusCode::SERVICE_UNAVAILABLE,
            Self::Hashing(_) | Self::Signing(_) | Self::Persistence(_) | Self::Internal(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }

    fn log(&self) {
        match self {
            Self::Hashing(e) => error!(error = %e, "Password hashing failed"),
            Self::Signing(e) => error!(error = %e, "Token signing failed"),
            Self::Persistence(e) => error!(error = %e, "Store operation failed"),
            Self::Internal(detail) => error!(error = %detail, "Internal error"),
            Self::RouteNotRegistered { method, path } => {
                warn!(%method, path = %path, "Request for unregistered route")
            }
            _ => {}
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        self.log();

        let status = self.status();
        let body = ResponseBody::<()> {
            is_error: true,
            message: self.to_string(),
            data: None,
        };

        let mut response = (status, Json(body)).into_response();
        if matches!(self, Self::TokenExpired) {
            response
                .headers_mut()
                .insert(TOKEN_EXPIRED_HEADER, HeaderValue::from_static("true"));
        }
        response
    }
}

/// API 핸들러 Result 타입 별칭.
pub type ApiResult<T> = Result<T, ApiError>;
