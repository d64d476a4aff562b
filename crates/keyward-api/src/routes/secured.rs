//! 역할 기반 접근 확인용 endpoint.
//!
//! 역할 검사는 인가 미들웨어가 라우트 선언의 허용 역할로 수행하므로,
//! 핸들러는 통과한 요청에 응답만 합니다.

use axum::http::StatusCode;
use serde::{Deserialize, Serialize};

use crate::auth::AuthenticatedUser;
use crate::error::ApiResponse;

const ACCESS_GRANTED: &str = "Access granted!";

/// 접근 허용 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessGranted {
    pub email: String,
    pub roles: Vec<String>,
}

/// GET /secured/role-1, /secured/role-2, /secured/role-1-and-2
pub async fn access_granted(AuthenticatedUser(user): AuthenticatedUser) -> ApiResponse<AccessGranted> {
    ApiResponse::with_status(
        StatusCode::OK,
        AccessGranted {
            email: user.email,
            roles: user.roles,
        },
    )
    .with_message(ACCESS_GRANTED)
}
