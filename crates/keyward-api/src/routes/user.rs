//! 사용자 조회 endpoint.

use std::sync::Arc;

use axum::extract::State;
use keyward_core::UserProfile;
use tracing::debug;

use crate::auth::AuthenticatedUser;
use crate::error::{ApiResponse, ApiResult};
use crate::state::AppState;

/// 전체 사용자 목록 (비밀번호 해시 제외).
///
/// GET /user/customer-records
pub async fn customer_records(
    State(state): State<Arc<AppState>>,
    AuthenticatedUser(caller): AuthenticatedUser,
) -> ApiResult<ApiResponse<Vec<UserProfile>>> {
    let users = state.users.find_all().await?;
    debug!(caller = %caller.email, count = users.len(), "Listing customer records");

    Ok(ApiResponse::ok(users.into_iter().map(UserProfile::from).collect()))
}
