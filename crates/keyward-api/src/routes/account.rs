//! 계정 endpoint: 회원가입, 로그인, 토큰 갱신.
//!
//! - `POST /account/create` - 회원가입
//! - `POST /account/auth` - 로그인 (access + refresh 발급, refresh 쿠키 설정)
//! - `GET /account/refresh-token` - refresh 쿠키로 access token 재발급

use std::sync::Arc;

use axum::{
    extract::State,
    http::{
        header::{HOST, SET_COOKIE},
        HeaderMap,
    },
    response::{IntoResponse, Response},
};
use chrono::NaiveDate;
use keyward_core::{NewUser, TokenRecord, User, UserProfile};
use serde::{Deserialize, Serialize};
use tracing::{debug, error, info, warn};
use validator::{Validate, ValidationError};

use crate::auth::{
    hash_password, read_cookie, refresh_cookie, validate_password_strength, verify_password,
    TokenError, TokenUse, REFRESH_COOKIE,
};
use crate::error::{ApiError, ApiResponse, ApiResult};
use crate::extract::ValidatedJson;
use crate::metrics::{record_login, record_token_issued};
use crate::state::AppState;

/// 토큰 타입 (항상 "Bearer").
const BEARER: &str = "Bearer";

const INVALID_CREDENTIALS: &str = "invalid credentials supplied. Please check username/password";

/// 비밀번호 강도 검증 (validator 커스텀 함수).
fn validate_password(value: &str) -> Result<(), ValidationError> {
    validate_password_strength(value)
        .map_err(|message| ValidationError::new("weak_password").with_message(message.into()))
}

/// 회원가입 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct CreateAccountRequest {
    #[validate(length(min = 1, max = 100, message = "first_name is required"))]
    pub first_name: String,
    #[validate(length(min = 1, max = 100, message = "last_name is required"))]
    pub last_name: String,
    #[validate(email(message = "email must be a valid email address"))]
    pub email: String,
    #[validate(length(min = 1, max = 32, message = "phone is required"))]
    pub phone: String,
    #[validate(custom(function = "validate_password"))]
    pub password: String,
    /// 생년월일 (YYYY-MM-DD)
    #[serde(default)]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub address: Option<String>,
}

/// 로그인 요청.
#[derive(Debug, Deserialize, Validate)]
pub struct AuthRequest {
    /// 가입 이메일
    #[validate(email(message = "username must be a valid email address"))]
    pub username: String,
    #[validate(length(min = 1, message = "password is required"))]
    pub password: String,
}

/// 로그인 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct TokenPair {
    pub access_token: String,
    pub refresh_token: String,
    /// 토큰 타입 (항상 "Bearer")
    pub token_type: String,
    /// access token 만료 시간 (초)
    pub expires_in: i64,
}

/// 토큰 갱신 응답.
#[derive(Debug, Serialize, Deserialize)]
pub struct AccessToken {
    pub access_token: String,
    pub token_type: String,
    pub expires_in: i64,
}

/// 이메일 비교용 정규화 (앞뒤 공백 제거, 소문자).
fn normalize_email(email: &str) -> String {
    email.trim().to_lowercase()
}

fn request_host(headers: &HeaderMap) -> Option<&str> {
    headers.get(HOST).and_then(|value| value.to_str().ok())
}

/// CPU 비용이 큰 해싱 작업을 blocking 스레드에서 실행합니다.
async fn run_blocking<T, F>(task: F) -> ApiResult<T>
where
    F: FnOnce() -> T + Send + 'static,
    T: Send + 'static,
{
    tokio::task::spawn_blocking(task)
        .await
        .map_err(|e| ApiError::Internal(format!("blocking task failed: {}", e)))
}

/// 회원가입.
///
/// POST /account/create
///
/// 이메일 중복이면 409. 역할은 요청에서 받지 않고 설정된 기본 역할을 부여합니다.
pub async fn create_account(
    State(state): State<Arc<AppState>>,
    ValidatedJson(request): ValidatedJson<CreateAccountRequest>,
) -> ApiResult<ApiResponse<UserProfile>> {
    let email = normalize_email(&request.email);

    if state.users.find_by_email(&email).await?.is_some() {
        debug!(email = %email, "Registration rejected: email already registered");
        return Err(ApiError::DuplicateResource(format!(
            "an account with email {} already exists",
            email
        )));
    }

    let password = request.password;
    let password_hash = run_blocking(move || hash_password(&password))
        .await?
        .map_err(ApiError::Hashing)?;

    let user = User::new(
        NewUser {
            first_name: request.first_name.trim().to_string(),
            last_name: request.last_name.trim().to_string(),
            email: email.clone(),
            phone: request.phone.trim().to_string(),
            date_of_birth: request.date_of_birth,
            address: request.address,
        },
        password_hash,
        state.default_roles.to_vec(),
    );

    // 조회와 삽입 사이의 경쟁은 저장소의 유니크 인덱스가 잡습니다
    match state.users.create(&user).await {
        Ok(_) => {}
        Err(e) if e.is_duplicate() => {
            return Err(ApiError::DuplicateResource(format!(
                "an account with email {} already exists",
                email
            )));
        }
        Err(e) => return Err(e.into()),
    }

    info!(user_id = %user.id, email = %email, "Account created");
    Ok(ApiResponse::created(user.profile()))
}

/// 로그인.
///
/// POST /account/auth
///
/// 성공 시 access/refresh token을 본문으로 반환하고 refresh token은 `jwt` 쿠키로도 설정합니다.
/// 발급 기록 저장 실패는 로그만 남깁니다.
pub async fn authenticate(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
    ValidatedJson(request): ValidatedJson<AuthRequest>,
) -> ApiResult<Response> {
    let email = normalize_email(&request.username);

    let Some(user) = state.users.find_by_email(&email).await? else {
        record_login("unknown_user");
        debug!(email = %email, "Login failed: unknown user");
        return Err(ApiError::AccessDenied(INVALID_CREDENTIALS.to_string()));
    };

    let password = request.password;
    let password_hash = user.password_hash.clone();
    let matched = run_blocking(move || verify_password(&password, &password_hash)).await?;
    if !matched {
        record_login("bad_password");
        debug!(email = %email, "Login failed: password mismatch");
        return Err(ApiError::AccessDenied(INVALID_CREDENTIALS.to_string()));
    }

    let jwt = &state.token_service;
    let extra = jwt.extra_claims(request_host(&headers));
    let access_token = jwt
        .issue_access(&user.profile(), extra.clone())
        .map_err(ApiError::Signing)?;
    let refresh_token = jwt
        .issue_refresh(&user.email, extra)
        .map_err(ApiError::Signing)?;
    record_token_issued("access");
    record_token_issued("refresh");

    let record = TokenRecord::new(access_token.clone(), Some(refresh_token.clone()));
    if let Err(e) = state.tokens.create(&record).await {
        error!(email = %email, error = %e, "Failed to persist token record");
    }

    let cookie = refresh_cookie(&refresh_token, jwt.refresh_ttl())
        .map_err(|e| ApiError::Internal(format!("refresh cookie: {}", e)))?;

    record_login("success");
    info!(user_id = %user.id, email = %email, "User authenticated");

    let body = TokenPair {
        access_token,
        refresh_token,
        token_type: BEARER.to_string(),
        expires_in: jwt.access_ttl().num_seconds(),
    };

    Ok(([(SET_COOKIE, cookie)], ApiResponse::created(body)).into_response())
}

/// access token 재발급.
///
/// GET /account/refresh-token
///
/// `jwt` 쿠키가 없으면 토큰 저장소를 건드리지 않고 401을 반환합니다.
pub async fn refresh_token(
    State(state): State<Arc<AppState>>,
    headers: HeaderMap,
) -> ApiResult<ApiResponse<AccessToken>> {
    let Some(cookie) = read_cookie(&headers, REFRESH_COOKIE) else {
        return Err(ApiError::AccessDenied(format!(
            "refresh token cookie '{}' not found",
            REFRESH_COOKIE
        )));
    };

    let jwt = &state.token_service;
    let (_, email): (_, String) = jwt
        .verify(cookie, TokenUse::Refresh)
        .map_err(|e| match e {
            TokenError::Expired => ApiError::TokenExpired,
            other => {
                debug!(error = %other, "Refresh token rejected");
                ApiError::AccessDenied("invalid refresh token supplied".to_string())
            }
        })?;

    let Some(user) = state.users.find_by_email(&email).await? else {
        warn!(email = %email, "Refresh token presented for missing account");
        return Err(ApiError::AccessDenied("account no longer exists".to_string()));
    };

    let access_token = jwt
        .issue_access(&user.profile(), jwt.extra_claims(request_host(&headers)))
        .map_err(ApiError::Signing)?;
    record_token_issued("access");

    let record = TokenRecord::new(access_token.clone(), None);
    if let Err(e) = state.tokens.create(&record).await {
        error!(email = %email, error = %e, "Failed to persist token record");
    }

    info!(user_id = %user.id, "Access token refreshed");

    Ok(ApiResponse::created(AccessToken {
        access_token,
        token_type: BEARER.to_string(),
        expires_in: jwt.access_ttl().num_seconds(),
    }))
}
