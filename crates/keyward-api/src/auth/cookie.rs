//! refresh token 쿠키.

use axum::http::header::{InvalidHeaderValue, COOKIE};
use axum::http::{HeaderMap, HeaderValue};
use chrono::Duration;

/// refresh token을 담는 쿠키 이름.
pub const REFRESH_COOKIE: &str = "jwt";

/// `Set-Cookie` 헤더 값 생성.
///
/// # Arguments
///
/// * `token` - refresh token
/// * `max_age` - 쿠키 유지 시간
pub fn refresh_cookie(token: &str, max_age: Duration) -> Result<HeaderValue, InvalidHeaderValue> {
    HeaderValue::from_str(&format!(
        "{}={}; Max-Age={}; Path=/; Secure; HttpOnly; SameSite=Strict",
        REFRESH_COOKIE,
        token,
        max_age.num_seconds().max(0)
    ))
}

/// 요청의 `Cookie` 헤더들에서 이름이 일치하는 첫 번째 값을 찾습니다.
///
/// 빈 값은 없는 것으로 취급합니다.
pub fn read_cookie<'a>(headers: &'a HeaderMap, name: &str) -> Option<&'a str> {
    headers
        .get_all(COOKIE)
        .iter()
        .filter_map(|value| value.to_str().ok())
        .flat_map(|value| value.split(';'))
        .filter_map(|pair| pair.trim().split_once('='))
        .find(|(key, _)| *key == name)
        .map(|(_, value)| value.trim())
        .filter(|value| !value.is_empty())
}
