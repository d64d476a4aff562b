//! 토큰 발급 기록.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

/// `tokens` 컬렉션에 저장되는 발급 기록.
///
/// 인증 또는 갱신에 성공할 때마다 생성되며 수정되지 않습니다.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct TokenRecord {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub access_token: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub refresh_token: Option<String>,
    pub created_at: DateTime<Utc>,
}

impl TokenRecord {
    /// 새 발급 기록 생성.
    pub fn new(access_token: impl Into<String>, refresh_token: Option<String>) -> Self {
        Self {
            id: Uuid::new_v4(),
            access_token: access_token.into(),
            refresh_token,
            created_at: Utc::now(),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_refresh_token_omitted_when_absent() {
        let record = TokenRecord::new("access", None);
        let json = serde_json::to_value(&record).unwrap();

        assert_eq!(json["access_token"], "access");
        assert!(json.get("refresh_token").is_none());
    }
}
