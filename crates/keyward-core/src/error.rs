//! 저장소 및 설정 에러 타입.

use std::time::Duration;

use thiserror::Error;

/// 문서 저장소 에러.
#[derive(Debug, Error)]
pub enum StoreError {
    /// 유니크 키 충돌
    #[error("duplicate value for unique key '{key}' in '{collection}'")]
    Duplicate {
        collection: &'static str,
        key: &'static str,
    },

    /// 문서 형식 오류 (JSON 객체가 아님 등)
    #[error("invalid document: {0}")]
    InvalidDocument(String),

    /// 호출 시간 초과
    #[error("store call timed out after {0:?}")]
    Timeout(Duration),

    /// 연결 실패 (재시도 소진 포함)
    #[error("store connection failed: {0}")]
    Connection(String),

    /// 백엔드 에러
    #[error("store backend error: {0}")]
    Backend(String),

    /// 직렬화 에러
    #[error("serialization error: {0}")]
    Serialization(#[from] serde_json::Error),
}

/// 저장소 작업을 위한 Result 타입.
pub type StoreResult<T> = Result<T, StoreError>;

impl StoreError {
    /// 유니크 키 충돌인지 확인합니다.
    pub fn is_duplicate(&self) -> bool {
        matches!(self, StoreError::Duplicate { .. })
    }
}

#[cfg(feature = "sqlx-support")]
impl From<sqlx::Error> for StoreError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::PoolTimedOut => StoreError::Connection("pool timed out".to_string()),
            sqlx::Error::Io(e) => StoreError::Connection(e.to_string()),
            other => StoreError::Backend(other.to_string()),
        }
    }
}

/// 설정 에러.
#[derive(Debug, Error)]
pub enum ConfigError {
    /// 설정 소스 로드/역직렬화 실패
    #[error("failed to load configuration: {0}")]
    Load(#[from] config::ConfigError),

    /// 설정 값 검증 실패
    #[error("invalid configuration: {0}")]
    Invalid(String),
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_is_duplicate() {
        let dup = StoreError::Duplicate {
            collection: "users",
            key: "email",
        };
        assert!(dup.is_duplicate());
        assert!(!StoreError::Timeout(Duration::from_secs(1)).is_duplicate());
    }

    #[test]
    fn test_duplicate_message() {
        let dup = StoreError::Duplicate {
            collection: "users",
            key: "email",
        };
        assert_eq!(
            dup.to_string(),
            "duplicate value for unique key 'email' in 'users'"
        );
    }
}
