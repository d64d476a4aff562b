//! JWT 토큰 처리.
//!
//! 서명 키는 [`JwtConfig`]를 통해 명시적으로 주입됩니다. 전역 키는 없습니다.
//!
//! `sub` 클레임에는 subject 값을 JSON으로 직렬화한 문자열이 들어갑니다.
//! access token의 subject는 [`UserProfile`](keyward_core::UserProfile),
//! refresh token의 subject는 이메일 문자열입니다.

use chrono::{Duration, Utc};
use jsonwebtoken::errors::ErrorKind;
use jsonwebtoken::{decode, encode, Algorithm, DecodingKey, EncodingKey, Header, Validation};
use keyward_core::{JwtConfig, UserProfile};
use secrecy::ExposeSecret;
use serde::de::DeserializeOwned;
use serde::{Deserialize, Serialize};
use serde_json::{Map, Value};
use tracing::debug;

/// 서명에 사용하는 알고리즘.
const SIGNING_ALGORITHM: Algorithm = Algorithm::HS256;

/// 검증 시 허용하는 알고리즘. HMAC 계열만 허용합니다.
const ACCEPTED_ALGORITHMS: [Algorithm; 3] = [Algorithm::HS256, Algorithm::HS384, Algorithm::HS512];

/// 서비스가 직접 채우는 클레임. 추가 클레임으로 덮어쓸 수 없습니다.
const RESERVED_CLAIMS: [&str; 4] = ["sub", "iat", "exp", "token_use"];

/// 토큰 용도.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum TokenUse {
    Access,
    Refresh,
}

impl std::fmt::Display for TokenUse {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(match self {
            Self::Access => "access",
            Self::Refresh => "refresh",
        })
    }
}

/// JWT 페이로드.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Claims {
    /// JSON으로 직렬화된 subject
    pub sub: String,
    /// Issued At (Unix timestamp)
    pub iat: i64,
    /// Expiration (Unix timestamp)
    pub exp: i64,
    pub token_use: TokenUse,
    /// 추가 클레임 (예: `iss`)
    #[serde(flatten)]
    pub extra: Map<String, Value>,
}

/// 토큰 발급/검증 에러.
#[derive(Debug, thiserror::Error)]
pub enum TokenError {
    #[error("token expired")]
    Expired,
    #[error("invalid token signature")]
    InvalidSignature,
    #[error("token algorithm not accepted")]
    InvalidAlgorithm,
    #[error("malformed token")]
    Malformed,
    #[error("expected {expected} token, got {found}")]
    WrongUse { expected: TokenUse, found: TokenUse },
    #[error("token subject could not be (de)serialized: {0}")]
    Subject(#[from] serde_json::Error),
    #[error("token lifetime out of range")]
    Lifetime,
    #[error("token signing failed: {0}")]
    Signing(#[source] jsonwebtoken::errors::Error),
}

impl From<jsonwebtoken::errors::Error> for TokenError {
    fn from(err: jsonwebtoken::errors::Error) -> Self {
        match err.kind() {
            ErrorKind::ExpiredSignature => Self::Expired,
            ErrorKind::InvalidSignature => Self::InvalidSignature,
            ErrorKind::InvalidAlgorithm | ErrorKind::InvalidAlgorithmName => Self::InvalidAlgorithm,
            _ => Self::Malformed,
        }
    }
}

/// 토큰 서비스.
///
/// 키와 검증 규칙을 한 번만 구성하고 요청 간에 공유합니다.
#[derive(Clone)]
pub struct TokenService {
    encoding_key: EncodingKey,
    decoding_key: DecodingKey,
    validation: Validation,
    access_ttl: Duration,
    refresh_ttl: Duration,
    issuer: Option<String>,
}

impl std::fmt::Debug for TokenService {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("TokenService")
            .field("access_ttl", &self.access_ttl)
            .field("refresh_ttl", &self.refresh_ttl)
            .field("issuer", &self.issuer)
            .finish_non_exhaustive()
    }
}

impl TokenService {
    /// 설정으로부터 서비스 생성.
    pub fn new(config: &JwtConfig) -> Self {
        let secret = config.secret.expose_secret().as_bytes();

        let mut validation = Validation::new(SIGNING_ALGORITHM);
        validation.algorithms = ACCEPTED_ALGORITHMS.to_vec();
        validation.leeway = 0;
        validation.validate_exp = true;
        validation.set_required_spec_claims(&["exp", "sub"]);

        Self {
            encoding_key: EncodingKey::from_secret(secret),
            decoding_key: DecodingKey::from_secret(secret),
            validation,
            access_ttl: config.access_ttl(),
            refresh_ttl: config.refresh_ttl(),
            issuer: config.issuer.clone(),
        }
    }

    pub fn access_ttl(&self) -> Duration {
        self.access_ttl
    }

    pub fn refresh_ttl(&self) -> Duration {
        self.refresh_ttl
    }

    /// 토큰 발급.
    ///
    /// # Arguments
    ///
    /// * `subject` - `sub`에 JSON으로 직렬화될 값
    /// * `token_use` - 토큰 용도
    /// * `ttl` - 유효 기간
    /// * `extra` - 병합할 추가 클레임
    pub fn issue<S: Serialize>(
        &self,
        subject: &S,
        token_use: TokenUse,
        ttl: Duration,
        mut extra: Map<String, Value>,
    ) -> Result<String, TokenError> {
        for key in RESERVED_CLAIMS {
            if extra.remove(key).is_some() {
                debug!(claim = key, "Dropped reserved claim from extra claims");
            }
        }

        let now = Utc::now();
        let expires_at = now.checked_add_signed(ttl).ok_or(TokenError::Lifetime)?;
        let claims = Claims {
            sub: serde_json::to_string(subject)?,
            iat: now.timestamp(),
            exp: expires_at.timestamp(),
            token_use,
            extra,
        };

        encode(&Header::new(SIGNING_ALGORITHM), &claims, &self.encoding_key)
            .map_err(TokenError::Signing)
    }

    /// 토큰 검증.
    ///
    /// 서명, 알고리즘, 만료(여유 시간 0), 용도를 모두 확인한 뒤 subject를 역직렬화합니다.
    pub fn verify<S: DeserializeOwned>(
        &self,
        token: &str,
        expected: TokenUse,
    ) -> Result<(Claims, S), TokenError> {
        let data = decode::<Claims>(token, &self.decoding_key, &self.validation)?;
        let claims = data.claims;

        if claims.token_use != expected {
            return Err(TokenError::WrongUse {
                expected,
                found: claims.token_use,
            });
        }

        let subject = serde_json::from_str(&claims.sub)?;
        Ok((claims, subject))
    }

    /// access token 발급 (subject = 사용자 프로필).
    pub fn issue_access(
        &self,
        profile: &UserProfile,
        extra: Map<String, Value>,
    ) -> Result<String, TokenError> {
        self.issue(profile, TokenUse::Access, self.access_ttl, extra)
    }

    /// refresh token 발급 (subject = 이메일).
    pub fn issue_refresh(&self, email: &str, extra: Map<String, Value>) -> Result<String, TokenError> {
        self.issue(&email, TokenUse::Refresh, self.refresh_ttl, extra)
    }

    /// 발급 시 붙일 추가 클레임.
    ///
    /// 설정된 issuer가 있으면 그것을, 없으면 요청의 Host를 `iss`로 사용합니다.
    pub fn extra_claims(&self, request_host: Option<&str>) -> Map<String, Value> {
        let mut extra = Map::new();
        if let Some(iss) = self.issuer.as_deref().or(request_host) {
            extra.insert("iss".to_string(), Value::String(iss.to_string()));
        }
        extra
    }
}
