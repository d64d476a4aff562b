//! 설정 관리.
//!
//! 기본값 → `config/default.toml`(선택) → `KEYWARD__*` 환경 변수 순으로 병합합니다.
//! 기존 배포에서 사용하던 `HTTP_PORT`, `DATABASE_URL`, `BASE_URI_PREFIX`, `JWT_SECRET`
//! 환경 변수도 인식합니다.

use std::path::Path;
use std::time::Duration;

use secrecy::{ExposeSecret, SecretString};
use serde::{Deserialize, Deserializer};

use crate::error::ConfigError;
use crate::logging::{LogConfig, LogFormat};
use crate::store::RetryPolicy;

/// JWT 서명 키 최소 길이 (바이트).
pub const MIN_JWT_SECRET_LEN: usize = 32;

/// Access Token 최대 유효 기간 (분, 7일).
pub const MAX_ACCESS_TTL_MINUTES: i64 = 7 * 24 * 60;

/// Refresh Token 최대 유효 기간 (시간, 365일).
pub const MAX_REFRESH_TTL_HOURS: i64 = 365 * 24;

/// 애플리케이션 설정.
#[derive(Debug, Deserialize)]
pub struct AppConfig {
    /// 서버 설정
    pub server: ServerConfig,
    /// 데이터베이스 설정
    pub database: DatabaseConfig,
    /// JWT 설정
    pub jwt: JwtConfig,
    /// 회원가입 설정
    #[serde(default)]
    pub registration: RegistrationConfig,
    /// 로깅 설정
    pub logging: LoggingConfig,
}

/// 서버 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct ServerConfig {
    /// 바인딩할 호스트
    pub host: String,
    /// 리스닝할 포트
    pub port: u16,
    /// 모든 라우트 앞에 붙는 경로 (예: "/api"). 빈 문자열이면 없음.
    #[serde(default)]
    pub base_path: String,
    /// 전역 요청 타임아웃 (초)
    pub request_timeout_secs: u64,
    /// 허용 CORS origin 목록. 비어 있으면 모든 origin 허용.
    #[serde(default)]
    pub cors_origins: Vec<String>,
}

impl ServerConfig {
    /// `host:port` 문자열.
    pub fn bind_address(&self) -> String {
        format!("{}:{}", self.host, self.port)
    }
}

/// 저장소 백엔드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum DatabaseBackend {
    /// PostgreSQL (JSONB)
    Postgres,
    /// 프로세스 내 메모리 (재시작 시 소멸)
    Memory,
}

/// 데이터베이스 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct DatabaseConfig {
    pub backend: DatabaseBackend,
    /// 연결 문자열 (postgres 백엔드에서 필수)
    #[serde(default)]
    pub url: Option<String>,
    /// 최대 연결 수
    pub max_connections: u32,
    /// 커넥션 획득 타임아웃 (초)
    pub connect_timeout_secs: u64,
    /// 시작 시 최대 연결 시도 횟수
    pub connect_attempts: u32,
    /// 첫 재시도 대기 (밀리초)
    pub retry_initial_delay_ms: u64,
    /// 재시도 대기 상한 (밀리초)
    pub retry_max_delay_ms: u64,
    /// 요청별 저장소 호출 타임아웃 (초)
    pub query_timeout_secs: u64,
}

impl DatabaseConfig {
    /// 시작 시 연결 재시도 정책.
    pub fn retry_policy(&self) -> RetryPolicy {
        RetryPolicy::new(
            self.connect_attempts,
            Duration::from_millis(self.retry_initial_delay_ms),
            Duration::from_millis(self.retry_max_delay_ms),
        )
    }

    /// 요청별 저장소 호출 타임아웃.
    pub fn query_timeout(&self) -> Duration {
        Duration::from_secs(self.query_timeout_secs)
    }
}

/// JWT 설정.
///
/// 서명 키는 이 구조체를 통해서만 토큰 서비스에 전달됩니다.
#[derive(Debug, Deserialize)]
pub struct JwtConfig {
    /// HMAC 서명 키
    #[serde(deserialize_with = "deserialize_secret")]
    pub secret: SecretString,
    /// Access Token 만료 시간 (분)
    pub access_ttl_minutes: i64,
    /// Refresh Token 만료 시간 (시간)
    pub refresh_ttl_hours: i64,
    /// `iss` 클레임. 비어 있으면 요청의 Host를 사용.
    #[serde(default)]
    pub issuer: Option<String>,
}

impl JwtConfig {
    /// 테스트 등에서 직접 구성할 때 사용.
    pub fn new(secret: impl Into<String>) -> Self {
        Self {
            secret: SecretString::from(secret.into()),
            access_ttl_minutes: 30,
            refresh_ttl_hours: 24,
            issuer: None,
        }
    }

    /// 검증되지 않은 값은 허용 범위로 잘라냅니다.
    pub fn access_ttl(&self) -> chrono::Duration {
        chrono::Duration::minutes(self.access_ttl_minutes.clamp(1, MAX_ACCESS_TTL_MINUTES))
    }

    pub fn refresh_ttl(&self) -> chrono::Duration {
        chrono::Duration::hours(self.refresh_ttl_hours.clamp(1, MAX_REFRESH_TTL_HOURS))
    }
}

fn deserialize_secret<'de, D>(deserializer: D) -> Result<SecretString, D::Error>
where
    D: Deserializer<'de>,
{
    String::deserialize(deserializer).map(SecretString::from)
}

/// 회원가입 설정.
#[derive(Debug, Clone, Default, Deserialize)]
pub struct RegistrationConfig {
    /// 신규 사용자에게 부여할 역할
    #[serde(default)]
    pub default_roles: Vec<String>,
}

/// 로깅 설정.
#[derive(Debug, Clone, Deserialize)]
pub struct LoggingConfig {
    /// 로그 레벨 필터 (예: "info", "keyward_api=debug")
    pub level: String,
    /// 출력 형식 ("pretty" | "json" | "compact")
    pub format: String,
}

impl LoggingConfig {
    /// 로깅 초기화용 설정으로 변환.
    pub fn to_log_config(&self) -> LogConfig {
        let format = self.format.parse().unwrap_or(LogFormat::Pretty);
        LogConfig::new(self.level.clone()).with_format(format)
    }
}

impl AppConfig {
    /// 파일(선택)과 환경 변수에서 설정을 로드하고 검증합니다.
    pub fn load<P: AsRef<Path>>(path: P) -> Result<Self, ConfigError> {
        let builder = config::Config::builder()
            // 기본값으로 시작
            .set_default("server.host", "0.0.0.0")?
            .set_default("server.port", 8080)?
            .set_default("server.base_path", "")?
            .set_default("server.request_timeout_secs", 30)?
            .set_default("database.backend", "postgres")?
            .set_default("database.max_connections", 10)?
            .set_default("database.connect_timeout_secs", 6)?
            .set_default("database.connect_attempts", 5)?
            .set_default("database.retry_initial_delay_ms", 500)?
            .set_default("database.retry_max_delay_ms", 8000)?
            .set_default("database.query_timeout_secs", 30)?
            .set_default("jwt.secret", "")?
            .set_default("jwt.access_ttl_minutes", 30)?
            .set_default("jwt.refresh_ttl_hours", 24)?
            .set_default("logging.level", "info")?
            .set_default("logging.format", "pretty")?
            // 파일에서 로드 (없어도 됨)
            .add_source(config::File::from(path.as_ref()).required(false))
            // 환경 변수로 오버라이드
            .add_source(
                config::Environment::with_prefix("KEYWARD")
                    .prefix_separator("__")
                    .separator("__")
                    .list_separator(",")
                    .with_list_parse_key("server.cors_origins")
                    .with_list_parse_key("registration.default_roles")
                    .try_parsing(true),
            )
            // 기존 배포 환경 변수
            .set_override_option("server.port", std::env::var("HTTP_PORT").ok())?
            .set_override_option("server.base_path", std::env::var("BASE_URI_PREFIX").ok())?
            .set_override_option("database.url", std::env::var("DATABASE_URL").ok())?
            .set_override_option("jwt.secret", std::env::var("JWT_SECRET").ok())?;

        let config: AppConfig = builder.build()?.try_deserialize()?;
        config.validate()?;
        Ok(config)
    }

    /// 기본 경로에서 설정을 로드합니다.
    pub fn load_default() -> Result<Self, ConfigError> {
        Self::load("config/default.toml")
    }

    /// 설정 값을 검증합니다.
    pub fn validate(&self) -> Result<(), ConfigError> {
        if self.jwt.secret.expose_secret().len() < MIN_JWT_SECRET_LEN {
            return Err(ConfigError::Invalid(format!(
                "jwt.secret must be at least {} bytes (set JWT_SECRET or KEYWARD__JWT__SECRET)",
                MIN_JWT_SECRET_LEN
            )));
        }

        if !(1..=MAX_ACCESS_TTL_MINUTES).contains(&self.jwt.access_ttl_minutes) {
            return Err(ConfigError::Invalid(format!(
                "jwt.access_ttl_minutes must be between 1 and {}",
                MAX_ACCESS_TTL_MINUTES
            )));
        }

        if !(1..=MAX_REFRESH_TTL_HOURS).contains(&self.jwt.refresh_ttl_hours) {
            return Err(ConfigError::Invalid(format!(
                "jwt.refresh_ttl_hours must be between 1 and {}",
                MAX_REFRESH_TTL_HOURS
            )));
        }

        if self.database.backend == DatabaseBackend::Postgres && self.database.url.is_none() {
            return Err(ConfigError::Invalid(
                "database.url is required for the postgres backend (set DATABASE_URL)".to_string(),
            ));
        }

        let base = &self.server.base_path;
        if !base.is_empty() && (!base.starts_with('/') || base.ends_with('/')) {
            return Err(ConfigError::Invalid(format!(
                "server.base_path must start with '/' and not end with '/': {:?}",
                base
            )));
        }

        Ok(())
    }
}
