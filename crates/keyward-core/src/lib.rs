//! # Keyward Core
//!
//! 인증 백엔드의 핵심 도메인 모델 및 저장소 추상화를 제공합니다.
//!
//! 이 크레이트는 API 서버 전반에서 사용되는 기본 타입을 제공합니다:
//! - 사용자 및 토큰 발급 기록 모델
//! - 역할(Role) 정의
//! - 문서 저장소 추상화 (PostgreSQL JSONB / 인메모리)
//! - 설정 관리
//! - 로깅 인프라

pub mod config;
pub mod domain;
pub mod error;
pub mod logging;
pub mod store;

pub use config::*;
pub use domain::*;
pub use error::*;
pub use logging::*;
pub use store::{Collection, DocumentStore, Filter, MemoryDocumentStore, RetryPolicy, SharedStore};

#[cfg(feature = "sqlx-support")]
pub use store::PgDocumentStore;
