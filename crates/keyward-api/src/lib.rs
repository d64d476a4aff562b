//! JWT 인증 계정 REST API.
//!
//! 이 크레이트는 다음을 제공합니다:
//! - Axum 기반 REST API (회원가입, 로그인, 토큰 갱신, 사용자 조회)
//! - 라우트 레지스트리 기반 인가 미들웨어 (미등록 경로는 거부)
//! - 헬스 체크 엔드포인트
//! - Prometheus 메트릭
//!
//! # 모듈 구성
//!
//! - [`state`]: 애플리케이션 공유 상태 (AppState)
//! - [`routes`]: REST API 엔드포인트와 라우트 선언
//! - [`auth`]: JWT, 비밀번호 해싱, 라우트 레지스트리, 인가 미들웨어
//! - [`repository`]: 사용자/토큰 컬렉션 접근
//! - [`metrics`]: Prometheus 메트릭 수집
//! - [`middleware`]: HTTP 미들웨어
//! - [`server`]: 라우터 조립과 종료 시그널

pub mod auth;
pub mod error;
pub mod extract;
pub mod metrics;
pub mod middleware;
pub mod repository;
pub mod routes;
pub mod server;
pub mod state;

pub use auth::{hash_password, verify_password, Claims, TokenError, TokenService, TokenUse};
pub use error::{ApiError, ApiResponse, ApiResult};
pub use metrics::setup_metrics_recorder;
pub use middleware::metrics_layer;
pub use server::create_router;
pub use state::AppState;
