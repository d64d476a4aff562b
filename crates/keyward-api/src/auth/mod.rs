//! 인증 및 권한 부여.
//!
//! # 구성 요소
//!
//! - [`password`]: Argon2id 비밀번호 해싱
//! - [`TokenService`]: access/refresh JWT 발급 및 검증
//! - [`RouteRegistry`]: 경로, 메서드, 보안 여부, 허용 역할을 함께 선언하는 라우트 목록
//! - [`authorize`]: 레지스트리 정책에 따라 요청을 통과/거부하는 미들웨어
//!
//! # 사용 예시
//!
//! ```rust,ignore
//! async fn protected_handler(
//!     AuthenticatedUser(user): AuthenticatedUser,
//! ) -> impl IntoResponse {
//!     format!("Hello, {}!", user.email)
//! }
//! ```

pub mod cookie;
mod jwt;
mod middleware;
pub mod password;
mod registry;

pub use cookie::{read_cookie, refresh_cookie, REFRESH_COOKIE};
pub use jwt::{Claims, TokenError, TokenService, TokenUse};
pub use middleware::{authorize, AuthGate, AuthenticatedUser};
pub use password::{hash_password, validate_password_strength, verify_password, PasswordError};
pub use registry::{
    RegistryError, RouteDescriptor, RouteMatch, RoutePolicy, RouteRegistry, RouteTable, Verb,
};
