//! 도메인 모델.
//!
//! - [`User`]: 저장소에 보관되는 사용자 문서 (비밀번호 해시 포함)
//! - [`UserProfile`]: 외부로 노출되는 사용자 표현 (비밀번호 필드 없음)
//! - [`TokenRecord`]: 토큰 발급 기록
//! - [`roles`]: 역할 상수 및 역할 교집합 검사

pub mod roles;
pub mod token;
pub mod user;

pub use roles::{roles_intersect, SALES_PERSON, SUPERVISOR};
pub use token::TokenRecord;
pub use user::{NewUser, User, UserProfile};
