//! 사용자 모델.
//!
//! 저장 형식([`User`])과 외부 노출 형식([`UserProfile`])을 타입 수준에서 분리합니다.
//! `UserProfile`에는 비밀번호 필드가 존재하지 않으므로 응답이나 토큰 subject로
//! 해시가 새어나갈 수 없습니다.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use uuid::Uuid;

use super::roles::roles_intersect;

/// `users` 컬렉션에 저장되는 사용자 문서.
#[derive(Clone, Serialize, Deserialize)]
pub struct User {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    /// PHC 형식 비밀번호 해시
    #[serde(rename = "password")]
    pub password_hash: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
    /// 소프트 삭제 시각 (현재 사용되지 않음)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub deleted_at: Option<DateTime<Utc>>,
}

impl std::fmt::Debug for User {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.debug_struct("User")
            .field("id", &self.id)
            .field("email", &self.email)
            .field("roles", &self.roles)
            .field("password_hash", &"[REDACTED]")
            .finish_non_exhaustive()
    }
}

/// 신규 사용자 입력.
#[derive(Debug, Clone)]
pub struct NewUser {
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    pub date_of_birth: Option<NaiveDate>,
    pub address: Option<String>,
}

impl User {
    /// 신규 사용자 문서 생성.
    ///
    /// # Arguments
    ///
    /// * `input` - 프로필 입력값
    /// * `password_hash` - 이미 해싱된 비밀번호
    /// * `roles` - 부여할 역할 목록
    pub fn new(input: NewUser, password_hash: String, roles: Vec<String>) -> Self {
        let now = Utc::now();
        Self {
            id: Uuid::new_v4(),
            first_name: input.first_name,
            last_name: input.last_name,
            email: input.email,
            phone: input.phone,
            password_hash,
            date_of_birth: input.date_of_birth,
            roles,
            address: input.address,
            created_at: now,
            updated_at: now,
            deleted_at: None,
        }
    }

    /// 외부 노출용 프로필로 변환.
    pub fn profile(&self) -> UserProfile {
        UserProfile::from(self)
    }
}

/// 외부로 노출되는 사용자 표현.
///
/// 응답 본문과 access token의 subject로 사용됩니다.
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct UserProfile {
    #[serde(rename = "_id")]
    pub id: Uuid,
    pub first_name: String,
    pub last_name: String,
    pub email: String,
    pub phone: String,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub date_of_birth: Option<NaiveDate>,
    #[serde(default)]
    pub roles: Vec<String>,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub address: Option<String>,
    pub created_at: DateTime<Utc>,
    pub updated_at: DateTime<Utc>,
}

impl UserProfile {
    /// 허용 역할 중 하나라도 보유하는지 확인.
    pub fn has_any_role(&self, permitted: &[&str]) -> bool {
        roles_intersect(&self.roles, permitted)
    }
}

impl From<&User> for UserProfile {
    fn from(user: &User) -> Self {
        Self {
            id: user.id,
            first_name: user.first_name.clone(),
            last_name: user.last_name.clone(),
            email: user.email.clone(),
            phone: user.phone.clone(),
            date_of_birth: user.date_of_birth,
            roles: user.roles.clone(),
            address: user.address.clone(),
            created_at: user.created_at,
            updated_at: user.updated_at,
        }
    }
}

impl From<User> for UserProfile {
    fn from(user: User) -> Self {
        UserProfile::from(&user)
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::roles::{SALES_PERSON, SUPERVISOR};

    fn sample_user() -> User {
        User::new(
            NewUser {
                first_name: "Ada".to_string(),
                last_name: "Lovelace".to_string(),
                email: "ada@example.com".to_string(),
                phone: "+44 20 0000 0000".to_string(),
                date_of_birth: None,
                address: None,
            },
            "$argon2id$v=19$m=19456,t=2,p=1$c2FsdA$aGFzaA".to_string(),
            vec![SALES_PERSON.to_string()],
        )
    }

    #[test]
    fn test_stored_document_keeps_password() {
        let json = serde_json::to_value(sample_user()).unwrap();
        assert!(json.get("password").is_some());
        assert!(json.get("_id").is_some());
        assert!(json.get("deleted_at").is_none());
    }

    #[test]
    fn test_profile_has_no_password() {
        let user = sample_user();
        let json = serde_json::to_string(&user.profile()).unwrap();

        assert!(!json.contains("password"));
        assert!(!json.contains(&user.password_hash));
        assert!(json.contains("ada@example.com"));
    }

    #[test]
    fn test_debug_redacts_hash() {
        let user = sample_user();
        let debug = format!("{:?}", user);
        assert!(!debug.contains("argon2id"));
        assert!(debug.contains("[REDACTED]"));
    }

    #[test]
    fn test_profile_role_check() {
        let profile = sample_user().profile();
        assert!(profile.has_any_role(&[SALES_PERSON]));
        assert!(!profile.has_any_role(&[SUPERVISOR]));
    }
}
