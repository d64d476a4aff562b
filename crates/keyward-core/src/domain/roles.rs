//! 역할 기반 접근 제어 (RBAC).
//!
//! 역할은 자유 형식 문자열이며, 라우트는 허용 역할 목록을 가집니다.
//! 빈 허용 목록은 "인증된 사용자 누구나"를 의미합니다.

/// 관리자 역할.
pub const SUPERVISOR: &str = "SUPERVISOR";

/// 영업 담당 역할.
pub const SALES_PERSON: &str = "SALES_PERSON";

/// 보유 역할과 허용 역할이 하나라도 겹치는지 확인.
///
/// 비교는 대소문자를 구분합니다.
pub fn roles_intersect<S: AsRef<str>>(held: &[S], permitted: &[&str]) -> bool {
    held.iter().any(|role| permitted.contains(&role.as_ref()))
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_roles_intersect() {
        let sales = vec![SALES_PERSON.to_string()];
        let both = vec![SUPERVISOR.to_string(), SALES_PERSON.to_string()];

        assert!(!roles_intersect(&sales, &[SUPERVISOR]));
        assert!(roles_intersect(&both, &[SUPERVISOR]));
        assert!(roles_intersect(&sales, &[SUPERVISOR, SALES_PERSON]));
    }

    #[test]
    fn test_roles_intersect_empty() {
        let none: Vec<String> = Vec::new();
        assert!(!roles_intersect(&none, &[SUPERVISOR]));
        assert!(!roles_intersect(&[SUPERVISOR], &[]));
    }

    #[test]
    fn test_roles_case_sensitive() {
        assert!(!roles_intersect(&["supervisor"], &[SUPERVISOR]));
    }
}
