//! 라우트 레지스트리.
//!
//! 모든 엔드포인트는 [`RouteDescriptor`]로 선언됩니다. 디스크립터는 경로, 메서드,
//! 보안 여부, 허용 역할, 핸들러를 함께 가지며, 시작 시 한 번 검증되어
//! axum [`Router`]와 읽기 전용 [`RouteTable`]로 나뉩니다.
//!
//! 인가 미들웨어는 `RouteTable`만 보고 판단하므로, 테이블에 없는 경로는
//! 라우터에 핸들러가 있더라도 통과할 수 없습니다.

use std::collections::HashSet;

use axum::handler::Handler;
use axum::http::Method;
use axum::routing::{on, MethodFilter, MethodRouter};
use axum::Router;

/// HTTP 메서드.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Verb {
    Get,
    Post,
    Put,
    Patch,
    Delete,
}

impl Verb {
    pub fn method(self) -> Method {
        match self {
            Self::Get => Method::GET,
            Self::Post => Method::POST,
            Self::Put => Method::PUT,
            Self::Patch => Method::PATCH,
            Self::Delete => Method::DELETE,
        }
    }

    fn filter(self) -> MethodFilter {
        match self {
            Self::Get => MethodFilter::GET,
            Self::Post => MethodFilter::POST,
            Self::Put => MethodFilter::PUT,
            Self::Patch => MethodFilter::PATCH,
            Self::Delete => MethodFilter::DELETE,
        }
    }

    /// GET 라우트는 HEAD 요청도 받습니다 (axum이 GET 핸들러로 HEAD를 처리).
    fn matches(self, method: &Method) -> bool {
        self.method() == *method || (self == Self::Get && *method == Method::HEAD)
    }
}

impl std::fmt::Display for Verb {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        f.write_str(self.method().as_str())
    }
}

/// 라우트의 접근 정책 (핸들러 제외).
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct RoutePolicy {
    /// base path가 붙은 전체 경로
    pub path: String,
    pub verb: Verb,
    /// 인증 필요 여부
    pub secure: bool,
    /// 허용 역할. 비어 있으면 인증된 모든 사용자 허용.
    pub permitted_roles: Vec<&'static str>,
}

/// 라우트 선언.
pub struct RouteDescriptor<S> {
    path: &'static str,
    verb: Verb,
    secure: bool,
    permitted_roles: Vec<&'static str>,
    handler: MethodRouter<S>,
}

impl<S> RouteDescriptor<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// 인증 없이 접근 가능한 라우트.
    pub fn public<H, T>(verb: Verb, path: &'static str, handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self {
            path,
            verb,
            secure: false,
            permitted_roles: Vec::new(),
            handler: on(verb.filter(), handler),
        }
    }

    /// 인증이 필요한 라우트.
    ///
    /// # Arguments
    ///
    /// * `roles` - 허용 역할 (비어 있으면 인증만 확인)
    pub fn secured<H, T>(verb: Verb, path: &'static str, roles: &[&'static str], handler: H) -> Self
    where
        H: Handler<T, S>,
        T: 'static,
    {
        Self {
            path,
            verb,
            secure: true,
            permitted_roles: roles.to_vec(),
            handler: on(verb.filter(), handler),
        }
    }
}

/// 레지스트리 구성 에러.
#[derive(Debug, thiserror::Error, PartialEq, Eq)]
pub enum RegistryError {
    #[error("route registered twice: {verb} {path}")]
    Duplicate { verb: Verb, path: String },
    #[error("invalid route path {0:?}: must start with '/' and contain only literal segments")]
    InvalidPath(String),
}

/// 조회 결과.
#[derive(Debug, PartialEq, Eq)]
pub enum RouteMatch<'a> {
    Found(&'a RoutePolicy),
    /// 경로는 있으나 메서드가 등록되지 않음
    MethodNotAllowed,
    NotRegistered,
}

/// 검증이 끝난 불변 라우트 정책 목록.
#[derive(Debug, Default)]
pub struct RouteTable {
    routes: Vec<RoutePolicy>,
}

impl RouteTable {
    /// 요청 메서드와 경로로 정책을 찾습니다 (정확 일치).
    pub fn lookup(&self, method: &Method, path: &str) -> RouteMatch<'_> {
        let mut path_known = false;
        for route in self.routes.iter().filter(|route| route.path == path) {
            if route.verb.matches(method) {
                return RouteMatch::Found(route);
            }
            path_known = true;
        }

        if path_known {
            RouteMatch::MethodNotAllowed
        } else {
            RouteMatch::NotRegistered
        }
    }

    pub fn len(&self) -> usize {
        self.routes.len()
    }

    pub fn is_empty(&self) -> bool {
        self.routes.is_empty()
    }

    pub fn iter(&self) -> impl Iterator<Item = &RoutePolicy> {
        self.routes.iter()
    }
}

/// 라우트 선언 모음.
pub struct RouteRegistry<S> {
    base_path: String,
    descriptors: Vec<RouteDescriptor<S>>,
}

impl<S> RouteRegistry<S>
where
    S: Clone + Send + Sync + 'static,
{
    /// # Arguments
    ///
    /// * `base_path` - 모든 경로 앞에 붙는 접두사 (빈 문자열 허용)
    pub fn new(base_path: impl Into<String>) -> Self {
        Self {
            base_path: base_path.into(),
            descriptors: Vec::new(),
        }
    }

    #[must_use]
    pub fn route(mut self, descriptor: RouteDescriptor<S>) -> Self {
        self.descriptors.push(descriptor);
        self
    }

    /// base path와 라우트 경로를 합칩니다.
    ///
    /// `"/"`는 base path가 있으면 base path 자체가 됩니다.
    pub fn full_path(&self, path: &str) -> String {
        join_path(&self.base_path, path)
    }

    /// 선언을 검증하고 라우터와 정책 테이블을 만듭니다.
    pub fn build(self) -> Result<(Router<S>, RouteTable), RegistryError> {
        let mut router = Router::new();
        let mut routes = Vec::with_capacity(self.descriptors.len());
        let mut seen = HashSet::new();

        for descriptor in self.descriptors {
            let path = join_path(&self.base_path, descriptor.path);
            if !is_literal_path(&path) {
                return Err(RegistryError::InvalidPath(path));
            }
            if !seen.insert((path.clone(), descriptor.verb)) {
                return Err(RegistryError::Duplicate {
                    verb: descriptor.verb,
                    path,
                });
            }

            router = router.route(&path, descriptor.handler);
            routes.push(RoutePolicy {
                path,
                verb: descriptor.verb,
                secure: descriptor.secure,
                permitted_roles: descriptor.permitted_roles,
            });
        }

        Ok((router, RouteTable { routes }))
    }
}

fn join_path(base: &str, path: &str) -> String {
    match (base.is_empty(), path) {
        (true, _) => path.to_string(),
        (false, "/") => base.to_string(),
        (false, _) => format!("{}{}", base, path),
    }
}

fn is_literal_path(path: &str) -> bool {
    path.starts_with('/')
        && !path.contains("//")
        && !path.chars().any(|c| matches!(c, '{' | '}' | ':' | '*' | '?' | '#'))
}

#[cfg(test)]
mod tests {
    use super::*;

    async fn ok() -> &'static str {
        "ok"
    }

    fn sample(base: &str) -> RouteRegistry<()> {
        RouteRegistry::new(base)
            .route(RouteDescriptor::public(Verb::Get, "/", ok))
            .route(RouteDescriptor::public(Verb::Post, "/account/create", ok))
            .route(RouteDescriptor::secured(Verb::Get, "/secured/role-1", &["SUPERVISOR"], ok))
    }

    #[test]
    fn test_build_collects_policies() {
        let (_, table) = sample("").build().unwrap();

        assert_eq!(table.len(), 3);
        let secured = table.iter().find(|r| r.path == "/secured/role-1").unwrap();
        assert!(secured.secure);
        assert_eq!(secured.permitted_roles, vec!["SUPERVISOR"]);
    }

    #[test]
    fn test_base_path_applied() {
        let (_, table) = sample("/api/v1").build().unwrap();
        let paths: Vec<_> = table.iter().map(|r| r.path.as_str()).collect();

        assert_eq!(paths, vec!["/api/v1", "/api/v1/account/create", "/api/v1/secured/role-1"]);
    }

    #[test]
    fn test_lookup() {
        let (_, table) = sample("").build().unwrap();

        assert!(matches!(
            table.lookup(&Method::POST, "/account/create"),
            RouteMatch::Found(policy) if !policy.secure
        ));
        assert_eq!(
            table.lookup(&Method::GET, "/account/create"),
            RouteMatch::MethodNotAllowed
        );
        assert_eq!(table.lookup(&Method::GET, "/nope"), RouteMatch::NotRegistered);
        assert!(matches!(
            table.lookup(&Method::HEAD, "/secured/role-1"),
            RouteMatch::Found(policy) if policy.secure
        ));
        assert_eq!(
            table.lookup(&Method::HEAD, "/account/create"),
            RouteMatch::MethodNotAllowed
        );
        // 정확 일치만 허용
        assert_eq!(
            table.lookup(&Method::GET, "/secured/role-1/"),
            RouteMatch::NotRegistered
        );
    }

    #[test]
    fn test_duplicate_rejected() {
        let result = sample("")
            .route(RouteDescriptor::public(Verb::Post, "/account/create", ok))
            .build();

        assert_eq!(
            result.err(),
            Some(RegistryError::Duplicate {
                verb: Verb::Post,
                path: "/account/create".to_string()
            })
        );
    }

    #[test]
    fn test_same_path_different_verbs_allowed() {
        let (_, table) = sample("")
            .route(RouteDescriptor::public(Verb::Delete, "/account/create", ok))
            .build()
            .unwrap();

        assert_eq!(table.len(), 4);
    }

    #[test]
    fn test_invalid_paths_rejected() {
        for path in ["account", "/users/{id}", "/users/:id", "/a//b"] {
            let result = RouteRegistry::<()>::new("")
                .route(RouteDescriptor::public(Verb::Get, path, ok))
                .build();
            assert!(matches!(result, Err(RegistryError::InvalidPath(_))), "{}", path);
        }
    }
}
