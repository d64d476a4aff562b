//! 계정 흐름 통합 테스트.
//!
//! 전체 미들웨어가 적용된 라우터에 인메모리 저장소를 연결하여
//! 회원가입 → 로그인 → 보호 라우트 → 토큰 갱신을 검증합니다.

use std::sync::Arc;

use axum::body::Body;
use axum::http::{header, Method, Request, StatusCode};
use axum::response::Response;
use axum::Router;
use keyward_api::auth::{verify_password, TokenService};
use keyward_api::create_router;
use keyward_api::state::{AppState, DEFAULT_QUERY_TIMEOUT};
use keyward_core::{
    Collection, DocumentStore, Filter, JwtConfig, MemoryDocumentStore, ServerConfig, SALES_PERSON,
    SUPERVISOR,
};
use serde_json::{json, Value};
use tower::ServiceExt;

const SECRET: &str = "integration-test-secret-key-minimum-32-chars";

struct TestApp {
    router: Router,
    store: Arc<MemoryDocumentStore>,
}

fn spawn_app(default_roles: &[&str]) -> TestApp {
    let store = Arc::new(MemoryDocumentStore::new());
    let state = AppState::new(
        store.clone(),
        TokenService::new(&JwtConfig::new(SECRET)),
        DEFAULT_QUERY_TIMEOUT,
    )
    .with_default_roles(default_roles.iter().map(|r| r.to_string()).collect());

    let server = ServerConfig {
        host: "127.0.0.1".to_string(),
        port: 0,
        base_path: String::new(),
        request_timeout_secs: 30,
        cors_origins: Vec::new(),
    };

    TestApp {
        router: create_router(Arc::new(state), &server).unwrap(),
        store,
    }
}

fn registration(email: &str) -> Value {
    json!({
        "first_name": "Grace",
        "last_name": "Hopper",
        "email": email,
        "phone": "555-0199",
        "password": "cobol1959",
        "date_of_birth": "1906-12-09",
        "address": "Arlington, VA"
    })
}

async fn send(app: &TestApp, request: Request<Body>) -> Response {
    app.router.clone().oneshot(request).await.unwrap()
}

fn post_json(uri: &str, body: &Value) -> Request<Body> {
    Request::builder()
        .method(Method::POST)
        .uri(uri)
        .header(header::CONTENT_TYPE, "application/json")
        .body(Body::from(body.to_string()))
        .unwrap()
}

fn get(uri: &str, bearer: Option<&str>) -> Request<Body> {
    let mut builder = Request::builder().uri(uri);
    if let Some(token) = bearer {
        builder = builder.header(header::AUTHORIZATION, format!("Bearer {}", token));
    }
    builder.body(Body::empty()).unwrap()
}

async fn body_json(response: Response) -> Value {
    let bytes = axum::body::to_bytes(response.into_body(), usize::MAX)
        .await
        .unwrap();
    serde_json::from_slice(&bytes).unwrap()
}

/// 가입 후 로그인하여 (access token, Set-Cookie 헤더 값)을 반환합니다.
async fn register_and_login(app: &TestApp, email: &str) -> (String, String) {
    let response = send(app, post_json("/account/create", &registration(email))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let response = send(
        app,
        post_json(
            "/account/auth",
            &json!({ "username": email, "password": "cobol1959" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let cookie = response
        .headers()
        .get(header::SET_COOKIE)
        .unwrap()
        .to_str()
        .unwrap()
        .to_string();
    let body = body_json(response).await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    (access, cookie)
}

#[tokio::test]
async fn test_register_login_and_list_records() {
    let app = spawn_app(&[]);
    let (access, _) = register_and_login(&app, "grace@example.com").await;

    let response = send(&app, get("/user/customer-records", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let body = body_json(response).await;
    assert_eq!(body["is_error"], false);
    let records = body["data"].as_array().unwrap();
    assert_eq!(records.len(), 1);
    assert_eq!(records[0]["email"], "grace@example.com");
    assert!(records[0].get("password").is_none());

    // 로그인 1회 = 토큰 기록 1건
    assert_eq!(app.store.len(Collection::Tokens).await, 1);
}

#[tokio::test]
async fn test_registration_response_hides_password() {
    let app = spawn_app(&[]);

    let response = send(&app, post_json("/account/create", &registration("ada@example.com"))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    assert_eq!(body["data"]["email"], "ada@example.com");
    assert!(body["data"].get("password").is_none());
}

#[tokio::test]
async fn test_registration_stores_only_password_hash() {
    let app = spawn_app(&[]);

    let response = send(&app, post_json("/account/create", &registration("hash@example.com"))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let stored = app
        .store
        .find_one(Collection::Users, &Filter::all().eq("email", "hash@example.com"))
        .await
        .unwrap()
        .unwrap();
    let hash = stored["password"].as_str().unwrap();

    assert_ne!(hash, "cobol1959");
    assert!(hash.starts_with("$argon2"));
    assert!(verify_password("cobol1959", hash));
    assert!(!verify_password("cobol1960", hash));
}

#[tokio::test]
async fn test_duplicate_email_rejected() {
    let app = spawn_app(&[]);

    let response = send(&app, post_json("/account/create", &registration("dup@example.com"))).await;
    assert_eq!(response.status(), StatusCode::CREATED);

    // 대소문자만 다른 이메일도 같은 계정
    let response = send(&app, post_json("/account/create", &registration("DUP@example.com"))).await;
    assert_eq!(response.status(), StatusCode::CONFLICT);
    assert_eq!(body_json(response).await["is_error"], true);

    assert_eq!(app.store.len(Collection::Users).await, 1);
}

#[tokio::test]
async fn test_invalid_registration_rejected() {
    let app = spawn_app(&[]);
    let mut body = registration("weak@example.com");
    body["password"] = json!("short");

    let response = send(&app, post_json("/account/create", &body)).await;
    assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    assert_eq!(app.store.len(Collection::Users).await, 0);
}

#[tokio::test]
async fn test_login_with_wrong_password() {
    let app = spawn_app(&[]);
    send(&app, post_json("/account/create", &registration("kay@example.com"))).await;

    let response = send(
        &app,
        post_json(
            "/account/auth",
            &json!({ "username": "kay@example.com", "password": "wrong-password1" }),
        ),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get(header::SET_COOKIE).is_none());
    assert_eq!(app.store.len(Collection::Tokens).await, 0);
}

#[tokio::test]
async fn test_refresh_cookie_attributes() {
    let app = spawn_app(&[]);
    let (_, cookie) = register_and_login(&app, "cookie@example.com").await;

    assert!(cookie.starts_with("jwt="));
    assert!(cookie.contains("HttpOnly"));
    assert!(cookie.contains("Secure"));
    assert!(cookie.contains("SameSite=Strict"));
    assert!(cookie.contains(&format!("Max-Age={}", 24 * 60 * 60)));
}

#[tokio::test]
async fn test_refresh_without_cookie() {
    let app = spawn_app(&[]);

    let response = send(&app, get("/account/refresh-token", None)).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(app.store.len(Collection::Tokens).await, 0);
}

#[tokio::test]
async fn test_refresh_with_cookie_issues_access_token() {
    let app = spawn_app(&[]);
    let (_, cookie) = register_and_login(&app, "refresh@example.com").await;
    let cookie_pair = cookie.split(';').next().unwrap().to_string();

    let response = send(
        &app,
        Request::builder()
            .uri("/account/refresh-token")
            .header(header::COOKIE, cookie_pair)
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::CREATED);

    let body = body_json(response).await;
    let access = body["data"]["access_token"].as_str().unwrap().to_string();
    assert_eq!(body["data"]["token_type"], "Bearer");
    assert_eq!(app.store.len(Collection::Tokens).await, 2);

    // 새 access token으로 보호 라우트 접근
    let response = send(&app, get("/user/customer-records", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_refresh_token_not_accepted_as_bearer() {
    let app = spawn_app(&[]);
    let (_, cookie) = register_and_login(&app, "mixup@example.com").await;
    let refresh = cookie
        .split(';')
        .next()
        .and_then(|pair| pair.strip_prefix("jwt="))
        .unwrap()
        .to_string();

    let response = send(&app, get("/user/customer-records", Some(&refresh))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_sales_person_denied_supervisor_route() {
    let app = spawn_app(&[SALES_PERSON]);
    let (access, _) = register_and_login(&app, "sales@example.com").await;

    let response = send(&app, get("/secured/role-1", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert_eq!(
        body_json(response).await["message"],
        "unauthorised access to this URL"
    );

    let response = send(&app, get("/secured/role-2", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::OK);

    let response = send(&app, get("/secured/role-1-and-2", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::OK);
}

#[tokio::test]
async fn test_user_with_both_roles_accepted() {
    let app = spawn_app(&[SUPERVISOR, SALES_PERSON]);
    let (access, _) = register_and_login(&app, "both@example.com").await;

    for path in ["/secured/role-1", "/secured/role-2", "/secured/role-1-and-2"] {
        let response = send(&app, get(path, Some(&access))).await;
        assert_eq!(response.status(), StatusCode::OK, "{}", path);

        let body = body_json(response).await;
        assert_eq!(body["message"], "Access granted!");
        assert_eq!(body["data"]["email"], "both@example.com");
    }
}

#[tokio::test]
async fn test_user_without_roles_denied_role_routes() {
    let app = spawn_app(&[]);
    let (access, _) = register_and_login(&app, "plain@example.com").await;

    let response = send(&app, get("/secured/role-1-and-2", Some(&access))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_unregistered_path_rejected() {
    let app = spawn_app(&[]);

    let response = send(&app, get("/admin/backdoor", None)).await;
    assert_eq!(response.status(), StatusCode::NOT_FOUND);
    assert_eq!(body_json(response).await["is_error"], true);
}

#[tokio::test]
async fn test_wrong_method_on_registered_path() {
    let app = spawn_app(&[]);

    let response = send(
        &app,
        Request::builder()
            .method(Method::DELETE)
            .uri("/account/create")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::METHOD_NOT_ALLOWED);
}

#[tokio::test]
async fn test_head_answered_on_get_routes() {
    let app = spawn_app(&[]);

    let response = send(
        &app,
        Request::builder()
            .method(Method::HEAD)
            .uri("/status")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::OK);

    // HEAD는 GET 라우트의 인증 요구도 그대로 따름
    let response = send(
        &app,
        Request::builder()
            .method(Method::HEAD)
            .uri("/user/customer-records")
            .body(Body::empty())
            .unwrap(),
    )
    .await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
}

#[tokio::test]
async fn test_malformed_bearer_rejected() {
    let app = spawn_app(&[]);

    let response = send(&app, get("/user/customer-records", Some("not.a.token"))).await;
    assert_eq!(response.status(), StatusCode::UNAUTHORIZED);
    assert!(response.headers().get("x-token-expired").is_none());
}
