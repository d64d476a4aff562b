//! 요청 본문 추출기.

use axum::{
    extract::{FromRequest, Request},
    Json,
};
use serde::de::DeserializeOwned;
use validator::{Validate, ValidationErrors};

use crate::error::ApiError;

/// JSON 본문을 역직렬화하고 `validator` 규칙까지 확인하는 추출기.
///
/// 본문이 없거나 형식이 틀리거나 검증에 실패하면 400 [`ApiError::Validation`]으로 거부합니다.
#[derive(Debug, Clone)]
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Validate,
    S: Send + Sync,
{
    type Rejection = ApiError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(value) = Json::<T>::from_request(req, state)
            .await
            .map_err(|rejection| ApiError::Validation(rejection.body_text()))?;

        value
            .validate()
            .map_err(|errors| ApiError::Validation(validation_message(&errors)))?;

        Ok(Self(value))
    }
}

/// 필드 에러 메시지를 `; `로 이어 붙입니다 (필드 이름 순).
pub fn validation_message(errors: &ValidationErrors) -> String {
    let mut messages = errors
        .field_errors()
        .iter()
        .flat_map(|(field, errors)| {
            errors.iter().map(move |e| {
                e.message
                    .as_ref()
                    .map(|m| m.to_string())
                    .unwrap_or_else(|| format!("{}: invalid value", field))
            })
        })
        .collect::<Vec<_>>();
    messages.sort();
    messages.join("; ")
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{body::Body, http::StatusCode, response::IntoResponse, routing::post, Router};
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Debug, Deserialize, Validate)]
    struct Payload {
        #[validate(email(message = "email must be a valid email address"))]
        email: String,
        #[validate(length(min = 1, message = "name is required"))]
        name: String,
    }

    async fn handler(ValidatedJson(payload): ValidatedJson<Payload>) -> impl IntoResponse {
        payload.name
    }

    async fn send(body: &'static str) -> StatusCode {
        let app = Router::new().route("/", post(handler));
        let request = axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap();
        app.oneshot(request).await.unwrap().status()
    }

    #[tokio::test]
    async fn test_valid_payload() {
        assert_eq!(send(r#"{"email":"a@example.com","name":"A"}"#).await, StatusCode::OK);
    }

    #[tokio::test]
    async fn test_invalid_fields_are_400() {
        assert_eq!(send(r#"{"email":"nope","name":""}"#).await, StatusCode::BAD_REQUEST);
    }

    #[tokio::test]
    async fn test_malformed_json_is_400() {
        assert_eq!(send(r#"{"email":"#).await, StatusCode::BAD_REQUEST);
        assert_eq!(send(r#"{"email":"a@example.com"}"#).await, StatusCode::BAD_REQUEST);
    }

    #[test]
    fn test_validation_message_joins_fields() {
        let payload = Payload {
            email: "nope".into(),
            name: String::new(),
        };
        let message = validation_message(&payload.validate().unwrap_err());
        assert_eq!(message, "email must be a valid email address; name is required");
    }
}
