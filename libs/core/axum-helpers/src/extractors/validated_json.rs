//! JSON extractor that normalizes and then validates the body.

use crate::errors::AppError;
use axum::{
    extract::{FromRequest, Json, Request},
    response::{IntoResponse, Response},
};
use serde::de::DeserializeOwned;
use validator::Validate;

/// Canonicalize a request body before validation (trim, lowercase, ...).
///
/// The default does nothing.
pub trait Normalize {
    fn normalize(&mut self) {}
}

/// JSON extractor with normalization and validation.
///
/// The body is deserialized, passed through [`Normalize::normalize`] and then
/// checked with the `validator` crate. Failures become a 400 with
/// `{"error": {"type": "validation_error", "details": {...}}}`.
///
/// # Example
/// ```ignore
/// use axum_helpers::extractors::{Normalize, ValidatedJson};
/// use serde::Deserialize;
/// use validator::Validate;
///
/// #[derive(Deserialize, Validate)]
/// struct Signup {
///     #[validate(email)]
///     email: String,
/// }
///
/// impl Normalize for Signup {
///     fn normalize(&mut self) {
///         self.email = self.email.trim().to_lowercase();
///     }
/// }
///
/// async fn signup(ValidatedJson(body): ValidatedJson<Signup>) -> String {
///     body.email
/// }
/// ```
pub struct ValidatedJson<T>(pub T);

impl<T, S> FromRequest<S> for ValidatedJson<T>
where
    T: DeserializeOwned + Normalize + Validate,
    S: Send + Sync,
{
    type Rejection = Response;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        let Json(mut data) = Json::<T>::from_request(req, state)
            .await
            .map_err(|e| AppError::from(e).into_response())?;

        data.normalize();
        data.validate()
            .map_err(|e| AppError::from(e).into_response())?;

        Ok(ValidatedJson(data))
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use axum::{Router, body::Body, http::StatusCode, routing::post};
    use http_body_util::BodyExt;
    use serde::Deserialize;
    use tower::ServiceExt;

    #[derive(Deserialize, Validate)]
    struct Signup {
        #[validate(email)]
        email: String,
    }

    impl Normalize for Signup {
        fn normalize(&mut self) {
            self.email = self.email.trim().to_lowercase();
        }
    }

    fn app() -> Router {
        Router::new().route(
            "/",
            post(|ValidatedJson(body): ValidatedJson<Signup>| async move { body.email }),
        )
    }

    fn request(body: &'static str) -> Request {
        axum::http::Request::builder()
            .method("POST")
            .uri("/")
            .header("content-type", "application/json")
            .body(Body::from(body))
            .unwrap()
    }

    #[tokio::test]
    async fn test_normalizes_before_validating() {
        let response = app()
            .oneshot(request(r#"{"email":"  Ada@Example.COM "}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::OK);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        assert_eq!(&bytes[..], b"ada@example.com");
    }

    #[tokio::test]
    async fn test_validation_failure_shape() {
        let response = app()
            .oneshot(request(r#"{"email":"not-an-email"}"#))
            .await
            .unwrap();

        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
        let bytes = response.into_body().collect().await.unwrap().to_bytes();
        let body: serde_json::Value = serde_json::from_slice(&bytes).unwrap();
        assert_eq!(body["error"]["type"], "validation_error");
        assert!(body["error"]["details"]["email"].is_array());
    }

    #[tokio::test]
    async fn test_malformed_json_is_rejected() {
        let response = app().oneshot(request("{")).await.unwrap();
        assert_eq!(response.status(), StatusCode::BAD_REQUEST);
    }
}
