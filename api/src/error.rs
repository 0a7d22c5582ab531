//! Error responses
//!
//! Every failure a handler can hit is answered with 400 and a JSON body
//! describing the raw error.

use axum::extract::rejection::{JsonRejection, QueryRejection};
use axum::http::StatusCode;
use axum::response::{IntoResponse, Response};
use axum::Json;
use serde_json::{json, Map, Value};
use shavasa_support::{RepositoryError, SupportError};

#[derive(Debug, thiserror::Error)]
pub enum ApiError {
    #[error(transparent)]
    Support(#[from] SupportError),

    #[error(transparent)]
    Body(#[from] JsonRejection),

    #[error(transparent)]
    Query(#[from] QueryRejection),
}

impl ApiError {
    pub fn body(&self) -> Value {
        match self {
            ApiError::Support(SupportError::Validation(error)) => to_body(error),
            ApiError::Support(SupportError::Cast(error)) => to_body(error),
            ApiError::Support(SupportError::Repository(error)) => repository_body(error),
            ApiError::Body(rejection) => json!({
                "name": "SyntaxError",
                "type": "entity.parse.failed",
                "status": rejection.status().as_u16(),
                "message": rejection.body_text(),
            }),
            ApiError::Query(rejection) => json!({
                "name": "QueryError",
                "message": rejection.body_text(),
            }),
        }
    }
}

fn to_body<T: serde::Serialize>(error: &T) -> Value {
    serde_json::to_value(error).unwrap_or_else(|e| json!({ "message": e.to_string() }))
}

fn repository_body(error: &RepositoryError) -> Value {
    match error {
        RepositoryError::DuplicateKey { path, value, .. } => {
            let mut key_pattern = Map::new();
            key_pattern.insert(path.clone(), json!(1));
            let mut key_value = Map::new();
            key_value.insert(path.clone(), json!(value));

            json!({
                "name": "MongoServerError",
                "code": 11000,
                "keyPattern": key_pattern,
                "keyValue": key_value,
                "message": error.to_string(),
            })
        }
        other => json!({
            "name": "MongoError",
            "message": other.to_string(),
        }),
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        (StatusCode::BAD_REQUEST, Json(self.body())).into_response()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_duplicate_key_body() {
        let error = ApiError::from(SupportError::Repository(RepositoryError::DuplicateKey {
            collection: "supportagents".into(),
            path: "email".into(),
            value: "a@x.com".into(),
        }));

        let body = error.body();
        assert_eq!(body["code"], 11000);
        assert_eq!(body["keyValue"]["email"], "a@x.com");
        assert_eq!(body["keyPattern"]["email"], 1);
    }

    #[test]
    fn test_connection_error_is_bad_request() {
        let error = ApiError::from(SupportError::Repository(RepositoryError::Connection("down".into())));
        assert_eq!(error.body()["name"], "MongoError");
        assert_eq!(error.into_response().status(), StatusCode::BAD_REQUEST);
    }
}
