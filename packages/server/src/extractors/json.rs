use axum::body::Bytes;
use axum::extract::{FromRequest, Request};
use axum::http::{HeaderMap, header};
use serde::de::DeserializeOwned;
use serde_json::error::Category;

use crate::error::AppError;

/// JSON request body. Every rejection is a `VALIDATION_ERROR` whose message names
/// the offending field where serde can tell which one it was.
pub struct AppJson<T>(pub T);

impl<S, T> FromRequest<S> for AppJson<T>
where
    T: DeserializeOwned,
    S: Send + Sync,
{
    type Rejection = AppError;

    async fn from_request(req: Request, state: &S) -> Result<Self, Self::Rejection> {
        if !is_json(req.headers()) {
            return Err(AppError::Validation(
                "Expected a JSON body (Content-Type: application/json)".into(),
            ));
        }

        let bytes = Bytes::from_request(req, state)
            .await
            .map_err(|e| AppError::Validation(format!("Failed to read request body: {e}")))?;

        serde_json::from_slice(&bytes)
            .map(AppJson)
            .map_err(|e| AppError::Validation(describe_json_error("Request body", &e)))
    }
}

/// Message for a JSON document that failed to deserialize into its target type.
///
/// `subject` names the document: the request body, or a multipart part.
pub fn describe_json_error(subject: &str, err: &serde_json::Error) -> String {
    match err.classify() {
        Category::Data => format!("{subject} has a missing or invalid field: {err}"),
        Category::Syntax | Category::Eof => format!("{subject} is not valid JSON: {err}"),
        Category::Io => format!("Failed to read {subject}: {err}"),
    }
}

fn is_json(headers: &HeaderMap) -> bool {
    let Some(content_type) = headers
        .get(header::CONTENT_TYPE)
        .and_then(|v| v.to_str().ok())
    else {
        return false;
    };
    let essence = content_type.split(';').next().unwrap_or_default().trim();
    essence.eq_ignore_ascii_case("application/json")
        || essence.to_ascii_lowercase().ends_with("+json")
}
