//! RFC 7807 problem documents.
//!
//! Handlers return `ApiError` and the `IntoResponse` impl shapes it into
//! an `application/problem+json` body. Server-side failures are logged at
//! error level with their full chain; the response body only ever carries
//! a generic detail for 5xx so internals never leak to clients.

use axum::http::{header, StatusCode};
use axum::response::{IntoResponse, Response};
use serde::Serialize;
use thiserror::Error;

const CONTENT_TYPE: &str = "application/problem+json";

const PROBLEM_BASE: &str = "https://sel.events/problems";

/// Wire shape of a problem document.
#[derive(Debug, Clone, Serialize)]
pub struct Problem {
    #[serde(rename = "type")]
    pub type_uri: String,
    pub title: String,
    pub status: u16,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub detail: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub instance: Option<String>,
}

/// Errors surfaced by HTTP handlers, classified per the SEL problem taxonomy.
#[derive(Error, Debug)]
pub enum ApiError {
    #[error("{0}")]
    Validation(String),

    #[error("{0}")]
    NotFound(String),

    #[error("{0}")]
    Conflict(String),

    #[error("{0}")]
    Unauthorized(String),

    #[error("{0}")]
    Forbidden(String),

    #[error("resource deleted")]
    Gone,

    #[error("server error")]
    Internal(#[from] anyhow::Error),
}

pub type ApiResult<T> = Result<T, ApiError>;

impl ApiError {
    pub fn validation(msg: impl Into<String>) -> Self {
        ApiError::Validation(msg.into())
    }

    pub fn not_found(msg: impl Into<String>) -> Self {
        ApiError::NotFound(msg.into())
    }

    pub fn conflict(msg: impl Into<String>) -> Self {
        ApiError::Conflict(msg.into())
    }

    fn status(&self) -> StatusCode {
        match self {
            ApiError::Validation(_) => StatusCode::BAD_REQUEST,
            ApiError::NotFound(_) => StatusCode::NOT_FOUND,
            ApiError::Conflict(_) => StatusCode::CONFLICT,
            ApiError::Unauthorized(_) => StatusCode::UNAUTHORIZED,
            ApiError::Forbidden(_) => StatusCode::FORBIDDEN,
            ApiError::Gone => StatusCode::GONE,
            ApiError::Internal(_) => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    fn slug(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "validation-error",
            ApiError::NotFound(_) => "not-found",
            ApiError::Conflict(_) => "conflict",
            ApiError::Unauthorized(_) => "unauthorized",
            ApiError::Forbidden(_) => "forbidden",
            ApiError::Gone => "gone",
            ApiError::Internal(_) => "server-error",
        }
    }

    fn title(&self) -> &'static str {
        match self {
            ApiError::Validation(_) => "Validation error",
            ApiError::NotFound(_) => "Not found",
            ApiError::Conflict(_) => "Conflict",
            ApiError::Unauthorized(_) => "Unauthorized",
            ApiError::Forbidden(_) => "Forbidden",
            ApiError::Gone => "Gone",
            ApiError::Internal(_) => "Server error",
        }
    }

    /// Build the problem document for this error.
    pub fn to_problem(&self) -> Problem {
        let status = self.status();
        let detail = match self {
            // Client errors carry their message; server errors stay generic.
            ApiError::Internal(_) => None,
            ApiError::Gone => None,
            other => Some(other.to_string()),
        };
        Problem {
            type_uri: format!("{}/{}", PROBLEM_BASE, self.slug()),
            title: self.title().to_string(),
            status: status.as_u16(),
            detail,
            instance: None,
        }
    }
}

impl From<sqlx::Error> for ApiError {
    fn from(err: sqlx::Error) -> Self {
        match err {
            sqlx::Error::RowNotFound => ApiError::NotFound("not found".to_string()),
            other => ApiError::Internal(other.into()),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        match &self {
            ApiError::Internal(err) => {
                tracing::error!(error = %err, chain = ?err, "request failed");
            }
            other => {
                tracing::warn!(status = other.status().as_u16(), error = %other, "request rejected");
            }
        }
        let problem = self.to_problem();
        problem.into_response()
    }
}

impl IntoResponse for Problem {
    fn into_response(self) -> Response {
        let status = StatusCode::from_u16(self.status).unwrap_or(StatusCode::INTERNAL_SERVER_ERROR);
        let body = serde_json::to_vec(&self).unwrap_or_else(|_| {
            br#"{"type":"about:blank","title":"Server error","status":500}"#.to_vec()
        });
        (status, [(header::CONTENT_TYPE, CONTENT_TYPE)], body).into_response()
    }
}
