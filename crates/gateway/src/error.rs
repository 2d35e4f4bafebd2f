//! Mapping of domain errors onto HTTP responses.
//!
//! Every error body is `{"error": "<message>"}`. Collaborator details are
//! logged here and never reach the client.

use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use parlor_core::error::Error;
use serde::Serialize;
use tracing::{error, warn};

pub const UNAUTHORIZED_MESSAGE: &str = "Unauthorized";
pub const NOT_FOUND_MESSAGE: &str = "Chat not found";
pub const GENERATION_MESSAGE: &str =
    "Sorry, I couldn't generate a response right now. Please try again.";
pub const STORAGE_MESSAGE: &str = "Storage is temporarily unavailable";
pub const INTERNAL_MESSAGE: &str = "Internal server error";

/// An error returned from an API handler.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum ApiError {
    Unauthorized,
    NotFound,
    BadRequest(String),
    PayloadTooLarge,
    Generation,
    Storage,
    Internal,
}

#[derive(Serialize)]
struct ErrorBody<'a> {
    error: &'a str,
}

impl ApiError {
    pub fn status(&self) -> StatusCode {
        match self {
            Self::Unauthorized => StatusCode::UNAUTHORIZED,
            Self::NotFound => StatusCode::NOT_FOUND,
            Self::BadRequest(_) => StatusCode::BAD_REQUEST,
            Self::PayloadTooLarge => StatusCode::PAYLOAD_TOO_LARGE,
            Self::Generation | Self::Storage | Self::Internal => StatusCode::INTERNAL_SERVER_ERROR,
        }
    }

    pub fn message(&self) -> &str {
        match self {
            Self::Unauthorized => UNAUTHORIZED_MESSAGE,
            Self::NotFound => NOT_FOUND_MESSAGE,
            Self::BadRequest(message) => message,
            Self::PayloadTooLarge => "Request body is too large",
            Self::Generation => GENERATION_MESSAGE,
            Self::Storage => STORAGE_MESSAGE,
            Self::Internal => INTERNAL_MESSAGE,
        }
    }
}

impl From<Error> for ApiError {
    fn from(err: Error) -> Self {
        match err {
            Error::Auth(e) => {
                warn!("Rejected request: {e}");
                Self::Unauthorized
            }
            Error::NotFoundOrForbidden => Self::NotFound,
            Error::Validation(message) => Self::BadRequest(message),
            Error::Generation(e) => {
                error!("Text generation failed: {e}");
                Self::Generation
            }
            Error::Store(e) => {
                error!("Conversation store failed: {e}");
                Self::Storage
            }
            other => {
                error!("Request failed: {other}");
                Self::Internal
            }
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> Response {
        let body = Json(ErrorBody {
            error: self.message(),
        });
        (self.status(), body).into_response()
    }
}
