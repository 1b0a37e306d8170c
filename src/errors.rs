use crate::services::storage_service::StorageError;
use axum::{
    Json,
    http::StatusCode,
    response::{IntoResponse, Response},
};
use serde_json::json;
use std::{fmt, io};
use thiserror::Error;

/// Errors surfaced by [`crate::client::ObjectStoreClient`].
///
/// `Transport` and `Io` mean the exchange itself failed; `Protocol` means the
/// server answered but not with something this client accepts.
#[derive(Debug, Error)]
pub enum ClientError {
    #[error("transport error: {0}")]
    Transport(#[from] reqwest::Error),

    #[error("i/o error: {0}")]
    Io(#[from] io::Error),

    #[error("{reason} (status {status})")]
    Protocol {
        status: u16,
        reason: String,
        body: String,
    },

    #[error("failed to encode object metadata: {0}")]
    Encode(#[source] serde_json::Error),

    #[error("invalid server url: {0}")]
    InvalidUrl(String),

    #[error("gave up waiting for {what} after {attempts} attempts")]
    WaitTimeout { what: String, attempts: u32 },
}

pub type ClientResult<T> = Result<T, ClientError>;

impl ClientError {
    pub(crate) fn protocol(status: u16, reason: impl Into<String>, body: impl Into<String>) -> Self {
        Self::Protocol {
            status,
            reason: reason.into(),
            body: body.into(),
        }
    }

    /// Connection or stream level failure.
    pub fn is_transport(&self) -> bool {
        matches!(self, Self::Transport(_) | Self::Io(_))
    }

    pub fn is_protocol(&self) -> bool {
        matches!(self, Self::Protocol { .. })
    }

    /// HTTP status carried by a protocol error.
    pub fn status(&self) -> Option<u16> {
        match self {
            Self::Protocol { status, .. } => Some(*status),
            Self::Transport(err) => err.status().map(|s| s.as_u16()),
            _ => None,
        }
    }

    /// Raw response body carried by a protocol error.
    pub fn body(&self) -> Option<&str> {
        match self {
            Self::Protocol { body, .. } => Some(body),
            _ => None,
        }
    }
}

/// A lightweight wrapper for reference-server errors that keeps the message local.
#[derive(Debug)]
pub struct AppError {
    pub status: StatusCode,
    pub message: String,
}

impl AppError {
    /// Create a new AppError with a specific status and message.
    pub fn new(status: StatusCode, msg: impl Into<String>) -> Self {
        Self {
            status,
            message: msg.into(),
        }
    }

    /// Shortcut for 400 Bad Request
    pub fn bad_request(msg: impl Into<String>) -> Self {
        Self::new(StatusCode::BAD_REQUEST, msg)
    }
}

impl fmt::Display for AppError {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for AppError {}

impl IntoResponse for AppError {
    fn into_response(self) -> Response {
        let body = Json(json!({
            "error": self.message,
            "status": self.status.as_u16()
        }));

        (self.status, body).into_response()
    }
}

impl From<StorageError> for AppError {
    fn from(err: StorageError) -> Self {
        let status = match &err {
            StorageError::BucketNotFound(_) | StorageError::ObjectNotFound { .. } => {
                StatusCode::NOT_FOUND
            }
            StorageError::BucketAlreadyExists(_) => StatusCode::CONFLICT,
            StorageError::InvalidBucketName { .. }
            | StorageError::InvalidObjectKey
            | StorageError::InvalidMetadata(_) => StatusCode::BAD_REQUEST,
            StorageError::Io(_) => StatusCode::INTERNAL_SERVER_ERROR,
        };
        AppError::new(status, err.to_string())
    }
}
