use axum::{http::StatusCode, response::IntoResponse};
use thiserror::Error;

use crate::admission_review::CodecError;
use crate::webhook::WebhookError;

/// Everything that can go wrong while turning one HTTP request into one
/// admission verdict. None of these is retried.
#[derive(Debug, Error)]
pub enum AdapterError {
    #[error("no body found")]
    InputEmpty,

    #[error("could not read the request body: {0}")]
    ReadBody(String),

    #[error("could not decode the admission review from the request")]
    Decode(#[source] CodecError),

    #[error("webhook could not review the request: {0}")]
    Webhook(#[source] WebhookError),

    #[error("error marshaling to json admission review response")]
    Encode(#[source] CodecError),
}

impl AdapterError {
    pub fn status(&self) -> StatusCode {
        match self {
            AdapterError::InputEmpty | AdapterError::ReadBody(_) | AdapterError::Decode(_) => {
                StatusCode::BAD_REQUEST
            }
            AdapterError::Webhook(_) | AdapterError::Encode(_) => {
                StatusCode::INTERNAL_SERVER_ERROR
            }
        }
    }
}

#[derive(Debug)]
/// An error that can be returned by the API
/// and will be converted into a plain text response.
pub(crate) struct ApiError {
    pub(crate) status: StatusCode,
    pub(crate) message: String,
}

impl From<AdapterError> for ApiError {
    fn from(error: AdapterError) -> Self {
        Self {
            status: error.status(),
            message: error.to_string(),
        }
    }
}

impl IntoResponse for ApiError {
    fn into_response(self) -> axum::response::Response {
        (self.status, self.message).into_response()
    }
}
