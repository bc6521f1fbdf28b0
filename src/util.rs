use std::convert::Infallible;

use derive_more::From;
use serde::{Deserialize, Serialize};
use tracing::error;
use warp::http::StatusCode;
use warp::{reply, Rejection, Reply};

use crate::auth::Unauthorized;
use crate::errors::Error;
use crate::storage;

#[derive(Serialize, Deserialize, From, Debug, PartialEq)]
pub struct ErrorMessage {
    pub message: String,
}

impl From<&str> for ErrorMessage {
    fn from(x: &str) -> Self {
        x.to_owned().into()
    }
}

/// `{ "success": true }`
#[derive(Serialize, Deserialize, Debug, PartialEq)]
pub struct Success {
    pub success: bool,
}

impl Success {
    pub fn new() -> Self {
        Success { success: true }
    }
}

impl Default for Success {
    fn default() -> Self {
        Success::new()
    }
}

pub fn map_result(result: Result<impl Serialize, Error>) -> reply::Response {
    map_result_with_status(StatusCode::OK, result)
}

pub fn map_created(result: Result<impl Serialize, Error>) -> reply::Response {
    map_result_with_status(StatusCode::CREATED, result)
}

pub fn map_result_with_status(
    success: StatusCode,
    result: Result<impl Serialize, Error>,
) -> reply::Response {
    match result {
        Ok(x) => reply::with_status(reply::json(&x), success).into_response(),
        Err(err) => error_reply(err),
    }
}

pub fn error_reply(err: Error) -> reply::Response {
    let internal_server_error: (StatusCode, ErrorMessage) = (
        StatusCode::INTERNAL_SERVER_ERROR,
        "An internal exception occurred.".into(),
    );
    let (status, body): (StatusCode, ErrorMessage) = match &err {
        Error::Unauthorized => (StatusCode::UNAUTHORIZED, "Unauthorized".into()),
        Error::NotFound(resource) => (
            StatusCode::NOT_FOUND,
            format!("{} not found", resource).into(),
        ),
        Error::Validation(message) => (StatusCode::BAD_REQUEST, message.as_str().into()),
        Error::Storage(storage::Error::AlreadyExists(_)) => {
            (StatusCode::CONFLICT, "File already exists".into())
        }
        Error::EstablishConnection(_) => internal_server_error,
        Error::QueryResult(_) => internal_server_error,
        Error::Storage(_) => internal_server_error,
    };
    error!(
        "Returning error body: {}, StatusCode: {}, Source: {}",
        body.message, status, err
    );
    reply::with_status(reply::json(&body), status).into_response()
}

/// Turns warp's own rejections into the same JSON error body handlers use.
pub async fn handle_rejection(rejection: Rejection) -> Result<impl Reply, Infallible> {
    let (status, message) = if rejection.find::<Unauthorized>().is_some() {
        (StatusCode::UNAUTHORIZED, "Unauthorized")
    } else if rejection.is_not_found() {
        (StatusCode::NOT_FOUND, "Not found")
    } else if rejection
        .find::<warp::filters::body::BodyDeserializeError>()
        .is_some()
    {
        (StatusCode::BAD_REQUEST, "Malformed request body")
    } else if rejection.find::<warp::reject::InvalidQuery>().is_some() {
        (StatusCode::BAD_REQUEST, "Malformed query string")
    } else if rejection.find::<warp::reject::PayloadTooLarge>().is_some() {
        (StatusCode::PAYLOAD_TOO_LARGE, "Payload too large")
    } else if rejection
        .find::<warp::reject::UnsupportedMediaType>()
        .is_some()
    {
        (StatusCode::UNSUPPORTED_MEDIA_TYPE, "Unsupported media type")
    } else if rejection.find::<warp::reject::MethodNotAllowed>().is_some() {
        (StatusCode::METHOD_NOT_ALLOWED, "Method not allowed")
    } else {
        error!(?rejection, "Unhandled rejection.");
        (
            StatusCode::INTERNAL_SERVER_ERROR,
            "An internal exception occurred.",
        )
    };
    Ok(reply::with_status(
        reply::json(&ErrorMessage::from(message)),
        status,
    ))
}
