use actix_web::http::StatusCode;
use actix_web::{HttpResponse, ResponseError};
use log::debug;
use snafu::{IntoError, Snafu};
use std::io;

use super::negotiate::MediaType;
use super::response;

// We want server (router/handler) and controller errors together so it's easy to define response
// error codes for all the high-level types of errors that could happen during a request.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub(super)))]
pub enum Error {
    // Request decoding errors
    #[snafu(display("request must contain all required fields"))]
    EmptyBody,

    #[snafu(display("Request body is larger than the limit of {} bytes", limit))]
    BodyTooLarge { limit: usize },

    #[snafu(display("Unable to read request body: {}", msg))]
    ReadBody { msg: String },

    #[snafu(display("Unable to parse JSON request body: {}", source))]
    DecodeJson { source: serde_json::Error },

    #[snafu(display("Unable to parse property list request body: {}", source))]
    DecodePlist { source: plist::Error },

    #[snafu(display("Missing required field '{}'", field))]
    MissingField { field: &'static str },

    #[snafu(display("{}", source))]
    InvalidName {
        #[snafu(source(from(datastore::Error, Box::new)))]
        source: Box<datastore::Error>,
    },

    // =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

    // Controller errors
    // This message is returned to clients as-is for missing entities and unknown routes.
    #[snafu(display("not found"))]
    NotFound,

    #[snafu(display("{}", source))]
    AlreadyExists {
        #[snafu(source(from(datastore::Error, Box::new)))]
        source: Box<datastore::Error>,
    },

    #[snafu(display("Data store error during {}: {}", op, source))]
    DataStore {
        op: &'static str,
        #[snafu(source(from(datastore::Error, Box::new)))]
        source: Box<datastore::Error>,
    },

    // =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

    // Response and server errors
    #[snafu(display("Unable to serialize response: {}", source))]
    SerializeJson { source: serde_json::Error },

    #[snafu(display("Unable to serialize response: {}", source))]
    SerializePlist { source: plist::Error },

    #[snafu(display("Unable to prepare repository: {}", source))]
    Repository { source: datastore::Error },

    #[snafu(display("Unable to bind to {}: {}", addr, source))]
    BindAddress { addr: String, source: io::Error },

    #[snafu(display("Unable to start server: {}", source))]
    ServerStart { source: io::Error },
}

pub type Result<T> = std::result::Result<T, Error>;

/// Sorts a data store error into the server error that describes it to clients, since several
/// kinds of store error are the caller's fault rather than the store's.
pub(super) fn from_store(op: &'static str) -> impl FnOnce(datastore::Error) -> Error {
    move |source| {
        if source.is_not_found() {
            debug!("Data store has no entity for {}: {:?}", op, source);
            NotFoundSnafu.build()
        } else if source.is_invalid_name() {
            InvalidNameSnafu.into_error(source)
        } else if source.is_already_exists() {
            AlreadyExistsSnafu.into_error(source)
        } else {
            DataStoreSnafu { op }.into_error(source)
        }
    }
}

/// Maps our error types to the HTTP status code they should return.
pub fn code_from(err: &Error) -> StatusCode {
    use Error::*;
    match err {
        // 404 Not Found
        NotFound => StatusCode::NOT_FOUND,

        // 400 Bad Request
        EmptyBody => StatusCode::BAD_REQUEST,
        BodyTooLarge { .. } => StatusCode::BAD_REQUEST,
        ReadBody { .. } => StatusCode::BAD_REQUEST,
        DecodeJson { .. } => StatusCode::BAD_REQUEST,
        DecodePlist { .. } => StatusCode::BAD_REQUEST,
        MissingField { .. } => StatusCode::BAD_REQUEST,
        InvalidName { .. } => StatusCode::BAD_REQUEST,

        // 503 Service Unavailable
        DataStore { .. } => StatusCode::SERVICE_UNAVAILABLE,

        // 500 Internal Server Error
        AlreadyExists { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SerializeJson { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        SerializePlist { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        Repository { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        BindAddress { .. } => StatusCode::INTERNAL_SERVER_ERROR,
        ServerStart { .. } => StatusCode::INTERNAL_SERVER_ERROR,
    }
}

// Handlers encode errors themselves so they can use the negotiated format; this is only reached
// if an error escapes some other way, so it uses the default format.
impl ResponseError for Error {
    fn status_code(&self) -> StatusCode {
        code_from(self)
    }

    fn error_response(&self) -> HttpResponse {
        response::encode_error(MediaType::Json, self)
    }
}
