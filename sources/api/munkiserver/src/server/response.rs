//! The response module turns the result of an endpoint into an HTTP response in the negotiated
//! format.

use actix_web::body::BoxBody;
use actix_web::http::StatusCode;
use actix_web::{HttpRequest, HttpResponse, Responder, ResponseError};
use log::{error, info};
use munki::{Manifest, ManifestCollection, Pkgsinfo, PkgsinfoCollection};
use plist::XmlWriteOptions;
use serde::Serialize;
use snafu::ResultExt;

use super::error::{self, Error, Result};
use super::negotiate::MediaType;

/// What an endpoint wants to send back, decided by the endpoint itself rather than discovered
/// from the value later.
#[derive(Debug)]
pub enum Reply<T> {
    /// A body to serialize, and the status to send it with.
    Success(StatusCode, T),
    /// 204, with nothing to serialize.
    NoContent,
    Failure(Error),
}

impl<T> Reply<T> {
    pub fn ok(result: Result<T>) -> Self {
        Self::with_status(StatusCode::OK, result)
    }

    pub fn created(result: Result<T>) -> Self {
        Self::with_status(StatusCode::CREATED, result)
    }

    pub fn with_status(status: StatusCode, result: Result<T>) -> Self {
        match result {
            Ok(value) => Reply::Success(status, value),
            Err(e) => Reply::Failure(e),
        }
    }

    pub fn no_content(result: Result<()>) -> Self {
        match result {
            Ok(()) => Reply::NoContent,
            Err(e) => Reply::Failure(e),
        }
    }
}

/// Collections aren't serialized directly; a collection response carries the collection's
/// subset, the part of each entity that's meant for listings.
pub trait Subset {
    type Output: Serialize;

    fn subset(self) -> Self::Output;
}

impl Subset for ManifestCollection {
    type Output = Vec<Manifest>;

    fn subset(self) -> Self::Output {
        self.into_iter().collect()
    }
}

impl Subset for PkgsinfoCollection {
    type Output = Vec<Pkgsinfo>;

    fn subset(self) -> Self::Output {
        self.into_iter().collect()
    }
}

/// A Reply paired with the format the client asked for.  Handlers return this.
pub struct Negotiated<T> {
    media: MediaType,
    reply: Reply<T>,
}

impl<T> Negotiated<T> {
    pub fn new(media: MediaType, reply: Reply<T>) -> Self {
        Negotiated { media, reply }
    }
}

impl<T: Serialize> Responder for Negotiated<T> {
    type Body = BoxBody;

    fn respond_to(self, _req: &HttpRequest) -> HttpResponse<Self::Body> {
        encode(self.media, self.reply)
    }
}

/// Builds the response for the given reply.
pub fn encode<T: Serialize>(media: MediaType, reply: Reply<T>) -> HttpResponse {
    let (status, value) = match reply {
        Reply::Failure(e) => return encode_error(media, &e),
        Reply::NoContent => return no_content(media),
        Reply::Success(status, value) => (status, value),
    };
    if status == StatusCode::NO_CONTENT {
        return no_content(media);
    }

    match serialize(media, &value) {
        Ok(body) => HttpResponse::build(status)
            .content_type(media.content_type())
            .body(body),
        Err(e) => encode_error(media, &e),
    }
}

fn no_content(media: MediaType) -> HttpResponse {
    HttpResponse::NoContent()
        .content_type(media.content_type())
        .finish()
}

#[derive(Debug, Serialize)]
struct ErrorBody {
    error: String,
}

/// Builds the response for the given error, with its message under the "error" key.
pub fn encode_error(media: MediaType, err: &Error) -> HttpResponse {
    let status = err.status_code();
    if status.is_server_error() {
        error!("{}", err);
    } else {
        info!("Rejecting request with {}: {}", status, err);
    }

    // Include the error message in the response, and for all error types.  Messages name the
    // entity or field involved, which is what a client needs to fix its request.
    let body = ErrorBody {
        error: err.to_string(),
    };
    match serialize(media, &body) {
        Ok(body) => HttpResponse::build(status)
            .content_type(media.content_type())
            .body(body),
        Err(e) => {
            error!("Unable to serialize error response: {}", e);
            HttpResponse::build(status).finish()
        }
    }
}

/// Serializes the value in the given format, indented by two spaces.
pub fn serialize<T: Serialize>(media: MediaType, value: &T) -> Result<Vec<u8>> {
    let mut body = Vec::new();
    match media {
        MediaType::Json => {
            serde_json::to_writer_pretty(&mut body, value).context(error::SerializeJsonSnafu)?;
            body.push(b'\n');
        }
        MediaType::Xml => {
            let options = XmlWriteOptions::default().indent(b' ', 2);
            plist::to_writer_xml_with_options(&mut body, value, &options)
                .context(error::SerializePlistSnafu)?;
        }
    }
    Ok(body)
}
