//! Content negotiation: picks the format for a response from the request's Accept header, and the
//! format of a request body from its Content-Type header.

use actix_web::dev::Payload;
use actix_web::http::header::{HeaderMap, HeaderName, ACCEPT, CONTENT_TYPE};
use actix_web::{FromRequest, HttpMessage, HttpRequest};
use log::trace;
use std::convert::Infallible;
use std::future::{ready, Ready};

/// The two formats the API speaks.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum MediaType {
    Json,
    Xml,
}

impl MediaType {
    /// Only these exact Accept values select XML; everything else, including a missing header,
    /// gets JSON.  There's no "not acceptable" response.
    pub fn from_accept(accept: Option<&str>) -> Self {
        match accept {
            Some("application/xml") | Some("application/xml; charset=utf-8") => MediaType::Xml,
            _ => MediaType::Json,
        }
    }

    /// Request bodies are property lists if they say they're XML, with any parameters, and JSON
    /// otherwise.
    pub fn from_content_type(content_type: Option<&str>) -> Self {
        let essence = content_type
            .and_then(|value| value.split(';').next())
            .map(str::trim);
        match essence {
            Some(essence) if essence.eq_ignore_ascii_case("application/xml") => MediaType::Xml,
            _ => MediaType::Json,
        }
    }

    pub fn content_type(self) -> &'static str {
        match self {
            MediaType::Json => "application/json; charset=utf-8",
            MediaType::Xml => "application/xml; charset=utf-8",
        }
    }

    /// Returns the response format for the request.  The Accept header is only inspected the first
    /// time; the result is kept in the request's extensions for anything else that asks.
    pub fn negotiate(req: &HttpRequest) -> Self {
        let cached = req.extensions().get::<MediaType>().copied();
        if let Some(media) = cached {
            return media;
        }

        let media = Self::from_accept(header_str(req.headers(), ACCEPT));
        trace!("Negotiated {:?} response for {}", media, req.path());
        req.extensions_mut().insert(media);
        media
    }

    /// Returns the format of the request body.
    pub fn of_body(req: &HttpRequest) -> Self {
        Self::from_content_type(header_str(req.headers(), CONTENT_TYPE))
    }
}

fn header_str(headers: &HeaderMap, name: HeaderName) -> Option<&str> {
    headers.get(name).and_then(|value| value.to_str().ok())
}

/// Handlers take a MediaType argument to learn the negotiated response format.
impl FromRequest for MediaType {
    type Error = Infallible;
    type Future = Ready<Result<Self, Self::Error>>;

    fn from_request(req: &HttpRequest, _payload: &mut Payload) -> Self::Future {
        ready(Ok(MediaType::negotiate(req)))
    }
}
