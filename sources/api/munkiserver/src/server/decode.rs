//! Request body decoding.  Bodies are read whole and parsed according to their Content-Type.

use actix_web::{web, HttpRequest};
use munki::{ManifestPayload, Pkgsinfo};
use serde::de::DeserializeOwned;
use serde::Deserialize;
use snafu::{ensure, ResultExt};

use super::error::{self, Result};
use super::negotiate::MediaType;

/// The largest request body we'll read.  Package descriptors can embed whole install scripts, so
/// this is well above actix's default.
pub(crate) const MAX_BODY_SIZE: usize = 32 * 1024 * 1024;

/// Reads the whole request body, refusing anything over the given limit.
pub(crate) async fn read_body(payload: web::Payload, limit: usize) -> Result<web::Bytes> {
    match payload.to_bytes_limited(limit).await {
        Ok(Ok(body)) => Ok(body),
        Ok(Err(e)) => error::ReadBodySnafu { msg: e.to_string() }.fail(),
        Err(_) => error::BodyTooLargeSnafu { limit }.fail(),
    }
}

/// Reads the request body and parses it as the given type.
pub(crate) async fn decode_payload<T: DeserializeOwned>(
    req: &HttpRequest,
    payload: web::Payload,
) -> Result<T> {
    let body = read_body(payload, MAX_BODY_SIZE).await?;
    decode_body(req, &body)
}

/// Parses the body of the request as the given type.
pub(crate) fn decode_body<T: DeserializeOwned>(req: &HttpRequest, body: &[u8]) -> Result<T> {
    ensure!(!body.is_empty(), error::EmptyBodySnafu);

    match MediaType::of_body(req) {
        MediaType::Json => serde_json::from_slice(body).context(error::DecodeJsonSnafu),
        MediaType::Xml => plist::from_bytes(body).context(error::DecodePlistSnafu),
    }
}

/// The body of a manifest creation request: the new manifest's name, along with any fields to set.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub(crate) struct CreateManifestRequest {
    #[serde(default)]
    pub(crate) filename: String,

    #[serde(flatten)]
    pub(crate) payload: ManifestPayload,
}

/// The body of a package descriptor creation request.
#[derive(Debug, Default, PartialEq, Deserialize)]
pub(crate) struct CreatePkgsinfoRequest {
    #[serde(default)]
    pub(crate) filename: String,

    #[serde(flatten)]
    pub(crate) pkgsinfo: Pkgsinfo,
}

/// Creation requests have to name the new entity.
pub(crate) fn require_filename(filename: &str) -> Result<()> {
    ensure!(
        !filename.is_empty(),
        error::MissingFieldSnafu { field: "filename" }
    );
    Ok(())
}

#[cfg(test)]
mod test {
    use super::*;
    use crate::server::error::Error;
    use actix_web::http::header::CONTENT_TYPE;
    use actix_web::test::TestRequest;
    use actix_web::FromRequest;
    use munki::{Field, Manifest};

    static FIREFOX: &str = include_str!("../../../../munki/tests/data/firefox.plist");

    fn json_request() -> HttpRequest {
        TestRequest::default()
            .insert_header((CONTENT_TYPE, "application/json"))
            .to_http_request()
    }

    fn xml_request() -> HttpRequest {
        TestRequest::default()
            .insert_header((CONTENT_TYPE, "application/xml"))
            .to_http_request()
    }

    async fn payload_of(body: &'static [u8]) -> web::Payload {
        let (req, mut payload) = TestRequest::default().set_payload(body).to_http_parts();
        web::Payload::from_request(&req, &mut payload).await.unwrap()
    }

    #[actix_web::test]
    async fn body_limit() {
        let body = read_body(payload_of(b"0123456789").await, 10).await.unwrap();
        assert_eq!(&body[..], b"0123456789");

        let err = read_body(payload_of(b"0123456789").await, 9)
            .await
            .unwrap_err();
        assert!(matches!(err, Error::BodyTooLarge { limit: 9 }));
    }

    #[test]
    fn empty_body() {
        let err = decode_body::<ManifestPayload>(&json_request(), b"").unwrap_err();
        assert!(matches!(err, Error::EmptyBody));
        let err = decode_body::<ManifestPayload>(&xml_request(), b"").unwrap_err();
        assert!(matches!(err, Error::EmptyBody));
    }

    #[test]
    fn malformed() {
        let err = decode_body::<ManifestPayload>(&json_request(), b"{\"notes\": ").unwrap_err();
        assert!(matches!(err, Error::DecodeJson { .. }));
        let err = decode_body::<ManifestPayload>(&xml_request(), b"<plist>").unwrap_err();
        assert!(matches!(err, Error::DecodePlist { .. }));
        // JSON body sent without saying so
        let err = decode_body::<Manifest>(&json_request(), FIREFOX.as_bytes()).unwrap_err();
        assert!(matches!(err, Error::DecodeJson { .. }));
    }

    #[test]
    fn json_without_content_type() {
        let req = TestRequest::default().to_http_request();
        let payload: ManifestPayload = decode_body(&req, br#"{"notes": "x"}"#).unwrap();
        assert_eq!(payload.notes, Field::Set("x".to_string()));
    }

    #[test]
    fn create_manifest_request() {
        let body = br#"{"filename": "clients/laptop", "catalogs": [], "user": null}"#;
        let request: CreateManifestRequest = decode_body(&json_request(), body).unwrap();
        assert_eq!(request.filename, "clients/laptop");
        assert_eq!(request.payload.catalogs, Field::Set(vec![]));
        assert_eq!(request.payload.user, Field::Unset);
        assert_eq!(request.payload.notes, Field::Unset);

        let request: CreateManifestRequest =
            decode_body(&json_request(), br#"{"notes": "x"}"#).unwrap();
        assert!(require_filename(&request.filename).is_err());
    }

    #[test]
    fn create_pkgsinfo_request_from_plist() {
        let body = FIREFOX.replacen(
            "<dict>\n",
            "<dict>\n\t<key>filename</key>\n\t<string>apps/Firefox-120.0</string>\n",
            1,
        );
        let request: CreatePkgsinfoRequest = decode_body(&xml_request(), body.as_bytes()).unwrap();
        assert_eq!(request.filename, "apps/Firefox-120.0");
        assert_eq!(request.pkgsinfo.name, "Firefox");
        assert_eq!(request.pkgsinfo.installer_item_size, Some(131072));
        require_filename(&request.filename).unwrap();
    }
}
