//! The server module owns the API surface.  It interfaces with the datastore through the
//! server::controller module.

mod controller;
mod decode;
mod error;
mod negotiate;
mod response;

pub use error::{code_from, Error, Result};
pub use negotiate::MediaType;
pub use response::{encode, encode_error, Negotiated, Reply, Subset};

use actix_web::{web, App, HttpRequest, HttpServer};
use datastore::{FilesystemDataStore, ManifestStore, PkgsinfoStore};
use log::info;
use munki::{Manifest, ManifestPayload, Pkgsinfo};
use snafu::ResultExt;
use std::path::Path;
use std::sync::Arc;

use decode::{decode_payload, CreateManifestRequest, CreatePkgsinfoRequest};

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

/// Handles to the stores that back the API.  Handlers reach it through web::Data.
#[derive(Clone)]
pub struct Stores {
    manifests: Arc<dyn ManifestStore>,
    pkgsinfos: Arc<dyn PkgsinfoStore>,
}

impl Stores {
    /// Serves both kinds of entity from the one store.
    pub fn new<S>(store: S) -> Self
    where
        S: ManifestStore + PkgsinfoStore + 'static,
    {
        let store = Arc::new(store);
        Stores {
            manifests: store.clone(),
            pkgsinfos: store,
        }
    }
}

// Router

/// This is the primary interface of the module.  It defines the server and application that actix
/// spawns for requests, serving the munki repository at the given path.
pub async fn serve<P>(listen: &str, repo_path: P, threads: Option<usize>) -> Result<()>
where
    P: AsRef<Path>,
{
    let store = FilesystemDataStore::new(repo_path.as_ref());
    store.create_dirs().context(error::RepositorySnafu)?;
    let stores = web::Data::new(Stores::new(store));

    let mut http_server = HttpServer::new(move || {
        App::new()
            // This makes the stores available to API methods merely by having a Data parameter.
            .app_data(stores.clone())
            .configure(configure)
    });
    if let Some(threads) = threads {
        http_server = http_server.workers(threads);
    }
    let http_server = http_server
        .bind(listen)
        .context(error::BindAddressSnafu { addr: listen })?;

    info!(
        "Serving munki repository at {} on {}",
        repo_path.as_ref().display(),
        listen
    );
    http_server.run().await.context(error::ServerStartSnafu)
}

/// Registers the API routes, plus a default handler for anything that doesn't match.
pub fn configure(cfg: &mut web::ServiceConfig) {
    cfg.service(
        web::scope("/api/v1")
            .service(
                web::scope("/manifests")
                    .route("", web::get().to(list_manifests))
                    .route("", web::post().to(create_manifest))
                    // Manifest names may contain slashes, so match the rest of the path.
                    .route("/{name:.+}", web::get().to(show_manifest))
                    .route("/{name:.+}", web::put().to(replace_manifest))
                    .route("/{name:.+}", web::patch().to(update_manifest))
                    .route("/{name:.+}", web::delete().to(delete_manifest)),
            )
            .service(
                web::scope("/pkgsinfos")
                    .route("", web::get().to(list_pkgsinfos))
                    .route("", web::post().to(create_pkgsinfo)),
            ),
    )
    .default_service(web::to(not_found));
}

// =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=   =^..^=

// Handler methods called by the router

/// Returns all manifests.
async fn list_manifests(media: MediaType, data: web::Data<Stores>) -> Negotiated<Vec<Manifest>> {
    let result = controller::list_manifests(&*data.manifests).map(Subset::subset);
    Negotiated::new(media, Reply::ok(result))
}

async fn show_manifest(
    media: MediaType,
    name: web::Path<String>,
    data: web::Data<Stores>,
) -> Negotiated<Manifest> {
    let result = controller::show_manifest(&*data.manifests, &name);
    Negotiated::new(media, Reply::ok(result))
}

/// Creates a manifest named by the "filename" field of the body.
async fn create_manifest(
    media: MediaType,
    req: HttpRequest,
    body: web::Payload,
    data: web::Data<Stores>,
) -> Negotiated<Manifest> {
    let result = decode_payload::<CreateManifestRequest>(&req, body)
        .await
        .and_then(|request| controller::create_manifest(&*data.manifests, request));
    Negotiated::new(media, Reply::created(result))
}

/// Replaces an existing manifest with the body.
async fn replace_manifest(
    media: MediaType,
    req: HttpRequest,
    name: web::Path<String>,
    body: web::Payload,
    data: web::Data<Stores>,
) -> Negotiated<Manifest> {
    let result = decode_payload::<Manifest>(&req, body)
        .await
        .and_then(|manifest| controller::replace_manifest(&*data.manifests, &name, manifest));
    Negotiated::new(media, Reply::ok(result))
}

/// Changes the fields of a manifest that are present in the body, leaving the rest alone.
async fn update_manifest(
    media: MediaType,
    req: HttpRequest,
    name: web::Path<String>,
    body: web::Payload,
    data: web::Data<Stores>,
) -> Negotiated<Manifest> {
    let result = decode_payload::<ManifestPayload>(&req, body)
        .await
        .and_then(|payload| controller::update_manifest(&*data.manifests, &name, payload));
    Negotiated::new(media, Reply::ok(result))
}

async fn delete_manifest(
    media: MediaType,
    name: web::Path<String>,
    data: web::Data<Stores>,
) -> Negotiated<()> {
    let result = controller::delete_manifest(&*data.manifests, &name);
    Negotiated::new(media, Reply::no_content(result))
}

/// Returns all package descriptors.
async fn list_pkgsinfos(media: MediaType, data: web::Data<Stores>) -> Negotiated<Vec<Pkgsinfo>> {
    let result = controller::list_pkgsinfos(&*data.pkgsinfos).map(Subset::subset);
    Negotiated::new(media, Reply::ok(result))
}

/// Creates a package descriptor named by the "filename" field of the body.
async fn create_pkgsinfo(
    media: MediaType,
    req: HttpRequest,
    body: web::Payload,
    data: web::Data<Stores>,
) -> Negotiated<Pkgsinfo> {
    let result = decode_payload::<CreatePkgsinfoRequest>(&req, body)
        .await
        .and_then(|request| controller::create_pkgsinfo(&*data.pkgsinfos, request));
    Negotiated::new(media, Reply::created(result))
}

/// Anything that doesn't match a route gets a "not found" error in the negotiated format.
async fn not_found(media: MediaType) -> Negotiated<()> {
    Negotiated::new(media, Reply::Failure(Error::NotFound))
}
