//! The controller module maps between the datastore and the API interface, similar to the
//! controller in the MVC model.

use datastore::{ManifestStore, PkgsinfoStore};
use log::debug;
use munki::{Manifest, ManifestCollection, ManifestPayload, Pkgsinfo, PkgsinfoCollection};

use super::decode::{require_filename, CreateManifestRequest, CreatePkgsinfoRequest};
use super::error::{from_store, Result};

/// Returns every manifest in the repository.
pub(crate) fn list_manifests(store: &dyn ManifestStore) -> Result<ManifestCollection> {
    store.all_manifests().map_err(from_store("all_manifests"))
}

/// Returns the named manifest.
pub(crate) fn show_manifest(store: &dyn ManifestStore, name: &str) -> Result<Manifest> {
    store.manifest(name).map_err(from_store("manifest"))
}

/// Creates a manifest from the given payload.  Fields absent from the payload stay empty.
pub(crate) fn create_manifest(
    store: &dyn ManifestStore,
    request: CreateManifestRequest,
) -> Result<Manifest> {
    let CreateManifestRequest { filename, payload } = request;
    require_filename(&filename)?;

    let mut manifest = store
        .new_manifest(&filename)
        .map_err(from_store("new_manifest"))?;
    manifest.update_from_payload(payload);
    store
        .save_manifest(&filename, &manifest)
        .map_err(from_store("save_manifest"))?;

    debug!("Created manifest '{}'", filename);
    Ok(manifest)
}

/// Replaces the named manifest wholesale.  The manifest has to exist already; use
/// create_manifest for new ones.
pub(crate) fn replace_manifest(
    store: &dyn ManifestStore,
    name: &str,
    mut manifest: Manifest,
) -> Result<Manifest> {
    store.manifest(name).map_err(from_store("manifest"))?;

    // The name in the path is the identity; the body can't rename it.
    manifest.filename = name.to_string();
    store
        .save_manifest(name, &manifest)
        .map_err(from_store("save_manifest"))?;

    debug!("Replaced manifest '{}'", name);
    Ok(manifest)
}

/// Applies a partial update to the named manifest.
pub(crate) fn update_manifest(
    store: &dyn ManifestStore,
    name: &str,
    payload: ManifestPayload,
) -> Result<Manifest> {
    let mut manifest = store.manifest(name).map_err(from_store("manifest"))?;
    manifest.update_from_payload(payload);
    store
        .save_manifest(name, &manifest)
        .map_err(from_store("save_manifest"))?;

    debug!("Updated manifest '{}'", name);
    Ok(manifest)
}

/// Removes the named manifest.
pub(crate) fn delete_manifest(store: &dyn ManifestStore, name: &str) -> Result<()> {
    store
        .delete_manifest(name)
        .map_err(from_store("delete_manifest"))?;

    debug!("Deleted manifest '{}'", name);
    Ok(())
}

/// Returns every package descriptor in the repository.
pub(crate) fn list_pkgsinfos(store: &dyn PkgsinfoStore) -> Result<PkgsinfoCollection> {
    store.all_pkgsinfos().map_err(from_store("all_pkgsinfos"))
}

/// Creates a package descriptor.
pub(crate) fn create_pkgsinfo(
    store: &dyn PkgsinfoStore,
    request: CreatePkgsinfoRequest,
) -> Result<Pkgsinfo> {
    let CreatePkgsinfoRequest { filename, pkgsinfo } = request;
    require_filename(&filename)?;

    let blank = store
        .new_pkgsinfo(&filename)
        .map_err(from_store("new_pkgsinfo"))?;
    let pkgsinfo = Pkgsinfo {
        filename: blank.filename,
        ..pkgsinfo
    };
    store
        .save_pkgsinfo(&filename, &pkgsinfo)
        .map_err(from_store("save_pkgsinfo"))?;

    debug!("Created pkgsinfo '{}'", filename);
    Ok(pkgsinfo)
}
