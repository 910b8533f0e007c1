//! In-memory datastore for use in testing other modules.
//!
//! Entities are kept in sorted maps keyed by name, so listing order matches the filesystem store.

use munki::{Manifest, ManifestCollection, Pkgsinfo, PkgsinfoCollection};
use snafu::{ensure, OptionExt};
use std::collections::BTreeMap;
use std::sync::{RwLock, RwLockReadGuard, RwLockWriteGuard};

use super::name::check_name;
use super::{error, ManifestStore, PkgsinfoStore, Result};

#[derive(Debug, Default)]
pub struct MemoryDataStore {
    manifests: RwLock<BTreeMap<String, Manifest>>,
    pkgsinfos: RwLock<BTreeMap<String, Pkgsinfo>>,
}

impl MemoryDataStore {
    pub fn new() -> Self {
        Default::default()
    }
}

fn read<T>(lock: &RwLock<T>) -> Result<RwLockReadGuard<'_, T>> {
    lock.read().ok().context(error::LockSnafu)
}

fn write<T>(lock: &RwLock<T>) -> Result<RwLockWriteGuard<'_, T>> {
    lock.write().ok().context(error::LockSnafu)
}

impl ManifestStore for MemoryDataStore {
    fn all_manifests(&self) -> Result<ManifestCollection> {
        let manifests = read(&self.manifests)?;
        Ok(manifests.values().cloned().collect())
    }

    fn manifest(&self, name: &str) -> Result<Manifest> {
        check_name(name)?;
        read(&self.manifests)?
            .get(name)
            .cloned()
            .context(error::NotFoundSnafu { name })
    }

    fn new_manifest(&self, name: &str) -> Result<Manifest> {
        check_name(name)?;
        ensure!(
            !read(&self.manifests)?.contains_key(name),
            error::AlreadyExistsSnafu { name }
        );
        Ok(Manifest::new(name))
    }

    fn save_manifest(&self, name: &str, manifest: &Manifest) -> Result<()> {
        check_name(name)?;
        let mut manifest = manifest.clone();
        manifest.filename = name.to_string();
        write(&self.manifests)?.insert(name.to_string(), manifest);
        Ok(())
    }

    fn delete_manifest(&self, name: &str) -> Result<()> {
        check_name(name)?;
        write(&self.manifests)?
            .remove(name)
            .map(|_| ())
            .context(error::NotFoundSnafu { name })
    }
}

impl PkgsinfoStore for MemoryDataStore {
    fn all_pkgsinfos(&self) -> Result<PkgsinfoCollection> {
        let pkgsinfos = read(&self.pkgsinfos)?;
        Ok(pkgsinfos.values().cloned().collect())
    }

    fn pkgsinfo(&self, name: &str) -> Result<Pkgsinfo> {
        check_name(name)?;
        read(&self.pkgsinfos)?
            .get(name)
            .cloned()
            .context(error::NotFoundSnafu { name })
    }

    fn new_pkgsinfo(&self, name: &str) -> Result<Pkgsinfo> {
        check_name(name)?;
        ensure!(
            !read(&self.pkgsinfos)?.contains_key(name),
            error::AlreadyExistsSnafu { name }
        );
        Ok(Pkgsinfo::new(name))
    }

    fn save_pkgsinfo(&self, name: &str, pkgsinfo: &Pkgsinfo) -> Result<()> {
        check_name(name)?;
        let mut pkgsinfo = pkgsinfo.clone();
        pkgsinfo.filename = name.to_string();
        write(&self.pkgsinfos)?.insert(name.to_string(), pkgsinfo);
        Ok(())
    }
}

#[cfg(test)]
mod test {
    use super::MemoryDataStore;
    use crate::ManifestStore;
    use munki::Manifest;

    #[test]
    fn save_sets_filename() {
        let store = MemoryDataStore::new();
        let manifest = Manifest::new("wrong-name");
        store.save_manifest("site_default", &manifest).unwrap();
        assert_eq!(
            store.manifest("site_default").unwrap().filename,
            "site_default"
        );
    }

    #[test]
    fn save_replaces() {
        let store = MemoryDataStore::new();
        let mut manifest = Manifest::new("site_default");
        manifest.notes = "first".to_string();
        store.save_manifest("site_default", &manifest).unwrap();
        manifest.notes = "second".to_string();
        store.save_manifest("site_default", &manifest).unwrap();

        let all = store.all_manifests().unwrap();
        assert_eq!(all.len(), 1);
        assert_eq!(all.as_slice()[0].notes, "second");
    }
}
