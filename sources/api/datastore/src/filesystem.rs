//! This implementation of the store traits serves a munki repository from the filesystem.
//!
//! Each entity is a property list file whose path resembles its name, e.g. manifests/clients/abc
//! for the manifest "clients/abc".  Files are written to a temporary file in the same directory
//! and then renamed over the target, so a reader sees either the old or the new contents.

use log::{debug, error, trace};
use munki::{Manifest, ManifestCollection, Pkgsinfo, PkgsinfoCollection};
use serde::de::DeserializeOwned;
use serde::Serialize;
use snafu::{ensure, OptionExt, ResultExt};
use std::fs;
use std::io;
use std::path::{self, Path, PathBuf};
use tempfile::NamedTempFile;
use walkdir::{DirEntry, WalkDir};

use super::name::{check_name, NAME_SEPARATOR};
use super::{error, ManifestStore, PkgsinfoStore, Result};

pub const MANIFESTS_DIR: &str = "manifests";
pub const PKGSINFO_DIR: &str = "pkgsinfo";

#[derive(Debug)]
pub struct FilesystemDataStore {
    manifests_path: PathBuf,
    pkgsinfo_path: PathBuf,
}

impl FilesystemDataStore {
    pub fn new<P: AsRef<Path>>(repo_path: P) -> FilesystemDataStore {
        FilesystemDataStore {
            manifests_path: repo_path.as_ref().join(MANIFESTS_DIR),
            pkgsinfo_path: repo_path.as_ref().join(PKGSINFO_DIR),
        }
    }

    /// Creates the repository subdirectories if they don't exist yet.
    pub fn create_dirs(&self) -> Result<()> {
        for dir in &[&self.manifests_path, &self.pkgsinfo_path] {
            fs::create_dir_all(dir).context(error::IoSnafu { path: *dir })?;
        }
        Ok(())
    }

    /// Returns the appropriate path on the filesystem for the given name under the given base.
    fn entity_path<S: AsRef<str>>(base_path: &Path, name: S) -> Result<PathBuf> {
        let name = name.as_ref();
        check_name(name)?;

        // Names always use '/'; turn it into the platform separator.
        let path_suffix = name.replace(NAME_SEPARATOR, path::MAIN_SEPARATOR_STR);
        let path = base_path.join(path_suffix);

        // Confirm no path traversal outside of base
        ensure!(
            path != base_path && path.starts_with(base_path),
            error::PathTraversalSnafu { name }
        );

        Ok(path)
    }

    /// Returns the path to write the named entity to.  Directories hold other entities, so a name
    /// can't land on one, or pass through a file on the way.
    fn writable_path(base_path: &Path, name: &str) -> Result<PathBuf> {
        let path = Self::entity_path(base_path, name)?;
        ensure!(
            !path.is_dir(),
            error::InvalidNameSnafu {
                name,
                msg: "name refers to a directory of other entities",
            }
        );
        for ancestor in path.ancestors().skip(1) {
            if ancestor == base_path {
                break;
            }
            ensure!(
                !ancestor.is_file(),
                error::InvalidNameSnafu {
                    name,
                    msg: format!("'{}' is an entity, not a directory", ancestor.display()),
                }
            );
        }
        Ok(path)
    }

    /// Deletes the given path from the filesystem.  Also removes the parent directory if empty
    /// (repeatedly, up to the base path), so that removing the last manifest in a subdirectory
    /// doesn't leave the directory behind.
    ///
    /// If we fail to remove an empty directory, we log an error, but still return Ok.
    fn delete_entity_path(base: &Path, path: &Path, name: &str) -> Result<()> {
        // A directory is a group of entities, not one itself.
        ensure!(!path.is_dir(), error::NotFoundSnafu { name });

        match fs::remove_file(path) {
            Ok(()) => {}
            Err(e) if e.kind() == io::ErrorKind::NotFound => {
                return error::NotFoundSnafu { name }.fail();
            }
            Err(e) => return Err(e).context(error::DeleteSnafu { path }),
        }

        if let Some(parent) = path.parent() {
            // Note: ancestors() includes 'parent' itself
            for parent in parent.ancestors() {
                if parent == base {
                    break;
                }
                if let Err(e) = fs::remove_dir(parent) {
                    if e.kind() == io::ErrorKind::NotFound {
                        continue;

                    // Anything but "not empty" is worth logging, but we've already removed the
                    // entity, so don't fail.
                    } else if e.kind() != io::ErrorKind::DirectoryNotEmpty {
                        error!(
                            "Failed to delete directory '{}' we believe is empty: {}",
                            parent.display(),
                            e
                        );
                    }
                    break;
                }
            }
        }
        Ok(())
    }
}

// Filesystem helpers

/// Reads and parses the property list at the given path.  Returns Ok(None) if the file doesn't
/// exist rather than erroring.  A directory doesn't count as a file.
fn read_plist<T: DeserializeOwned>(path: &Path) -> Result<Option<T>> {
    if path.is_dir() {
        return Ok(None);
    }

    match fs::read(path) {
        Ok(bytes) => plist::from_bytes(&bytes)
            .map(Some)
            .context(error::ReadPlistSnafu { path }),
        Err(e) => {
            if e.kind() == io::ErrorKind::NotFound {
                return Ok(None);
            }

            Err(e).context(error::IoSnafu { path })
        }
    }
}

/// Writes the value as an XML property list, making the directory tree beforehand so that names
/// with subdirectories work without any fixed structure.
fn write_plist<T: Serialize>(path: &Path, value: &T) -> Result<()> {
    let dirname = path.parent().with_context(|| error::InternalSnafu {
        msg: format!(
            "Given path to write without proper prefix: {}",
            path.display()
        ),
    })?;
    fs::create_dir_all(dirname).context(error::IoSnafu { path: dirname })?;

    let mut tmp = NamedTempFile::new_in(dirname).context(error::IoSnafu { path: dirname })?;
    plist::to_writer_xml(&mut tmp, value).context(error::WritePlistSnafu { path })?;
    tmp.persist(path).context(error::PersistSnafu { path })?;
    Ok(())
}

/// Hidden entries are never entities; this also skips our own in-flight temporary files.
fn is_hidden(entry: &DirEntry) -> bool {
    entry
        .file_name()
        .to_str()
        .map(|s| s.starts_with('.'))
        .unwrap_or(false)
}

/// Walks the given base directory and returns the name of every entity file under it, in sorted
/// order.  A missing base directory means an empty store.
fn list_names(base: &Path) -> Result<Vec<String>> {
    if !base.exists() {
        trace!(
            "Returning empty list because path doesn't exist: {}",
            base.display()
        );
        return Ok(Vec::new());
    }

    let walker = WalkDir::new(base)
        .follow_links(false) // shouldn't be links...
        .same_file_system(true) // shouldn't be filesystems to cross...
        .sort_by_file_name()
        .into_iter()
        .filter_entry(|e| e.depth() == 0 || !is_hidden(e));

    let mut names = Vec::new();
    trace!("Starting walk of filesystem under {}", base.display());
    for entry in walker {
        let entry = entry.context(error::ListEntriesSnafu { path: base })?;
        if !entry.file_type().is_file() {
            trace!("Skipping non-file entry: {}", entry.path().display());
            continue;
        }

        let relative = entry.path().strip_prefix(base).context(error::PathSnafu)?;
        let relative_str = relative.to_str().context(error::CorruptionSnafu {
            msg: "Non-UTF8 path",
            path: entry.path(),
        })?;
        names.push(relative_str.replace(path::MAIN_SEPARATOR, &NAME_SEPARATOR.to_string()));
    }

    // Walking sorts per directory; sort the full names so order doesn't depend on depth.
    names.sort();
    Ok(names)
}

/// Reads every entity under the given base, setting each one's name with the given function.
fn read_all<T, F>(base: &Path, mut set_name: F) -> Result<Vec<T>>
where
    T: DeserializeOwned,
    F: FnMut(&mut T, String),
{
    let mut result = Vec::new();
    for name in list_names(base)? {
        let path = FilesystemDataStore::entity_path(base, &name)?;
        trace!("Reading entity '{}' from {}", name, path.display());
        match read_plist::<T>(&path)? {
            Some(mut entity) => {
                set_name(&mut entity, name);
                result.push(entity);
            }
            // Removed since we listed it; that's fine, it's just not part of the result.
            None => debug!("Listed entity '{}' no longer on disk", name),
        }
    }
    Ok(result)
}

impl ManifestStore for FilesystemDataStore {
    fn all_manifests(&self) -> Result<ManifestCollection> {
        let manifests = read_all(&self.manifests_path, |m: &mut Manifest, name| {
            m.filename = name
        })?;
        Ok(ManifestCollection::new(manifests))
    }

    fn manifest(&self, name: &str) -> Result<Manifest> {
        let path = Self::entity_path(&self.manifests_path, name)?;
        let mut manifest: Manifest =
            read_plist(&path)?.context(error::NotFoundSnafu { name })?;
        manifest.filename = name.to_string();
        Ok(manifest)
    }

    fn new_manifest(&self, name: &str) -> Result<Manifest> {
        let path = Self::writable_path(&self.manifests_path, name)?;
        ensure!(!path.exists(), error::AlreadyExistsSnafu { name });
        Ok(Manifest::new(name))
    }

    fn save_manifest(&self, name: &str, manifest: &Manifest) -> Result<()> {
        let path = Self::writable_path(&self.manifests_path, name)?;
        debug!("Writing manifest '{}' to {}", name, path.display());
        write_plist(&path, manifest)
    }

    fn delete_manifest(&self, name: &str) -> Result<()> {
        let path = Self::entity_path(&self.manifests_path, name)?;
        debug!("Removing manifest '{}' at {}", name, path.display());
        Self::delete_entity_path(&self.manifests_path, &path, name)
    }
}

impl PkgsinfoStore for FilesystemDataStore {
    fn all_pkgsinfos(&self) -> Result<PkgsinfoCollection> {
        let pkgsinfos = read_all(&self.pkgsinfo_path, |p: &mut Pkgsinfo, name| {
            p.filename = name
        })?;
        Ok(PkgsinfoCollection::new(pkgsinfos))
    }

    fn pkgsinfo(&self, name: &str) -> Result<Pkgsinfo> {
        let path = Self::entity_path(&self.pkgsinfo_path, name)?;
        let mut pkgsinfo: Pkgsinfo =
            read_plist(&path)?.context(error::NotFoundSnafu { name })?;
        pkgsinfo.filename = name.to_string();
        Ok(pkgsinfo)
    }

    fn new_pkgsinfo(&self, name: &str) -> Result<Pkgsinfo> {
        let path = Self::writable_path(&self.pkgsinfo_path, name)?;
        ensure!(!path.exists(), error::AlreadyExistsSnafu { name });
        Ok(Pkgsinfo::new(name))
    }

    fn save_pkgsinfo(&self, name: &str, pkgsinfo: &Pkgsinfo) -> Result<()> {
        let path = Self::writable_path(&self.pkgsinfo_path, name)?;
        debug!("Writing pkgsinfo '{}' to {}", name, path.display());
        write_plist(&path, pkgsinfo)
    }
}

#[cfg(test)]
mod test {
    use super::{list_names, FilesystemDataStore, MANIFESTS_DIR};
    use crate::{ManifestStore, PkgsinfoStore};
    use munki::Pkgsinfo;
    use munki::Manifest;
    use std::fs;
    use std::path::Path;
    use tempfile::TempDir;

    #[test]
    fn entity_path() {
        let base = Path::new("/repo/manifests");
        let path = FilesystemDataStore::entity_path(base, "clients/abc").unwrap();
        assert_eq!(path.into_os_string(), "/repo/manifests/clients/abc");

        FilesystemDataStore::entity_path(base, "../pkgsinfo/x").unwrap_err();
        FilesystemDataStore::entity_path(base, "/etc/passwd").unwrap_err();
    }

    #[test]
    fn listing_skips_hidden_and_sorts() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join(MANIFESTS_DIR);
        fs::create_dir_all(base.join("b")).unwrap();
        fs::create_dir_all(base.join(".git")).unwrap();
        fs::write(base.join("c"), "").unwrap();
        fs::write(base.join("b/a"), "").unwrap();
        fs::write(base.join(".DS_Store"), "").unwrap();
        fs::write(base.join(".git/config"), "").unwrap();

        assert_eq!(list_names(&base).unwrap(), vec!["b/a", "c"]);
    }

    #[test]
    fn missing_directory_is_empty() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDataStore::new(dir.path().join("nothing-here"));
        assert!(store.all_manifests().unwrap().is_empty());
    }

    #[test]
    fn saves_xml_plist() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDataStore::new(dir.path());

        let mut manifest = Manifest::new("site_default");
        manifest.catalogs = vec!["production".to_string()];
        store.save_manifest("site_default", &manifest).unwrap();

        let written = fs::read_to_string(dir.path().join("manifests/site_default")).unwrap();
        assert!(written.contains("<plist version=\"1.0\">"));
        assert!(written.contains("<key>catalogs</key>"));
        assert!(!written.contains("filename"));

        // No temporary files left behind.
        let entries = fs::read_dir(dir.path().join(MANIFESTS_DIR)).unwrap().count();
        assert_eq!(entries, 1);
    }

    #[test]
    fn reads_existing_repository() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join(MANIFESTS_DIR);
        fs::create_dir_all(&base).unwrap();
        fs::write(
            base.join("site_default"),
            include_str!("../../../munki/tests/data/site_default.plist"),
        )
        .unwrap();

        let store = FilesystemDataStore::new(dir.path());
        let manifest = store.manifest("site_default").unwrap();
        assert_eq!(manifest.filename, "site_default");
        assert_eq!(manifest.display_name, "Site Default");
    }

    #[test]
    fn corrupt_file_is_an_error() {
        let dir = TempDir::new().unwrap();
        let base = dir.path().join(MANIFESTS_DIR);
        fs::create_dir_all(&base).unwrap();
        fs::write(base.join("broken"), "not a plist").unwrap();

        let store = FilesystemDataStore::new(dir.path());
        let err = store.manifest("broken").unwrap_err();
        assert!(!err.is_not_found());
    }

    #[test]
    fn delete_removes_empty_directories() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDataStore::new(dir.path());
        store.create_dirs().unwrap();
        store
            .save_manifest("clients/east/abc", &Manifest::new("clients/east/abc"))
            .unwrap();

        store.delete_manifest("clients/east/abc").unwrap();
        assert!(!dir.path().join("manifests/clients").exists());
        assert!(dir.path().join(MANIFESTS_DIR).exists());
    }

    #[test]
    fn directories_are_not_entities() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDataStore::new(dir.path());
        store.create_dirs().unwrap();
        store
            .save_manifest("clients/laptop", &Manifest::new("clients/laptop"))
            .unwrap();

        assert!(store.manifest("clients").unwrap_err().is_not_found());
        assert!(store.delete_manifest("clients").unwrap_err().is_not_found());
        assert!(store
            .save_manifest("clients", &Manifest::new("clients"))
            .unwrap_err()
            .is_invalid_name());
        assert!(store.new_manifest("clients").unwrap_err().is_invalid_name());
        assert!(store
            .save_manifest("clients/laptop/extra", &Manifest::new("x"))
            .unwrap_err()
            .is_invalid_name());

        // The real entity is untouched.
        assert_eq!(store.all_manifests().unwrap().len(), 1);
        store.manifest("clients/laptop").unwrap();

        store
            .save_pkgsinfo("apps/Firefox-120.0", &Pkgsinfo::new("apps/Firefox-120.0"))
            .unwrap();
        assert!(store.pkgsinfo("apps").unwrap_err().is_not_found());
        assert!(store.new_pkgsinfo("apps").unwrap_err().is_invalid_name());
    }

    #[test]
    fn delete_keeps_populated_directories() {
        let dir = TempDir::new().unwrap();
        let store = FilesystemDataStore::new(dir.path());
        store.create_dirs().unwrap();
        for name in &["clients/a", "clients/b"] {
            store.save_manifest(name, &Manifest::new(*name)).unwrap();
        }

        store.delete_manifest("clients/a").unwrap();
        assert!(dir.path().join("manifests/clients/b").is_file());
        assert_eq!(store.all_manifests().unwrap().len(), 1);
    }
}
