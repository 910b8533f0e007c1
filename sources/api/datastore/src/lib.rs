/*!
# Background

A 'data store' for the munki API server is responsible for storing manifests and package descriptors ("pkgsinfo") by name.

For more detail about their usage, see [munkiserver](../munkiserver).

# Library

This library provides traits defining the exact requirements, along with implementations for filesystem and memory data stores.

`FilesystemDataStore` serves a munki repository directly: each manifest is a property list file under `manifests/`, and each package descriptor is a property list file under `pkgsinfo/`.
The name of an entity is its path relative to that directory, so names may contain `/` to refer to subdirectories.

`MemoryDataStore` keeps everything in memory, which is mostly useful for tests.

# Concurrency

The traits take `&self` and require `Send + Sync`, so one store can be shared by all server workers.
Each implementation is responsible for its own consistency:
* `FilesystemDataStore` writes to a temporary file next to the target and renames it into place, so readers never see a partial file.
* `MemoryDataStore` guards its maps with read/write locks.

# Current limitations

* There's no conflict detection between concurrent writers; the last save wins.
* Creating an entity checks for an existing one, but the check and the later save aren't atomic.
*/

pub mod error;
pub mod filesystem;
pub mod memory;
pub mod name;

pub use error::{Error, Result};
pub use filesystem::FilesystemDataStore;
pub use memory::MemoryDataStore;

use munki::{Manifest, ManifestCollection, Pkgsinfo, PkgsinfoCollection};

/// ManifestStore describes persistence for manifests.
pub trait ManifestStore: Send + Sync {
    /// Returns every manifest in the store.
    fn all_manifests(&self) -> Result<ManifestCollection>;

    /// Returns the manifest with the given name, or Error::NotFound.
    fn manifest(&self, name: &str) -> Result<Manifest>;

    /// Returns a new, empty manifest with the given name.  The manifest isn't persisted until
    /// it's passed to save_manifest.  Returns Error::AlreadyExists if the name is taken.
    fn new_manifest(&self, name: &str) -> Result<Manifest>;

    /// Stores the manifest under the given name, replacing any existing manifest of that name.
    fn save_manifest(&self, name: &str, manifest: &Manifest) -> Result<()>;

    /// Removes the manifest with the given name, or returns Error::NotFound.
    fn delete_manifest(&self, name: &str) -> Result<()>;
}

/// PkgsinfoStore describes persistence for package descriptors.
pub trait PkgsinfoStore: Send + Sync {
    /// Returns every package descriptor in the store.
    fn all_pkgsinfos(&self) -> Result<PkgsinfoCollection>;

    /// Returns the package descriptor with the given name, or Error::NotFound.
    fn pkgsinfo(&self, name: &str) -> Result<Pkgsinfo>;

    /// Returns a new, empty package descriptor with the given name, or Error::AlreadyExists.
    fn new_pkgsinfo(&self, name: &str) -> Result<Pkgsinfo>;

    /// Stores the package descriptor under the given name.
    fn save_pkgsinfo(&self, name: &str, pkgsinfo: &Pkgsinfo) -> Result<()>;
}
