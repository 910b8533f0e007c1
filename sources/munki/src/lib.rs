/*!
# Background

This library holds the data model for a munki repository as served by the munki API server.

A munki repository is a directory of property list files.
`manifests/` holds one manifest per client or group of clients, describing what software should be installed, removed, or offered, and which other manifests it includes.
`pkgsinfo/` holds one package descriptor per installable item.

# Model

* `Manifest` is a named manifest; `Condition` is a conditional block nested inside one.
* `ManifestPayload` describes a partial update to a manifest.
  Each field is a `Field`, which keeps "not given" apart from "given, but empty", so that a PATCH can clear a list without touching the fields it doesn't mention.
* `Pkgsinfo` is a package descriptor.

The key of each entity (its path relative to the repository subdirectory) is kept in the `filename` field, which is never serialized; the key is part of the request path instead.

All optional fields are skipped during serialization when they're empty, to match the way munki tools write these files.
*/

pub mod manifest;
pub mod payload;
pub mod pkgsinfo;

pub use manifest::{Condition, Manifest, ManifestCollection, ManifestItems, ManifestPayload};
pub use payload::Field;
pub use pkgsinfo::{Pkgsinfo, PkgsinfoCollection, Receipt};
