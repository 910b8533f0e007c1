/*!
# Background

munkiserver is a small REST API for managing a munki repository.
munki clients read manifests and package descriptors ("pkgsinfo") straight from the repository; munkiserver lets administrators and tooling list, create, and edit those files over HTTP instead of editing property lists by hand.

All storage goes through the [datastore](../datastore) traits, so the server doesn't know or care how the repository is laid out on disk.

# Endpoints

All paths are under `/api/v1`.

* `GET /manifests` lists every manifest.
* `GET /manifests/{name}` returns one manifest.  Names may contain `/` for manifests in subdirectories.
* `POST /manifests` creates a manifest; the body must include `filename`.
* `PUT /manifests/{name}` replaces an existing manifest.
* `PATCH /manifests/{name}` updates only the fields present in the body.
* `DELETE /manifests/{name}` removes a manifest.
* `GET /pkgsinfos` lists every package descriptor.
* `POST /pkgsinfos` creates a package descriptor; the body must include `filename`.

# Formats

Responses are JSON unless the request's `Accept` header is exactly `application/xml` or `application/xml; charset=utf-8`, in which case they're XML property lists.
Request bodies are read as XML property lists if their `Content-Type` is `application/xml`, and JSON otherwise.

Errors are returned as a map with a single `error` key, in the same format as a successful response would have been:

```json
{
  "error": "not found"
}
```

# Configuration

The `munkiserver` binary reads an optional TOML file (`/etc/munkiserver.toml` by default) and accepts command-line flags that override it; see `munkiserver --help`.
*/

pub mod config;
pub mod server;

pub use server::serve;
