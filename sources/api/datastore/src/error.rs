use snafu::Snafu;
use std::io;
use std::path::PathBuf;

/// Possible errors from datastore operations.
#[derive(Debug, Snafu)]
#[snafu(visibility(pub))]
pub enum Error {
    // This message is returned to API clients as-is, so keep it short.
    #[snafu(display("not found"))]
    NotFound { name: String },

    #[snafu(display("'{}' already exists", name))]
    AlreadyExists { name: String },

    #[snafu(display("Name '{}' is invalid: {}", name, msg))]
    InvalidName { name: String, msg: String },

    #[snafu(display("Name would traverse outside data store: {}", name))]
    PathTraversal { name: String },

    #[snafu(display("IO error on '{}': {}", path.display(), source))]
    Io { path: PathBuf, source: io::Error },

    #[snafu(display("Removing '{}' failed: {}", path.display(), source))]
    Delete { path: PathBuf, source: io::Error },

    #[snafu(display("Error listing entries under '{}': {}", path.display(), source))]
    ListEntries {
        path: PathBuf,
        source: walkdir::Error,
    },

    #[snafu(display("Error building data store path: {}", source))]
    Path { source: std::path::StripPrefixError },

    #[snafu(display("Unable to read property list '{}': {}", path.display(), source))]
    ReadPlist { path: PathBuf, source: plist::Error },

    #[snafu(display("Unable to write property list '{}': {}", path.display(), source))]
    WritePlist { path: PathBuf, source: plist::Error },

    #[snafu(display("Unable to move new file into place at '{}': {}", path.display(), source))]
    Persist {
        path: PathBuf,
        source: tempfile::PersistError,
    },

    #[snafu(display("Data store logic error: {}", msg))]
    Internal { msg: String },

    #[snafu(display("Data store integrity violation at {}: {}", path.display(), msg))]
    Corruption { msg: String, path: PathBuf },

    #[snafu(display("Another thread poisoned the data store lock by panicking"))]
    Lock,
}

impl Error {
    pub fn is_not_found(&self) -> bool {
        matches!(self, Error::NotFound { .. })
    }

    pub fn is_already_exists(&self) -> bool {
        matches!(self, Error::AlreadyExists { .. })
    }

    /// Returns true if the caller asked for a name that can never be stored, as opposed to the
    /// store failing to carry out the request.
    pub fn is_invalid_name(&self) -> bool {
        matches!(
            self,
            Error::InvalidName { .. } | Error::PathTraversal { .. }
        )
    }
}

pub type Result<T> = std::result::Result<T, Error>;
