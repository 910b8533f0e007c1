//! Entity names are paths relative to a repository subdirectory, like "site_default" or
//! "clients/laptop-0042".  This module checks that a name is safe to use as such a path.

use snafu::ensure;

use super::{error, Result};

/// Separates the directory components of a name, regardless of platform.
pub const NAME_SEPARATOR: char = '/';

/// Segment length matches the maximum filename length of 255.
const MAX_SEGMENT_LENGTH: usize = 255;

/// Confirms that the given name is a relative path made of plain, non-hidden components.  This
/// rules out absolute paths, "." and "..", empty components (from leading, trailing, or doubled
/// separators), and dotfiles, which would be skipped when listing the store.
pub fn check_name<S: AsRef<str>>(name: S) -> Result<()> {
    let name = name.as_ref();
    ensure!(
        !name.is_empty(),
        error::InvalidNameSnafu {
            name,
            msg: "name is empty",
        }
    );
    ensure!(
        !name.contains('\0') && !name.contains('\\'),
        error::InvalidNameSnafu {
            name,
            msg: "name contains a forbidden character",
        }
    );

    for segment in name.split(NAME_SEPARATOR) {
        ensure!(
            !segment.is_empty(),
            error::InvalidNameSnafu {
                name,
                msg: "name has an empty path component",
            }
        );
        ensure!(
            !segment.starts_with('.'),
            error::InvalidNameSnafu {
                name,
                msg: format!("path component '{}' may not start with '.'", segment),
            }
        );
        ensure!(
            segment.len() <= MAX_SEGMENT_LENGTH,
            error::InvalidNameSnafu {
                name,
                msg: format!("path component longer than {}", MAX_SEGMENT_LENGTH),
            }
        );
    }

    Ok(())
}
