//! Home-directory shorthand for identity material paths.

use std::io;
use std::path::PathBuf;

use crate::error::{BridgeError, BridgeResult};

/// Expand a leading `~` to the invoking user's home directory.
///
/// Only `~` on its own and `~/...` are expanded; `~user` forms and a `~`
/// anywhere else in the path are left untouched.
pub fn expand_home(path: &str) -> BridgeResult<PathBuf> {
    let rest = match path.strip_prefix('~') {
        Some(rest) if rest.is_empty() || rest.starts_with('/') => rest,
        _ => return Ok(PathBuf::from(path)),
    };

    let home = dirs::home_dir().ok_or_else(|| {
        BridgeError::io(
            path,
            io::Error::new(io::ErrorKind::NotFound, "home directory is not known"),
        )
    })?;

    Ok(home.join(rest.trim_start_matches('/')))
}
