//! Mapping of request paths onto the filesystem under the server root.

use std::path::{Component, Path, PathBuf};

use crate::error::ServeError;

/// Percent-decode a request path.
///
/// # Errors
/// Returns `MalformedRequest` if the decoded bytes are not UTF-8 or contain NUL.
pub fn decode_path(uri_path: &str) -> Result<String, ServeError> {
    let decoded = urlencoding::decode(uri_path)
        .map_err(|_| ServeError::MalformedRequest(format!("path is not UTF-8: {uri_path}")))?;
    if decoded.contains('\0') {
        return Err(ServeError::MalformedRequest(format!(
            "path contains NUL: {uri_path}"
        )));
    }
    Ok(decoded.into_owned())
}

/// Resolve a request path against `root`.
///
/// Empty and `.` segments are skipped. A `..` segment, or any segment that
/// is not a single plain file name, is rejected, so the result is always
/// `root` or a descendant of it. Symlinks are not inspected.
///
/// # Errors
/// Returns `MalformedRequest` for undecodable paths and `ForbiddenPath` for
/// paths that try to leave the root.
pub fn resolve(root: &Path, uri_path: &str) -> Result<PathBuf, ServeError> {
    let decoded = decode_path(uri_path)?;
    let mut resolved = root.to_path_buf();

    for segment in decoded.split('/') {
        match segment {
            "" | "." => {}
            ".." => return Err(ServeError::ForbiddenPath(decoded.clone())),
            _ => {
                let mut components = Path::new(segment).components();
                match (components.next(), components.next()) {
                    (Some(Component::Normal(name)), None) => resolved.push(name),
                    _ => return Err(ServeError::ForbiddenPath(decoded.clone())),
                }
            }
        }
    }

    Ok(resolved)
}
