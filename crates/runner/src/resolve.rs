//! Maps an approved virtual path onto the physical root.
//!
//! Checks run in a fixed order: containment, traversal token, network path,
//! symbolic link, existence. Containment is judged on the lexically
//! normalized path, never on the raw concatenation.

use std::fs;
use std::path::{Component, Path, PathBuf, MAIN_SEPARATOR};

use execgate_core::paths::{extension_of, has_parent_segment, relative_to_vfs_root};
use execgate_core::{ExecGateError, PathViolation, PolicySettings, ResolvedTarget};

pub fn resolve(virtual_path: &str, settings: &PolicySettings) -> Result<ResolvedTarget, ExecGateError> {
    if settings.physical_path.as_os_str().is_empty() {
        return Err(PathViolation::NotConfigured.into());
    }

    let relative = relative_to_vfs_root(virtual_path, &settings.vfs_roots());
    let root = canonical_root(&settings.physical_path);
    let joined = root.join(relative.trim_start_matches(['/', '\\']));
    let candidate = lexical_normalize(&joined);

    if !is_within(&candidate, &root) {
        return Err(PathViolation::OutsideRoot.into());
    }
    if has_parent_segment(&relative) {
        return Err(PathViolation::Traversal.into());
    }
    if is_network_path(&settings.physical_path) || is_network_path(&candidate) {
        return Err(PathViolation::NetworkPath.into());
    }
    // Resolution failures are left to the existence check.
    if let Ok(real) = fs::canonicalize(&candidate) {
        if !same_path(&strip_verbatim(real), &candidate) {
            return Err(PathViolation::SymbolicLink.into());
        }
    }
    if !candidate.is_file() {
        return Err(ExecGateError::NotFound);
    }

    let extension = extension_of(&candidate.to_string_lossy());
    Ok(ResolvedTarget {
        physical_path: candidate,
        extension,
    })
}

/// Resolves `.` and `..` without touching the filesystem. `..` at the root
/// stays at the root.
pub fn lexical_normalize(path: &Path) -> PathBuf {
    let mut out = PathBuf::new();
    for component in path.components() {
        match component {
            Component::CurDir => {}
            Component::ParentDir => {
                out.pop();
            }
            other => out.push(other.as_os_str()),
        }
    }
    out
}

/// Case-insensitive check that `candidate` lies strictly below `root`.
pub fn is_within(candidate: &Path, root: &Path) -> bool {
    let root = root.to_string_lossy().to_lowercase();
    let candidate = candidate.to_string_lossy().to_lowercase();
    let prefix = if root.ends_with(MAIN_SEPARATOR) {
        root
    } else {
        format!("{root}{MAIN_SEPARATOR}")
    };
    candidate.starts_with(&prefix)
}

/// Paths starting with two separators can address a remote host.
pub fn is_network_path(path: &Path) -> bool {
    let text = path.to_string_lossy();
    text.starts_with("\\\\") || text.starts_with("//")
}

/// The root with links resolved when it exists, so that only links below the
/// root are flagged. Falls back to the lexical form.
pub fn canonical_root(root: &Path) -> PathBuf {
    match fs::canonicalize(root) {
        Ok(real) => strip_verbatim(real),
        Err(_) => lexical_normalize(root),
    }
}

/// Drops the `\\?\` prefix Windows adds to canonical paths; `\\?\UNC\host`
/// becomes `\\host` so it is still recognised as a network path.
fn strip_verbatim(path: PathBuf) -> PathBuf {
    let stripped = {
        let text = path.to_string_lossy();
        if let Some(rest) = text.strip_prefix(r"\\?\UNC\") {
            Some(PathBuf::from(format!(r"\\{rest}")))
        } else {
            text.strip_prefix(r"\\?\").map(PathBuf::from)
        }
    };
    stripped.unwrap_or(path)
}

#[cfg(windows)]
fn same_path(real: &Path, candidate: &Path) -> bool {
    real.to_string_lossy().to_lowercase() == candidate.to_string_lossy().to_lowercase()
}

#[cfg(not(windows))]
fn same_path(real: &Path, candidate: &Path) -> bool {
    real == candidate
}
