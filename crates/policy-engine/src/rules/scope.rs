use execgate_core::paths::vfs_root_for;

/// Confines requests to the configured VFS roots. No roots, no restriction.
pub fn check_vfs_scope(normalized: &str, roots: &[String]) -> Result<(), String> {
    if roots.is_empty() || vfs_root_for(normalized, roots).is_some() {
        return Ok(());
    }
    Err(format!("VFS path not allowed: {normalized}"))
}
