use execgate_core::paths::extension_of;

pub fn check_extension(virtual_path: &str, allowed: &[String]) -> Result<(), String> {
    let extension = extension_of(virtual_path);
    if allowed.iter().any(|candidate| candidate.eq_ignore_ascii_case(&extension)) {
        return Ok(());
    }
    Err(format!("invalid extension: {extension}"))
}
