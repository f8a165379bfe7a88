use anyhow::{bail, Result};

use execgate_core::identity::hash_token;

/// Prints the digest to paste into an `[[accounts]]` entry.
pub fn execute(token: &str) -> Result<()> {
    if token.trim().is_empty() {
        bail!("token must not be empty");
    }
    println!("token_sha256 = \"{}\"", hash_token(token.trim()));
    Ok(())
}
