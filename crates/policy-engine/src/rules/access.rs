//! Identity rules: authentication, role, then group membership.

use execgate_core::{AuthorizationContext, IdentityOracle};

pub fn check_authenticated(identity: &AuthorizationContext) -> Result<(), String> {
    if identity.is_authenticated {
        return Ok(());
    }
    Err("authorization required".to_string())
}

pub fn check_role(allow_all_users: bool, identity: &AuthorizationContext) -> Result<(), String> {
    if allow_all_users || identity.is_admin {
        return Ok(());
    }
    Err("administrators only".to_string())
}

pub fn check_groups(
    groups: &[String],
    identity: &AuthorizationContext,
    oracle: &dyn IdentityOracle,
) -> Result<(), String> {
    if groups.is_empty() || oracle.belongs_to(identity, groups) {
        return Ok(());
    }
    Err("access denied for your group".to_string())
}
