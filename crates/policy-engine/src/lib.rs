use execgate_core::paths::{decode_virtual_path, normalize};
use execgate_core::{AuthorizationContext, ExecutionRequest, IdentityOracle, PolicySettings};

mod decision;
pub mod rules;

pub use decision::PolicyDecision;

/// Decides whether a request may execute. Holds no settings of its own: the
/// caller passes the current snapshot on every evaluation, so check and run
/// always judge against the same, fresh policy.
pub struct PolicyEngine<'a> {
    oracle: &'a dyn IdentityOracle,
}

impl<'a> PolicyEngine<'a> {
    pub fn new(oracle: &'a dyn IdentityOracle) -> Self {
        Self { oracle }
    }

    /// Applies the rules in order: extension, VFS scope, authentication,
    /// role, groups. The first failing rule supplies the denial reason.
    pub fn evaluate(
        &self,
        request: &ExecutionRequest,
        settings: &PolicySettings,
        identity: &AuthorizationContext,
    ) -> PolicyDecision {
        let Some(virtual_path) = decode_virtual_path(&request.virtual_path) else {
            return PolicyDecision::deny("invalid path encoding", None);
        };
        let normalized = normalize(&virtual_path);

        let verdict = rules::extension::check_extension(&virtual_path, &settings.extensions())
            .and_then(|_| rules::scope::check_vfs_scope(&normalized, &settings.vfs_roots()))
            .and_then(|_| rules::access::check_authenticated(identity))
            .and_then(|_| rules::access::check_role(settings.allow_all_users, identity))
            .and_then(|_| {
                rules::access::check_groups(&settings.groups(), identity, self.oracle)
            });

        match verdict {
            Ok(()) => PolicyDecision::allow(virtual_path, normalized, identity.username.clone()),
            Err(reason) => PolicyDecision::deny(reason, Some(normalized)),
        }
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use execgate_core::{AccountConfig, AccountDirectory};

    fn directory() -> AccountDirectory {
        let account = |name: &str, admin: bool, belongs: &[&str]| AccountConfig {
            username: name.to_string(),
            admin,
            belongs: belongs.iter().map(|b| b.to_string()).collect(),
            token_sha256: None,
        };
        AccountDirectory::new(vec![
            account("root", true, &[]),
            account("operator", false, &["ops"]),
            account("guest", false, &[]),
            account("ops", false, &[]),
        ])
    }

    fn scenario_settings() -> PolicySettings {
        PolicySettings {
            allowed_extensions: "exe|bat".to_string(),
            allowed_vfs_paths: "/scripts".to_string(),
            ..PolicySettings::default()
        }
    }

    fn evaluate(path: &str, settings: &PolicySettings, user: Option<&str>) -> PolicyDecision {
        let directory = directory();
        let identity = match user {
            Some(name) => directory.lookup(name),
            None => AuthorizationContext::anonymous(),
        };
        PolicyEngine::new(&directory).evaluate(&ExecutionRequest::new(path), settings, &identity)
    }

    #[test]
    fn admin_may_run_listed_file() {
        let decision = evaluate("/scripts/run.exe", &scenario_settings(), Some("root"));
        assert!(decision.allowed);
        assert_eq!(decision.reason, None);
        assert_eq!(decision.virtual_path.as_deref(), Some("/scripts/run.exe"));
        assert_eq!(decision.username.as_deref(), Some("root"));
    }

    #[test]
    fn decision_keeps_decoded_display_path() {
        let decision = evaluate("/Scripts/My%20Tool.EXE", &scenario_settings(), Some("root"));
        assert!(decision.allowed);
        assert_eq!(decision.virtual_path.as_deref(), Some("/Scripts/My Tool.EXE"));
        assert_eq!(
            decision.normalized_virtual_path.as_deref(),
            Some("/scripts/my tool.exe")
        );
    }

    #[test]
    fn wrong_extension_is_denied_regardless_of_other_settings() {
        let mut settings = scenario_settings();
        settings.allow_all_users = true;
        settings.allowed_vfs_paths.clear();
        for user in [Some("root"), Some("guest"), None] {
            let decision = evaluate("/scripts/readme.TXT", &settings, user);
            assert!(!decision.allowed);
            assert_eq!(decision.reason.as_deref(), Some("invalid extension: txt"));
        }
    }

    #[test]
    fn empty_extension_setting_uses_defaults() {
        let settings = PolicySettings {
            allowed_extensions: String::new(),
            ..PolicySettings::default()
        };
        assert!(evaluate("/x/job.cmd", &settings, Some("root")).allowed);
        assert!(!evaluate("/x/job.ps1", &settings, Some("root")).allowed);
    }

    #[test]
    fn path_outside_vfs_scope_is_denied() {
        let decision = evaluate("/private/run.exe", &scenario_settings(), Some("root"));
        assert!(!decision.allowed);
        assert_eq!(
            decision.reason.as_deref(),
            Some("VFS path not allowed: /private/run.exe")
        );
        assert_eq!(
            decision.normalized_virtual_path.as_deref(),
            Some("/private/run.exe")
        );
    }

    #[test]
    fn unauthenticated_is_always_denied() {
        for allow_all_users in [false, true] {
            let settings = PolicySettings {
                allow_all_users,
                ..scenario_settings()
            };
            let decision = evaluate("/scripts/run.exe", &settings, None);
            assert_eq!(decision.reason.as_deref(), Some("authorization required"));
        }
    }

    #[test]
    fn non_admin_is_denied_unless_all_users_allowed() {
        let decision = evaluate("/scripts/run.exe", &scenario_settings(), Some("guest"));
        assert_eq!(decision.reason.as_deref(), Some("administrators only"));

        let settings = PolicySettings {
            allow_all_users: true,
            ..scenario_settings()
        };
        assert!(evaluate("/scripts/run.exe", &settings, Some("guest")).allowed);
    }

    #[test]
    fn group_rule_admits_members_only() {
        let settings = PolicySettings {
            allow_all_users: true,
            allowed_groups: "ops|admins".to_string(),
            ..scenario_settings()
        };
        assert!(evaluate("/scripts/run.exe", &settings, Some("operator")).allowed);

        let decision = evaluate("/scripts/run.exe", &settings, Some("guest"));
        assert_eq!(
            decision.reason.as_deref(),
            Some("access denied for your group")
        );
    }

    #[test]
    fn group_rule_applies_to_admins_too() {
        let settings = PolicySettings {
            allowed_groups: "ops".to_string(),
            ..scenario_settings()
        };
        let decision = evaluate("/scripts/run.exe", &settings, Some("root"));
        assert_eq!(
            decision.reason.as_deref(),
            Some("access denied for your group")
        );
    }

    #[test]
    fn traversal_passes_string_checks_here() {
        // the raw string satisfies extension and prefix; the resolver rejects it
        let decision = evaluate("/scripts/../secret.exe", &scenario_settings(), Some("root"));
        assert!(decision.allowed);
    }

    #[test]
    fn invalid_encoding_is_denied() {
        let decision = evaluate("/scripts/%c3%28.exe", &scenario_settings(), Some("root"));
        assert_eq!(decision.reason.as_deref(), Some("invalid path encoding"));
    }

    #[test]
    fn repeated_evaluation_is_identical() {
        let settings = scenario_settings();
        for user in [Some("root"), Some("guest"), None] {
            let first = evaluate("/scripts/run.exe", &settings, user);
            let second = evaluate("/scripts/run.exe", &settings, user);
            assert_eq!(first, second);
        }
    }
}
