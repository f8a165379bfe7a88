use std::collections::{BTreeSet, VecDeque};

use sha2::{Digest, Sha256};

use crate::config::AccountConfig;
use crate::types::AuthorizationContext;

/// Credentials presented with a remote call.
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum Credentials {
    Anonymous,
    Bearer(String),
}

/// Authentication and group-membership lookups.
pub trait IdentityOracle: Send + Sync {
    fn current_identity(&self, credentials: &Credentials) -> AuthorizationContext;

    /// True when the identity matches any entry of `groups`, either by
    /// username or through membership.
    fn belongs_to(&self, identity: &AuthorizationContext, groups: &[String]) -> bool;
}

/// Account table resolving bearer tokens and transitive group membership.
#[derive(Debug, Clone, Default)]
pub struct AccountDirectory {
    accounts: Vec<AccountConfig>,
}

pub fn hash_token(token: &str) -> String {
    let mut hasher = Sha256::new();
    hasher.update(token.as_bytes());
    hex::encode(hasher.finalize())
}

impl AccountDirectory {
    pub fn new(accounts: Vec<AccountConfig>) -> Self {
        Self { accounts }
    }

    fn find(&self, username: &str) -> Option<&AccountConfig> {
        self.accounts
            .iter()
            .find(|account| account.username.eq_ignore_ascii_case(username))
    }

    /// Builds the context for a known username without checking credentials.
    pub fn lookup(&self, username: &str) -> AuthorizationContext {
        match self.find(username) {
            Some(account) => self.context_for(account),
            None => AuthorizationContext::anonymous(),
        }
    }

    /// Groups are followed transitively. Admin rights are not: only the
    /// account's own flag counts.
    fn context_for(&self, account: &AccountConfig) -> AuthorizationContext {
        let mut memberships = BTreeSet::new();
        let mut queue: VecDeque<String> = account.belongs.iter().cloned().collect();
        while let Some(group) = queue.pop_front() {
            let key = group.to_lowercase();
            if key == account.username.to_lowercase() || !memberships.insert(key) {
                continue;
            }
            if let Some(parent) = self.find(&group) {
                queue.extend(parent.belongs.iter().cloned());
            }
        }
        AuthorizationContext {
            is_authenticated: true,
            username: Some(account.username.clone()),
            is_admin: account.admin,
            group_memberships: memberships,
        }
    }
}

impl IdentityOracle for AccountDirectory {
    fn current_identity(&self, credentials: &Credentials) -> AuthorizationContext {
        let token = match credentials {
            Credentials::Anonymous => return AuthorizationContext::anonymous(),
            Credentials::Bearer(token) => token,
        };
        let digest = hash_token(token);
        self.accounts
            .iter()
            .find(|account| {
                account
                    .token_sha256
                    .as_deref()
                    .is_some_and(|stored| stored.eq_ignore_ascii_case(&digest))
            })
            .map(|account| self.context_for(account))
            .unwrap_or_else(AuthorizationContext::anonymous)
    }

    fn belongs_to(&self, identity: &AuthorizationContext, groups: &[String]) -> bool {
        let username = identity.username.as_deref().map(str::to_lowercase);
        groups.iter().any(|group| {
            let group = group.to_lowercase();
            username.as_deref() == Some(group.as_str()) || identity.group_memberships.contains(&group)
        })
    }
}
