use std::collections::BTreeSet;
use std::path::PathBuf;

use serde::{Deserialize, Serialize};

/// Identity of the caller for a single request.
#[derive(Debug, Clone, Default, PartialEq, Eq, Serialize, Deserialize)]
pub struct AuthorizationContext {
    pub is_authenticated: bool,
    pub username: Option<String>,
    pub is_admin: bool,
    /// Lowercased names of every group the user belongs to, directly or not.
    pub group_memberships: BTreeSet<String>,
}

impl AuthorizationContext {
    pub fn anonymous() -> Self {
        Self::default()
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ExecutionRequest {
    /// Virtual path as sent by the UI, still percent-encoded.
    pub virtual_path: String,
}

impl ExecutionRequest {
    pub fn new(virtual_path: impl Into<String>) -> Self {
        Self {
            virtual_path: virtual_path.into(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedTarget {
    pub physical_path: PathBuf,
    pub extension: String,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchOutcome {
    pub success: bool,
    pub process_id: Option<u32>,
    pub error: Option<String>,
}

impl LaunchOutcome {
    pub fn started(process_id: u32) -> Self {
        Self {
            success: true,
            process_id: Some(process_id),
            error: None,
        }
    }

    pub fn failed(error: impl Into<String>) -> Self {
        Self {
            success: false,
            process_id: None,
            error: Some(error.into()),
        }
    }
}
