use serde::{Deserialize, Serialize};

use execgate_core::ExecGateError;

/// Outcome of evaluating one request. Denials carry a human-readable reason.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct PolicyDecision {
    pub allowed: bool,
    pub reason: Option<String>,
    /// Decoded virtual path, as displayed to the user.
    pub virtual_path: Option<String>,
    pub normalized_virtual_path: Option<String>,
    pub username: Option<String>,
}

impl PolicyDecision {
    pub fn allow(virtual_path: String, normalized: String, username: Option<String>) -> Self {
        Self {
            allowed: true,
            reason: None,
            virtual_path: Some(virtual_path),
            normalized_virtual_path: Some(normalized),
            username,
        }
    }

    pub fn deny(reason: impl Into<String>, normalized: Option<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
            virtual_path: None,
            normalized_virtual_path: normalized,
            username: None,
        }
    }

    pub fn into_result(self) -> Result<Self, ExecGateError> {
        if self.allowed {
            return Ok(self);
        }
        let reason = self.reason.unwrap_or_else(|| "execution denied".to_string());
        Err(ExecGateError::PolicyDenied(reason))
    }
}
