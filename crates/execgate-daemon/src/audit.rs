//! Audit trail for execution requests, emitted under the `execgate::audit`
//! target so it can be filtered or routed on its own.

use std::path::Path;

use tracing::{error, info, warn};

use execgate_core::RequestId;

const TARGET: &str = "execgate::audit";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum Operation {
    Check,
    Run,
}

impl Operation {
    pub fn as_str(&self) -> &'static str {
        match self {
            Operation::Check => "check",
            Operation::Run => "run",
        }
    }
}

pub fn service_started(enabled: bool) {
    info!(target: TARGET, enabled, "exec launcher initialized");
}

pub fn platform_unsupported() {
    error!(
        target: TARGET,
        platform = std::env::consts::OS,
        "exec launcher works only on Windows, execution disabled"
    );
}

pub fn denied(
    request: RequestId,
    op: Operation,
    path: Option<&str>,
    reason: &str,
    username: Option<&str>,
) {
    info!(
        target: TARGET,
        request = %request,
        op = op.as_str(),
        path = path.unwrap_or("-"),
        username = username.unwrap_or("-"),
        reason,
        "request denied"
    );
}

pub fn path_rejected(request: RequestId, path: &str, reason: &str, username: Option<&str>) {
    warn!(
        target: TARGET,
        request = %request,
        path,
        username = username.unwrap_or("-"),
        reason,
        "path rejected"
    );
}

pub fn launched(request: RequestId, path: &Path, pid: u32, detached: bool, username: Option<&str>) {
    info!(
        target: TARGET,
        request = %request,
        path = %path.display(),
        pid,
        detached,
        username = username.unwrap_or("-"),
        "file executed"
    );
}

pub fn launch_failed(request: RequestId, path: &Path, message: &str, username: Option<&str>) {
    error!(
        target: TARGET,
        request = %request,
        path = %path.display(),
        username = username.unwrap_or("-"),
        error = message,
        "execution error"
    );
}

pub fn settings_unavailable(request: RequestId, op: Operation, message: &str) {
    error!(
        target: TARGET,
        request = %request,
        op = op.as_str(),
        error = message,
        "settings unavailable"
    );
}
