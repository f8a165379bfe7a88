use std::sync::Arc;

use serde::{Deserialize, Serialize};

use execgate_core::paths::file_name;
use execgate_core::{
    Credentials, ExecGateError, ExecutionRequest, PolicySettings, RequestId, SettingsProvider,
};
use policy_engine::{PolicyDecision, PolicyEngine};
use runner::Runner;

use crate::audit::{self, Operation};

/// The check and run pipeline. Holds no policy state: settings and identity
/// come from one fresh snapshot per call, and run never trusts an earlier
/// check.
pub struct ExecService {
    provider: Arc<dyn SettingsProvider>,
    /// `None` when the platform cannot launch processes.
    runner: Option<Runner>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct CheckResponse {
    pub allowed: bool,
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub reason: Option<String>,
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(untagged)]
pub enum RunResponse {
    Started {
        success: bool,
        pid: u32,
        file: String,
        #[serde(rename = "vfsPath")]
        vfs_path: String,
    },
    Failed {
        error: String,
    },
}

impl CheckResponse {
    pub fn denied(reason: impl Into<String>) -> Self {
        Self {
            allowed: false,
            reason: Some(reason.into()),
        }
    }
}

impl RunResponse {
    pub fn failed(error: impl Into<String>) -> Self {
        RunResponse::Failed {
            error: error.into(),
        }
    }
}

impl ExecService {
    /// Enables launching on Windows only; elsewhere the service stays up but
    /// refuses every request.
    pub fn init(provider: Arc<dyn SettingsProvider>) -> Self {
        let runner = if cfg!(windows) {
            Some(Runner::with_os_spawner())
        } else {
            audit::platform_unsupported();
            None
        };
        audit::service_started(runner.is_some());
        Self { provider, runner }
    }

    pub fn with_runner(provider: Arc<dyn SettingsProvider>, runner: Option<Runner>) -> Self {
        Self { provider, runner }
    }

    pub fn is_enabled(&self) -> bool {
        self.runner.is_some()
    }

    pub fn check(&self, request: RequestId, credentials: &Credentials, file: &str) -> CheckResponse {
        match self.authorize(request, Operation::Check, credentials, file) {
            Ok(_) => CheckResponse {
                allowed: true,
                reason: None,
            },
            Err(err) => CheckResponse::denied(err.to_string()),
        }
    }

    pub fn run(&self, request: RequestId, credentials: &Credentials, file: &str) -> RunResponse {
        match self.execute(request, credentials, file) {
            Ok(response) => response,
            Err(err) => RunResponse::failed(err.to_string()),
        }
    }

    fn authorize(
        &self,
        request: RequestId,
        op: Operation,
        credentials: &Credentials,
        file: &str,
    ) -> Result<(PolicyDecision, PolicySettings), ExecGateError> {
        if self.runner.is_none() {
            return Err(ExecGateError::Unsupported);
        }
        let snapshot = self.provider.snapshot().map_err(|err| {
            let message = format!("{err:#}");
            audit::settings_unavailable(request, op, &message);
            ExecGateError::InvalidConfig(message)
        })?;
        let identity = snapshot.oracle.current_identity(credentials);
        let decision = PolicyEngine::new(snapshot.oracle.as_ref()).evaluate(
            &ExecutionRequest::new(file),
            &snapshot.policy,
            &identity,
        );
        if !decision.allowed {
            audit::denied(
                request,
                op,
                decision.normalized_virtual_path.as_deref(),
                decision.reason.as_deref().unwrap_or_default(),
                identity.username.as_deref(),
            );
        }
        Ok((decision.into_result()?, snapshot.policy))
    }

    fn execute(
        &self,
        request: RequestId,
        credentials: &Credentials,
        file: &str,
    ) -> Result<RunResponse, ExecGateError> {
        let Some(runner) = &self.runner else {
            return Err(ExecGateError::Unsupported);
        };
        let (decision, settings) = self.authorize(request, Operation::Run, credentials, file)?;
        let PolicyDecision {
            virtual_path,
            normalized_virtual_path,
            username,
            ..
        } = decision;
        let virtual_path = virtual_path.unwrap_or_default();
        let username = username.as_deref();

        let rejected = |err: ExecGateError| {
            let path = normalized_virtual_path.as_deref().unwrap_or(&virtual_path);
            audit::path_rejected(request, path, &err.to_string(), username);
            err
        };
        let target = runner.resolve(&virtual_path, &settings).map_err(rejected)?;
        runner.build_plan(&target, &settings).map_err(rejected)?;

        let outcome = runner.launch(&target, &settings);
        match outcome.process_id {
            Some(pid) if outcome.success => {
                audit::launched(request, &target.physical_path, pid, settings.run_detached, username);
                Ok(RunResponse::Started {
                    success: true,
                    pid,
                    file: file_name(&virtual_path).to_string(),
                    vfs_path: virtual_path.clone(),
                })
            }
            _ => {
                let message = outcome
                    .error
                    .unwrap_or_else(|| "process did not start".to_string());
                audit::launch_failed(request, &target.physical_path, &message, username);
                Err(ExecGateError::LaunchFailure(message))
            }
        }
    }
}
