use std::path::PathBuf;

use anyhow::{Context, Result};

use execgate_core::config::{resolve_config_path, Config};
use execgate_core::{AccountDirectory, AuthorizationContext, ExecutionRequest};
use policy_engine::PolicyEngine;
use runner::command::LaunchPlan;
use runner::Runner;

pub struct CheckInputs {
    pub config_path: Option<PathBuf>,
    pub user: Option<String>,
    pub file: String,
}

/// Evaluates and resolves a virtual path the way the daemon would, then
/// prints the command line instead of starting it.
pub fn execute(inputs: CheckInputs) -> Result<()> {
    let config_path = resolve_config_path(inputs.config_path)?;
    let config = Config::load(&config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;

    let plan = plan_for(&config, inputs.user.as_deref(), &inputs.file)?;
    println!("allowed: {}", inputs.file);
    println!("command: {}", plan.display());
    println!("detached: {}", plan.detached);
    Ok(())
}

pub fn plan_for(config: &Config, user: Option<&str>, file: &str) -> Result<LaunchPlan> {
    let directory = AccountDirectory::new(config.accounts.clone());
    let identity = match user {
        Some(name) => directory.lookup(name),
        None => AuthorizationContext::anonymous(),
    };
    if user.is_some() && !identity.is_authenticated {
        tracing::warn!(user = user.unwrap_or("-"), "unknown account, evaluating as anonymous");
    }

    let decision = PolicyEngine::new(&directory)
        .evaluate(&ExecutionRequest::new(file), &config.policy, &identity)
        .into_result()?;
    let virtual_path = decision.virtual_path.unwrap_or_default();
    let plan = Runner::with_os_spawner().dry_run(&virtual_path, &config.policy)?;
    Ok(plan)
}
