use execgate_core::{ExecGateError, LaunchOutcome, PolicySettings, ResolvedTarget};

pub mod command;
pub mod resolve;
pub mod spawn;

use command::LaunchPlan;
use spawn::{OsSpawner, ProcessSpawner};

/// Turns an approved virtual path into a started process.
pub struct Runner {
    spawner: Box<dyn ProcessSpawner>,
}

impl Runner {
    pub fn new(spawner: Box<dyn ProcessSpawner>) -> Self {
        Self { spawner }
    }

    pub fn with_os_spawner() -> Self {
        Self::new(Box::new(OsSpawner::new()))
    }

    pub fn resolve(
        &self,
        virtual_path: &str,
        settings: &PolicySettings,
    ) -> Result<ResolvedTarget, ExecGateError> {
        resolve::resolve(virtual_path, settings)
    }

    pub fn build_plan(
        &self,
        target: &ResolvedTarget,
        settings: &PolicySettings,
    ) -> Result<LaunchPlan, ExecGateError> {
        LaunchPlan::for_target(target, settings.run_detached)
    }

    /// Resolves and plans without starting anything.
    pub fn dry_run(
        &self,
        virtual_path: &str,
        settings: &PolicySettings,
    ) -> Result<LaunchPlan, ExecGateError> {
        let target = self.resolve(virtual_path, settings)?;
        self.build_plan(&target, settings)
    }

    /// Starts the target. Spawn errors come back in the outcome; nothing is
    /// raised after this returns.
    pub fn launch(&self, target: &ResolvedTarget, settings: &PolicySettings) -> LaunchOutcome {
        let plan = match self.build_plan(target, settings) {
            Ok(plan) => plan,
            Err(err) => return LaunchOutcome::failed(err.to_string()),
        };
        if plan.via_interpreter {
            tracing::info!(command = %plan.display(), "running via command interpreter");
        }
        match self.spawner.spawn(&plan) {
            Ok(pid) => LaunchOutcome::started(pid),
            Err(err) => LaunchOutcome::failed(err.to_string()),
        }
    }
}
