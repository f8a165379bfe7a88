pub mod config;
pub mod error;
pub mod identity;
pub mod ids;
pub mod paths;
pub mod types;

pub use config::{
    AccountConfig, Config, ConfigFile, ConfigPaths, PolicySettings, ServerConfig,
    SettingsProvider, Snapshot,
};
pub use error::{ExecGateError, PathViolation};
pub use identity::{AccountDirectory, Credentials, IdentityOracle};
pub use ids::RequestId;
pub use types::{AuthorizationContext, ExecutionRequest, LaunchOutcome, ResolvedTarget};
