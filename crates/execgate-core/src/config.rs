use std::fs;
use std::path::{Path, PathBuf};
use std::sync::Arc;

use anyhow::{Context, Result};
use directories::ProjectDirs;
use serde::{Deserialize, Serialize};

use crate::identity::{AccountDirectory, IdentityOracle};
use crate::paths::{normalize, split_list};

pub const DEFAULT_EXTENSIONS: &str = "exe|cmd|bat";
pub const DEFAULT_LISTEN: &str = "127.0.0.1:8480";

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct Config {
    #[serde(default)]
    pub server: ServerConfig,
    #[serde(default)]
    pub policy: PolicySettings,
    #[serde(default)]
    pub accounts: Vec<AccountConfig>,
}

#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct ServerConfig {
    pub listen: String,
}

/// Execution policy as edited by the operator.
///
/// List-valued settings are stored pipe-delimited, the same way they are
/// entered, and parsed on access.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
#[serde(default)]
pub struct PolicySettings {
    pub allow_all_users: bool,
    pub allowed_groups: String,
    pub allowed_extensions: String,
    pub allowed_vfs_paths: String,
    pub physical_path: PathBuf,
    pub run_detached: bool,
}

/// An account known to the server. Accounts double as groups: any account
/// name can appear in another account's `belongs` list.
#[derive(Debug, Clone, Serialize, Deserialize)]
pub struct AccountConfig {
    pub username: String,
    #[serde(default)]
    pub admin: bool,
    #[serde(default)]
    pub belongs: Vec<String>,
    /// Hex SHA-256 of the bearer token, see `execgate token`.
    #[serde(default)]
    pub token_sha256: Option<String>,
}

#[derive(Debug, Clone)]
pub struct ConfigPaths {
    pub config_path: PathBuf,
}

/// Policy and the identity oracle taken from the same read of the
/// configuration.
#[derive(Clone)]
pub struct Snapshot {
    pub policy: PolicySettings,
    pub oracle: Arc<dyn IdentityOracle>,
}

/// Source of the current policy and accounts. Implementations must not
/// cache: every call reflects the configuration as it is now.
pub trait SettingsProvider: Send + Sync {
    fn snapshot(&self) -> Result<Snapshot>;
}

/// Reads policy and accounts from a config file, once per snapshot.
#[derive(Debug, Clone)]
pub struct ConfigFile {
    path: PathBuf,
}

impl Default for ServerConfig {
    fn default() -> Self {
        Self {
            listen: DEFAULT_LISTEN.to_string(),
        }
    }
}

impl Default for PolicySettings {
    fn default() -> Self {
        Self {
            allow_all_users: false,
            allowed_groups: String::new(),
            allowed_extensions: DEFAULT_EXTENSIONS.to_string(),
            allowed_vfs_paths: String::new(),
            physical_path: PathBuf::new(),
            run_detached: true,
        }
    }
}

impl PolicySettings {
    /// Allowed extensions, lowercased. Falls back to the defaults when the
    /// setting holds no usable entry.
    pub fn extensions(&self) -> Vec<String> {
        let parsed: Vec<String> = split_list(&self.allowed_extensions)
            .into_iter()
            .map(|ext| ext.to_lowercase())
            .collect();
        if parsed.is_empty() {
            return split_list(DEFAULT_EXTENSIONS);
        }
        parsed
    }

    /// Allowed VFS roots in normalized form. Empty means unrestricted.
    pub fn vfs_roots(&self) -> Vec<String> {
        split_list(&self.allowed_vfs_paths)
            .iter()
            .map(|root| normalize(root))
            .collect()
    }

    /// Allowed groups or usernames, lowercased. Empty means no group rule.
    pub fn groups(&self) -> Vec<String> {
        split_list(&self.allowed_groups)
            .into_iter()
            .map(|group| group.to_lowercase())
            .collect()
    }
}

impl Config {
    pub fn default_config() -> Self {
        Self {
            server: ServerConfig::default(),
            policy: PolicySettings::default(),
            accounts: vec![AccountConfig {
                username: "admin".to_string(),
                admin: true,
                belongs: Vec::new(),
                token_sha256: None,
            }],
        }
    }

    pub fn from_toml_str(contents: &str) -> Result<Self> {
        let config: Config = toml::from_str(contents).context("parse config TOML")?;
        Ok(config)
    }

    pub fn to_toml_string(&self) -> Result<String> {
        let output = toml::to_string_pretty(self).context("render config TOML")?;
        Ok(output)
    }

    pub fn load(path: &Path) -> Result<Self> {
        let contents = fs::read_to_string(path)
            .with_context(|| format!("read config at {}", path.display()))?;
        Self::from_toml_str(&contents)
    }

    pub fn save(&self, path: &Path) -> Result<()> {
        if let Some(parent) = path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("create config dir {}", parent.display()))?;
        }
        let contents = self.to_toml_string()?;
        fs::write(path, contents).with_context(|| format!("write config at {}", path.display()))?;
        Ok(())
    }
}

impl ConfigPaths {
    pub fn resolve() -> Result<Self> {
        let project_dirs = ProjectDirs::from("io", "execgate", "execgate")
            .ok_or_else(|| anyhow::anyhow!("unable to determine project directories"))?;
        Ok(Self {
            config_path: project_dirs.config_dir().join("config.toml"),
        })
    }
}

/// Picks the config file: explicit flag, then `EXECGATE_CONFIG`, then the
/// platform default.
pub fn resolve_config_path(explicit: Option<PathBuf>) -> Result<PathBuf> {
    if let Some(path) = explicit {
        return Ok(path);
    }
    if let Ok(value) = std::env::var("EXECGATE_CONFIG") {
        return Ok(PathBuf::from(value));
    }
    Ok(ConfigPaths::resolve()?.config_path)
}

impl ConfigFile {
    pub fn new(path: PathBuf) -> Self {
        Self { path }
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    pub fn load(&self) -> Result<Config> {
        Config::load(&self.path)
    }
}

impl SettingsProvider for ConfigFile {
    fn snapshot(&self) -> Result<Snapshot> {
        let config = self.load()?;
        Ok(Snapshot {
            policy: config.policy,
            oracle: Arc::new(AccountDirectory::new(config.accounts)),
        })
    }
}
