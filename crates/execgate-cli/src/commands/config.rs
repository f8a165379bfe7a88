use std::path::{Path, PathBuf};

use anyhow::{Context, Result};

use execgate_core::config::{resolve_config_path, Config, ConfigPaths};

pub fn print_effective(config_path: Option<PathBuf>) -> Result<()> {
    let config_path = resolve_config_path(config_path)?;
    println!("{}", render_effective(&config_path)?);
    Ok(())
}

fn render_effective(config_path: &Path) -> Result<String> {
    let config = Config::load(config_path)
        .with_context(|| format!("load config {}", config_path.display()))?;
    Ok(format!("# {}\n{}", config_path.display(), config.to_toml_string()?))
}

pub fn init(path: Option<PathBuf>, force: bool) -> Result<()> {
    let config_path = match path {
        Some(path) => path,
        None => ConfigPaths::resolve()?.config_path,
    };
    if config_path.exists() && !force {
        return Err(anyhow::anyhow!(
            "Config already exists at {} (use --force to overwrite)",
            config_path.display()
        ));
    }
    Config::default_config().save(&config_path)?;
    println!("Config written to {}", config_path.display());
    println!("Set [policy] physical_path and an admin token before starting the daemon.");
    Ok(())
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn effective_config_names_its_source() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("config.toml");
        Config::default_config().save(&path).unwrap();

        let output = render_effective(&path).unwrap();
        assert!(output.starts_with(&format!("# {}", path.display())));
        assert!(output.contains("[policy]"));
        assert!(output.contains("username = \"admin\""));
    }

    #[test]
    fn missing_config_names_the_path() {
        let dir = tempfile::tempdir().unwrap();
        let path = dir.path().join("absent.toml");
        let err = render_effective(&path).unwrap_err();
        assert!(err.to_string().contains("absent.toml"));
    }
}
