use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use execgate_core::{ExecGateError, PathViolation, ResolvedTarget};

pub const COMMAND_INTERPRETER: &str = "cmd.exe";

/// Extensions that need the command interpreter rather than a direct start.
pub const SCRIPT_EXTENSIONS: &[&str] = &["bat", "cmd"];

/// Images the OS loader starts directly. Anything else would need a shell
/// file association and is refused.
pub const DIRECT_EXTENSIONS: &[&str] = &["exe", "com"];

/// Removed from a path before it is quoted for the interpreter. This narrows
/// what a crafted file name can do; it does not make shell parsing safe.
pub const SHELL_METACHARACTERS: &[char] = &['&', '|', '>', '<', '^', '%', '"'];

/// A fully decided process invocation.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LaunchPlan {
    pub program: PathBuf,
    /// Passed verbatim when `via_interpreter` is set, otherwise as an
    /// argument vector.
    pub args: Vec<String>,
    pub via_interpreter: bool,
    pub detached: bool,
}

impl LaunchPlan {
    /// A script whose path holds a metacharacter is refused: stripping it
    /// would hand the interpreter a different path than the one resolved.
    pub fn for_target(target: &ResolvedTarget, detached: bool) -> Result<Self, ExecGateError> {
        if is_script(&target.extension) {
            if target
                .physical_path
                .to_string_lossy()
                .contains(SHELL_METACHARACTERS)
            {
                return Err(PathViolation::ShellMetacharacters.into());
            }
            return Ok(Self {
                program: PathBuf::from(COMMAND_INTERPRETER),
                args: vec!["/c".to_string(), quote_for_shell(&target.physical_path)],
                via_interpreter: true,
                detached,
            });
        }
        if !is_direct(&target.extension) {
            return Err(ExecGateError::UnsupportedFileType(target.extension.clone()));
        }
        Ok(Self {
            program: target.physical_path.clone(),
            args: Vec::new(),
            via_interpreter: false,
            detached,
        })
    }

    pub fn display(&self) -> String {
        let mut line = self.program.display().to_string();
        for arg in &self.args {
            line.push(' ');
            line.push_str(arg);
        }
        line
    }
}

pub fn is_script(extension: &str) -> bool {
    SCRIPT_EXTENSIONS
        .iter()
        .any(|script| script.eq_ignore_ascii_case(extension))
}

pub fn is_direct(extension: &str) -> bool {
    DIRECT_EXTENSIONS
        .iter()
        .any(|direct| direct.eq_ignore_ascii_case(extension))
}

pub fn quote_for_shell(path: &Path) -> String {
    let cleaned: String = path
        .to_string_lossy()
        .chars()
        .filter(|c| !SHELL_METACHARACTERS.contains(c))
        .collect();
    format!("\"{cleaned}\"")
}
