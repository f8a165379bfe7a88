use thiserror::Error;

#[derive(Debug, Clone, PartialEq, Eq, Error)]
pub enum ExecGateError {
    #[error("{0}")]
    PolicyDenied(String),
    #[error(transparent)]
    PathViolation(#[from] PathViolation),
    #[error("file not found")]
    NotFound,
    #[error("execution error: {0}")]
    LaunchFailure(String),
    #[error("invalid configuration: {0}")]
    InvalidConfig(String),
    #[error("execution is not supported on this platform")]
    Unsupported,
    #[error("unsupported file type: {0}")]
    UnsupportedFileType(String),
}

/// Reasons a path is refused before anything is launched.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum PathViolation {
    #[error("physical path is not configured")]
    NotConfigured,
    #[error("execution denied: file is outside allowed directory")]
    OutsideRoot,
    #[error("path traversal attempt detected")]
    Traversal,
    #[error("execution of files via network paths is forbidden")]
    NetworkPath,
    #[error("symbolic links are forbidden")]
    SymbolicLink,
    #[error("script path contains shell metacharacters")]
    ShellMetacharacters,
}
