use std::path::PathBuf;

#[derive(Debug, thiserror::Error)]
pub enum LauncherError {
    #[error("{op} failed on {key}: Win32 error {code}")]
    Registry {
        op: &'static str,
        key: String,
        code: u32,
    },

    #[cfg(windows)]
    #[error("COM call failed: {0}")]
    Com(#[from] windows::core::Error),

    #[error("PowerShell Core is not installed (no App Paths entry for pwsh.exe)")]
    PwshNotFound,

    #[error("resource file is missing: {}", .0.display())]
    MissingResource(PathBuf),

    #[error("failed to start {program}: {source}")]
    Spawn {
        program: String,
        #[source]
        source: std::io::Error,
    },

    #[error("child process {0} is not piped")]
    StreamUnavailable(&'static str),

    #[error(transparent)]
    Io(#[from] std::io::Error),
}

pub type Result<T> = std::result::Result<T, LauncherError>;
