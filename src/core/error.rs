use std::path::PathBuf;
use thiserror::Error;

/// Central error type for the launcher.
/// Every fallible step of the prepare/launch flow returns `Result<T, LauncherError>`.
#[derive(Debug, Error)]
pub enum LauncherError {
    // ── Startup ─────────────────────────────────────────
    #[error("Launcher module could not be initialised: {0}")]
    ModuleInit(String),

    #[error("Cannot determine the launcher executable path: {0}")]
    ExecutablePath(#[source] std::io::Error),

    #[error("Configuration error in {path:?}: {reason}")]
    Config { path: PathBuf, reason: String },

    #[error("Another instance is already running ({0})")]
    InstanceAlreadyRunning(String),

    // ── IO ──────────────────────────────────────────────
    #[error("IO error at {path:?}: {source}")]
    Io {
        path: PathBuf,
        source: std::io::Error,
    },

    // ── JSON ────────────────────────────────────────────
    #[error("JSON error: {0}")]
    Json(#[from] serde_json::Error),

    // ── Java ────────────────────────────────────────────
    #[error(transparent)]
    Resolve(#[from] ResolveError),

    // ── Launch plan ─────────────────────────────────────
    #[error("Unterminated variable reference in {0:?}")]
    UnterminatedVariable(String),

    #[error("Path variable would exceed {limit} characters")]
    PathVarOverflow { limit: usize },

    #[error(transparent)]
    Launch(#[from] LaunchError),
}

/// Convenience alias used throughout the crate.
pub type LauncherResult<T> = Result<T, LauncherError>;

/// Failure to interrogate a candidate runtime with `-version`.
///
/// Probe errors never leave the locators: they only disqualify a candidate.
#[derive(Debug, Error)]
pub enum ProbeError {
    #[error("no quoted version string in runtime output")]
    NoVersionString,

    #[error("version string longer than {capacity} bytes")]
    VersionTooLong { capacity: usize },

    #[error("cannot run {command:?}: {source}")]
    ProcessSpawnFailed {
        command: PathBuf,
        source: std::io::Error,
    },
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Error)]
pub enum ResolveError {
    /// No usable constraint: neither a path specification that matched nor a
    /// minimum version to drive the registry search.
    #[error("no Java runtime search was configured")]
    NotFound,

    #[error("no Java runtime satisfies the configured constraints")]
    NoMatch { corrupted_jre_found: bool },
}

#[derive(Debug, Error)]
pub enum LaunchError {
    #[error("cannot start {command} (OS error {os_code:?})")]
    ProcessSpawnFailed {
        command: String,
        os_code: Option<i32>,
    },

    #[error("cannot wait for {command}: {source}")]
    Wait {
        command: String,
        source: std::io::Error,
    },
}
