mod commands;
mod core;

use std::fs::OpenOptions;
use std::path::Path;
use std::sync::Mutex;

use tracing_subscriber::EnvFilter;

use crate::core::java::{os_is_64bit, LaunchContext};

/// Debug log written next to the executable when debugging is requested.
pub const LOG_FILE_NAME: &str = "launcher.log";
/// Environment variable that can switch debug logging on.
pub const DEBUG_ENV_VAR: &str = "JRELAUNCHER";

const DEBUG_FLAG: &str = "--launcher-debug";
const DEBUG_ALL_FLAG: &str = "--launcher-debug-all";

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
enum DebugLevel {
    Off,
    Debug,
    All,
}

impl DebugLevel {
    /// From the command line first, then from `JRELAUNCHER`.
    fn detect(args: &[String], env_value: Option<&str>) -> Self {
        if args.iter().any(|arg| arg == DEBUG_ALL_FLAG) {
            return DebugLevel::All;
        }
        if args.iter().any(|arg| arg == DEBUG_FLAG) {
            return DebugLevel::Debug;
        }
        match env_value.map(str::to_ascii_lowercase) {
            Some(value) if value.contains("debug-all") => DebugLevel::All,
            Some(value) if value.contains("debug") => DebugLevel::Debug,
            _ => DebugLevel::Off,
        }
    }

    fn filter(self) -> &'static str {
        match self {
            DebugLevel::Off => "warn",
            DebugLevel::Debug => "debug",
            DebugLevel::All => "trace",
        }
    }
}

fn init_logging(level: DebugLevel, exe_dir: Option<&Path>) {
    let log_file = match (level, exe_dir) {
        (DebugLevel::Off, _) | (_, None) => None,
        (_, Some(dir)) => OpenOptions::new()
            .create(true)
            .append(true)
            .open(dir.join(LOG_FILE_NAME))
            .ok(),
    };

    let result = match log_file {
        Some(file) => tracing_subscriber::fmt()
            .with_env_filter(EnvFilter::new(level.filter()))
            .with_ansi(false)
            .with_writer(Mutex::new(file))
            .try_init(),
        None => tracing_subscriber::fmt()
            .with_env_filter(
                EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new(level.filter())),
            )
            .with_writer(std::io::stderr)
            .try_init(),
    };
    if let Err(err) = result {
        eprintln!("Logging already initialised: {}", err);
    }
}

/// Launcher entry point. Returns the exit code for the process.
pub fn run() -> i32 {
    let args: Vec<String> = std::env::args_os()
        .skip(1)
        .map(|arg| arg.to_string_lossy().into_owned())
        .collect();
    let exe_path = LaunchContext::current_exe();

    let env_value = std::env::var(DEBUG_ENV_VAR).ok();
    let level = DebugLevel::detect(&args, env_value.as_deref());
    init_logging(
        level,
        exe_path.as_ref().ok().and_then(|path| path.parent()),
    );

    tracing::info!("jrelauncher {} starting", env!("CARGO_PKG_VERSION"));
    tracing::debug!("CmdLine: {}", args.join(" "));
    tracing::debug!("64-bit OS: {}", if os_is_64bit() { "Yes" } else { "No" });

    commands::execute(exe_path, args)
}

#[cfg(test)]
mod tests {
    use super::*;

    fn args(values: &[&str]) -> Vec<String> {
        values.iter().map(|value| value.to_string()).collect()
    }

    #[test]
    fn debug_flags_on_command_line() {
        assert_eq!(DebugLevel::detect(&args(&["--launcher-debug"]), None), DebugLevel::Debug);
        assert_eq!(
            DebugLevel::detect(&args(&["x", "--launcher-debug-all"]), None),
            DebugLevel::All
        );
        assert_eq!(DebugLevel::detect(&args(&["x"]), None), DebugLevel::Off);
    }

    #[test]
    fn debug_from_environment() {
        assert_eq!(DebugLevel::detect(&[], Some("Debug")), DebugLevel::Debug);
        assert_eq!(DebugLevel::detect(&[], Some("debug-all")), DebugLevel::All);
        assert_eq!(DebugLevel::detect(&[], Some("quiet")), DebugLevel::Off);
    }
}
