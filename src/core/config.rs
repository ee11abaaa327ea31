use std::path::{Path, PathBuf};

use serde::{Deserialize, Serialize};

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::LauncherBinary;

/// Extension of the configuration document stored next to the executable.
pub const CONFIG_EXTENSION: &str = "launch.json";

/// Header flavour of the launcher executable.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "lowercase")]
pub enum HeaderType {
    #[default]
    Gui,
    Console,
}

impl HeaderType {
    pub fn launcher_binary(self) -> LauncherBinary {
        match self {
            HeaderType::Gui => LauncherBinary::Windowed,
            HeaderType::Console => LauncherBinary::Console,
        }
    }
}

/// Scheduling priority of the launched runtime.
#[derive(Debug, Clone, Copy, Default, Serialize, Deserialize, PartialEq, Eq)]
#[serde(rename_all = "snake_case")]
pub enum PriorityClass {
    #[default]
    Normal,
    Idle,
    High,
    AboveNormal,
    BelowNormal,
}

impl PriorityClass {
    /// Win32 process creation flag for this class.
    pub fn creation_flag(self) -> u32 {
        match self {
            PriorityClass::Normal => 0x0000_0020,
            PriorityClass::Idle => 0x0000_0040,
            PriorityClass::High => 0x0000_0080,
            PriorityClass::AboveNormal => 0x0000_8000,
            PriorityClass::BelowNormal => 0x0000_4000,
        }
    }
}

/// User-facing texts shown when the launch cannot proceed.
#[derive(Debug, Clone, Serialize, Deserialize)]
#[serde(default)]
pub struct Messages {
    pub error_title: String,
    pub startup_error: String,
    pub jre_version_error: String,
    pub jre_not_found_error: String,
    pub launcher_error: String,
    pub instance_already_exists: String,
    pub download_url: String,
    pub support_url: String,
}

impl Default for Messages {
    fn default() -> Self {
        Self {
            error_title: "jrelauncher".to_string(),
            startup_error: "An error occurred while starting the application.".to_string(),
            jre_version_error: "This application requires a Java Runtime Environment".to_string(),
            jre_not_found_error: "This application requires a Java Runtime Environment."
                .to_string(),
            launcher_error: "The registry refers to a nonexistent Java Runtime Environment \
installation or the runtime is corrupted."
                .to_string(),
            instance_already_exists: "An application instance is already running.".to_string(),
            download_url: String::new(),
            support_url: String::new(),
        }
    }
}

/// Full launcher configuration persisted next to the executable as
/// `<name>.launch.json`.
///
/// String fields may reference `%VARIABLES%`; they are expanded at the point
/// of use, not at load time.
#[derive(Debug, Clone, Default, Serialize, Deserialize)]
#[serde(default)]
pub struct LauncherConfig {
    pub header_type: HeaderType,
    /// Keep the launcher alive until the runtime exits (gui headers only;
    /// console headers always wait).
    pub stay_alive: bool,
    /// Embedding mode: a 64-bit runtime can never be selected.
    pub jni: bool,

    // ── Runtime search ──
    pub min_version: String,
    pub max_version: String,
    pub requires_jdk: bool,
    pub requires_64bit: bool,
    /// Semicolon separated list of runtime homes, searched before the registry.
    pub jre_path: String,

    // ── Heap ──
    pub initial_heap_mb: u64,
    pub initial_heap_percent: u64,
    pub max_heap_mb: u64,
    pub max_heap_percent: u64,

    // ── Application ──
    pub main_class: Option<String>,
    pub classpath: String,
    pub jar: String,
    /// The executable itself carries the application jar.
    pub wrapper: bool,
    pub jvm_options: String,
    pub cmd_line: String,
    /// Tab separated `NAME=value` assignments.
    pub env_variables: String,

    // ── Process ──
    pub priority_class: PriorityClass,
    pub chdir: Option<String>,
    pub mutex_name: Option<String>,

    pub messages: Messages,
}

impl LauncherConfig {
    /// Path of the configuration document belonging to `exe_path`.
    pub fn path_for(exe_path: &Path) -> PathBuf {
        exe_path.with_extension(CONFIG_EXTENSION)
    }

    pub fn load(path: &Path) -> LauncherResult<Self> {
        let bytes = std::fs::read(path).map_err(|source| LauncherError::Io {
            path: path.to_path_buf(),
            source,
        })?;
        Self::from_slice(&bytes).map_err(|err| LauncherError::Config {
            path: path.to_path_buf(),
            reason: err.to_string(),
        })
    }

    pub fn from_slice(bytes: &[u8]) -> Result<Self, serde_json::Error> {
        serde_json::from_slice(bytes)
    }

    /// Whether the launcher blocks until the runtime exits.
    pub fn waits_for_exit(&self) -> bool {
        self.header_type == HeaderType::Console || self.stay_alive
    }

    /// `NAME=value` pairs from the tab separated assignment list.
    pub fn env_assignments(&self) -> impl Iterator<Item = (&str, &str)> {
        self.env_variables
            .split('\t')
            .filter(|entry| !entry.trim().is_empty())
            .filter_map(|entry| entry.split_once('='))
    }
}
