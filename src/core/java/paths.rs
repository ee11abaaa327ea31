use std::path::{Path, PathBuf};

use tracing::{debug, warn};

use crate::core::error::{LauncherError, LauncherResult};

/// Runtime launcher binary used both for probing and for the final launch.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum LauncherBinary {
    /// `java.exe`, attached to a console.
    Console,
    /// `javaw.exe`, no console window.
    Windowed,
}

impl LauncherBinary {
    pub fn file_name(self) -> &'static str {
        match self {
            LauncherBinary::Console => "java.exe",
            LauncherBinary::Windowed => "javaw.exe",
        }
    }
}

pub const COMPILER_BINARY: &str = "javac.exe";

/// On-disk layout checks for a JRE/JDK home directory.
#[derive(Debug, Clone, Copy)]
pub struct JreLayout {
    pub binary: LauncherBinary,
    pub requires_jdk: bool,
}

impl JreLayout {
    pub fn launcher_path(&self, home: &Path) -> PathBuf {
        home.join("bin").join(self.binary.file_name())
    }

    pub fn compiler_path(home: &Path) -> PathBuf {
        home.join("bin").join(COMPILER_BINARY)
    }

    /// The home exposes the launcher binary and, for JDK searches, the compiler.
    pub fn is_valid(&self, home: &Path) -> bool {
        if home.as_os_str().is_empty() {
            return false;
        }

        let launcher = self.launcher_path(home);
        let mut valid = launcher.is_file();
        debug!(
            "Check launcher: {:?} {}",
            launcher,
            if valid { "(OK)" } else { "(not found)" }
        );

        if valid && self.requires_jdk {
            let javac = Self::compiler_path(home);
            valid = javac.is_file();
            debug!(
                "Check javac: {:?} {}",
                javac,
                if valid { "(OK)" } else { "(not found)" }
            );
        }

        valid
    }
}

/// Process-wide paths captured once per invocation and passed explicitly.
#[derive(Debug, Clone)]
pub struct LaunchContext {
    exe_path: PathBuf,
    exe_dir: PathBuf,
    previous_dir: PathBuf,
    working_dir: Option<PathBuf>,
}

impl LaunchContext {
    pub fn new(exe_path: PathBuf, previous_dir: PathBuf) -> Self {
        let exe_dir = exe_path
            .parent()
            .map(Path::to_path_buf)
            .unwrap_or_default();
        Self {
            exe_path,
            exe_dir,
            previous_dir,
            working_dir: None,
        }
    }

    /// Path of the running launcher executable.
    pub fn current_exe() -> LauncherResult<PathBuf> {
        std::env::current_exe().map_err(LauncherError::ExecutablePath)
    }

    /// Capture the current directory, then apply the optional
    /// working-directory override relative to the executable.
    pub fn capture(exe_path: PathBuf, chdir: Option<&str>) -> LauncherResult<Self> {
        let previous_dir = std::env::current_dir().map_err(|source| LauncherError::Io {
            path: PathBuf::from("."),
            source,
        })?;

        let mut context = Self::new(exe_path, previous_dir);
        if let Some(dir) = chdir.filter(|dir| !dir.trim().is_empty()) {
            let working_dir = context.exe_dir.join(dir);
            match std::env::set_current_dir(&working_dir) {
                Ok(()) => {
                    debug!("Working dir: {:?}", working_dir);
                    context.working_dir = Some(working_dir);
                }
                Err(err) => warn!("Working dir {:?} not applied: {}", working_dir, err),
            }
        }
        Ok(context)
    }

    pub fn exe_path(&self) -> &Path {
        &self.exe_path
    }

    pub fn exe_dir(&self) -> &Path {
        &self.exe_dir
    }

    pub fn previous_dir(&self) -> &Path {
        &self.previous_dir
    }

    pub fn working_dir(&self) -> Option<&Path> {
        self.working_dir.as_deref()
    }
}

/// True when the host OS is 64-bit, including a 32-bit build running under WOW64.
pub fn os_is_64bit() -> bool {
    cfg!(target_pointer_width = "64") || std::env::var_os("PROCESSOR_ARCHITEW6432").is_some()
}
