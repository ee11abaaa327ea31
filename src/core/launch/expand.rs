// ─── Variable Expansion ───
// `%NAME%` substitution shared by the runtime path, classpath, JVM options
// and environment assignments.

use std::path::{Path, PathBuf};

use tracing::debug;

use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::paths::LaunchContext;
use crate::core::java::registry::{query_registry_value, RegistryAccess};

const REGISTRY_TOKEN_PREFIX: &str = "HKEY";

/// Read-only inputs for `%NAME%` substitution.
pub struct ExpansionContext<'a> {
    exe_path: PathBuf,
    exe_dir: PathBuf,
    current_dir: PathBuf,
    previous_dir: PathBuf,
    jre_home: Option<PathBuf>,
    env_overrides: Vec<(String, String)>,
    registry: &'a dyn RegistryAccess,
    os_is_64bit: bool,
}

impl<'a> ExpansionContext<'a> {
    /// `%PWD%` is the directory the launcher runs in after any working
    /// directory override was applied.
    pub fn new(launch: &LaunchContext, registry: &'a dyn RegistryAccess, os_is_64bit: bool) -> Self {
        let current_dir = launch
            .working_dir()
            .unwrap_or_else(|| launch.previous_dir())
            .to_path_buf();
        Self {
            exe_path: launch.exe_path().to_path_buf(),
            exe_dir: launch.exe_dir().to_path_buf(),
            current_dir,
            previous_dir: launch.previous_dir().to_path_buf(),
            jre_home: None,
            env_overrides: Vec::new(),
            registry,
            os_is_64bit,
        }
    }

    pub fn with_jre_home(mut self, home: &Path) -> Self {
        self.jre_home = Some(home.to_path_buf());
        self
    }

    /// Environment value visible to later expansions before it reaches the
    /// child process.
    pub fn set_override(&mut self, name: &str, value: String) {
        match self
            .env_overrides
            .iter_mut()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            Some((_, current)) => *current = value,
            None => self.env_overrides.push((name.to_string(), value)),
        }
    }

    pub fn exe_dir(&self) -> &Path {
        &self.exe_dir
    }

    pub fn env_overrides(&self) -> &[(String, String)] {
        &self.env_overrides
    }

    /// Substitute every `%NAME%` token in `src`.
    ///
    /// Unknown names expand to nothing and `%%` yields a literal `%`. A `%`
    /// without a closing partner fails the whole expansion.
    pub fn expand(&self, src: &str) -> LauncherResult<String> {
        let mut out = String::with_capacity(src.len());
        let mut rest = src;

        while let Some(start) = rest.find('%') {
            let after = &rest[start + 1..];
            let Some(len) = after.find('%') else {
                return Err(LauncherError::UnterminatedVariable(src.to_string()));
            };
            out.push_str(&rest[..start]);

            let name = &after[..len];
            let value = self.lookup(name);
            debug!("Substitute: {} = {}", name, value.as_deref().unwrap_or(""));
            if let Some(value) = value {
                out.push_str(&value);
            }
            rest = &after[len + 1..];
        }
        out.push_str(rest);

        Ok(out)
    }

    fn lookup(&self, name: &str) -> Option<String> {
        match name {
            "EXEDIR" => Some(path_text(&self.exe_dir)),
            "EXEFILE" => Some(path_text(&self.exe_path)),
            "PWD" => Some(path_text(&self.current_dir)),
            "OLDPWD" => Some(path_text(&self.previous_dir)),
            "JREHOMEDIR" => Some(self.jre_home.as_deref().map(path_text).unwrap_or_default()),
            "" => Some("%".to_string()),
            _ if name.starts_with(REGISTRY_TOKEN_PREFIX) => {
                query_registry_value(name, self.registry, self.os_is_64bit)
            }
            _ => self.environment_value(name),
        }
    }

    fn environment_value(&self, name: &str) -> Option<String> {
        if let Some((_, value)) = self
            .env_overrides
            .iter()
            .find(|(existing, _)| existing.eq_ignore_ascii_case(name))
        {
            return Some(value.clone());
        }
        std::env::var(name).ok().filter(|value| !value.is_empty())
    }
}

fn path_text(path: &Path) -> String {
    path.to_string_lossy().into_owned()
}
