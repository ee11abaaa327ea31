// ─── Launch Plan ───
// Turns the resolved runtime and the configuration into the immutable
// description of the process to start.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument};

use crate::core::config::{LauncherConfig, PriorityClass};
use crate::core::error::{LauncherError, LauncherResult};
use crate::core::java::paths::{JreLayout, LaunchContext};
use crate::core::java::registry::RegistryAccess;
use crate::core::java::runtime::JreCandidate;

use super::classpath::build_main_arguments;
use super::expand::ExpansionContext;
use super::options::{forwarded_arguments, heap_flags, load_jvm_options};

/// Size limit of a Windows environment variable, in characters.
pub const MAX_VAR_SIZE: usize = 32767;
/// Longest command line `CreateProcess` accepts, including the terminator.
pub const MAX_COMMAND_LINE: usize = 32768;
const PATH_VAR: &str = "Path";

/// Everything needed to start the runtime. Built once, consumed once.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct LaunchPlan {
    executable_path: PathBuf,
    arguments: String,
    environment_overrides: Vec<(String, String)>,
    working_directory: Option<PathBuf>,
    priority_class: PriorityClass,
}

impl LaunchPlan {
    pub(crate) fn new(
        executable_path: PathBuf,
        arguments: String,
        environment_overrides: Vec<(String, String)>,
        working_directory: Option<PathBuf>,
        priority_class: PriorityClass,
    ) -> Self {
        Self {
            executable_path,
            arguments,
            environment_overrides,
            working_directory,
            priority_class,
        }
    }

    pub fn executable_path(&self) -> &Path {
        &self.executable_path
    }

    pub fn arguments(&self) -> &str {
        &self.arguments
    }

    pub fn environment_overrides(&self) -> &[(String, String)] {
        &self.environment_overrides
    }

    pub fn working_directory(&self) -> Option<&Path> {
        self.working_directory.as_deref()
    }

    pub fn priority_class(&self) -> PriorityClass {
        self.priority_class
    }
}

pub struct LaunchPlanBuilder<'a> {
    config: &'a LauncherConfig,
    launch: &'a LaunchContext,
    registry: &'a dyn RegistryAccess,
    os_is_64bit: bool,
    available_memory: Option<u64>,
    forwarded: Vec<String>,
    base_path: Option<String>,
}

impl<'a> LaunchPlanBuilder<'a> {
    pub fn new(
        config: &'a LauncherConfig,
        launch: &'a LaunchContext,
        registry: &'a dyn RegistryAccess,
        os_is_64bit: bool,
    ) -> Self {
        Self {
            config,
            launch,
            registry,
            os_is_64bit,
            available_memory: None,
            forwarded: Vec::new(),
            base_path: None,
        }
    }

    /// Arguments the launcher itself received, reserved flags included.
    pub fn forward_args(mut self, args: Vec<String>) -> Self {
        self.forwarded = args;
        self
    }

    /// Use a fixed amount of available memory instead of asking the OS.
    #[cfg(test)]
    pub fn available_memory(mut self, bytes: u64) -> Self {
        self.available_memory = Some(bytes);
        self
    }

    /// Use a fixed `Path` value instead of the process environment.
    #[cfg(test)]
    pub fn base_path(mut self, path: impl Into<String>) -> Self {
        self.base_path = Some(path.into());
        self
    }

    #[instrument(skip_all, fields(runtime = %candidate))]
    pub fn build(self, candidate: JreCandidate) -> LauncherResult<LaunchPlan> {
        let config = self.config;
        let mut expansion = ExpansionContext::new(self.launch, self.registry, self.os_is_64bit)
            .with_jre_home(&candidate.home);

        let base_path = self.base_path.clone().unwrap_or_else(current_path_var);
        let jre_bin = candidate.home.join("bin");
        let path = append_to_path_var(&base_path, &jre_bin.to_string_lossy())?;
        expansion.set_override(PATH_VAR, path);

        for (name, value) in config.env_assignments() {
            let expanded = expansion.expand(value)?;
            debug!("Set var: {} = {}", name, expanded);
            expansion.set_override(name, expanded);
        }

        let available = self.available_memory.unwrap_or_else(available_memory_bytes);
        let mut sections = heap_flags(config, available, candidate.is_64bit);

        let jvm_options = load_jvm_options(config, self.launch.exe_path())?;
        sections.push(expansion.expand(&jvm_options)?);
        sections.push(build_main_arguments(
            config,
            self.launch.exe_path(),
            &expansion,
        )?);
        sections.push(config.cmd_line.trim().to_string());
        sections.push(forwarded_arguments(&self.forwarded));

        let arguments = sections
            .into_iter()
            .filter(|section| !section.is_empty())
            .collect::<Vec<_>>()
            .join(" ");

        let layout = JreLayout {
            binary: config.header_type.launcher_binary(),
            requires_jdk: false,
        };
        let executable_path = layout.launcher_path(&candidate.home);

        debug!("Launcher: {:?}", executable_path);
        debug!("Launcher args: {}", arguments);
        debug!("Args length: {}/{} chars", arguments.len(), MAX_COMMAND_LINE);

        Ok(LaunchPlan::new(
            executable_path,
            arguments,
            expansion.env_overrides().to_vec(),
            self.launch.working_dir().map(Path::to_path_buf),
            config.priority_class,
        ))
    }
}

/// `current;addition`, refusing to grow past the environment size limit.
pub fn append_to_path_var(current: &str, addition: &str) -> LauncherResult<String> {
    if current.len() + 1 + addition.len() > MAX_VAR_SIZE {
        debug!("Error: appendToPathVar failed.");
        return Err(LauncherError::PathVarOverflow {
            limit: MAX_VAR_SIZE,
        });
    }
    Ok(format!("{};{}", current, addition))
}

fn current_path_var() -> String {
    std::env::var(PATH_VAR)
        .or_else(|_| std::env::var("PATH"))
        .unwrap_or_default()
}

fn available_memory_bytes() -> u64 {
    let mut system = sysinfo::System::new();
    system.refresh_memory();
    system.available_memory()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::core::config::HeaderType;
    use crate::core::java::registry::NoRegistry;
    use crate::core::java::runtime::CandidateSource;
    use crate::core::java::version::JavaVersion;

    const GIB: u64 = 1024 * 1024 * 1024;

    fn candidate(home: &Path, is_64bit: bool) -> JreCandidate {
        JreCandidate {
            home: home.to_path_buf(),
            version: JavaVersion::normalize("17.0.1"),
            is_64bit,
            source: CandidateSource::Path,
        }
    }

    #[test]
    fn arguments_follow_fixed_order() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let exe = dir.join("app.exe");
        std::fs::write(dir.join("app.vmoptions"), "-Dfrom.file=%EXEDIR%").unwrap();
        let launch = LaunchContext::new(exe.clone(), dir.to_path_buf());
        let config = LauncherConfig {
            header_type: HeaderType::Console,
            max_heap_percent: 50,
            jvm_options: "-Dhome=%JREHOMEDIR%".to_string(),
            main_class: Some("com.acme.Main".to_string()),
            classpath: "lib/a.jar".to_string(),
            cmd_line: "--mode batch".to_string(),
            priority_class: PriorityClass::High,
            ..LauncherConfig::default()
        };
        let home = PathBuf::from("/runtimes/jdk17");

        let plan = LaunchPlanBuilder::new(&config, &launch, &NoRegistry, true)
            .available_memory(4 * GIB)
            .base_path("/usr/bin")
            .forward_args(vec!["--launcher-debug".to_string(), "file one".to_string()])
            .build(candidate(&home, false))
            .unwrap();

        assert_eq!(
            plan.arguments(),
            format!(
                "-Xmx1024m -Dhome={} -Dfrom.file={} -classpath \"lib/a.jar\" com.acme.Main --mode batch \"file one\"",
                home.display(),
                dir.display()
            )
        );
        assert_eq!(plan.executable_path(), home.join("bin").join("java.exe"));
        assert_eq!(plan.priority_class(), PriorityClass::High);
        assert_eq!(plan.working_directory(), None);
    }

    #[test]
    fn environment_gets_runtime_bin_and_expanded_values() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let launch = LaunchContext::new(dir.join("app.exe"), dir.to_path_buf());
        let config = LauncherConfig {
            jar: "app.jar".to_string(),
            env_variables: "APP_HOME=%EXEDIR%\tAPP_PATH=%Path%".to_string(),
            ..LauncherConfig::default()
        };
        let home = PathBuf::from("/runtimes/jre8");

        let plan = LaunchPlanBuilder::new(&config, &launch, &NoRegistry, true)
            .available_memory(GIB)
            .base_path("/usr/bin")
            .build(candidate(&home, true))
            .unwrap();

        let expected_path = format!("/usr/bin;{}", home.join("bin").display());
        let env = plan.environment_overrides();
        assert_eq!(env[0], ("Path".to_string(), expected_path.clone()));
        assert_eq!(env[1], ("APP_HOME".to_string(), dir.display().to_string()));
        assert_eq!(env[2], ("APP_PATH".to_string(), expected_path));
        assert_eq!(
            plan.executable_path(),
            home.join("bin").join("javaw.exe")
        );
    }

    #[test]
    fn oversized_path_is_rejected() {
        let current = "x".repeat(MAX_VAR_SIZE - 4);
        assert!(matches!(
            append_to_path_var(&current, r"C:\jre\bin"),
            Err(LauncherError::PathVarOverflow { .. })
        ));
        assert_eq!(append_to_path_var("a", "b").unwrap(), "a;b");
    }

    #[test]
    fn unterminated_option_fails_the_build() {
        let tmp = TempDir::new().unwrap();
        let dir = tmp.path();
        let launch = LaunchContext::new(dir.join("app.exe"), dir.to_path_buf());
        let config = LauncherConfig {
            jvm_options: "-Dbroken=%EXEDIR".to_string(),
            ..LauncherConfig::default()
        };

        let result = LaunchPlanBuilder::new(&config, &launch, &NoRegistry, true)
            .available_memory(GIB)
            .base_path("")
            .build(candidate(Path::new("/jre"), true));
        assert!(matches!(result, Err(LauncherError::UnterminatedVariable(_))));
    }
}
