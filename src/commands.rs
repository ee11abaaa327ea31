// ─── Launcher Driver ───
// prepare → resolve → build → launch, plus the translation of failures into
// what the user gets to see.

use std::path::{Path, PathBuf};

use tracing::{debug, error, info, warn};

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult, ResolveError};
use crate::core::instance::InstanceLock;
use crate::core::java::{
    JreCandidate, JreResolver, LaunchContext, ProcessProbe, RegistryAccess, ResolutionContext,
    SearchCriteria, SystemRegistry,
};
use crate::core::launch::{self, ExpansionContext, LaunchPlanBuilder};

pub const EXIT_FAILURE: i32 = 1;
/// Another instance holds the configured single-instance lock.
pub const EXIT_ALREADY_RUNNING: i32 = 2;

/// User-facing description of a failed launch.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Diagnostic {
    pub title: String,
    pub message: String,
    pub url: Option<String>,
}

/// Run the launcher for `exe_path` and return the process exit code.
pub fn execute(exe_path: LauncherResult<PathBuf>, args: Vec<String>) -> i32 {
    let fallback = LauncherConfig::default();

    let exe_path = match exe_path {
        Ok(path) => path,
        Err(err) => return fail(&err, &fallback),
    };
    let config = match load_config(&exe_path) {
        Ok(config) => config,
        Err(err) => return fail(&err, &fallback),
    };

    match run_with_config(&config, exe_path, args) {
        Ok(code) => code,
        Err(LauncherError::InstanceAlreadyRunning(name)) => {
            info!("{} ({})", config.messages.instance_already_exists, name);
            EXIT_ALREADY_RUNNING
        }
        Err(err) => fail(&err, &config),
    }
}

fn fail(err: &LauncherError, config: &LauncherConfig) -> i32 {
    error!("{}", err);
    report(&describe_error(err, config));
    EXIT_FAILURE
}

/// Read `<exe stem>.launch.json`. The launcher cannot start without it.
pub fn load_config(exe_path: &Path) -> LauncherResult<LauncherConfig> {
    let path = LauncherConfig::path_for(exe_path);
    debug!("Config: {:?}", path);
    LauncherConfig::load(&path).map_err(|err| LauncherError::ModuleInit(err.to_string()))
}

/// Everything after the configuration is known: lock, working directory,
/// runtime resolution, plan, process.
pub fn run_with_config(
    config: &LauncherConfig,
    exe_path: PathBuf,
    args: Vec<String>,
) -> LauncherResult<i32> {
    let os_is_64bit = crate::core::java::os_is_64bit();
    debug!("JNI: {}", if config.jni { "Yes" } else { "No" });
    debug!("64-bit OS: {}", if os_is_64bit { "Yes" } else { "No" });

    let lock = match config.mutex_name.as_deref().map(str::trim) {
        Some(name) if !name.is_empty() => Some(InstanceLock::acquire(name)?),
        _ => None,
    };

    let launch_ctx = LaunchContext::capture(exe_path, config.chdir.as_deref())?;
    let registry = SystemRegistry::default();

    let candidate = resolve_runtime(config, &launch_ctx, &registry, os_is_64bit)?;
    let plan = LaunchPlanBuilder::new(config, &launch_ctx, &registry, os_is_64bit)
        .forward_args(args)
        .build(candidate)?;

    if config.waits_for_exit() {
        let code = launch::launch(plan, true)?.unwrap_or_default();
        drop(lock);
        return Ok(code);
    }

    let process = launch::spawn(plan)?;
    if let Some(lock) = lock {
        let pid = process.id();
        if let Err(err) = lock.hand_over(pid) {
            warn!("Instance lock not handed over to {}: {}", pid, err);
        }
    }
    process.detach();
    Ok(0)
}

/// Path search first, registry second.
pub fn resolve_runtime(
    config: &LauncherConfig,
    launch_ctx: &LaunchContext,
    registry: &dyn RegistryAccess,
    os_is_64bit: bool,
) -> Result<JreCandidate, ResolveError> {
    let criteria = SearchCriteria::from_config(config);
    let binary = config.header_type.launcher_binary();
    let expansion = ExpansionContext::new(launch_ctx, registry, os_is_64bit);
    let probe = ProcessProbe::new(binary);

    let mut ctx = ResolutionContext::new(criteria, binary, os_is_64bit);
    JreResolver::new(&config.jre_path, &expansion, &probe, registry).resolve(&mut ctx)
}

pub fn describe_error(err: &LauncherError, config: &LauncherConfig) -> Diagnostic {
    let messages = &config.messages;

    match err {
        LauncherError::Resolve(ResolveError::NoMatch {
            corrupted_jre_found,
        }) => {
            let mut message = format!("{} {}", messages.jre_version_error, config.min_version.trim());
            if !config.max_version.trim().is_empty() {
                message.push_str(" - ");
                message.push_str(config.max_version.trim());
            }
            if config.requires_64bit {
                message.push_str(" (64-bit)");
            }
            if *corrupted_jre_found && !messages.launcher_error.is_empty() {
                message.push('\n');
                message.push_str(&messages.launcher_error);
            }
            Diagnostic {
                title: messages.error_title.clone(),
                message,
                url: non_empty(&messages.download_url),
            }
        }
        LauncherError::Resolve(ResolveError::NotFound) => Diagnostic {
            title: messages.error_title.clone(),
            message: messages.jre_not_found_error.clone(),
            url: non_empty(&messages.support_url),
        },
        other => Diagnostic {
            title: messages.error_title.clone(),
            message: format!("{}\n{}", messages.startup_error, other),
            url: non_empty(&messages.support_url),
        },
    }
}

fn non_empty(url: &str) -> Option<String> {
    (!url.trim().is_empty()).then(|| url.to_string())
}

fn report(diagnostic: &Diagnostic) {
    eprintln!("{}: {}", diagnostic.title, diagnostic.message);
    if let Some(url) = &diagnostic.url {
        eprintln!("{}", url);
    }
}
