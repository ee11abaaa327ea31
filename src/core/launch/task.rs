// ─── Launch Task ───
// Starts the runtime described by a `LaunchPlan`, then either waits for it or
// leaves it running detached.

use std::process::{Child, Command};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::{debug, info};

use crate::core::config::PriorityClass;
use crate::core::error::LaunchError;

use super::plan::LaunchPlan;

/// A started runtime process.
pub struct RunningProcess {
    child: Child,
    command: String,
}

impl RunningProcess {
    pub fn id(&self) -> u32 {
        self.child.id()
    }

    /// Block until the runtime exits and return its exit code.
    pub fn wait(mut self) -> Result<i32, LaunchError> {
        let status = self.child.wait().map_err(|source| LaunchError::Wait {
            command: self.command.clone(),
            source,
        })?;
        let code = status.code().unwrap_or(-1);
        debug!("Exit code: {}", code);
        Ok(code)
    }

    /// Let the runtime keep running after the launcher exits.
    pub fn detach(self) {
        debug!("Detached process {}", self.child.id());
    }
}

/// `"<executable>" <arguments>`, the command line handed to the OS.
pub fn command_line(plan: &LaunchPlan) -> String {
    let executable = format!("\"{}\"", plan.executable_path().display());
    if plan.arguments().is_empty() {
        executable
    } else {
        format!("{} {}", executable, plan.arguments())
    }
}

/// Create the runtime process without waiting for it.
pub fn spawn(plan: LaunchPlan) -> Result<RunningProcess, LaunchError> {
    let command = command_line(&plan);

    let mut cmd = Command::new(plan.executable_path());
    apply_arguments(&mut cmd, plan.arguments());
    for (name, value) in plan.environment_overrides() {
        cmd.env(name, value);
    }
    if let Some(dir) = plan.working_directory() {
        cmd.current_dir(dir);
    }
    configure_platform_spawn(&mut cmd, plan.priority_class());

    info!("Launching: {}", command);
    let child = cmd.spawn().map_err(|err| {
        debug!("Error: CreateProcess failed: {}", err);
        LaunchError::ProcessSpawnFailed {
            command: command.clone(),
            os_code: err.raw_os_error(),
        }
    })?;

    Ok(RunningProcess { child, command })
}

/// Start the runtime. With `wait` the call blocks and yields the exit code;
/// otherwise it returns as soon as the process exists.
pub fn launch(plan: LaunchPlan, wait: bool) -> Result<Option<i32>, LaunchError> {
    let process = spawn(plan)?;
    if wait {
        process.wait().map(Some)
    } else {
        process.detach();
        Ok(None)
    }
}

#[cfg(target_os = "windows")]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    if !arguments.is_empty() {
        cmd.raw_arg(arguments);
    }
}

#[cfg(not(target_os = "windows"))]
fn apply_arguments(cmd: &mut Command, arguments: &str) {
    cmd.args(split_command_line(arguments));
}

#[cfg(target_os = "windows")]
fn configure_platform_spawn(cmd: &mut Command, priority: PriorityClass) {
    cmd.creation_flags(priority.creation_flag());
}

#[cfg(not(target_os = "windows"))]
fn configure_platform_spawn(_cmd: &mut Command, priority: PriorityClass) {
    debug!(
        "Priority class {:?} (0x{:x}) ignored on this platform",
        priority,
        priority.creation_flag()
    );
}

/// Split a Windows-style command line into arguments: whitespace separates,
/// double quotes group, and backslashes escape quotes only.
pub fn split_command_line(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut in_token = false;
    let mut in_quotes = false;
    let mut backslashes = 0usize;

    for c in line.chars() {
        match c {
            '\\' => {
                backslashes += 1;
                in_token = true;
            }
            '"' => {
                current.extend(std::iter::repeat_n('\\', backslashes / 2));
                if backslashes % 2 == 1 {
                    current.push('"');
                } else {
                    in_quotes = !in_quotes;
                }
                backslashes = 0;
                in_token = true;
            }
            ' ' | '\t' if !in_quotes => {
                current.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
                if in_token {
                    args.push(std::mem::take(&mut current));
                    in_token = false;
                }
            }
            _ => {
                current.extend(std::iter::repeat_n('\\', backslashes));
                backslashes = 0;
                current.push(c);
                in_token = true;
            }
        }
    }
    current.extend(std::iter::repeat_n('\\', backslashes));
    if in_token {
        args.push(current);
    }
    args
}
