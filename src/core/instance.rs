// ─── Single Instance Lock ───
// Named, cross-process lock file in the temp directory. A lock left behind by
// a process that no longer runs, or whose pid now belongs to a younger
// process, is treated as stale and replaced.

use std::fs::OpenOptions;
use std::io::Write;
use std::path::{Path, PathBuf};

use chrono::Utc;
use serde::{Deserialize, Serialize};
use tracing::{debug, info, warn};

use crate::core::error::{LauncherError, LauncherResult};

pub const LOCK_EXTENSION: &str = "lock";
/// Tolerance between the OS-reported process start time and the lock timestamp.
const START_TIME_SLACK_SECS: i64 = 2;

#[derive(Debug, Clone, Copy, Serialize, Deserialize)]
struct LockPayload {
    pid: u32,
    timestamp: i64,
}

impl LockPayload {
    fn for_pid(pid: u32) -> Self {
        Self {
            pid,
            timestamp: Utc::now().timestamp(),
        }
    }
}

/// Held while this launcher owns the instance slot. Dropping it frees the slot.
#[derive(Debug)]
pub struct InstanceLock {
    path: PathBuf,
    owned: bool,
}

impl InstanceLock {
    /// Lock file used for `name`.
    pub fn lock_path(name: &str) -> PathBuf {
        let file_name: String = name
            .chars()
            .map(|c| if c.is_alphanumeric() || matches!(c, '-' | '_' | '.') { c } else { '_' })
            .collect();
        std::env::temp_dir().join(format!("{}.{}", file_name, LOCK_EXTENSION))
    }

    pub fn acquire(name: &str) -> LauncherResult<Self> {
        Self::acquire_at(name, Self::lock_path(name))
    }

    fn acquire_at(name: &str, path: PathBuf) -> LauncherResult<Self> {
        debug!("Create mutex: {}", name);

        for attempt in 0..2 {
            match OpenOptions::new().create_new(true).write(true).open(&path) {
                Ok(mut file) => {
                    write_payload(&mut file, &path, LockPayload::for_pid(std::process::id()))?;
                    return Ok(Self {
                        path,
                        owned: true,
                    });
                }
                Err(err) if err.kind() == std::io::ErrorKind::AlreadyExists => {
                    if attempt == 0 && remove_stale_lock(&path) {
                        continue;
                    }
                    debug!("Error: Instance already exists.");
                    return Err(LauncherError::InstanceAlreadyRunning(name.to_string()));
                }
                Err(source) => return Err(LauncherError::Io { path, source }),
            }
        }

        Err(LauncherError::InstanceAlreadyRunning(name.to_string()))
    }

    /// Transfer the slot to a detached child: the lock now names `pid` and
    /// outlives this launcher.
    pub fn hand_over(mut self, pid: u32) -> LauncherResult<()> {
        let mut file = OpenOptions::new()
            .write(true)
            .truncate(true)
            .open(&self.path)
            .map_err(|source| LauncherError::Io {
                path: self.path.clone(),
                source,
            })?;
        write_payload(&mut file, &self.path, LockPayload::for_pid(pid))?;
        info!("Instance lock {:?} handed over to process {}", self.path, pid);
        self.owned = false;
        Ok(())
    }
}

impl Drop for InstanceLock {
    fn drop(&mut self) {
        if !self.owned {
            return;
        }
        if let Err(source) = std::fs::remove_file(&self.path) {
            warn!("Failed to remove lock {:?}: {}", self.path, source);
        }
    }
}

fn write_payload(file: &mut std::fs::File, path: &Path, payload: LockPayload) -> LauncherResult<()> {
    let bytes = serde_json::to_vec(&payload)?;
    file.write_all(&bytes).map_err(|source| LauncherError::Io {
        path: path.to_path_buf(),
        source,
    })
}

/// Remove the lock when its owner is gone. Returns whether it was removed.
fn remove_stale_lock(path: &Path) -> bool {
    let payload = std::fs::read(path)
        .ok()
        .and_then(|bytes| serde_json::from_slice::<LockPayload>(&bytes).ok());

    let stale = match payload {
        Some(payload) => !owner_is_alive(payload),
        None => true,
    };
    if !stale {
        return false;
    }

    debug!("Removing stale lock {:?} ({:?})", path, payload);
    std::fs::remove_file(path).is_ok()
}

/// The recorded pid still runs and was started no later than the lock was
/// written. A younger process means the pid has been reused.
fn owner_is_alive(payload: LockPayload) -> bool {
    let system = sysinfo::System::new_all();
    match system.process(sysinfo::Pid::from_u32(payload.pid)) {
        Some(process) => {
            let started = i64::try_from(process.start_time()).unwrap_or(i64::MAX);
            started <= payload.timestamp.saturating_add(START_TIME_SLACK_SECS)
        }
        None => false,
    }
}
