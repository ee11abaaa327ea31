// ─── Version Probe ───
// Runs `<home>\bin\java(w).exe -version` and extracts the quoted version
// string plus the bitness marker from its combined output.

use std::io::Read;
use std::path::Path;
use std::process::{Command, Stdio};

#[cfg(target_os = "windows")]
use std::os::windows::process::CommandExt;

use tracing::{debug, instrument, trace};

use crate::core::error::ProbeError;

use super::paths::{JreLayout, LauncherBinary};

/// Upper bound on captured `-version` output. The buffer never grows.
pub const PROBE_CAPTURE_BYTES: usize = 1024;
/// Longest accepted raw version string.
pub const VERSION_CAPACITY: usize = 128;

#[derive(Debug, Clone, PartialEq, Eq)]
pub struct ProbeOutput {
    pub raw_version: String,
    pub is_64bit: bool,
}

/// Asks a runtime home which version it is.
pub trait VersionProbe {
    fn probe(&self, java_home: &Path) -> Result<ProbeOutput, ProbeError>;
}

/// Probe backed by a real child process.
#[derive(Debug, Clone, Copy)]
pub struct ProcessProbe {
    binary: LauncherBinary,
}

impl ProcessProbe {
    pub fn new(binary: LauncherBinary) -> Self {
        Self { binary }
    }
}

impl VersionProbe for ProcessProbe {
    #[instrument(skip(self))]
    fn probe(&self, java_home: &Path) -> Result<ProbeOutput, ProbeError> {
        let layout = JreLayout {
            binary: self.binary,
            requires_jdk: false,
        };
        let launcher = layout.launcher_path(java_home);
        let spawn_failed = |source| ProbeError::ProcessSpawnFailed {
            command: launcher.clone(),
            source,
        };

        let (mut reader, writer) = std::io::pipe().map_err(spawn_failed)?;
        let stderr_writer = writer.try_clone().map_err(spawn_failed)?;

        let mut cmd = Command::new(&launcher);
        cmd.arg("-version")
            .stdin(Stdio::null())
            .stdout(writer)
            .stderr(stderr_writer);
        configure_probe_spawn(&mut cmd);

        trace!("Create process: {:?} -version", launcher);
        let spawned = cmd.spawn();
        // The command owns the parent's write ends; release them so the read
        // side sees EOF once the child exits.
        drop(cmd);
        let mut child = spawned.map_err(spawn_failed)?;

        let mut captured = Vec::with_capacity(PROBE_CAPTURE_BYTES);
        let read_result = (&mut reader)
            .take(PROBE_CAPTURE_BYTES as u64)
            .read_to_end(&mut captured);
        drop(reader);
        if let Err(err) = child.wait() {
            debug!("Cannot reap {:?}: {}", launcher, err);
        }
        if let Err(err) = read_result {
            debug!("Reading {:?} output stopped early: {}", launcher, err);
        }

        trace!("Java version output: {}", String::from_utf8_lossy(&captured));
        parse_version_output(&captured)
    }
}

#[cfg(target_os = "windows")]
fn configure_probe_spawn(cmd: &mut Command) {
    const CREATE_NO_WINDOW: u32 = 0x0800_0000;
    cmd.creation_flags(CREATE_NO_WINDOW);
}

#[cfg(not(target_os = "windows"))]
fn configure_probe_spawn(_cmd: &mut Command) {}

/// Parse the first quoted substring and the `64-bit` marker from `-version` output.
pub fn parse_version_output(output: &[u8]) -> Result<ProbeOutput, ProbeError> {
    let text = String::from_utf8_lossy(output);

    let Some(start) = text.find('"') else {
        debug!("Cannot get version string: cannot find quote");
        return Err(ProbeError::NoVersionString);
    };
    let rest = &text[start + 1..];
    let Some(len) = rest.find('"') else {
        debug!("Cannot get version string: missing end quote");
        return Err(ProbeError::NoVersionString);
    };
    if len >= VERSION_CAPACITY {
        debug!("Cannot get version string: data too large");
        return Err(ProbeError::VersionTooLong {
            capacity: VERSION_CAPACITY,
        });
    }

    Ok(ProbeOutput {
        raw_version: rest[..len].to_string(),
        is_64bit: text.to_ascii_lowercase().contains("64-bit"),
    })
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;

    #[test]
    fn parses_openjdk_output() {
        let output = b"openjdk version \"17.0.1\" 2021-10-19\n\
OpenJDK Runtime Environment (build 17.0.1+12-39)\n\
OpenJDK 64-Bit Server VM (build 17.0.1+12-39, mixed mode, sharing)\n";
        let parsed = parse_version_output(output).unwrap();
        assert_eq!(parsed.raw_version, "17.0.1");
        assert!(parsed.is_64bit);
    }

    #[test]
    fn missing_marker_means_32bit() {
        let output = b"java version \"1.8.0_212\"\nJava HotSpot(TM) Client VM (build 25.212-b10, mixed mode)\n";
        let parsed = parse_version_output(output).unwrap();
        assert_eq!(parsed.raw_version, "1.8.0_212");
        assert!(!parsed.is_64bit);
    }

    #[test]
    fn lowercase_marker_is_detected() {
        let parsed = parse_version_output(b"java version \"11\" 64-bit").unwrap();
        assert!(parsed.is_64bit);
    }

    #[test]
    fn unquoted_output_is_rejected() {
        assert!(matches!(
            parse_version_output(b"Error: could not create the Java VM"),
            Err(ProbeError::NoVersionString)
        ));
        assert!(matches!(
            parse_version_output(b"java version \"1.8.0"),
            Err(ProbeError::NoVersionString)
        ));
    }

    #[test]
    fn oversized_version_is_rejected() {
        let output = format!("version \"{}\"", "9".repeat(VERSION_CAPACITY));
        assert!(matches!(
            parse_version_output(output.as_bytes()),
            Err(ProbeError::VersionTooLong { .. })
        ));
    }

    #[test]
    fn missing_binary_fails_to_spawn() {
        let home = TempDir::new().unwrap();
        let probe = ProcessProbe::new(LauncherBinary::Console);
        assert!(matches!(
            probe.probe(home.path()),
            Err(ProbeError::ProcessSpawnFailed { .. })
        ));
    }

    #[cfg(unix)]
    fn fake_java(script: &str) -> TempDir {
        use std::os::unix::fs::PermissionsExt;

        let home = TempDir::new().unwrap();
        let bin = home.path().join("bin");
        std::fs::create_dir_all(&bin).unwrap();
        let java = bin.join("java.exe");
        std::fs::write(&java, format!("#!/bin/sh\n{}\n", script)).unwrap();
        std::fs::set_permissions(&java, std::fs::Permissions::from_mode(0o755)).unwrap();
        home
    }

    #[cfg(unix)]
    #[test]
    fn reads_stdout_and_stderr_together() {
        let home = fake_java(
            "echo 'openjdk version \"17.0.1\" 2021-10-19' >&2\n\
             echo 'OpenJDK 64-Bit Server VM (build 17.0.1+12, mixed mode)'",
        );
        let output = ProcessProbe::new(LauncherBinary::Console)
            .probe(home.path())
            .unwrap();
        assert_eq!(
            output,
            ProbeOutput {
                raw_version: "17.0.1".to_string(),
                is_64bit: true,
            }
        );
    }

    #[cfg(unix)]
    #[test]
    fn capture_stops_at_limit() {
        let home = fake_java("head -c 204800 /dev/zero | tr '\\0' x\necho '\"17\"'");
        assert!(matches!(
            ProcessProbe::new(LauncherBinary::Console).probe(home.path()),
            Err(ProbeError::NoVersionString)
        ));
    }
}
