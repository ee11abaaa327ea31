// ─── JVM Options ───
// Heap sizing, the external options file and forwarding of the launcher's
// own command line arguments.

use std::path::Path;

use tracing::debug;

use crate::core::config::LauncherConfig;
use crate::core::error::{LauncherError, LauncherResult};

/// Largest heap a 32-bit runtime is given, in megabytes.
pub const HEAP_LIMIT_32BIT_MB: u64 = 1024;
/// Extension of the options file next to the executable.
pub const OPTIONS_EXTENSION: &str = "vmoptions";
/// Arguments with this prefix control the launcher and never reach the runtime.
pub const RESERVED_FLAG_PREFIX: &str = "--launcher-";

const MIB: u64 = 1024 * 1024;

/// Heap size for one `-Xms`/`-Xmx` flag: the larger of the configured size
/// and the configured share of available memory, clamped on 32-bit runtimes.
pub fn heap_size_mb(
    configured_mb: u64,
    percent: u64,
    available_bytes: u64,
    is_64bit: bool,
) -> Option<u64> {
    let available_mb = available_bytes.saturating_mul(percent) / (100 * MIB);
    let mut heap_mb = configured_mb.max(available_mb);
    if heap_mb == 0 {
        return None;
    }

    if !is_64bit && heap_mb > HEAP_LIMIT_32BIT_MB {
        debug!(
            "Heap limit: Reduced {} MB heap size to 32-bit maximum {} MB",
            heap_mb, HEAP_LIMIT_32BIT_MB
        );
        heap_mb = HEAP_LIMIT_32BIT_MB;
    }
    Some(heap_mb)
}

/// `-Xms<n>m` and `-Xmx<n>m` for the configured heap settings.
pub fn heap_flags(config: &LauncherConfig, available_bytes: u64, is_64bit: bool) -> Vec<String> {
    let settings = [
        ("-Xms", config.initial_heap_mb, config.initial_heap_percent),
        ("-Xmx", config.max_heap_mb, config.max_heap_percent),
    ];

    settings
        .into_iter()
        .filter_map(|(flag, mb, percent)| {
            let size = heap_size_mb(mb, percent, available_bytes, is_64bit)?;
            debug!(
                "Heap {}: Requested {} MB / {}%, Available: {} MB, Heap size: {} MB",
                flag,
                mb,
                percent,
                available_bytes / MIB,
                size
            );
            Some(format!("{}{}m", flag, size))
        })
        .collect()
}

/// Options file text as a single line: `#` comments run to the end of the
/// line and any whitespace run becomes one space.
pub fn parse_options_file(text: &str) -> String {
    text.lines()
        .map(|line| line.split_once('#').map_or(line, |(before, _)| before))
        .flat_map(str::split_whitespace)
        .collect::<Vec<_>>()
        .join(" ")
}

/// Configured JVM options followed by the contents of `<exe stem>.vmoptions`,
/// still unexpanded.
pub fn load_jvm_options(config: &LauncherConfig, exe_path: &Path) -> LauncherResult<String> {
    let mut options = config.jvm_options.trim().to_string();

    let options_file = exe_path.with_extension(OPTIONS_EXTENSION);
    if options_file.is_file() {
        debug!("Loading: {:?}", options_file);
        let bytes = std::fs::read(&options_file).map_err(|source| LauncherError::Io {
            path: options_file.clone(),
            source,
        })?;
        let from_file = parse_options_file(&String::from_utf8_lossy(&bytes));
        if !from_file.is_empty() {
            if !options.is_empty() {
                options.push(' ');
            }
            options.push_str(&from_file);
        }
    }

    Ok(options)
}

/// The launcher's own arguments minus reserved flags, quoted for a Windows
/// command line.
pub fn forwarded_arguments<I, S>(args: I) -> String
where
    I: IntoIterator<Item = S>,
    S: AsRef<str>,
{
    args.into_iter()
        .filter(|arg| !arg.as_ref().starts_with(RESERVED_FLAG_PREFIX))
        .map(|arg| quote_arg(arg.as_ref()))
        .collect::<Vec<_>>()
        .join(" ")
}

/// Quote one argument so the runtime's argument parser reads it back unchanged.
pub fn quote_arg(arg: &str) -> String {
    if !arg.is_empty() && !arg.contains([' ', '\t', '\n', '"']) {
        return arg.to_string();
    }

    let mut quoted = String::with_capacity(arg.len() + 2);
    quoted.push('"');
    let mut backslashes = 0usize;
    for c in arg.chars() {
        match c {
            '\\' => backslashes += 1,
            '"' => {
                quoted.extend(std::iter::repeat_n('\\', backslashes * 2 + 1));
                quoted.push('"');
                backslashes = 0;
            }
            _ => {
                quoted.extend(std::iter::repeat_n('\\', backslashes));
                quoted.push(c);
                backslashes = 0;
            }
        }
    }
    quoted.extend(std::iter::repeat_n('\\', backslashes * 2));
    quoted.push('"');
    quoted
}
