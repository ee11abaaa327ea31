// ─── Path Runtime Search ───
// Walks the configured `;`-separated list of runtime homes in order and
// returns the first one that is structurally valid and probes acceptably.

use std::path::{Path, PathBuf};

use tracing::{debug, instrument, trace};

use crate::core::launch::expand::ExpansionContext;

use super::probe::VersionProbe;
use super::runtime::{CandidateSource, JreCandidate, ResolutionContext};
use super::version::JavaVersion;

pub struct PathLocator;

impl PathLocator {
    #[instrument(skip_all)]
    pub fn search(
        path_spec: &str,
        expansion: &ExpansionContext<'_>,
        ctx: &mut ResolutionContext,
        probe: &dyn VersionProbe,
    ) -> Option<JreCandidate> {
        trace!("Path search");
        if ctx.criteria().requires_64bit && !ctx.os_is_64bit() {
            debug!("JRE: Cannot use 64-bit runtime on 32-bit OS.");
            return None;
        }

        let expanded = match expansion.expand(path_spec) {
            Ok(expanded) => expanded,
            Err(err) => {
                debug!("JRE paths: {}", err);
                return None;
            }
        };
        debug!("JRE paths: {}", expanded);

        let layout = ctx.layout();
        expanded
            .split(';')
            .filter(|entry| !entry.is_empty())
            .map(|entry| resolve_home(entry, expansion.exe_dir()))
            .filter(|home| layout.is_valid(home))
            .find_map(|home| Self::probe_home(home, ctx, probe))
    }

    fn probe_home(
        home: PathBuf,
        ctx: &ResolutionContext,
        probe: &dyn VersionProbe,
    ) -> Option<JreCandidate> {
        trace!(
            "Check Java Version: {:?} min={:?} max={:?}",
            home,
            ctx.criteria().min_version,
            ctx.criteria().max_version
        );
        let output = match probe.probe(&home) {
            Ok(output) => output,
            Err(err) => {
                debug!("Cannot run java(w) -version: {}", err);
                return None;
            }
        };

        let version = JavaVersion::normalize(&output.raw_version);
        if !ctx.criteria().accepts(&version, output.is_64bit) {
            return None;
        }
        Some(JreCandidate {
            home,
            version,
            is_64bit: output.is_64bit,
            source: CandidateSource::Path,
        })
    }
}

/// Turn one path entry into a runtime home: drop a trailing `bin` segment and
/// any quotes, then anchor relative entries at the executable's directory.
pub fn resolve_home(entry: &str, exe_dir: &Path) -> PathBuf {
    let without_bin = strip_bin_suffix(entry);
    let cleaned: String = without_bin.chars().filter(|c| *c != '"').collect();

    if is_absolute_entry(&cleaned) {
        PathBuf::from(cleaned)
    } else {
        exe_dir.join(cleaned)
    }
}

fn strip_bin_suffix(entry: &str) -> &str {
    let Some(split) = entry.rfind(['\\', '/']) else {
        return entry;
    };
    if entry[split + 1..].eq_ignore_ascii_case("bin") {
        &entry[..split]
    } else {
        entry
    }
}

fn is_absolute_entry(entry: &str) -> bool {
    entry.starts_with(['\\', '/'])
        || entry.as_bytes().get(1) == Some(&b':')
        || Path::new(entry).is_absolute()
}

#[cfg(test)]
mod tests {
    use tempfile::TempDir;

    use super::*;
    use crate::core::java::paths::{LaunchContext, LauncherBinary};
    use crate::core::java::registry::NoRegistry;
    use crate::core::java::runtime::SearchCriteria;
    use crate::core::java::testing::{install_runtime, FakeProbe};

    fn context(min: &str, os_is_64bit: bool) -> ResolutionContext {
        let criteria = SearchCriteria {
            min_version: JavaVersion::bound(min),
            ..SearchCriteria::default()
        };
        ResolutionContext::new(criteria, LauncherBinary::Windowed, os_is_64bit)
    }

    #[test]
    fn skips_invalid_entry_and_takes_next() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let jdk8 = root.join("jdk8");
        let jdk17 = root.join("jdk17");
        std::fs::create_dir_all(&jdk8).unwrap();
        install_runtime(&jdk17, "javaw.exe", false);

        let launch = LaunchContext::new(root.join("app.exe"), root.to_path_buf());
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let probe = FakeProbe::default().answer(&jdk17, "17.0.1", true);
        let spec = format!("{};{}", jdk8.display(), jdk17.display());

        let mut ctx = context("1.8.0", true);
        let found = PathLocator::search(&spec, &expansion, &mut ctx, &probe).unwrap();
        assert_eq!(found.home, jdk17);
        assert!(found.is_64bit);
        assert_eq!(found.version, JavaVersion::normalize("17.0.1"));
        assert_eq!(*probe.probed.borrow(), vec![jdk17.clone()]);
    }

    #[test]
    fn relative_bin_entry_resolves_against_exe_dir() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        install_runtime(&root.join("jre"), "javaw.exe", false);

        let launch = LaunchContext::new(root.join("app.exe"), PathBuf::from("/"));
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let probe = FakeProbe::default().answer(&root.join("jre"), "1.8.0_212", false);

        let mut ctx = context("1.8.0", true);
        let found = PathLocator::search("jre/BIN", &expansion, &mut ctx, &probe).unwrap();
        assert_eq!(found.home, root.join("jre"));
        assert!(!found.is_64bit);
    }

    #[test]
    fn version_mismatch_continues() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        let old = root.join("jre6");
        let new = root.join("jre8");
        install_runtime(&old, "javaw.exe", false);
        install_runtime(&new, "javaw.exe", false);

        let launch = LaunchContext::new(root.join("app.exe"), root.to_path_buf());
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let probe = FakeProbe::default()
            .answer(&old, "1.6.0_45", false)
            .answer(&new, "1.8.0_212", false);

        let mut ctx = context("1.8.0", true);
        let spec = "%EXEDIR%/jre6;;%EXEDIR%/jre8";
        let found = PathLocator::search(spec, &expansion, &mut ctx, &probe).unwrap();
        assert_eq!(found.home, new);
    }

    #[test]
    fn requires_64bit_on_32bit_os_skips_search() {
        let dir = TempDir::new().unwrap();
        let root = dir.path();
        install_runtime(&root.join("jre"), "javaw.exe", false);

        let launch = LaunchContext::new(root.join("app.exe"), root.to_path_buf());
        let expansion = ExpansionContext::new(&launch, &NoRegistry, false);
        let probe = FakeProbe::default().answer(&root.join("jre"), "17", true);

        let mut ctx = ResolutionContext::new(
            SearchCriteria {
                requires_64bit: true,
                ..SearchCriteria::default()
            },
            LauncherBinary::Windowed,
            false,
        );
        assert!(PathLocator::search("jre", &expansion, &mut ctx, &probe).is_none());
        assert!(probe.probed.borrow().is_empty());
    }

    #[test]
    fn unterminated_spec_yields_nothing() {
        let launch = LaunchContext::new(PathBuf::from("/app/app.exe"), PathBuf::from("/"));
        let expansion = ExpansionContext::new(&launch, &NoRegistry, true);
        let mut ctx = context("1.8", true);
        assert!(PathLocator::search("%EXEDIR", &expansion, &mut ctx, &FakeProbe::default()).is_none());
    }

    #[test]
    fn home_resolution_rules() {
        let exe_dir = Path::new("/opt/app");
        assert_eq!(resolve_home(r"C:\jdk17\bin", exe_dir), PathBuf::from(r"C:\jdk17"));
        assert_eq!(resolve_home(r"\\server\jre", exe_dir), PathBuf::from(r"\\server\jre"));
        assert_eq!(resolve_home("jre", exe_dir), exe_dir.join("jre"));
        assert_eq!(resolve_home("\"jre\"/Bin", exe_dir), exe_dir.join("jre"));
        assert_eq!(resolve_home("jre/binaries", exe_dir), exe_dir.join("jre/binaries"));
    }
}
