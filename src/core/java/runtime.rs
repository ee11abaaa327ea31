// ─── Java Runtime Resolution ───
// Search criteria, the resolution state threaded through the locators and the
// resolver that runs the path search before the registry search.

use std::fmt;
use std::path::PathBuf;

use tracing::{debug, info, instrument};

use crate::core::config::LauncherConfig;
use crate::core::error::ResolveError;
use crate::core::launch::expand::ExpansionContext;

use super::locator::PathLocator;
use super::paths::{JreLayout, LauncherBinary};
use super::probe::VersionProbe;
use super::registry::{RegistryAccess, RegistryLocator, RegistryView, RootKey};
use super::version::JavaVersion;

/// Constraints a runtime must satisfy. Built once at startup.
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct SearchCriteria {
    pub min_version: Option<JavaVersion>,
    pub max_version: Option<JavaVersion>,
    pub requires_jdk: bool,
    pub requires_64bit: bool,
    /// Embedding mode, a 64-bit runtime is never acceptable.
    pub jni_mode: bool,
}

impl SearchCriteria {
    pub fn from_config(config: &LauncherConfig) -> Self {
        let criteria = Self {
            min_version: JavaVersion::bound(&config.min_version),
            max_version: JavaVersion::bound(&config.max_version),
            requires_jdk: config.requires_jdk,
            requires_64bit: config.requires_64bit,
            jni_mode: config.jni,
        };
        debug!("Requires JDK: {}", yes_no(criteria.requires_jdk));
        debug!("Requires 64-Bit: {}", yes_no(criteria.requires_64bit));
        debug!("Java min ver: {}", display_bound(&criteria.min_version));
        debug!("Java max ver: {}", display_bound(&criteria.max_version));
        criteria
    }

    /// Inclusive version bounds plus the bitness gates.
    pub fn accepts(&self, version: &JavaVersion, is_64bit: bool) -> bool {
        let accepted = self.min_version.as_ref().map_or(true, |min| version >= min)
            && self.max_version.as_ref().map_or(true, |max| version <= max)
            && (!self.requires_64bit || is_64bit)
            && (!self.jni_mode || !is_64bit);
        debug!(
            "Version string: {} / {}-Bit ({})",
            version,
            if is_64bit { "64" } else { "32" },
            if accepted { "OK" } else { "Ignore" }
        );
        accepted
    }
}

fn yes_no(flag: bool) -> &'static str {
    if flag {
        "Yes"
    } else {
        "No"
    }
}

fn display_bound(bound: &Option<JavaVersion>) -> &str {
    bound.as_ref().map_or("", JavaVersion::as_str)
}

/// Where a candidate was discovered.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum CandidateSource {
    Path,
    Registry { root: RootKey, view: RegistryView },
}

/// A fully validated runtime. Never constructed partially.
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct JreCandidate {
    pub home: PathBuf,
    pub version: JavaVersion,
    pub is_64bit: bool,
    pub source: CandidateSource,
}

impl fmt::Display for JreCandidate {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(
            f,
            "{} ({}-bit) at {}",
            self.version,
            if self.is_64bit { "64" } else { "32" },
            self.home.display()
        )
    }
}

/// Search state shared by the locators of one invocation.
///
/// The chosen candidate is write-once: after the first match every later
/// candidate is ignored.
#[derive(Debug)]
pub struct ResolutionContext {
    criteria: SearchCriteria,
    binary: LauncherBinary,
    os_is_64bit: bool,
    corrupted_jre_found: bool,
    found: Option<JreCandidate>,
}

impl ResolutionContext {
    pub fn new(criteria: SearchCriteria, binary: LauncherBinary, os_is_64bit: bool) -> Self {
        Self {
            criteria,
            binary,
            os_is_64bit,
            corrupted_jre_found: false,
            found: None,
        }
    }

    pub fn criteria(&self) -> &SearchCriteria {
        &self.criteria
    }

    pub fn os_is_64bit(&self) -> bool {
        self.os_is_64bit
    }

    pub fn layout(&self) -> JreLayout {
        JreLayout {
            binary: self.binary,
            requires_jdk: self.criteria.requires_jdk,
        }
    }

    pub fn mark_corrupted(&mut self) {
        self.corrupted_jre_found = true;
    }

    pub fn corrupted_jre_found(&self) -> bool {
        self.corrupted_jre_found
    }

    /// Record `candidate` unless a match was already recorded.
    /// Returns whether the candidate was kept.
    pub fn record_match(&mut self, candidate: JreCandidate) -> bool {
        if self.found.is_some() {
            debug!("Ignoring later match {}", candidate);
            return false;
        }
        self.found = Some(candidate);
        true
    }

    pub fn found(&self) -> Option<&JreCandidate> {
        self.found.as_ref()
    }

    fn take_found(&mut self) -> Option<JreCandidate> {
        self.found.take()
    }
}

/// Runs the configured path search, then the registry search.
pub struct JreResolver<'a> {
    jre_path: &'a str,
    expansion: &'a ExpansionContext<'a>,
    probe: &'a dyn VersionProbe,
    registry: &'a dyn RegistryAccess,
}

impl<'a> JreResolver<'a> {
    pub fn new(
        jre_path: &'a str,
        expansion: &'a ExpansionContext<'a>,
        probe: &'a dyn VersionProbe,
        registry: &'a dyn RegistryAccess,
    ) -> Self {
        Self {
            jre_path,
            expansion,
            probe,
            registry,
        }
    }

    #[instrument(skip_all)]
    pub fn resolve(&self, ctx: &mut ResolutionContext) -> Result<JreCandidate, ResolveError> {
        if !self.jre_path.trim().is_empty() {
            if let Some(candidate) =
                PathLocator::search(self.jre_path, self.expansion, ctx, self.probe)
            {
                ctx.record_match(candidate);
            }
        }

        if ctx.found().is_none() && ctx.criteria().min_version.is_some() {
            if let Some(candidate) = RegistryLocator::search(ctx, self.registry) {
                ctx.record_match(candidate);
            }
        }

        match ctx.take_found() {
            Some(candidate) => {
                info!("Runtime used: {} ({:?})", candidate, candidate.source);
                Ok(candidate)
            }
            None if ctx.criteria().min_version.is_none() => Err(ResolveError::NotFound),
            None => Err(ResolveError::NoMatch {
                corrupted_jre_found: ctx.corrupted_jre_found(),
            }),
        }
    }
}
