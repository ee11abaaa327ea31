// ─── Registry Runtime Search ───
// Enumerates the vendor keys under HKEY_LOCAL_MACHINE in a fixed priority
// order, applying the 64/32-bit view rules. The first acceptable subkey wins.

use std::path::Path;

use tracing::{debug, instrument, trace};

use super::runtime::{CandidateSource, JreCandidate, ResolutionContext};
use super::version::JavaVersion;

/// Predefined registry hive.
#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RootKey {
    ClassesRoot,
    CurrentUser,
    LocalMachine,
    Users,
    CurrentConfig,
}

impl RootKey {
    const PREFIXES: [(&'static str, RootKey); 5] = [
        ("HKEY_CLASSES_ROOT", RootKey::ClassesRoot),
        ("HKEY_CURRENT_USER", RootKey::CurrentUser),
        ("HKEY_LOCAL_MACHINE", RootKey::LocalMachine),
        ("HKEY_USERS", RootKey::Users),
        ("HKEY_CURRENT_CONFIG", RootKey::CurrentConfig),
    ];

    /// Hive named at the start of `path`, e.g. `HKEY_LOCAL_MACHINE\SOFTWARE\...`.
    pub fn from_prefix(path: &str) -> Option<Self> {
        Self::PREFIXES
            .iter()
            .find(|(prefix, _)| path.starts_with(prefix))
            .map(|(_, root)| *root)
    }
}

/// Registry view used when opening a key.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum RegistryView {
    /// Whatever view matches the launcher's own bitness.
    Native,
    Wow64_64,
    Wow64_32,
}

/// Read-only registry capability used by the locator and the `%HKEY_...%`
/// variable lookup. Every failure reads as "absent".
pub trait RegistryAccess {
    /// Subkey names of `root\path` in enumeration order.
    fn subkeys(&self, root: RootKey, path: &str, view: RegistryView) -> Option<Vec<String>>;

    /// String value `name` of `root\path`.
    fn string_value(
        &self,
        root: RootKey,
        path: &str,
        name: &str,
        view: RegistryView,
    ) -> Option<String>;
}

#[cfg(windows)]
mod windows {
    use winreg::enums::{
        HKEY_CLASSES_ROOT, HKEY_CURRENT_CONFIG, HKEY_CURRENT_USER, HKEY_LOCAL_MACHINE, HKEY_USERS,
        KEY_READ, KEY_WOW64_32KEY, KEY_WOW64_64KEY,
    };
    use winreg::RegKey;

    use super::{RegistryAccess, RegistryView, RootKey};

    /// The live Windows registry.
    #[derive(Debug, Default, Clone, Copy)]
    pub struct WindowsRegistry;

    impl WindowsRegistry {
        fn open(root: RootKey, path: &str, view: RegistryView) -> Option<RegKey> {
            let hive = RegKey::predef(match root {
                RootKey::ClassesRoot => HKEY_CLASSES_ROOT,
                RootKey::CurrentUser => HKEY_CURRENT_USER,
                RootKey::LocalMachine => HKEY_LOCAL_MACHINE,
                RootKey::Users => HKEY_USERS,
                RootKey::CurrentConfig => HKEY_CURRENT_CONFIG,
            });
            let flags = KEY_READ
                | match view {
                    RegistryView::Native => 0,
                    RegistryView::Wow64_64 => KEY_WOW64_64KEY,
                    RegistryView::Wow64_32 => KEY_WOW64_32KEY,
                };
            hive.open_subkey_with_flags(path, flags).ok()
        }
    }

    impl RegistryAccess for WindowsRegistry {
        fn subkeys(&self, root: RootKey, path: &str, view: RegistryView) -> Option<Vec<String>> {
            let key = Self::open(root, path, view)?;
            Some(key.enum_keys().map_while(Result::ok).collect())
        }

        fn string_value(
            &self,
            root: RootKey,
            path: &str,
            name: &str,
            view: RegistryView,
        ) -> Option<String> {
            Self::open(root, path, view)?.get_value::<String, _>(name).ok()
        }
    }
}

#[cfg(windows)]
pub use windows::WindowsRegistry;

/// Stand-in for hosts without a registry: every key is absent.
#[derive(Debug, Default, Clone, Copy)]
pub struct NoRegistry;

impl RegistryAccess for NoRegistry {
    fn subkeys(&self, _root: RootKey, _path: &str, _view: RegistryView) -> Option<Vec<String>> {
        None
    }

    fn string_value(
        &self,
        _root: RootKey,
        _path: &str,
        _name: &str,
        _view: RegistryView,
    ) -> Option<String> {
        None
    }
}

#[cfg(windows)]
pub type SystemRegistry = WindowsRegistry;
#[cfg(not(windows))]
pub type SystemRegistry = NoRegistry;

#[derive(Debug, Clone, Copy, PartialEq, Eq)]
pub enum RuntimeFamily {
    Jre,
    Jdk,
}

/// One vendor/product key holding a subkey per installed version.
#[derive(Debug, Clone, Copy)]
pub struct RegistryRoot {
    pub path: &'static str,
    pub family: RuntimeFamily,
    pub vendor: &'static str,
}

/// Search order. Earlier roots win over later ones regardless of version.
pub const REGISTRY_ROOTS: &[RegistryRoot] = &[
    RegistryRoot {
        path: r"SOFTWARE\JavaSoft\Java Runtime Environment",
        family: RuntimeFamily::Jre,
        vendor: "JavaSoft",
    },
    RegistryRoot {
        path: r"SOFTWARE\JavaSoft\Java Development Kit",
        family: RuntimeFamily::Jdk,
        vendor: "JavaSoft",
    },
    // Java 9+ layout
    RegistryRoot {
        path: r"SOFTWARE\JavaSoft\JRE",
        family: RuntimeFamily::Jre,
        vendor: "JavaSoft",
    },
    RegistryRoot {
        path: r"SOFTWARE\JavaSoft\JDK",
        family: RuntimeFamily::Jdk,
        vendor: "JavaSoft",
    },
    RegistryRoot {
        path: r"SOFTWARE\IBM\Java Runtime Environment",
        family: RuntimeFamily::Jre,
        vendor: "IBM",
    },
    RegistryRoot {
        path: r"SOFTWARE\IBM\Java Development Kit",
        family: RuntimeFamily::Jdk,
        vendor: "IBM",
    },
    // IBM 1.7 and earlier
    RegistryRoot {
        path: r"SOFTWARE\IBM\Java2 Runtime Environment",
        family: RuntimeFamily::Jre,
        vendor: "IBM",
    },
];

pub const JAVA_HOME_VALUE: &str = "JavaHome";

pub struct RegistryLocator;

impl RegistryLocator {
    #[instrument(skip_all)]
    pub fn search(
        ctx: &mut ResolutionContext,
        registry: &dyn RegistryAccess,
    ) -> Option<JreCandidate> {
        trace!("Registry search");
        let requires_jdk = ctx.criteria().requires_jdk;

        REGISTRY_ROOTS
            .iter()
            .filter(|root| !requires_jdk || root.family == RuntimeFamily::Jdk)
            .find_map(|root| Self::search_root(ctx, registry, root))
    }

    fn search_root(
        ctx: &mut ResolutionContext,
        registry: &dyn RegistryAccess,
        root: &RegistryRoot,
    ) -> Option<JreCandidate> {
        if ctx.os_is_64bit() && !ctx.criteria().jni_mode {
            if let Some(found) = Self::search_view(ctx, registry, root, RegistryView::Wow64_64) {
                return Some(found);
            }
        }
        if ctx.criteria().requires_64bit {
            return None;
        }
        Self::search_view(ctx, registry, root, RegistryView::Wow64_32)
    }

    fn search_view(
        ctx: &mut ResolutionContext,
        registry: &dyn RegistryAccess,
        root: &RegistryRoot,
        view: RegistryView,
    ) -> Option<JreCandidate> {
        let is_64bit = view == RegistryView::Wow64_64;
        debug!(
            "{}-bit search: {} ({})",
            if is_64bit { "64" } else { "32" },
            root.path,
            root.vendor
        );

        let subkeys = registry.subkeys(RootKey::LocalMachine, root.path, view)?;
        for name in subkeys {
            let key_path = format!(r"{}\{}", root.path, name);
            debug!("Check: {}", key_path);
            let version = JavaVersion::normalize(&name);

            if !ctx.criteria().accepts(&version, is_64bit) {
                debug!("Ignore: {}", version);
                continue;
            }

            let home = registry
                .string_value(RootKey::LocalMachine, &key_path, JAVA_HOME_VALUE, view)
                .unwrap_or_default();
            if !ctx.layout().is_valid(Path::new(&home)) {
                ctx.mark_corrupted();
                debug!("Ignore: {}", version);
                continue;
            }

            debug!("Match: {}", version);
            return Some(JreCandidate {
                home: home.into(),
                version,
                is_64bit,
                source: CandidateSource::Registry {
                    root: RootKey::LocalMachine,
                    view,
                },
            });
        }
        None
    }
}

/// Resolve a `HKEY_...\key\path\value` token to its string value.
///
/// The hive is everything before the first `\`, the value name everything
/// after the last one. The 64-bit view is tried first on 64-bit hosts.
pub fn query_registry_value(
    token: &str,
    registry: &dyn RegistryAccess,
    os_is_64bit: bool,
) -> Option<String> {
    let root = RootKey::from_prefix(token)?;
    let (_, rest) = token.split_once('\\')?;
    let (key, value) = rest.rsplit_once('\\')?;

    let views: &[RegistryView] = if os_is_64bit {
        &[RegistryView::Wow64_64, RegistryView::Native]
    } else {
        &[RegistryView::Native]
    };
    views
        .iter()
        .find_map(|view| registry.string_value(root, key, value, *view))
}
