// ─── Test Doubles ───
// In-memory stand-ins for the `java -version` probe and the registry, shared by
// the locator and resolver tests.

use std::cell::RefCell;
use std::collections::HashMap;
use std::path::{Path, PathBuf};

use crate::core::error::ProbeError;

use super::probe::{ProbeOutput, VersionProbe};
use super::registry::{RegistryAccess, RegistryView, RootKey, JAVA_HOME_VALUE};

/// Canned `-version` answers keyed by home directory. Records every home probed.
#[derive(Default)]
pub struct FakeProbe {
    answers: HashMap<PathBuf, ProbeOutput>,
    pub probed: RefCell<Vec<PathBuf>>,
}

impl FakeProbe {
    pub fn answer(mut self, home: &Path, raw: &str, is_64bit: bool) -> Self {
        self.answers.insert(
            home.to_path_buf(),
            ProbeOutput {
                raw_version: raw.to_string(),
                is_64bit,
            },
        );
        self
    }
}

impl VersionProbe for FakeProbe {
    fn probe(&self, java_home: &Path) -> Result<ProbeOutput, ProbeError> {
        self.probed.borrow_mut().push(java_home.to_path_buf());
        self.answers
            .get(java_home)
            .cloned()
            .ok_or(ProbeError::NoVersionString)
    }
}

/// In-memory registry keyed by `(view, path)`. Only `HKEY_LOCAL_MACHINE` is
/// expected for subkey enumeration.
#[derive(Default)]
pub struct FakeRegistry {
    keys: HashMap<(RegistryView, String), Vec<String>>,
    values: HashMap<(RegistryView, String, String), String>,
}

impl FakeRegistry {
    /// Register `version` under `root` with a `JavaHome` of `home`.
    pub fn install(&mut self, view: RegistryView, root: &str, version: &str, home: &Path) {
        self.keys
            .entry((view, root.to_string()))
            .or_default()
            .push(version.to_string());
        self.set_value(
            view,
            &format!(r"{}\{}", root, version),
            JAVA_HOME_VALUE,
            &home.to_string_lossy(),
        );
    }

    pub fn set_value(&mut self, view: RegistryView, path: &str, name: &str, data: &str) {
        self.values
            .insert((view, path.to_string(), name.to_string()), data.to_string());
    }
}

impl RegistryAccess for FakeRegistry {
    fn subkeys(&self, root: RootKey, path: &str, view: RegistryView) -> Option<Vec<String>> {
        assert_eq!(root, RootKey::LocalMachine);
        self.keys.get(&(view, path.to_string())).cloned()
    }

    fn string_value(
        &self,
        _root: RootKey,
        path: &str,
        name: &str,
        view: RegistryView,
    ) -> Option<String> {
        self.values
            .get(&(view, path.to_string(), name.to_string()))
            .cloned()
    }
}

/// Lay out `<home>\bin\<binary>`, plus `javac.exe` for a JDK.
pub fn install_runtime(home: &Path, binary: &str, with_javac: bool) {
    let bin = home.join("bin");
    std::fs::create_dir_all(&bin).unwrap();
    std::fs::write(bin.join(binary), b"").unwrap();
    if with_javac {
        std::fs::write(bin.join("javac.exe"), b"").unwrap();
    }
}
