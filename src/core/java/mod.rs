pub mod locator;
pub mod paths;
pub mod probe;
pub mod registry;
pub mod runtime;
#[cfg(test)]
pub(crate) mod testing;
pub mod version;

pub use paths::{os_is_64bit, LaunchContext, LauncherBinary};
pub use probe::ProcessProbe;
pub use registry::{RegistryAccess, SystemRegistry};
pub use runtime::{JreCandidate, JreResolver, ResolutionContext, SearchCriteria};
