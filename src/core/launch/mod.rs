pub mod classpath;
pub mod expand;
pub mod options;
pub mod plan;
pub mod task;

pub use expand::ExpansionContext;
pub use plan::LaunchPlanBuilder;
pub use task::{launch, spawn};
