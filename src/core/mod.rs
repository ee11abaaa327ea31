// ─── jrelauncher Core ───
// Java runtime discovery and launch-plan construction.
//
// Architecture:
//   core/
//     config     — Launcher configuration next to the executable
//     error      — Error taxonomy
//     instance   — Single-instance lock
//     java/      — Version normalizing, probing, path + registry search
//     launch/    — Variable expansion, classpath, options, plan, process

pub mod config;
pub mod error;
pub mod instance;
pub mod java;
pub mod launch;
