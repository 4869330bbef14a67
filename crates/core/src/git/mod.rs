//! Git operations for branchsync.

pub mod classify;
pub mod client;
pub mod inspector;
pub mod runner;

pub use client::GitClient;
pub use inspector::RepositoryInspector;
pub use runner::{CommandOutput, CommandRunner, SystemRunner};
