//! branchsync core library.
//!
//! Keeps a set of sibling branches in step with the current branch: merges
//! every peer forward, pushes the result, then carries it back into each
//! peer. All git work goes through the [`git::CommandRunner`] seam.

pub mod config;
pub mod conflict;
pub mod errors;
pub mod git;
pub mod models;
pub mod prompt;
pub mod report;
pub mod sync;

#[cfg(test)]
mod testing;

// Re-exports for convenience.
pub use config::SyncConfig;
pub use models::BranchName;
pub use report::SyncSummary;
pub use sync::{SyncOrchestrator, SyncSession};
