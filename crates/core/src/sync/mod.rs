//! The sync pipeline: session state, per-peer propagation, and the
//! orchestrator that drives the whole run.

pub mod orchestrator;
pub mod propagator;
pub mod session;

pub use orchestrator::{SyncOrchestrator, SyncState};
pub use propagator::BranchPropagator;
pub use session::SyncSession;
