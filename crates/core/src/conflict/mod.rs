//! Merge conflict handling.
//!
//! The conflict subsystem is responsible for:
//! 1. **Classification** -- telling a true conflict (unmerged paths) apart
//!    from any other merge failure.
//! 2. **Hand-off** -- opening conflicted files in the user's editor so they
//!    can resolve them in place.

pub mod editor;
pub mod handler;

pub use editor::{CommandEditor, Editor};
pub use handler::MergeConflictHandler;
