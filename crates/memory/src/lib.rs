//! Step memory for the Quarry agent loop.
//!
//! The [`MemoryLog`] is an ordered, append-only record of what happened in a
//! run: one [`TaskStep`] followed by one [`ActionStep`] per loop iteration.
//! It is the single source of truth for the conversation — on every
//! iteration the loop re-projects the **whole** log into a message sequence
//! (no incremental buffer), so the model always sees a consistent history.

pub mod log;
pub mod step;

pub use log::MemoryLog;
pub use step::{ActionStep, Step, TaskStep};
