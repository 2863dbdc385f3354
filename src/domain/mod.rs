//! Domain models for nextup
//!
//! Contains the task model and the read-only graph views built over it,
//! without any I/O concerns.

mod id;
mod task;
mod graph;
mod snapshot;
mod outline;

pub use id::{IdError, OwnerId, TaskId};
pub use task::Task;
pub use graph::{BlockGraph, GraphError, Relation};
pub use snapshot::TaskGraph;
pub use outline::{Outline, OutlineItem};
