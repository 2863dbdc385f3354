//! nextup - A local-first task outliner that tells you what to do next
//!
//! Tasks form a forest of subtasks and can additionally block one another
//! across branches. The [`engine`] module works out which tasks are
//! actionable right now and ranks them; the rest of the crate stores tasks
//! per owner and drives the engine from the command line.

pub mod domain;
pub mod engine;
pub mod storage;
pub mod cli;

pub use domain::{OwnerId, Task, TaskGraph, TaskId};
pub use engine::{next_up, NextUp, RankError, RankedTask};
