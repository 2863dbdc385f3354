//! Readiness filter
//!
//! A task is a candidate when it is open, every child is completed and every
//! task blocking it is completed. Each decision looks only at the task's own
//! direct children and blockers, so the order tasks are checked in never
//! changes the result.

use std::collections::BTreeSet;

use crate::domain::{TaskGraph, TaskId};

/// Returns true if `id` can be worked on right now
pub fn is_candidate(graph: &TaskGraph, id: &TaskId) -> bool {
    let Some(task) = graph.get(id) else {
        return false;
    };

    if task.completed {
        return false;
    }

    let children_done = graph.children(id).iter().all(|c| graph.is_completed(c));
    let blockers_done = graph.blocked_by(id).iter().all(|b| graph.is_completed(b));

    children_done && blockers_done
}

/// Selects the candidates among `scope`
///
/// Children and blockers are looked up in the whole snapshot, so a blocker
/// outside the scope still holds a task back.
pub fn filter_candidates<'a>(
    graph: &TaskGraph,
    scope: impl IntoIterator<Item = &'a TaskId>,
) -> BTreeSet<TaskId> {
    scope
        .into_iter()
        .filter(|id| is_candidate(graph, id))
        .cloned()
        .collect()
}
