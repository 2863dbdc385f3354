//! Importance scoring
//!
//! Marks the candidates that hold up other work, either because they have a
//! subtree beneath them or because they block other tasks, and weighs them by
//! how much they hold up.

use serde::Serialize;
use std::collections::{BTreeMap, BTreeSet};

use crate::domain::{TaskGraph, TaskId};

/// Weight of a high-priority task
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize)]
pub struct Importance {
    pub score: u64,
}

/// High-priority candidates keyed by ID
pub type HighPriority = BTreeMap<TaskId, Importance>;

/// Subtree size plus number of tasks blocked, counting every outgoing edge
/// whether or not its target is completed
pub fn importance(graph: &TaskGraph, id: &TaskId) -> u64 {
    (graph.descendant_count(id) + graph.blocking_count(id)) as u64
}

/// Whether a task qualifies as high priority
///
/// The grouping is `(open && has descendants) || blocks something`: a
/// completed task that blocks something would qualify too. Candidates are
/// never completed, so the difference does not show up in rankings.
pub fn qualifies(completed: bool, descendant_count: usize, blocking_count: usize) -> bool {
    (!completed && descendant_count > 0) || blocking_count > 0
}

/// Computes the high-priority map over `candidates` only
pub fn compute_high_priority(graph: &TaskGraph, candidates: &BTreeSet<TaskId>) -> HighPriority {
    candidates
        .iter()
        .filter_map(|id| {
            let task = graph.get(id)?;
            let descendants = graph.descendant_count(id);
            let blocking = graph.blocking_count(id);

            qualifies(task.completed, descendants, blocking).then(|| {
                (
                    id.clone(),
                    Importance {
                        score: (descendants + blocking) as u64,
                    },
                )
            })
        })
        .collect()
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Task};

    fn id(n: u32) -> TaskId {
        format!("t-{:07x}", n).parse().unwrap()
    }

    fn task(n: u32, parent: Option<u32>) -> Task {
        let owner: OwnerId = "alice".parse().unwrap();
        let mut t = Task::new(id(n), owner, format!("Task {}", n));
        t.place(parent.map(id), n);
        t
    }

    fn graph(tasks: Vec<Task>) -> TaskGraph {
        TaskGraph::for_owner(&"alice".parse().unwrap(), tasks)
    }

    fn set(ids: &[u32]) -> BTreeSet<TaskId> {
        ids.iter().map(|n| id(*n)).collect()
    }

    #[test]
    fn qualifying_grouping() {
        assert!(!qualifies(false, 0, 0));
        assert!(qualifies(false, 1, 0));
        assert!(qualifies(false, 0, 1));
        assert!(!qualifies(true, 1, 0));
        // Completed but blocking still qualifies
        assert!(qualifies(true, 0, 1));
    }

    #[test]
    fn plain_leaf_is_not_high_priority() {
        let g = graph(vec![task(1, None)]);
        assert!(compute_high_priority(&g, &set(&[1])).is_empty());
    }

    #[test]
    fn blocker_scores_its_blocking_count() {
        let mut b = task(2, None);
        let mut c = task(3, None);
        b.add_blocker(id(1));
        c.add_blocker(id(1));
        let g = graph(vec![task(1, None), b, c]);

        let hp = compute_high_priority(&g, &set(&[1]));
        assert_eq!(hp.get(&id(1)), Some(&Importance { score: 2 }));
    }

    #[test]
    fn completed_targets_still_count() {
        let mut done = task(2, None);
        done.add_blocker(id(1));
        done.complete();
        let g = graph(vec![task(1, None), done]);

        assert_eq!(importance(&g, &id(1)), 1);
        let hp = compute_high_priority(&g, &set(&[1]));
        assert_eq!(hp.get(&id(1)), Some(&Importance { score: 1 }));
    }

    #[test]
    fn parent_with_finished_subtree_scores_descendants() {
        let mut c1 = task(2, Some(1));
        let mut c2 = task(3, Some(1));
        let mut gc = task(4, Some(2));
        c1.complete();
        c2.complete();
        gc.complete();
        let g = graph(vec![task(1, None), c1, c2, gc]);

        let hp = compute_high_priority(&g, &set(&[1]));
        assert_eq!(hp.get(&id(1)), Some(&Importance { score: 3 }));
    }

    #[test]
    fn only_candidates_are_scored() {
        let mut b = task(2, None);
        b.add_blocker(id(1));
        let g = graph(vec![task(1, None), b]);

        // Task 1 is structurally important but left out of the candidate set
        assert!(compute_high_priority(&g, &set(&[2])).is_empty());
    }
}
