//! # Readiness & Priority Ranking
//!
//! Answers "what can I do right now, and in what order?" for one owner's
//! task snapshot.
//!
//! ## Pipeline
//!
//! ```text
//! TaskGraph ──► readiness ──► candidates ──► importance ──► high-priority map
//!                                  │                               │
//!                                  └──────────► ranker ◄───────────┘
//!                                                  │
//!                                                  ▼
//!                                         Vec<RankedTask>
//! ```
//!
//! Everything here is a pure function of the snapshot: no I/O, no mutation,
//! and the blocking graph is only ever read one edge deep, so cycles in it
//! cannot stop a call from finishing.

mod importance;
mod ranker;
mod readiness;

pub use importance::{compute_high_priority, importance, qualifies, HighPriority, Importance};
pub use ranker::{rank, score_candidate, AncestorRef, RankedTask};
pub use readiness::{filter_candidates, is_candidate};

use serde::Serialize;
use thiserror::Error;

use crate::domain::{GraphError, TaskGraph, TaskId};

#[derive(Debug, Error, PartialEq)]
pub enum RankError {
    #[error("Task not found: {0}")]
    NotFound(TaskId),

    #[error(transparent)]
    Graph(GraphError),
}

impl From<GraphError> for RankError {
    fn from(err: GraphError) -> Self {
        match err {
            GraphError::TaskNotFound(id) => RankError::NotFound(id),
            other => RankError::Graph(other),
        }
    }
}

/// Sizes of each stage, for logging
#[derive(Debug, Clone, Copy, Default, PartialEq, Eq, Serialize)]
pub struct RankStats {
    pub scope: usize,
    pub candidates: usize,
    pub high_priority: usize,
}

/// Result of a ranking call
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct NextUp {
    pub tasks: Vec<RankedTask>,
    pub stats: RankStats,
}

/// Ranks the actionable tasks of the snapshot
///
/// With `root` set, only that task and its descendants are considered (the
/// root itself included); otherwise every task of the owner is.
pub fn next_up(graph: &TaskGraph, root: Option<&TaskId>) -> Result<NextUp, RankError> {
    let scope = graph.list_scope(root)?;
    let candidates = filter_candidates(graph, &scope);
    let high_priority = compute_high_priority(graph, &candidates);
    let tasks = rank(graph, &candidates, &high_priority);

    Ok(NextUp {
        stats: RankStats {
            scope: scope.len(),
            candidates: candidates.len(),
            high_priority: high_priority.len(),
        },
        tasks,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Task};

    fn id(n: u32) -> TaskId {
        format!("t-{:07x}", n).parse().unwrap()
    }

    fn task(n: u32, name: &str, parent: Option<u32>) -> Task {
        let owner: OwnerId = "alice".parse().unwrap();
        let mut t = Task::new(id(n), owner, name);
        t.place(parent.map(id), n);
        t
    }

    const ROOT: u32 = 1;
    const A: u32 = 2;
    const B: u32 = 3;
    const C: u32 = 4;
    const D: u32 = 5;

    /// Root has children A and B; C blocks B; B blocks D
    fn scenario(c_completed: bool) -> TaskGraph {
        let mut b = task(B, "B", Some(ROOT));
        b.add_blocker(id(C));
        let mut c = task(C, "C", None);
        if c_completed {
            c.complete();
        }
        let mut d = task(D, "D", None);
        d.add_blocker(id(B));

        let tasks = vec![task(ROOT, "Root", None), task(A, "A", Some(ROOT)), b, c, d];
        TaskGraph::for_owner(&"alice".parse().unwrap(), tasks)
    }

    fn scores(result: &NextUp) -> Vec<(TaskId, u64)> {
        result
            .tasks
            .iter()
            .map(|r| (r.task_id.clone(), r.score))
            .collect()
    }

    #[test]
    fn scenario_with_blocker_done() {
        let graph = scenario(true);
        let result = next_up(&graph, None).unwrap();

        assert_eq!(scores(&result), vec![(id(B), 2), (id(A), 1)]);
        assert_eq!(
            result.stats,
            RankStats {
                scope: 5,
                candidates: 2,
                high_priority: 1,
            }
        );

        let b = &result.tasks[0];
        assert!(b.reasons.is_empty());
        assert_eq!(b.ancestors.len(), 1);
        assert_eq!(b.ancestors[0].name, "Root");
    }

    #[test]
    fn scenario_with_blocker_open() {
        let graph = scenario(false);
        let result = next_up(&graph, None).unwrap();

        // Over the whole forest C is an open leaf too: it scores its own
        // importance (blocks B) and ties with A's parent bonus
        assert_eq!(scores(&result), vec![(id(A), 1), (id(C), 1)]);
    }

    #[test]
    fn scenario_subtree_of_root_with_blocker_open() {
        let graph = scenario(false);
        let result = next_up(&graph, Some(&id(ROOT))).unwrap();

        assert_eq!(scores(&result), vec![(id(A), 1)]);
    }

    #[test]
    fn subtree_includes_root_itself() {
        let graph = scenario(true);
        let result = next_up(&graph, Some(&id(A))).unwrap();

        assert_eq!(scores(&result), vec![(id(A), 1)]);
    }

    #[test]
    fn unknown_root_is_not_found() {
        let graph = scenario(true);
        let result = next_up(&graph, Some(&id(99)));
        assert_eq!(result, Err(RankError::NotFound(id(99))));
    }

    #[test]
    fn empty_snapshot_ranks_nothing() {
        let graph = TaskGraph::for_owner(&"alice".parse().unwrap(), Vec::new());
        let result = next_up(&graph, None).unwrap();
        assert!(result.tasks.is_empty());
        assert_eq!(result.stats, RankStats::default());
    }

    #[test]
    fn blocked_targets_never_reach_the_high_priority_map() {
        let mut report = task(2, "Report", None);
        report.add_blocker(id(1));
        let mut review = task(3, "Review", None);
        review.add_blocker(id(2));
        let tasks = vec![task(1, "Draft", None), report, review];
        let graph = TaskGraph::for_owner(&"alice".parse().unwrap(), tasks);

        let result = next_up(&graph, None).unwrap();

        // Draft blocks Report, but Report is held back by Draft and so is
        // never scored as high priority
        assert_eq!(result.tasks.len(), 1);
        assert_eq!(result.tasks[0].task_id, id(1));
        assert_eq!(result.tasks[0].score, 1);
        assert!(result.tasks[0].reasons.is_empty());
    }

    #[test]
    fn repeated_calls_agree() {
        let graph = scenario(true);
        let first = next_up(&graph, None).unwrap();
        let second = next_up(&graph, None).unwrap();
        assert_eq!(first, second);
    }
}
