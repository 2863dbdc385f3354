//! Property tests for readiness and ranking over random task forests

use std::collections::BTreeSet;

use nextup::domain::{OwnerId, Task, TaskGraph, TaskId};
use nextup::engine::{
    compute_high_priority, filter_candidates, is_candidate, next_up, score_candidate, HighPriority,
    Importance,
};
use proptest::prelude::*;

fn id(n: usize) -> TaskId {
    format!("t-{:07x}", n).parse().unwrap()
}

fn owner() -> OwnerId {
    "alice".parse().unwrap()
}

/// Node `i` may only hang under an earlier node, so parents always form a forest
#[derive(Debug, Clone)]
struct Forest {
    parents: Vec<Option<usize>>,
    completed: Vec<bool>,
    /// (blocker, blocked), cycles allowed
    edges: Vec<(usize, usize)>,
}

impl Forest {
    fn tasks(&self) -> Vec<Task> {
        let mut tasks: Vec<Task> = (0..self.parents.len())
            .map(|i| {
                let mut task = Task::new(id(i), owner(), format!("task {}", i));
                task.place(self.parents[i].map(id), i as u32);
                if self.completed[i] {
                    task.complete();
                }
                task
            })
            .collect();
        for &(blocker, blocked) in &self.edges {
            if blocker != blocked {
                tasks[blocked].add_blocker(id(blocker));
            }
        }
        tasks
    }

    fn graph(&self) -> TaskGraph {
        TaskGraph::for_owner(&owner(), self.tasks())
    }
}

fn forest() -> impl Strategy<Value = Forest> {
    (1usize..24).prop_flat_map(|n| {
        let parents = (0..n)
            .map(|i| {
                if i == 0 {
                    Just(None).boxed()
                } else {
                    proptest::option::of(0..i).boxed()
                }
            })
            .collect::<Vec<_>>();
        (
            parents,
            proptest::collection::vec(any::<bool>(), n),
            proptest::collection::vec((0..n, 0..n), 0..n * 2),
        )
            .prop_map(|(parents, completed, edges)| Forest {
                parents,
                completed,
                edges,
            })
    })
}

fn all_ids(graph: &TaskGraph) -> Vec<TaskId> {
    graph.tasks().map(|t| t.id.clone()).collect()
}

proptest! {
    #[test]
    fn completed_tasks_are_never_candidates(forest in forest()) {
        let graph = forest.graph();
        let ids = all_ids(&graph);
        for candidate in filter_candidates(&graph, &ids) {
            prop_assert!(!graph.is_completed(&candidate));
        }
    }

    #[test]
    fn candidates_have_everything_beneath_and_before_them_done(forest in forest()) {
        let graph = forest.graph();
        let ids = all_ids(&graph);
        for candidate in filter_candidates(&graph, &ids) {
            for child in graph.children(&candidate) {
                prop_assert!(graph.is_completed(child));
            }
            for blocker in graph.blocked_by(&candidate) {
                prop_assert!(graph.is_completed(&blocker));
            }
        }
    }

    #[test]
    fn open_unblocked_leaves_are_candidates(forest in forest()) {
        let graph = forest.graph();
        for task in graph.tasks() {
            let leaf = graph.children(&task.id).is_empty();
            if !task.completed && leaf && graph.blocked_by(&task.id).is_empty() {
                prop_assert!(is_candidate(&graph, &task.id));
            }
        }
    }

    #[test]
    fn ranking_is_deterministic_and_terminates_with_cycles(forest in forest()) {
        let first = next_up(&forest.graph(), None).unwrap();
        let second = next_up(&forest.graph(), None).unwrap();
        prop_assert_eq!(&first, &second);

        for pair in first.tasks.windows(2) {
            prop_assert!(
                pair[0].score > pair[1].score
                    || (pair[0].score == pair[1].score && pair[0].task_id < pair[1].task_id)
            );
        }
    }

    #[test]
    fn subtree_ranking_only_contains_subtree_tasks(forest in forest(), pick in any::<prop::sample::Index>()) {
        let graph = forest.graph();
        let root = id(pick.index(forest.parents.len()));
        let scope: BTreeSet<TaskId> = graph.list_scope(Some(&root)).unwrap().into_iter().collect();

        let result = next_up(&graph, Some(&root)).unwrap();
        for ranked in &result.tasks {
            prop_assert!(scope.contains(&ranked.task_id));
        }
    }

    #[test]
    fn high_priority_only_covers_candidates(forest in forest()) {
        let graph = forest.graph();
        let ids = all_ids(&graph);
        let candidates = filter_candidates(&graph, &ids);
        for key in compute_high_priority(&graph, &candidates).keys() {
            prop_assert!(candidates.contains(key));
        }
    }

    #[test]
    fn blocking_a_high_priority_task_adds_its_weight(
        forest in forest(),
        subject in any::<prop::sample::Index>(),
        target in any::<prop::sample::Index>(),
        weight in 1u64..50,
    ) {
        let n = forest.parents.len();
        let subject = subject.index(n);
        let target = target.index(n);
        prop_assume!(subject != target);
        prop_assume!(!forest.edges.contains(&(subject, target)));

        let mut high_priority = HighPriority::new();
        high_priority.insert(id(target), Importance { score: weight });

        let before = score_candidate(&forest.graph(), &id(subject), &high_priority);

        let mut linked = forest.clone();
        linked.edges.push((subject, target));
        let after = score_candidate(&linked.graph(), &id(subject), &high_priority);

        prop_assert_eq!(after.score, before.score + 100 * weight);
        prop_assert_eq!(after.reasons.len(), before.reasons.len() + 1);
    }
}
