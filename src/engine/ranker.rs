//! Priority ranking
//!
//! Scores each candidate from the high-priority map:
//!
//! | Contribution | Weight | Reason shown |
//! |--------------|--------|--------------|
//! | Blocks a high-priority task | score x 100 | `blocking "<name>"` |
//! | Sits under a high-priority ancestor | score x 10 | - |
//! | Is high priority itself | score x 1 | - |
//! | Has a parent | +1 | - |
//!
//! Only the blocking contribution explains itself; it is the most actionable
//! driver. Results sort by score descending, then by task ID ascending.

use serde::Serialize;
use std::cmp::Reverse;
use std::collections::BTreeSet;

use super::importance::HighPriority;
use crate::domain::{TaskGraph, TaskId};

const BLOCKING_WEIGHT: u64 = 100;
const ANCESTOR_WEIGHT: u64 = 10;
const SUBTASK_BONUS: u64 = 1;

/// An ancestor shown next to a ranked task
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct AncestorRef {
    pub id: TaskId,
    pub name: String,
}

/// A candidate with its score and explanation
#[derive(Debug, Clone, PartialEq, Eq, Serialize)]
pub struct RankedTask {
    pub task_id: TaskId,
    pub name: String,
    pub score: u64,
    pub reasons: Vec<String>,
    /// Ancestors ordered by name
    pub ancestors: Vec<AncestorRef>,
}

/// Scores a single candidate
pub fn score_candidate(graph: &TaskGraph, id: &TaskId, high_priority: &HighPriority) -> RankedTask {
    let mut score = 0;
    let mut reasons = Vec::new();

    for blocked in graph.blocks(id) {
        if let Some(weight) = high_priority.get(&blocked) {
            score += weight.score * BLOCKING_WEIGHT;
            reasons.push(format!(
                "blocking \"{}\"",
                graph.name(&blocked).unwrap_or_default()
            ));
        }
    }

    let ancestor_ids = graph.ancestor_ids(id);
    for ancestor in &ancestor_ids {
        if let Some(weight) = high_priority.get(ancestor) {
            score += weight.score * ANCESTOR_WEIGHT;
        }
    }

    if let Some(weight) = high_priority.get(id) {
        score += weight.score;
    }

    if graph.parent(id).is_some() {
        score += SUBTASK_BONUS;
    }

    let mut ancestors: Vec<AncestorRef> = ancestor_ids
        .into_iter()
        .map(|ancestor| AncestorRef {
            name: graph.name(&ancestor).unwrap_or_default().to_string(),
            id: ancestor,
        })
        .collect();
    ancestors.sort_by(|a, b| (&a.name, &a.id).cmp(&(&b.name, &b.id)));

    RankedTask {
        task_id: id.clone(),
        name: graph.name(id).unwrap_or_default().to_string(),
        score,
        reasons,
        ancestors,
    }
}

/// Scores and orders every candidate
pub fn rank(
    graph: &TaskGraph,
    candidates: &BTreeSet<TaskId>,
    high_priority: &HighPriority,
) -> Vec<RankedTask> {
    let mut ranked: Vec<RankedTask> = candidates
        .iter()
        .map(|id| score_candidate(graph, id, high_priority))
        .collect();

    ranked.sort_by(|a, b| (Reverse(a.score), &a.task_id).cmp(&(Reverse(b.score), &b.task_id)));
    ranked
}
