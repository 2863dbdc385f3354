//! Blocking graph for tasks
//!
//! Holds the "must finish before" edges between tasks, independent of the
//! parent/child tree. Edges point from the blocker to the blocked task.
//! Unlike the tree, this graph may contain cycles; nothing here walks it
//! transitively, so a cycle only ever shows up through `has_cycle`.

use petgraph::algo::is_cyclic_directed;
use petgraph::graph::{DiGraph, NodeIndex};
use petgraph::Direction;
use std::collections::HashMap;
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

use super::id::TaskId;
use super::task::Task;

#[derive(Debug, Error, PartialEq)]
pub enum GraphError {
    #[error("Task not found: {0}")]
    TaskNotFound(TaskId),

    #[error("A task cannot block itself: {0}")]
    SelfBlock(TaskId),

    #[error("That task does not belong to you: {0}")]
    NotOwned(TaskId),

    #[error("Cannot move {0} under its own subtask {1}")]
    ParentCycle(TaskId, TaskId),

    #[error("Unknown relation '{0}': expected 'blocking' or 'blocked-by'")]
    UnknownRelation(String),
}

/// Which way a blocking edge is read from a task's point of view
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash)]
pub enum Relation {
    /// The task must finish before the other task
    Blocking,
    /// The other task must finish before this one
    BlockedBy,
}

impl Relation {
    /// The same edge seen from the other end
    pub fn inverse(self) -> Self {
        match self {
            Relation::Blocking => Relation::BlockedBy,
            Relation::BlockedBy => Relation::Blocking,
        }
    }

    /// Human-readable label, e.g. for `"A" is now blocked by "B".`
    pub fn label(self) -> &'static str {
        match self {
            Relation::Blocking => "blocking",
            Relation::BlockedBy => "blocked by",
        }
    }

    /// Edge direction to follow from a node in the blocker -> blocked graph
    fn direction(self) -> Direction {
        match self {
            Relation::Blocking => Direction::Outgoing,
            Relation::BlockedBy => Direction::Incoming,
        }
    }

    /// Orients `subject <relation> other` as a `(blocker, blocked)` pair
    pub fn edge<'a>(self, subject: &'a TaskId, other: &'a TaskId) -> (&'a TaskId, &'a TaskId) {
        match self {
            Relation::Blocking => (subject, other),
            Relation::BlockedBy => (other, subject),
        }
    }
}

impl fmt::Display for Relation {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.label())
    }
}

impl FromStr for Relation {
    type Err = GraphError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        match s.trim().to_ascii_lowercase().replace(['_', ' '], "-").as_str() {
            "blocking" | "blocks" => Ok(Relation::Blocking),
            "blocked-by" => Ok(Relation::BlockedBy),
            _ => Err(GraphError::UnknownRelation(s.to_string())),
        }
    }
}

/// A graph of blocking edges between tasks
#[derive(Debug, Default)]
pub struct BlockGraph {
    /// The underlying directed graph (blocker -> blocked)
    graph: DiGraph<TaskId, ()>,

    /// Map from TaskId to node index
    node_map: HashMap<TaskId, NodeIndex>,
}

impl BlockGraph {
    /// Creates an empty blocking graph
    pub fn new() -> Self {
        Self {
            graph: DiGraph::new(),
            node_map: HashMap::new(),
        }
    }

    /// Builds a graph from a collection of tasks
    ///
    /// Edges naming a task outside the collection are skipped; the number of
    /// skipped edges is returned alongside the graph.
    pub fn from_tasks<'a>(tasks: impl IntoIterator<Item = &'a Task>) -> (Self, usize) {
        let mut graph = Self::new();

        // First pass: add all nodes
        let tasks: Vec<_> = tasks.into_iter().collect();
        for task in &tasks {
            graph.add_task(task.id.clone());
        }

        // Second pass: add all edges
        let mut skipped = 0;
        for task in &tasks {
            for blocker in &task.blocked_by {
                if graph.add_edge(blocker, &task.id).is_err() {
                    skipped += 1;
                }
            }
        }

        (graph, skipped)
    }

    /// Adds a task to the graph
    pub fn add_task(&mut self, task_id: TaskId) {
        if !self.node_map.contains_key(&task_id) {
            let idx = self.graph.add_node(task_id.clone());
            self.node_map.insert(task_id, idx);
        }
    }

    /// Adds an edge: `blocker` must finish before `blocked`
    ///
    /// Adding an existing edge is a no-op. Cycles are allowed.
    pub fn add_edge(&mut self, blocker: &TaskId, blocked: &TaskId) -> Result<(), GraphError> {
        if blocker == blocked {
            return Err(GraphError::SelfBlock(blocker.clone()));
        }

        let from = self.index(blocker)?;
        let to = self.index(blocked)?;

        if self.graph.find_edge(from, to).is_none() {
            self.graph.add_edge(from, to, ());
        }

        Ok(())
    }

    fn index(&self, task_id: &TaskId) -> Result<NodeIndex, GraphError> {
        self.node_map
            .get(task_id)
            .copied()
            .ok_or_else(|| GraphError::TaskNotFound(task_id.clone()))
    }

    /// Returns the tasks on the other end of `relation`, ordered by ID
    pub fn related(&self, task_id: &TaskId, relation: Relation) -> Vec<TaskId> {
        let Some(idx) = self.node_map.get(task_id) else {
            return vec![];
        };

        let mut ids: Vec<TaskId> = self
            .graph
            .neighbors_directed(*idx, relation.direction())
            .filter_map(|n| self.graph.node_weight(n).cloned())
            .collect();
        ids.sort();
        ids
    }

    /// Tasks that cannot start until `task_id` is done
    pub fn blocks(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.related(task_id, Relation::Blocking)
    }

    /// Tasks that must finish before `task_id`
    pub fn blocked_by(&self, task_id: &TaskId) -> Vec<TaskId> {
        self.related(task_id, Relation::BlockedBy)
    }

    /// Number of outgoing blocking edges, regardless of target completion
    pub fn blocking_count(&self, task_id: &TaskId) -> usize {
        self.node_map
            .get(task_id)
            .map(|idx| {
                self.graph
                    .neighbors_directed(*idx, Direction::Outgoing)
                    .count()
            })
            .unwrap_or(0)
    }

    /// Returns true if some chain of blocking edges loops back on itself
    pub fn has_cycle(&self) -> bool {
        is_cyclic_directed(&self.graph)
    }

    /// Returns true if the graph contains the task
    pub fn contains(&self, task_id: &TaskId) -> bool {
        self.node_map.contains_key(task_id)
    }

    /// Returns the number of tasks in the graph
    pub fn len(&self) -> usize {
        self.node_map.len()
    }

    /// Returns true if the graph is empty
    pub fn is_empty(&self) -> bool {
        self.node_map.is_empty()
    }

    /// Returns the number of blocking edges
    pub fn edge_count(&self) -> usize {
        self.graph.edge_count()
    }
}
