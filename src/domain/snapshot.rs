//! Read-only snapshot of one owner's tasks
//!
//! [`TaskGraph`] is an id-indexed arena: tree edges (parent/children) and
//! blocking edges live in separate adjacency structures keyed by [`TaskId`],
//! so no task ever holds a reference to another.

use std::collections::{HashMap, HashSet};

use super::graph::{BlockGraph, GraphError};
use super::id::{OwnerId, TaskId};
use super::task::Task;

/// A snapshot of every task belonging to one owner
#[derive(Debug)]
pub struct TaskGraph {
    owner: OwnerId,
    tasks: HashMap<TaskId, Task>,
    /// Children per parent, in sibling order
    children: HashMap<TaskId, Vec<TaskId>>,
    /// Top-level tasks, in sibling order
    roots: Vec<TaskId>,
    blocking: BlockGraph,
    /// Tree or blocking references that left the owner's task set
    dropped_refs: usize,
}

impl TaskGraph {
    /// Builds the snapshot for `owner`, ignoring everyone else's tasks
    pub fn for_owner(owner: &OwnerId, tasks: impl IntoIterator<Item = Task>) -> Self {
        let tasks: HashMap<TaskId, Task> = tasks
            .into_iter()
            .filter(|t| &t.owner == owner)
            .map(|t| (t.id.clone(), t))
            .collect();

        let mut dropped_refs = 0;
        let mut children: HashMap<TaskId, Vec<TaskId>> = HashMap::new();
        let mut roots = Vec::new();

        for task in tasks.values() {
            match &task.parent {
                Some(parent) if tasks.contains_key(parent) => {
                    children.entry(parent.clone()).or_default().push(task.id.clone());
                }
                Some(_) => {
                    dropped_refs += 1;
                    roots.push(task.id.clone());
                }
                None => roots.push(task.id.clone()),
            }
        }

        let sibling_order = |a: &TaskId, b: &TaskId| {
            (tasks[a].position, a).cmp(&(tasks[b].position, b))
        };
        for siblings in children.values_mut() {
            siblings.sort_by(sibling_order);
        }
        roots.sort_by(sibling_order);

        let (blocking, skipped) = BlockGraph::from_tasks(tasks.values());
        dropped_refs += skipped;

        Self {
            owner: owner.clone(),
            tasks,
            children,
            roots,
            blocking,
            dropped_refs,
        }
    }

    /// The owner this snapshot was built for
    pub fn owner(&self) -> &OwnerId {
        &self.owner
    }

    pub fn get(&self, id: &TaskId) -> Option<&Task> {
        self.tasks.get(id)
    }

    /// Looks up a task, failing with [`GraphError::TaskNotFound`]
    pub fn require(&self, id: &TaskId) -> Result<&Task, GraphError> {
        self.tasks
            .get(id)
            .ok_or_else(|| GraphError::TaskNotFound(id.clone()))
    }

    pub fn contains(&self, id: &TaskId) -> bool {
        self.tasks.contains_key(id)
    }

    /// Unknown tasks count as not completed
    pub fn is_completed(&self, id: &TaskId) -> bool {
        self.tasks.get(id).map(|t| t.completed).unwrap_or(false)
    }

    pub fn name(&self, id: &TaskId) -> Option<&str> {
        self.tasks.get(id).map(|t| t.name.as_str())
    }

    /// Direct children in sibling order
    pub fn children(&self, id: &TaskId) -> &[TaskId] {
        self.children.get(id).map(Vec::as_slice).unwrap_or(&[])
    }

    /// Top-level tasks in sibling order
    pub fn roots(&self) -> &[TaskId] {
        &self.roots
    }

    /// Parent within this snapshot, if any
    pub fn parent(&self, id: &TaskId) -> Option<&TaskId> {
        self.tasks
            .get(id)
            .and_then(|t| t.parent.as_ref())
            .filter(|p| self.tasks.contains_key(*p))
    }

    /// Ancestors from the parent up to the top of the forest, excluding `id`
    pub fn ancestor_ids(&self, id: &TaskId) -> Vec<TaskId> {
        let mut ancestors = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut current = self.parent(id);

        while let Some(parent) = current {
            // The store keeps the tree acyclic; stop rather than spin if it didn't
            if !seen.insert(parent) {
                break;
            }
            ancestors.push(parent.clone());
            current = self.parent(parent);
        }

        ancestors
    }

    /// Every task below `id`, depth-first in sibling order, excluding `id`
    pub fn descendant_ids(&self, id: &TaskId) -> Vec<TaskId> {
        let mut out = Vec::new();
        let mut seen = HashSet::from([id]);
        let mut stack: Vec<&TaskId> = self.children(id).iter().rev().collect();

        while let Some(next) = stack.pop() {
            if !seen.insert(next) {
                continue;
            }
            out.push(next.clone());
            stack.extend(self.children(next).iter().rev());
        }

        out
    }

    pub fn descendant_count(&self, id: &TaskId) -> usize {
        self.descendant_ids(id).len()
    }

    pub fn completed_descendant_count(&self, id: &TaskId) -> usize {
        self.descendant_ids(id)
            .iter()
            .filter(|d| self.is_completed(d))
            .count()
    }

    /// Tasks that cannot start until `id` is done
    pub fn blocks(&self, id: &TaskId) -> Vec<TaskId> {
        self.blocking.blocks(id)
    }

    /// Tasks that must finish before `id`
    pub fn blocked_by(&self, id: &TaskId) -> Vec<TaskId> {
        self.blocking.blocked_by(id)
    }

    pub fn blocking_count(&self, id: &TaskId) -> usize {
        self.blocking.blocking_count(id)
    }

    pub fn block_graph(&self) -> &BlockGraph {
        &self.blocking
    }

    /// The tasks a ranking call considers
    ///
    /// Without a root this is every task of the owner (ordered by ID); with a
    /// root it is the root followed by all of its descendants.
    pub fn list_scope(&self, root: Option<&TaskId>) -> Result<Vec<TaskId>, GraphError> {
        match root {
            None => {
                let mut ids: Vec<TaskId> = self.tasks.keys().cloned().collect();
                ids.sort();
                Ok(ids)
            }
            Some(root) => {
                self.require(root)?;
                let mut ids = vec![root.clone()];
                ids.extend(self.descendant_ids(root));
                Ok(ids)
            }
        }
    }

    /// Number of parent or blocking references that pointed outside the snapshot
    pub fn dropped_refs(&self) -> usize {
        self.dropped_refs
    }

    pub fn tasks(&self) -> impl Iterator<Item = &Task> {
        self.tasks.values()
    }

    pub fn len(&self) -> usize {
        self.tasks.len()
    }

    pub fn is_empty(&self) -> bool {
        self.tasks.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    fn id(n: u32) -> TaskId {
        format!("t-{:07x}", n).parse().unwrap()
    }

    fn owner(name: &str) -> OwnerId {
        name.parse().unwrap()
    }

    fn task(n: u32, parent: Option<u32>, position: u32) -> Task {
        let mut t = Task::new(id(n), owner("alice"), format!("Task {}", n));
        t.place(parent.map(id), position);
        t
    }

    /// 1
    /// ├── 2
    /// │   └── 4
    /// └── 3
    /// 5
    fn sample() -> TaskGraph {
        let mut t4 = task(4, Some(2), 0);
        t4.complete();
        let mut t5 = task(5, None, 1);
        t5.add_blocker(id(3));
        let tasks = vec![
            task(1, None, 0),
            task(3, Some(1), 1),
            task(2, Some(1), 0),
            t4,
            t5,
        ];
        TaskGraph::for_owner(&owner("alice"), tasks)
    }

    #[test]
    fn children_follow_position() {
        let graph = sample();
        assert_eq!(graph.children(&id(1)), &[id(2), id(3)]);
        assert_eq!(graph.roots(), &[id(1), id(5)]);
        assert!(graph.children(&id(3)).is_empty());
    }

    #[test]
    fn ancestors_walk_up_from_parent() {
        let graph = sample();
        assert_eq!(graph.ancestor_ids(&id(4)), vec![id(2), id(1)]);
        assert!(graph.ancestor_ids(&id(1)).is_empty());
    }

    #[test]
    fn descendant_counts() {
        let graph = sample();
        assert_eq!(graph.descendant_ids(&id(1)), vec![id(2), id(4), id(3)]);
        assert_eq!(graph.descendant_count(&id(1)), 3);
        assert_eq!(graph.completed_descendant_count(&id(1)), 1);
        assert_eq!(graph.descendant_count(&id(4)), 0);
    }

    #[test]
    fn blocking_views() {
        let graph = sample();
        assert_eq!(graph.blocks(&id(3)), vec![id(5)]);
        assert_eq!(graph.blocked_by(&id(5)), vec![id(3)]);
        assert_eq!(graph.blocking_count(&id(3)), 1);
    }

    #[test]
    fn scope_without_root_is_everything() {
        let graph = sample();
        let scope = graph.list_scope(None).unwrap();
        assert_eq!(scope, vec![id(1), id(2), id(3), id(4), id(5)]);
    }

    #[test]
    fn scope_with_root_includes_root() {
        let graph = sample();
        let scope = graph.list_scope(Some(&id(2))).unwrap();
        assert_eq!(scope, vec![id(2), id(4)]);
    }

    #[test]
    fn scope_with_unknown_root_fails() {
        let graph = sample();
        let result = graph.list_scope(Some(&id(42)));
        assert_eq!(result, Err(GraphError::TaskNotFound(id(42))));
    }

    #[test]
    fn other_owners_are_invisible() {
        let mut foreign = Task::new(id(9), owner("bob"), "Bob's task");
        foreign.place(Some(id(1)), 0);
        let mut mine = task(1, None, 0);
        mine.add_blocker(id(9));

        let graph = TaskGraph::for_owner(&owner("alice"), vec![mine, foreign]);

        assert_eq!(graph.len(), 1);
        assert!(!graph.contains(&id(9)));
        assert!(graph.children(&id(1)).is_empty());
        assert!(graph.blocked_by(&id(1)).is_empty());
        assert_eq!(graph.dropped_refs(), 1);
    }

    #[test]
    fn orphaned_task_becomes_root() {
        let graph = TaskGraph::for_owner(&owner("alice"), vec![task(2, Some(77), 0)]);
        assert_eq!(graph.roots(), &[id(2)]);
        assert!(graph.parent(&id(2)).is_none());
        assert_eq!(graph.dropped_refs(), 1);
    }

    #[test]
    fn corrupt_parent_loop_terminates() {
        let tasks = vec![task(1, Some(2), 0), task(2, Some(1), 0)];
        let graph = TaskGraph::for_owner(&owner("alice"), tasks);

        assert_eq!(graph.ancestor_ids(&id(1)), vec![id(2)]);
        assert_eq!(graph.descendant_ids(&id(1)), vec![id(2)]);
    }
}
