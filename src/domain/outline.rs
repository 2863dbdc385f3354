//! Normalized outline view of a task tree
//!
//! Flattens a scope into an id-keyed item table plus the ordered list of
//! top-level ids, which is the shape a tree renderer wants. Blocking links in
//! the outline only mention tasks that are still open.

use chrono::NaiveDate;
use serde::Serialize;
use std::collections::BTreeMap;

use super::graph::GraphError;
use super::id::TaskId;
use super::snapshot::TaskGraph;

/// One row of the outline
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct OutlineItem {
    pub id: TaskId,
    pub name: String,
    pub completed: bool,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,
    #[serde(skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,
    /// Direct children in sibling order
    pub children: Vec<TaskId>,
    pub descendant_count: usize,
    pub completed_descendant_count: usize,
    /// Open tasks this one is blocking
    pub blocking_ids: Vec<TaskId>,
    /// Open tasks this one is blocked by
    pub blocked_by_ids: Vec<TaskId>,
}

/// An outline of either a whole owner's forest or one task's subtree
#[derive(Debug, Clone, PartialEq, Serialize)]
pub struct Outline {
    /// The subtree root, or None for the whole forest
    pub root_id: Option<TaskId>,
    /// Ids shown at the top level (roots of the forest or children of `root_id`)
    pub top: Vec<TaskId>,
    pub items: BTreeMap<TaskId, OutlineItem>,
}

impl Outline {
    /// Builds the outline for `root`'s subtree, or for everything when `root` is None
    pub fn build(graph: &TaskGraph, root: Option<&TaskId>) -> Result<Self, GraphError> {
        let scope = graph.list_scope(root)?;
        let open = |ids: Vec<TaskId>| -> Vec<TaskId> {
            ids.into_iter().filter(|id| !graph.is_completed(id)).collect()
        };

        let mut items = BTreeMap::new();
        for id in scope {
            let task = graph.require(&id)?;
            let descendants = graph.descendant_ids(&id);
            let item = OutlineItem {
                id: id.clone(),
                name: task.name.clone(),
                completed: task.completed,
                description: task.description.clone(),
                due_date: task.due_date,
                children: graph.children(&id).to_vec(),
                descendant_count: descendants.len(),
                completed_descendant_count: descendants
                    .iter()
                    .filter(|d| graph.is_completed(d))
                    .count(),
                blocking_ids: open(graph.blocks(&id)),
                blocked_by_ids: open(graph.blocked_by(&id)),
            };
            items.insert(id, item);
        }

        let top = match root {
            Some(root) => graph.children(root).to_vec(),
            None => graph.roots().to_vec(),
        };

        Ok(Self {
            root_id: root.cloned(),
            top,
            items,
        })
    }

    /// Rows in display order with their depth (top level is 0)
    ///
    /// With `show_completed` off, a completed task is left out together with
    /// everything beneath it.
    pub fn rows(&self, show_completed: bool) -> Vec<(usize, &OutlineItem)> {
        let mut rows = Vec::new();
        let mut stack: Vec<(usize, &TaskId)> = self.top.iter().rev().map(|id| (0, id)).collect();

        while let Some((depth, id)) = stack.pop() {
            let Some(item) = self.items.get(id) else {
                continue;
            };
            if item.completed && !show_completed {
                continue;
            }
            rows.push((depth, item));
            stack.extend(item.children.iter().rev().map(|c| (depth + 1, c)));
        }

        rows
    }

    pub fn len(&self) -> usize {
        self.items.len()
    }

    pub fn is_empty(&self) -> bool {
        self.items.is_empty()
    }
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::domain::{OwnerId, Task};

    fn id(n: u32) -> TaskId {
        format!("t-{:07x}", n).parse().unwrap()
    }

    fn task(n: u32, name: &str, parent: Option<u32>, position: u32) -> Task {
        let owner: OwnerId = "alice".parse().unwrap();
        let mut t = Task::new(id(n), owner, name);
        t.place(parent.map(id), position);
        t
    }

    /// Project (1)
    /// ├── Design (2) [done]
    /// └── Build (3), blocked by Design and by Budget
    /// Budget (4)
    fn sample() -> TaskGraph {
        let mut design = task(2, "Design", Some(1), 0);
        design.complete();
        let mut build = task(3, "Build", Some(1), 1);
        build.add_blocker(id(2));
        build.add_blocker(id(4));
        let tasks = vec![task(1, "Project", None, 0), design, build, task(4, "Budget", None, 1)];
        TaskGraph::for_owner(&"alice".parse().unwrap(), tasks)
    }

    #[test]
    fn whole_forest_outline() {
        let outline = Outline::build(&sample(), None).unwrap();

        assert_eq!(outline.root_id, None);
        assert_eq!(outline.top, vec![id(1), id(4)]);
        assert_eq!(outline.len(), 4);

        let project = outline.items.get(&id(1)).unwrap();
        assert_eq!(project.children, vec![id(2), id(3)]);
        assert_eq!(project.descendant_count, 2);
        assert_eq!(project.completed_descendant_count, 1);
    }

    #[test]
    fn blocking_links_only_mention_open_tasks() {
        let outline = Outline::build(&sample(), None).unwrap();

        let build = outline.items.get(&id(3)).unwrap();
        assert_eq!(build.blocked_by_ids, vec![id(4)]);

        let design = outline.items.get(&id(2)).unwrap();
        assert_eq!(design.blocking_ids, vec![id(3)]);

        let budget = outline.items.get(&id(4)).unwrap();
        assert_eq!(budget.blocking_ids, vec![id(3)]);
    }

    #[test]
    fn subtree_outline() {
        let outline = Outline::build(&sample(), Some(&id(1))).unwrap();

        assert_eq!(outline.root_id, Some(id(1)));
        assert_eq!(outline.top, vec![id(2), id(3)]);
        assert_eq!(outline.len(), 3);
        assert!(outline.items.get(&id(4)).is_none());
    }

    #[test]
    fn rows_hide_completed_on_request() {
        let outline = Outline::build(&sample(), None).unwrap();

        let all: Vec<_> = outline.rows(true).iter().map(|(d, i)| (*d, i.id.clone())).collect();
        assert_eq!(all, vec![(0, id(1)), (1, id(2)), (1, id(3)), (0, id(4))]);

        let open: Vec<_> = outline.rows(false).iter().map(|(_, i)| i.id.clone()).collect();
        assert_eq!(open, vec![id(1), id(3), id(4)]);
    }

    #[test]
    fn items_carry_description_and_due_date() {
        let mut report = task(1, "Report", None, 0);
        report.set_description(Some("Q3 numbers".to_string()));
        report.set_due_date(NaiveDate::from_ymd_opt(2026, 9, 30));
        let graph = TaskGraph::for_owner(&"alice".parse().unwrap(), vec![report]);

        let outline = Outline::build(&graph, None).unwrap();
        let item = &outline.items[&id(1)];
        assert_eq!(item.description.as_deref(), Some("Q3 numbers"));
        assert_eq!(item.due_date, NaiveDate::from_ymd_opt(2026, 9, 30));
    }

    #[test]
    fn unknown_root_fails() {
        let result = Outline::build(&sample(), Some(&id(99)));
        assert_eq!(result, Err(GraphError::TaskNotFound(id(99))));
    }
}
