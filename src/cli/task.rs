//! Task CLI commands

use std::collections::HashMap;

use anyhow::Result;
use chrono::{DateTime, NaiveDate, Utc};
use clap::Subcommand;

use super::app::open_project;
use super::output::Output;
use super::query;
use crate::domain::{GraphError, OwnerId, Relation, Task, TaskGraph, TaskId};
use crate::storage::remove_tasks;

#[derive(Subcommand)]
pub enum TaskCommands {
    /// Add a task, at the top level or under a parent
    ///
    /// Examples:
    ///   nextup task add "Plan trip"
    ///   nextup task add "Book flights" --parent t-1234567
    Add {
        /// Task name
        name: String,

        /// Parent task ID
        #[arg(long)]
        parent: Option<String>,

        /// Optional description
        #[arg(long)]
        description: Option<String>,
    },

    /// List all tasks
    List,

    /// Show task details, its links and its own next-up list
    Show {
        /// Task ID
        id: String,
    },

    /// Mark task as completed
    Done {
        /// Task ID
        id: String,
    },

    /// Mark a completed task as open again
    Reopen {
        /// Task ID
        id: String,
    },

    /// Rename a task
    Rename {
        /// Task ID
        id: String,

        /// New name
        name: String,
    },

    /// Change a task's description or due date
    ///
    /// Examples:
    ///   nextup task edit t-1234567 --description "Window seat"
    ///   nextup task edit t-1234567 --due 2026-05-01
    ///   nextup task edit t-1234567 --clear-due
    Edit {
        /// Task ID
        id: String,

        /// New description (an empty string clears it)
        #[arg(long)]
        description: Option<String>,

        /// Due date as YYYY-MM-DD
        #[arg(long, conflicts_with = "clear_due")]
        due: Option<NaiveDate>,

        /// Remove the due date
        #[arg(long)]
        clear_due: bool,
    },

    /// Move a task under a new parent and/or to a new position
    Move {
        /// Task ID
        id: String,

        /// New parent ID, or "root" for the top level (defaults to the current parent)
        #[arg(long)]
        parent: Option<String>,

        /// Position among the new siblings (0-based, defaults to last)
        #[arg(long)]
        position: Option<u32>,
    },

    /// Delete a task together with its subtasks
    Remove {
        /// Task ID
        id: String,
    },

    /// Add a blocking link between two tasks
    ///
    /// Examples:
    ///   nextup task link t-1234567 blocking t-89abcde
    ///   nextup task link t-1234567 blocked-by t-89abcde
    Link {
        /// Task ID
        id: String,

        /// blocking | blocked-by
        relation: Relation,

        /// The other task ID
        other: String,
    },

    /// Remove a blocking link between two tasks
    Unlink {
        /// Task ID
        id: String,

        /// blocking | blocked-by
        relation: Relation,

        /// The other task ID
        other: String,
    },

    /// Delete the completed direct subtasks of a task
    ClearCompleted {
        /// Task ID
        id: String,
    },
}

pub fn run(cmd: TaskCommands, output: &Output, owner: Option<&str>) -> Result<()> {
    match cmd {
        TaskCommands::Add {
            name,
            parent,
            description,
        } => add_task(output, owner, &name, parent.as_deref(), description),
        TaskCommands::List => list_tasks(output, owner),
        TaskCommands::Show { id } => query::show(output, owner, &id),
        TaskCommands::Done { id } => set_completed(output, owner, &id, true),
        TaskCommands::Reopen { id } => set_completed(output, owner, &id, false),
        TaskCommands::Rename { id, name } => rename_task(output, owner, &id, &name),
        TaskCommands::Edit {
            id,
            description,
            due,
            clear_due,
        } => {
            let due = if clear_due { Some(None) } else { due.map(Some) };
            edit_task(output, owner, &id, description, due)
        }
        TaskCommands::Move {
            id,
            parent,
            position,
        } => move_task(output, owner, &id, parent.as_deref(), position),
        TaskCommands::Remove { id } => remove_task(output, owner, &id),
        TaskCommands::Link {
            id,
            relation,
            other,
        } => link_tasks(output, owner, &id, relation, &other, true),
        TaskCommands::Unlink {
            id,
            relation,
            other,
        } => link_tasks(output, owner, &id, relation, &other, false),
        TaskCommands::ClearCompleted { id } => clear_completed(output, owner, &id),
    }
}

/// Looks up a task, telling "missing" apart from "someone else's"
pub(super) fn require_owned<'a>(
    tasks: &'a HashMap<TaskId, Task>,
    owner: &OwnerId,
    id: &TaskId,
) -> Result<&'a Task, GraphError> {
    match tasks.get(id) {
        Some(task) if &task.owner == owner => Ok(task),
        Some(_) => Err(GraphError::NotOwned(id.clone())),
        None => Err(GraphError::TaskNotFound(id.clone())),
    }
}

/// Mutable form of [`require_owned`]
fn owned_mut<'a>(
    tasks: &'a mut HashMap<TaskId, Task>,
    owner: &OwnerId,
    id: &TaskId,
) -> Result<&'a mut Task, GraphError> {
    match tasks.get_mut(id) {
        Some(task) if &task.owner == owner => Ok(task),
        Some(_) => Err(GraphError::NotOwned(id.clone())),
        None => Err(GraphError::TaskNotFound(id.clone())),
    }
}

/// An ID for `name` that no stored task uses yet, for any owner
fn fresh_id(tasks: &HashMap<TaskId, Task>, name: &str, now: DateTime<Utc>) -> TaskId {
    let mut id = TaskId::new(name, now);
    let mut attempt = 0u32;
    while tasks.contains_key(&id) {
        attempt += 1;
        id = TaskId::new(&format!("{}#{}", name, attempt), now);
    }
    id
}

/// Next free sibling position under `parent`
fn next_position(tasks: &HashMap<TaskId, Task>, owner: &OwnerId, parent: Option<&TaskId>) -> u32 {
    tasks
        .values()
        .filter(|t| &t.owner == owner && t.parent.as_ref() == parent)
        .map(|t| t.position + 1)
        .max()
        .unwrap_or(0)
}

fn add_task(
    output: &Output,
    owner: Option<&str>,
    name: &str,
    parent_str: Option<&str>,
    description: Option<String>,
) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let parent = parent_str.map(str::parse::<TaskId>).transpose()?;

    let task = project.task_store().modify(|tasks| {
        if let Some(parent) = &parent {
            require_owned(tasks, &owner, parent)?;
        }

        let mut task = Task::new(fresh_id(tasks, name, Utc::now()), owner.clone(), name);
        task.place(parent.clone(), next_position(tasks, &owner, parent.as_ref()));
        if description.is_some() {
            task.set_description(description);
        }
        tasks.insert(task.id.clone(), task.clone());
        Ok(task)
    })?;
    output.verbose_ctx("task", &format!("Added {} at position {}", task.id, task.position));

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "name": task.name,
            "parent": task.parent,
            "owner": task.owner,
        }));
    } else {
        output.success(&format!("Created task: {} - {}", task.id, task.name));
    }

    Ok(())
}

fn list_tasks(output: &Output, owner: Option<&str>) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let tasks = project.task_store().read_for_owner(&owner)?;

    let mut sorted: Vec<_> = tasks.values().collect();
    sorted.sort_by(|a, b| a.id.cmp(&b.id));

    if output.is_json() {
        let items: Vec<_> = sorted
            .iter()
            .map(|t| {
                serde_json::json!({
                    "id": t.id,
                    "name": t.name,
                    "completed": t.completed,
                    "parent": t.parent,
                    "blocked_by": t.blocked_by,
                })
            })
            .collect();
        output.data(&items);
    } else if sorted.is_empty() {
        println!("No tasks");
    } else {
        println!("{:<10} {:<6} {:<10} NAME", "ID", "DONE", "PARENT");
        println!("{}", "-".repeat(60));
        for task in sorted {
            let parent = task.parent.as_ref().map(|p| p.to_string()).unwrap_or_default();
            let done = if task.completed { "[x]" } else { "[ ]" };
            println!("{:<10} {:<6} {:<10} {}", task.id, done, parent, task.name);
        }
    }

    Ok(())
}

fn set_completed(output: &Output, owner: Option<&str>, id_str: &str, completed: bool) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;

    let task = project.task_store().modify(|tasks| {
        let task = owned_mut(tasks, &owner, &id)?;
        if completed {
            task.complete();
        } else {
            task.reopen();
        }
        Ok(task.clone())
    })?;

    let verb = if completed { "Completed" } else { "Reopened" };
    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "completed": task.completed,
            "completed_at": task.completed_at,
        }));
    } else {
        output.success(&format!("{} task: {} - {}", verb, task.id, task.name));
    }

    Ok(())
}

fn rename_task(output: &Output, owner: Option<&str>, id_str: &str, name: &str) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;

    let task = project.task_store().modify(|tasks| {
        let task = owned_mut(tasks, &owner, &id)?;
        task.rename(name);
        Ok(task.clone())
    })?;

    output.success(&format!("Renamed task: {} - {}", task.id, task.name));
    Ok(())
}

/// `due` is None to leave the date alone, `Some(None)` to clear it
fn edit_task(
    output: &Output,
    owner: Option<&str>,
    id_str: &str,
    description: Option<String>,
    due: Option<Option<NaiveDate>>,
) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;

    let task = project.task_store().modify(|tasks| {
        let task = owned_mut(tasks, &owner, &id)?;
        if description.is_some() {
            task.set_description(description);
        }
        if let Some(due) = due {
            task.set_due_date(due);
        }
        Ok(task.clone())
    })?;

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "description": task.description,
            "due_date": task.due_date,
        }));
    } else {
        output.success(&format!("Updated task: {} - {}", task.id, task.name));
    }

    Ok(())
}

fn move_task(
    output: &Output,
    owner: Option<&str>,
    id_str: &str,
    parent_str: Option<&str>,
    position: Option<u32>,
) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;
    let requested_parent = match parent_str {
        None => None,
        Some("root") => Some(None),
        Some(p) => Some(Some(p.parse::<TaskId>()?)),
    };

    let (new_parent, slot, name) = project.task_store().modify(|tasks| {
        let moving = require_owned(tasks, &owner, &id)?;
        let current_parent = moving.parent.clone();
        let name = moving.name.clone();

        let new_parent = match requested_parent {
            None => current_parent.clone(),
            Some(parent) => parent,
        };
        if let Some(parent) = &new_parent {
            require_owned(tasks, &owner, parent)?;
            let graph = TaskGraph::for_owner(&owner, tasks.values().cloned());
            if parent == &id || graph.descendant_ids(&id).contains(parent) {
                return Err(GraphError::ParentCycle(id.clone(), parent.clone()).into());
            }
        }

        let mut order = sibling_order(tasks, &owner, new_parent.as_ref(), Some(&id));
        let slot = position.map(|p| p as usize).unwrap_or(order.len()).min(order.len());
        order.insert(slot, id.clone());
        renumber(tasks, new_parent.as_ref(), &order);

        // Close the gap left behind under the old parent
        if current_parent != new_parent {
            let old = sibling_order(tasks, &owner, current_parent.as_ref(), None);
            renumber(tasks, current_parent.as_ref(), &old);
        }

        Ok((new_parent, slot, name))
    })?;
    output.verbose_ctx("task", &format!("Moved {} to slot {} of {:?}", id, slot, new_parent));

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "parent": new_parent,
            "position": slot,
        }));
    } else {
        output.success(&format!("Moved task: {} - {}", id, name));
    }

    Ok(())
}

/// Children of `parent` in current sibling order, leaving out `skip`
fn sibling_order(
    tasks: &HashMap<TaskId, Task>,
    owner: &OwnerId,
    parent: Option<&TaskId>,
    skip: Option<&TaskId>,
) -> Vec<TaskId> {
    let mut siblings: Vec<(u32, &TaskId)> = tasks
        .values()
        .filter(|t| &t.owner == owner && t.parent.as_ref() == parent && Some(&t.id) != skip)
        .map(|t| (t.position, &t.id))
        .collect();
    siblings.sort();
    siblings.into_iter().map(|(_, id)| id.clone()).collect()
}

fn renumber(tasks: &mut HashMap<TaskId, Task>, parent: Option<&TaskId>, order: &[TaskId]) {
    for (index, id) in order.iter().enumerate() {
        if let Some(task) = tasks.get_mut(id) {
            task.place(parent.cloned(), index as u32);
        }
    }
}

fn remove_task(output: &Output, owner: Option<&str>, id_str: &str) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;

    let (name, removed) = project.task_store().modify(|tasks| {
        let name = require_owned(tasks, &owner, &id)?.name.clone();

        let graph = TaskGraph::for_owner(&owner, tasks.values().cloned());
        let mut doomed = vec![id.clone()];
        doomed.extend(graph.descendant_ids(&id));

        Ok((name, remove_tasks(tasks, &doomed)))
    })?;
    output.verbose_ctx("task", &format!("Removed {} task(s)", removed));

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "removed": removed,
        }));
    } else {
        output.success(&format!("\"{}\" deleted.", name));
    }

    Ok(())
}

fn link_tasks(
    output: &Output,
    owner: Option<&str>,
    id_str: &str,
    relation: Relation,
    other_str: &str,
    add: bool,
) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;
    let other: TaskId = other_str.parse()?;
    let (blocker, blocked) = relation.edge(&id, &other);

    let (subject_name, other_name, changed) = project.task_store().modify(|tasks| {
        let subject_name = require_owned(tasks, &owner, &id)?.name.clone();
        let other_name = require_owned(tasks, &owner, &other)?.name.clone();
        if id == other {
            return Err(GraphError::SelfBlock(id.clone()).into());
        }

        let target = owned_mut(tasks, &owner, blocked)?;
        let changed = if add {
            target.add_blocker(blocker.clone())
        } else {
            target.remove_blocker(blocker)
        };
        Ok((subject_name, other_name, changed))
    })?;

    if !changed {
        output.verbose_ctx("task", "Link already in the requested state");
    }

    let text = if add {
        format!("\"{}\" is now {} \"{}\".", subject_name, relation.label(), other_name)
    } else {
        format!("\"{}\" is no longer {} \"{}\".", subject_name, relation.label(), other_name)
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "blocker": blocker,
            "blocked": blocked,
            "linked": add,
            "changed": changed,
            "text": text,
        }));
    } else {
        output.success(&text);
    }

    Ok(())
}

fn clear_completed(output: &Output, owner: Option<&str>, id_str: &str) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let id: TaskId = id_str.parse()?;

    let removed = project.task_store().modify(|tasks| {
        require_owned(tasks, &owner, &id)?;

        let graph = TaskGraph::for_owner(&owner, tasks.values().cloned());
        let mut doomed = Vec::new();
        for child in graph.children(&id) {
            if graph.is_completed(child) {
                doomed.push(child.clone());
                doomed.extend(graph.descendant_ids(child));
            }
        }

        Ok(remove_tasks(tasks, &doomed))
    })?;
    output.verbose_ctx("task", &format!("Removed {} completed task(s)", removed));

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": id,
            "removed": removed,
        }));
    } else {
        output.success("All completed subtasks deleted.");
    }

    Ok(())
}
