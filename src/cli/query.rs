//! Query commands (next, outline, task show)
//!
//! Each command reads the store once, builds the owner's snapshot and runs
//! against that, so edits made meanwhile never leak into a half-done result.

use std::time::Instant;

use anyhow::Result;

use super::app::open_project;
use super::output::Output;
use super::task::require_owned;
use crate::domain::{Outline, OwnerId, TaskGraph, TaskId};
use crate::engine::{self, RankedTask};
use crate::storage::Project;

/// Resolves an optional scope root for `owner`
///
/// A root owned by somebody else is rejected here, before the engine runs.
/// An unknown root is passed through so the engine reports it as not found.
fn resolve_root(project: &Project, owner: &OwnerId, root: Option<&str>) -> Result<Option<TaskId>> {
    let Some(root) = root else {
        return Ok(None);
    };

    let id: TaskId = root.parse()?;
    let tasks = project.task_store().read_all()?;
    if tasks.contains_key(&id) {
        require_owned(&tasks, owner, &id)?;
    }
    Ok(Some(id))
}

fn log_snapshot(output: &Output, ctx: &str, graph: &TaskGraph) {
    output.verbose_ctx(
        ctx,
        &format!(
            "Snapshot for {}: {} tasks, {} blocking links",
            graph.owner(),
            graph.len(),
            graph.block_graph().edge_count()
        ),
    );
    if graph.dropped_refs() > 0 {
        output.verbose_ctx(
            ctx,
            &format!("Ignored {} link(s) to tasks outside the snapshot", graph.dropped_refs()),
        );
    }
    if graph.block_graph().has_cycle() {
        output.verbose_ctx(ctx, "Blocking links contain a cycle; tasks in it never become ready");
    }
}

fn print_ranking(ranked: &[RankedTask], total: usize) {
    if ranked.is_empty() {
        println!("Nothing to do right now.");
        return;
    }

    println!("Next up ({} of {}):", ranked.len(), total);
    println!("{:>6}  {:<10} TASK", "SCORE", "ID");
    println!("{}", "-".repeat(60));
    for entry in ranked {
        let context = if entry.ancestors.is_empty() {
            String::new()
        } else {
            let names: Vec<_> = entry.ancestors.iter().map(|a| a.name.as_str()).collect();
            format!("  ({})", names.join(", "))
        };
        println!("{:>6}  {:<10} {}{}", entry.score, entry.task_id, entry.name, context);
        for reason in &entry.reasons {
            println!("{:>6}  {:<10}   {}", "", "", reason);
        }
    }
}

fn apply_limit(mut ranked: Vec<RankedTask>, limit: usize) -> Vec<RankedTask> {
    if limit > 0 {
        ranked.truncate(limit);
    }
    ranked
}

/// Show the ranked list of tasks ready to work on
pub fn next(output: &Output, owner: Option<&str>, root: Option<&str>, limit: Option<usize>) -> Result<()> {
    let timer = Instant::now();
    let (project, owner) = open_project(owner)?;
    let root = resolve_root(&project, &owner, root)?;

    let graph = project.snapshot(&owner)?;
    log_snapshot(output, "next", &graph);
    output.verbose_ctx("next", &format!("Snapshot ready ({:?})", timer.elapsed()));

    let result = engine::next_up(&graph, root.as_ref())?;
    output.verbose_ctx(
        "next",
        &format!(
            "scope: {}, candidates: {}, high priority: {} ({:?})",
            result.stats.scope,
            result.stats.candidates,
            result.stats.high_priority,
            timer.elapsed()
        ),
    );

    let limit = limit.unwrap_or(project.config().project.next_up.limit);
    let total = result.tasks.len();
    let ranked = apply_limit(result.tasks, limit);

    if output.is_json() {
        output.data(&ranked);
    } else {
        print_ranking(&ranked, total);
    }

    Ok(())
}

/// Show the task tree for the owner or one subtree
pub fn outline(output: &Output, owner: Option<&str>, root: Option<&str>, all: bool) -> Result<()> {
    let (project, owner) = open_project(owner)?;
    let root = resolve_root(&project, &owner, root)?;

    let graph = project.snapshot(&owner)?;
    log_snapshot(output, "outline", &graph);

    let outline = Outline::build(&graph, root.as_ref())?;
    output.verbose_ctx("outline", &format!("{} item(s)", outline.len()));

    if output.is_json() {
        output.data(&outline);
        return Ok(());
    }

    let show_completed = all || project.config().project.outline.show_completed;
    let rows = outline.rows(show_completed);
    if rows.is_empty() {
        println!("No tasks");
        return Ok(());
    }

    for (depth, item) in rows {
        let check = if item.completed { "[x]" } else { "[ ]" };
        let progress = if item.descendant_count > 0 {
            format!(" ({}/{})", item.completed_descendant_count, item.descendant_count)
        } else {
            String::new()
        };
        let blocked = if item.blocked_by_ids.is_empty() {
            String::new()
        } else {
            format!(" [blocked by {}]", item.blocked_by_ids.len())
        };
        let due = item.due_date.map(|d| format!(" due {}", d)).unwrap_or_default();
        println!(
            "{}{} {}  {}{}{}{}",
            "  ".repeat(depth),
            check,
            item.name,
            item.id,
            progress,
            due,
            blocked
        );
    }

    Ok(())
}

/// Show one task with its links, counts, ancestors and next-up list
pub fn show(output: &Output, owner: Option<&str>, id_str: &str) -> Result<()> {
    let timer = Instant::now();
    let (project, owner) = open_project(owner)?;
    let store = project.task_store();
    let tasks = store.read_all()?;

    let id: TaskId = id_str.parse()?;
    require_owned(&tasks, &owner, &id)?;

    let graph = TaskGraph::for_owner(&owner, tasks.into_values());
    log_snapshot(output, "show", &graph);
    let task = graph.require(&id)?;

    let by_name = |ids: Vec<TaskId>| {
        let mut named: Vec<(String, TaskId)> = ids
            .into_iter()
            .map(|i| (graph.name(&i).unwrap_or_default().to_string(), i))
            .collect();
        named.sort();
        named
    };
    let blocked_by = by_name(graph.blocked_by(&id));
    let blocking = by_name(graph.blocks(&id));
    let ancestors = by_name(graph.ancestor_ids(&id));
    let descendants = graph.descendant_count(&id);
    let completed_descendants = graph.completed_descendant_count(&id);

    // The whole subtree ranking; `limit` only trims `nextup next`
    let next_up = if project.config().project.next_up.visible {
        Some(engine::next_up(&graph, Some(&id))?.tasks)
    } else {
        None
    };
    output.verbose_ctx("show", &format!("Gathered details ({:?})", timer.elapsed()));

    let as_refs = |named: &[(String, TaskId)]| -> Vec<serde_json::Value> {
        named
            .iter()
            .map(|(name, i)| serde_json::json!({ "id": i, "name": name }))
            .collect()
    };

    if output.is_json() {
        output.data(&serde_json::json!({
            "id": task.id,
            "name": task.name,
            "completed": task.completed,
            "description": task.description,
            "due_date": task.due_date,
            "parent": task.parent,
            "created_at": task.created_at,
            "completed_at": task.completed_at,
            "blocked_by": as_refs(&blocked_by),
            "blocking": as_refs(&blocking),
            "ancestors": as_refs(&ancestors),
            "descendant_count": descendants,
            "completed_descendant_count": completed_descendants,
            "next_up": next_up,
        }));
        return Ok(());
    }

    println!("{}: {}", task.id, task.name);
    println!("Status: {}", if task.completed { "completed" } else { "open" });
    if let Some(description) = &task.description {
        println!("Description: {}", description);
    }
    if let Some(due) = task.due_date {
        println!("Due: {}", due);
    }
    if !ancestors.is_empty() {
        let names: Vec<_> = ancestors.iter().map(|(n, _)| n.as_str()).collect();
        println!("Ancestors: {}", names.join(", "));
    }
    if descendants > 0 {
        println!("Subtasks: {}/{} completed", completed_descendants, descendants);
    }

    for (label, named) in [("Blocked by", &blocked_by), ("Blocking", &blocking)] {
        if !named.is_empty() {
            println!();
            println!("{}:", label);
            for (name, i) in named.iter() {
                let done = if graph.is_completed(i) { "[x]" } else { "[ ]" };
                println!("  {} {} {}", done, i, name);
            }
        }
    }

    if let Some(ranked) = next_up {
        println!();
        let total = ranked.len();
        print_ranking(&ranked, total);
    }

    Ok(())
}
