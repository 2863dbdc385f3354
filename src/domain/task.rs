//! Task domain model
//!
//! Tasks form a forest through their `parent` link and are additionally
//! connected by blocking edges. A blocking edge is stored on the task being
//! blocked, in its `blocked_by` set.

use chrono::{DateTime, NaiveDate, Utc};
use serde::{Deserialize, Serialize};
use std::collections::BTreeSet;

use super::id::{OwnerId, TaskId};

/// A task in an owner's outline
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Task {
    /// Unique identifier
    pub id: TaskId,

    /// User this task belongs to
    pub owner: OwnerId,

    /// Human-readable name
    pub name: String,

    /// Whether the task is finished
    #[serde(default)]
    pub completed: bool,

    /// Parent task, or None for a top-level task
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub parent: Option<TaskId>,

    /// Position among siblings (0-based)
    #[serde(default)]
    pub position: u32,

    /// Tasks that must be completed before this one can start
    #[serde(default, skip_serializing_if = "BTreeSet::is_empty")]
    pub blocked_by: BTreeSet<TaskId>,

    /// Optional description
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub description: Option<String>,

    /// Day the task is due, if any
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub due_date: Option<NaiveDate>,

    /// When the task was created
    pub created_at: DateTime<Utc>,

    /// When the task was last updated
    pub updated_at: DateTime<Utc>,

    /// When the task was completed (if completed)
    #[serde(default, skip_serializing_if = "Option::is_none")]
    pub completed_at: Option<DateTime<Utc>>,
}

impl Task {
    /// Creates a new top-level task with the given ID, owner and name
    pub fn new(id: TaskId, owner: OwnerId, name: impl Into<String>) -> Self {
        let now = Utc::now();
        Self {
            id,
            owner,
            name: name.into(),
            completed: false,
            parent: None,
            position: 0,
            blocked_by: BTreeSet::new(),
            description: None,
            due_date: None,
            created_at: now,
            updated_at: now,
            completed_at: None,
        }
    }

    /// Marks the task completed
    pub fn complete(&mut self) {
        if !self.completed {
            let now = Utc::now();
            self.completed = true;
            self.completed_at = Some(now);
            self.updated_at = now;
        }
    }

    /// Marks the task as not completed
    pub fn reopen(&mut self) {
        if self.completed {
            self.completed = false;
            self.completed_at = None;
            self.updated_at = Utc::now();
        }
    }

    /// Sets the name
    pub fn rename(&mut self, name: impl Into<String>) {
        self.name = name.into();
        self.updated_at = Utc::now();
    }

    /// Sets or clears the description; a blank one counts as cleared
    pub fn set_description(&mut self, description: Option<String>) {
        self.description = description.filter(|d| !d.trim().is_empty());
        self.updated_at = Utc::now();
    }

    /// Sets or clears the due date
    pub fn set_due_date(&mut self, due_date: Option<NaiveDate>) {
        self.due_date = due_date;
        self.updated_at = Utc::now();
    }

    /// Places the task under `parent` at `position`
    pub fn place(&mut self, parent: Option<TaskId>, position: u32) {
        if self.parent != parent || self.position != position {
            self.parent = parent;
            self.position = position;
            self.updated_at = Utc::now();
        }
    }

    /// Records that `blocker` must finish before this task. Returns false if
    /// the edge already existed.
    pub fn add_blocker(&mut self, blocker: TaskId) -> bool {
        let added = self.blocked_by.insert(blocker);
        if added {
            self.updated_at = Utc::now();
        }
        added
    }

    /// Removes a blocking edge. Returns false if there was none.
    pub fn remove_blocker(&mut self, blocker: &TaskId) -> bool {
        let removed = self.blocked_by.remove(blocker);
        if removed {
            self.updated_at = Utc::now();
        }
        removed
    }
}
