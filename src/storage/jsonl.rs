//! JSONL storage for tasks
//!
//! Tasks live in `.nextup/tasks.jsonl`, one JSON object per line, shared by
//! every owner of the project. A sidecar `tasks.jsonl.lock` file serializes
//! access: readers hold it shared, and every read-modify-write holds it
//! exclusively from the read to the rename, so two concurrent edits cannot
//! drop each other's changes.

use std::collections::HashMap;
use std::fs::{self, File, OpenOptions};
use std::io::{BufRead, BufReader, BufWriter, Write};
use std::path::{Path, PathBuf};

use anyhow::{Context, Result};
use fs2::FileExt;

use crate::domain::{OwnerId, Task, TaskId};

/// Store for task data in JSONL format
pub struct TaskStore {
    path: PathBuf,
}

impl TaskStore {
    pub fn new(path: impl Into<PathBuf>) -> Self {
        Self { path: path.into() }
    }

    /// The store of the project rooted at `project_root`
    pub fn for_project(project_root: &Path) -> Self {
        Self::new(project_root.join(".nextup").join("tasks.jsonl"))
    }

    pub fn path(&self) -> &Path {
        &self.path
    }

    fn lock_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.lock")
    }

    fn temp_path(&self) -> PathBuf {
        self.path.with_extension("jsonl.tmp")
    }

    fn ensure_dir(&self) -> Result<()> {
        if let Some(parent) = self.path.parent() {
            fs::create_dir_all(parent)
                .with_context(|| format!("Failed to create directory: {}", parent.display()))?;
        }
        Ok(())
    }

    /// Opens the lock file; the lock is released when the handle drops
    fn lock(&self, exclusive: bool) -> Result<File> {
        self.ensure_dir()?;
        let lock_path = self.lock_path();
        let file = OpenOptions::new()
            .read(true)
            .write(true)
            .create(true)
            .truncate(false)
            .open(&lock_path)
            .with_context(|| format!("Failed to open lock file: {}", lock_path.display()))?;

        if exclusive {
            file.lock_exclusive()
                .context("Failed to acquire write lock on task store")?;
        } else {
            file.lock_shared()
                .context("Failed to acquire read lock on task store")?;
        }
        Ok(file)
    }

    /// Parses the store without taking the lock
    fn load(&self) -> Result<HashMap<TaskId, Task>> {
        let file = match File::open(&self.path) {
            Ok(file) => file,
            Err(e) if e.kind() == std::io::ErrorKind::NotFound => return Ok(HashMap::new()),
            Err(e) => {
                return Err(e).with_context(|| {
                    format!("Failed to open task store: {}", self.path.display())
                })
            }
        };

        let mut tasks = HashMap::new();
        for (index, line) in BufReader::new(file).lines().enumerate() {
            let line_num = index + 1;
            let line = line.with_context(|| format!("Failed to read line {}", line_num))?;
            if line.trim().is_empty() {
                continue;
            }

            let task: Task = serde_json::from_str(&line)
                .with_context(|| format!("Failed to parse task at line {}", line_num))?;
            tasks.insert(task.id.clone(), task);
        }

        Ok(tasks)
    }

    /// Rewrites the store through a temp file and rename, without taking the lock
    fn save(&self, tasks: &HashMap<TaskId, Task>) -> Result<()> {
        let temp_path = self.temp_path();
        let file = File::create(&temp_path)
            .with_context(|| format!("Failed to create temp file: {}", temp_path.display()))?;

        let mut sorted: Vec<&Task> = tasks.values().collect();
        sorted.sort_by(|a, b| a.id.cmp(&b.id));

        let mut writer = BufWriter::new(file);
        for task in sorted {
            write_task(&mut writer, task)?;
        }
        writer.flush().context("Failed to flush task store")?;
        drop(writer);

        fs::rename(&temp_path, &self.path).with_context(|| {
            format!(
                "Failed to rename {} to {}",
                temp_path.display(),
                self.path.display()
            )
        })
    }

    /// Reads every task of every owner
    ///
    /// A later line for the same ID replaces an earlier one.
    pub fn read_all(&self) -> Result<HashMap<TaskId, Task>> {
        let _guard = self.lock(false)?;
        self.load()
    }

    /// Reads the tasks belonging to one owner
    pub fn read_for_owner(&self, owner: &OwnerId) -> Result<HashMap<TaskId, Task>> {
        let mut tasks = self.read_all()?;
        tasks.retain(|_, task| &task.owner == owner);
        Ok(tasks)
    }

    /// Runs `edit` on the current tasks and saves the result, all under the
    /// write lock
    ///
    /// Nothing is written when `edit` fails.
    pub fn modify<R>(&self, edit: impl FnOnce(&mut HashMap<TaskId, Task>) -> Result<R>) -> Result<R> {
        let _guard = self.lock(true)?;
        let mut tasks = self.load()?;
        let result = edit(&mut tasks)?;
        self.save(&tasks)?;
        Ok(result)
    }
}

/// Removes tasks by ID and drops any blocking edge that pointed at them
///
/// Returns the number of tasks removed.
pub fn remove_tasks(tasks: &mut HashMap<TaskId, Task>, ids: &[TaskId]) -> usize {
    let before = tasks.len();
    tasks.retain(|id, _| !ids.contains(id));
    let removed = before - tasks.len();

    if removed > 0 {
        for task in tasks.values_mut() {
            for id in ids {
                task.remove_blocker(id);
            }
        }
    }
    removed
}

fn write_task(writer: &mut impl Write, task: &Task) -> Result<()> {
    let line = serde_json::to_string(task).context("Failed to serialize task")?;
    writeln!(writer, "{}", line).context("Failed to write task")
}
