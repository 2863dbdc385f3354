//! # Storage Layer
//!
//! Persistence for nextup in git-friendly file formats. The ranking engine
//! never touches this layer; it only sees the [`TaskGraph`](crate::domain::TaskGraph)
//! snapshot built from it.
//!
//! ## Storage Formats
//!
//! | Data | Format | Location |
//! |------|--------|----------|
//! | Tasks | JSONL (one JSON per line) | `.nextup/tasks.jsonl` |
//! | Config | TOML | `.nextup/config.toml` |
//!
//! ## Concurrency Safety
//!
//! - [`TaskStore`] uses file locking (`fs2`) for concurrent access
//! - Every edit goes through [`TaskStore::modify`], which holds the write
//!   lock from the read to the atomic rename
//!
//! ## Key Types
//!
//! - [`Project`] - Entry point for accessing a nextup project
//! - [`TaskStore`] - Read/write tasks as JSONL
//! - [`Config`] - Project and global configuration

mod jsonl;
mod config;
mod project;

pub use jsonl::{remove_tasks, TaskStore};
pub use config::{Config, ConfigError, GlobalConfig, NextUpConfig, OutlineConfig, OutputFormat, ProjectConfig};
pub use project::{Project, ProjectError};
