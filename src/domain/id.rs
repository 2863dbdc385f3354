//! Identifiers for tasks and owners
//!
//! ID Format:
//! - Task IDs: `t-{7-char-hash}` (e.g., `t-9d3e5f2`)
//! - Owner IDs: any non-empty name without whitespace (e.g., `alice`)
//!
//! Task hashes are derived from name + creation timestamp, so the same name
//! created twice gets two different IDs. Task IDs order by their hash, which
//! is what the ranking uses to break ties.

use chrono::{DateTime, Utc};
use serde::{Deserialize, Serialize};
use std::fmt;
use std::str::FromStr;
use thiserror::Error;

#[derive(Debug, Error, PartialEq)]
pub enum IdError {
    #[error("Invalid task ID format: expected 't-{{7-char-hash}}', got '{0}'")]
    InvalidTaskId(String),

    #[error("Invalid owner: '{0}' (must be non-empty and contain no whitespace)")]
    InvalidOwner(String),
}

const HASH_LEN: usize = 7;

/// Generates a 7-character hash from name and timestamp
fn generate_hash(name: &str, timestamp: DateTime<Utc>) -> String {
    let input = format!("{}{}", name, timestamp.timestamp_nanos_opt().unwrap_or(0));
    let hash = blake3::hash(input.as_bytes());
    let hex = hash.to_hex();
    hex[..HASH_LEN].to_string()
}

/// Task ID in the format `t-{7-char-hash}`
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct TaskId {
    hash: String,
}

impl TaskId {
    /// Creates a new task ID from name and timestamp
    pub fn new(name: &str, timestamp: DateTime<Utc>) -> Self {
        Self {
            hash: generate_hash(name, timestamp),
        }
    }

    /// Returns the hash portion of the ID
    pub fn hash(&self) -> &str {
        &self.hash
    }
}

impl fmt::Display for TaskId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "t-{}", self.hash)
    }
}

impl FromStr for TaskId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        let hash = s
            .strip_prefix("t-")
            .ok_or_else(|| IdError::InvalidTaskId(s.to_string()))?;

        if hash.len() != HASH_LEN || !hash.chars().all(|c| c.is_ascii_hexdigit()) {
            return Err(IdError::InvalidTaskId(s.to_string()));
        }

        Ok(Self {
            hash: hash.to_ascii_lowercase(),
        })
    }
}

impl TryFrom<String> for TaskId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<TaskId> for String {
    fn from(id: TaskId) -> Self {
        id.to_string()
    }
}

/// The user a task belongs to
///
/// Every task lives in exactly one owner scope; tree and blocking relations
/// never cross owners.
#[derive(Debug, Clone, PartialEq, Eq, Hash, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(try_from = "String", into = "String")]
pub struct OwnerId(String);

impl OwnerId {
    pub fn as_str(&self) -> &str {
        &self.0
    }
}

impl fmt::Display for OwnerId {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(&self.0)
    }
}

impl FromStr for OwnerId {
    type Err = IdError;

    fn from_str(s: &str) -> Result<Self, Self::Err> {
        let s = s.trim();
        if s.is_empty() || s.chars().any(char::is_whitespace) {
            return Err(IdError::InvalidOwner(s.to_string()));
        }
        Ok(Self(s.to_string()))
    }
}

impl TryFrom<String> for OwnerId {
    type Error = IdError;

    fn try_from(value: String) -> Result<Self, Self::Error> {
        value.parse()
    }
}

impl From<OwnerId> for String {
    fn from(id: OwnerId) -> Self {
        id.0
    }
}
