//! # Command-Line Interface
//!
//! User-facing commands and output formatting. This layer owns tasks on the
//! engine's behalf: it stores them, checks ownership, builds the snapshot and
//! renders the ranking.
//!
//! ## Command Groups
//!
//! | Group | Purpose | Examples |
//! |-------|---------|----------|
//! | Core | Project setup | `init` |
//! | Task | Outline editing | `task add`, `task edit`, `task done`, `task move`, `task link` |
//! | Query | Ranking and views | `next`, `outline`, `task show` |
//!
//! ## Owners
//!
//! Every command acts for exactly one owner, taken from `--owner`,
//! `NEXTUP_OWNER`, the project or global config, or `$USER`. Tasks of other
//! owners are invisible, and naming one is an error.
//!
//! ## Output Formats
//!
//! All commands support `--format`:
//! - `text` (default) - Human-readable output
//! - `json` - Machine-parseable JSON
//!
//! Use `--verbose` (or `-v`) for debug output on stderr:
//! ```bash
//! nextup --verbose next
//! ```

mod app;
mod output;
mod task;
mod query;

pub use app::{Cli, Commands, run};
pub use output::{Output, OutputFormat};
