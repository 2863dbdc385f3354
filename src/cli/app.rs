//! Main CLI application structure

use anyhow::Result;
use clap::{Parser, Subcommand};

use super::output::{Output, OutputFormat};
use super::{query, task};
use crate::domain::OwnerId;
use crate::storage::{Config, Project};

#[derive(Parser)]
#[command(name = "nextup")]
#[command(author, version, about = "Local-first task outliner that ranks what to do next")]
#[command(propagate_version = true)]
pub struct Cli {
    /// Output format (defaults to the global config, then text)
    #[arg(long, short = 'f', global = true)]
    pub format: Option<OutputFormat>,

    /// Enable verbose output for debugging
    #[arg(long, short = 'v', global = true)]
    pub verbose: bool,

    /// Act as this owner
    #[arg(long, global = true, env = "NEXTUP_OWNER")]
    pub owner: Option<String>,

    #[command(subcommand)]
    pub command: Commands,
}

#[derive(Subcommand)]
pub enum Commands {
    /// Initialize a new nextup project
    Init {
        /// Path to initialize (defaults to current directory)
        #[arg(default_value = ".")]
        path: String,
    },

    /// Manage tasks
    #[command(subcommand)]
    Task(task::TaskCommands),

    /// Rank the tasks you can work on right now
    Next {
        /// Only consider this task and its subtasks
        #[arg(long)]
        root: Option<String>,

        /// Number of tasks to show (0 = all; defaults to config)
        #[arg(long, short = 'n')]
        limit: Option<usize>,
    },

    /// Show the task tree
    Outline {
        /// Only show this task's subtree
        #[arg(long)]
        root: Option<String>,

        /// Include completed tasks even if the config hides them
        #[arg(long)]
        all: bool,
    },
}

/// Opens the current project and resolves who we are acting for
pub(super) fn open_project(owner: Option<&str>) -> Result<(Project, OwnerId)> {
    let project = Project::open_current()?;
    let owner = project.config().resolve_owner(owner)?;
    Ok((project, owner))
}

/// Main entry point for the CLI
pub fn run() -> Result<()> {
    let cli = Cli::parse();

    let format = match cli.format {
        Some(format) => format,
        None => Config::load()?.global.default_format.into(),
    };
    let output = Output::new(format, cli.verbose);
    let owner = cli.owner.as_deref();

    output.verbose("nextup starting");

    match cli.command {
        Commands::Init { path } => {
            output.verbose_ctx("init", &format!("Initializing project at: {}", path));
            let mut project = Project::init(&path)?;

            if let Some(owner) = owner {
                let owner: OwnerId = owner.parse()?;
                project.config_mut().project.owner = Some(owner.to_string());
                project.config().save_project()?;
                output.verbose_ctx("init", &format!("Default owner set to: {}", owner));
            }

            output.verbose_ctx(
                "init",
                &format!("Created .nextup directory at: {}", project.data_dir().display()),
            );
            output.success(&format!(
                "Initialized nextup project at {}",
                project.root().display()
            ));
        }

        Commands::Task(cmd) => task::run(cmd, &output, owner)?,

        Commands::Next { root, limit } => {
            output.verbose_ctx("next", &format!("Ranking next-up tasks, root: {:?}", root));
            query::next(&output, owner, root.as_deref(), limit)?
        }

        Commands::Outline { root, all } => {
            output.verbose_ctx("outline", &format!("Building outline, root: {:?}", root));
            query::outline(&output, owner, root.as_deref(), all)?
        }
    }

    output.verbose("Command completed successfully");
    Ok(())
}
