//! CLI interface for the radiator.
//!
//! Each subcommand is non-interactive: arguments in, structured output out.
//!
//! Commands split into two groups:
//!
//! - `radiator ingest|replay|investigate`: write side, fold webhook events into
//!   the state store, or suppress a failing pipeline.
//! - `radiator status|current|all|investigations`: read side, query the store.
//!
//! Status and diagnostics go to stderr; stdout carries only the requested output.

mod format;

use std::{
    fs,
    io::{self, Read},
    path::{Path, PathBuf},
    process::ExitCode,
};

use clap::{Args, Parser, Subcommand};

use crate::config::Config;
use crate::model::{Event, Investigation, Status};
use crate::radiator::{self, Query, Selection};
use crate::storage::Storage;

use format::{format_outcome, format_view};

/// Exit code for a radiator with at least one unsuppressed failure.
const EXIT_FAILING: u8 = 2;

/// Radiator: reconcile GitLab pipeline and build events into one dashboard.
#[derive(Debug, Parser)]
#[command(name = "radiator", after_long_help = WORKFLOW_HELP)]
pub struct Cli {
    #[command(subcommand)]
    pub command: Command,
}

const WORKFLOW_HELP: &str = r#"Workflow:
  1. Feed webhook payloads as they arrive:
       radiator ingest "$PAYLOAD"
     or replay a relay queue (one JSON event per line):
       radiator replay /var/spool/gitlab/queue.jsonl
  2. Check the radiator (exit 2 while anything watched is failing):
       radiator status --branch master --branch develop
  3. Acknowledge a failure you are looking into:
       radiator investigate --group platform --project web-app --id 1234

Other views:
  radiator current --status running --json
  radiator all"#;

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Apply one webhook event (pipeline or build) to the state store.
    ///
    /// Reads the JSON payload from the argument, or stdin when omitted or `-`.
    /// Unknown event kinds and malformed payloads are rejected without
    /// touching the store.
    Ingest {
        /// The event JSON.
        event: Option<String>,
    },

    /// Apply a queue file of webhook events, one JSON payload per line.
    ///
    /// Stops at the first line that fails to parse; earlier events stay applied.
    Replay {
        /// Path to the queue file.
        queue: PathBuf,
    },

    /// Show failing pipelines on watched branches and tags.
    ///
    /// Exits 2 when at least one unsuppressed failure remains.
    #[command(name = "status")]
    Radiator {
        /// Branch to watch. Can be specified multiple times.
        /// Defaults to the configured branches.
        #[arg(long)]
        branch: Vec<String>,

        /// Don't include tags.
        #[arg(long)]
        no_tags: bool,

        /// Pipeline status to show. Can be specified multiple times.
        /// Defaults to the configured statuses (`failed`).
        #[arg(long)]
        status: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Show pipelines currently in the given statuses, on any ref.
    Current {
        /// Pipeline status to show. Can be specified multiple times.
        /// Defaults to `running` and `pending`.
        #[arg(long)]
        status: Vec<String>,

        #[command(flatten)]
        view: ViewArgs,
    },

    /// Print the raw reconciled state as JSON, unfiltered.
    All,

    /// Suppress a failing pipeline from the radiator.
    Investigate {
        /// Project namespace (group). Use `-` for a project without one.
        #[arg(long)]
        group: String,

        /// Project name.
        #[arg(long)]
        project: String,

        /// Pipeline ID.
        #[arg(long)]
        id: u64,
    },

    /// List recorded investigations.
    Investigations,
}

/// Options shared by the view commands.
#[derive(Debug, Args)]
pub struct ViewArgs {
    /// Regex on `namespace/name`; matching projects are hidden.
    /// Can be specified multiple times. Defaults to the configured filters.
    #[arg(long)]
    project_filter: Vec<String>,

    /// Client refresh interval in seconds, echoed in the output.
    #[arg(long)]
    refresh: Option<u32>,

    /// Print the view as JSON instead of text.
    #[arg(long)]
    json: bool,
}

/// Run a parsed command, returning an error message on failure.
pub fn run(cli: Cli, config: &Config, storage: &Storage) -> Result<ExitCode, String> {
    match cli.command {
        Command::Ingest { event } => cmd_ingest(storage, event.as_deref()),
        Command::Replay { queue } => cmd_replay(storage, &queue),
        Command::Radiator {
            branch,
            no_tags,
            status,
            view,
        } => {
            let selection = Selection::Watched {
                branches: or_default(branch, &config.branches),
                tags: !no_tags,
                statuses: statuses(or_default(status, &config.statuses)),
            };
            cmd_view(config, storage, selection, &view, true)
        }
        Command::Current { status, view } => {
            let selection = Selection::Current {
                statuses: statuses(or_default(status, &config.current_statuses)),
            };
            cmd_view(config, storage, selection, &view, false)
        }
        Command::All => cmd_all(storage),
        Command::Investigate { group, project, id } => {
            cmd_investigate(storage, &group, &project, id)
        }
        Command::Investigations => cmd_investigations(storage),
    }
}

fn or_default(given: Vec<String>, default: &[String]) -> Vec<String> {
    if given.is_empty() {
        default.to_vec()
    } else {
        given
    }
}

fn statuses(names: Vec<String>) -> Vec<Status> {
    names.into_iter().map(Status::from).collect()
}

fn cmd_ingest(storage: &Storage, event: Option<&str>) -> Result<ExitCode, String> {
    let payload = match event {
        Some(json) if json != "-" => json.to_string(),
        _ => {
            let mut buf = String::new();
            io::stdin()
                .read_to_string(&mut buf)
                .map_err(|e| format!("failed to read stdin: {e}"))?;
            buf
        }
    };

    let event = Event::from_json(&payload).map_err(|e| format!("rejected event: {e}"))?;
    let outcome = storage
        .apply_event(&event)
        .map_err(|e| format!("failed to apply event: {e}"))?;

    eprintln!("{}", format_outcome(&event, outcome));
    Ok(ExitCode::SUCCESS)
}

fn cmd_replay(storage: &Storage, queue: &Path) -> Result<ExitCode, String> {
    let contents = fs::read_to_string(queue)
        .map_err(|e| format!("failed to read {}: {e}", queue.display()))?;

    let mut applied = 0;
    let mut ignored = 0;
    for (index, line) in contents.lines().enumerate() {
        if line.trim().is_empty() {
            continue;
        }
        let event = Event::from_json(line)
            .map_err(|e| format!("{}:{}: rejected event: {e}", queue.display(), index + 1))?;
        let outcome = storage
            .apply_event(&event)
            .map_err(|e| format!("{}:{}: failed to apply event: {e}", queue.display(), index + 1))?;
        if outcome.changed() {
            applied += 1;
        } else {
            ignored += 1;
        }
    }

    eprintln!("Replayed {} events ({applied} applied, {ignored} ignored)", applied + ignored);
    Ok(ExitCode::SUCCESS)
}

/// Runs a view query. When `gate` is set, failures turn the exit code non-zero.
fn cmd_view(
    config: &Config,
    storage: &Storage,
    selection: Selection,
    args: &ViewArgs,
    gate: bool,
) -> Result<ExitCode, String> {
    let patterns = or_default(args.project_filter.clone(), &config.project_filters);
    let query = Query::new(selection, args.refresh.unwrap_or(config.refresh))
        .excluding(&patterns)
        .map_err(|e| e.to_string())?;

    let state = storage
        .load_state()
        .map_err(|e| format!("failed to load state: {e}"))?;
    let investigations = storage
        .load_investigations()
        .map_err(|e| format!("failed to load investigations: {e}"))?;

    let view = radiator::query(&state, &investigations, &query);

    if args.json {
        let json = serde_json::to_string_pretty(&view)
            .map_err(|e| format!("failed to serialize view: {e}"))?;
        println!("{json}");
    } else {
        print!("{}", format_view(&view));
    }

    if gate && !view.success {
        return Ok(ExitCode::from(EXIT_FAILING));
    }
    Ok(ExitCode::SUCCESS)
}

fn cmd_all(storage: &Storage) -> Result<ExitCode, String> {
    let state = storage
        .load_state()
        .map_err(|e| format!("failed to load state: {e}"))?;
    let json = state
        .to_json()
        .map_err(|e| format!("failed to serialize state: {e}"))?;
    println!("{json}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_investigate(
    storage: &Storage,
    group: &str,
    project: &str,
    id: u64,
) -> Result<ExitCode, String> {
    let investigation =
        Investigation::new(group, project, id).map_err(|e| format!("invalid investigation: {e}"))?;
    storage
        .record_investigation(&investigation)
        .map_err(|e| format!("failed to record investigation: {e}"))?;

    eprintln!("Investigating {group}/{project} #{id}");
    Ok(ExitCode::SUCCESS)
}

fn cmd_investigations(storage: &Storage) -> Result<ExitCode, String> {
    let lines = storage
        .investigation_lines()
        .map_err(|e| format!("failed to read investigations: {e}"))?;

    if lines.is_empty() {
        eprintln!("No investigations");
    }
    for line in &lines {
        println!("{line}");
    }
    Ok(ExitCode::SUCCESS)
}
