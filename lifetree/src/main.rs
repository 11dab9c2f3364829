//! LifeTree - goal tree, focus timer and productivity history.
//!
//! # Commands
//!
//! - `lifetree tree <op>`: Show or edit a goal tree
//! - `lifetree shell`: Interactive tree editing session with undo/redo
//! - `lifetree focus`: Run a focus session
//! - `lifetree history`: Print today's productivity summary
//!
//! # Environment Variables
//!
//! See the [`config`] module for available configuration options.

use std::io::{self, BufRead, Write};
use std::time::Duration;

use anyhow::{anyhow, bail, Context, Result};
use chrono::Local;
use clap::{Parser, Subcommand, ValueEnum};
use tokio::signal;
use tokio::time::MissedTickBehavior;
use tracing::{error, info};
use tracing_subscriber::EnvFilter;

use lifetree::app::{App, Focus};
use lifetree::config::Config;
use lifetree::node::NodeId;
use lifetree::progress::percentage;
use lifetree::session_log::SessionOutcome;
use lifetree::timer::PhaseCompletion;
use lifetree::trackers::activity::format_duration;
use lifetree::tree::TreeStateManager;
use lifetree::types::{NodeStatus, Perspective};

/// LifeTree - goal tree, focus timer and productivity history.
///
/// Keeps goals in a tree with undoable, stat-preserving edits, runs
/// Pomodoro focus sessions, and records daily activity.
#[derive(Parser, Debug)]
#[command(name = "lifetree")]
#[command(author, version, about, long_about = None)]
#[command(after_help = "\
ENVIRONMENT VARIABLES:
    LIFETREE_DATA_DIR              Data directory (default: ~/.lifetree)
    LIFETREE_FOCUS_MINUTES         Focus length (default: 25)
    LIFETREE_SHORT_BREAK_MINUTES   Short break length (default: 5)
    LIFETREE_LONG_BREAK_MINUTES    Long break length (default: 15)
    LIFETREE_LONG_BREAK_INTERVAL   Focus cycles per long break (default: 4)
    LIFETREE_IDLE_THRESHOLD_SECS   Idle seconds before inactive (default: 25)
    LIFETREE_CYCLE_TIME_LIMIT_SECS Productivity cycle length (default: 28800)
    LIFETREE_HISTORY_CAPACITY      History points kept (default: 86400)
    LIFETREE_UNDO_LIMIT            Undo depth (default: 100)
    LIFETREE_AUTOSAVE_SECS         Autosave period in seconds (default: 60)

EXAMPLES:
    # Add a goal and a sub-goal
    lifetree tree add Health
    lifetree tree add \"Sleep by 11\" --parent Health

    # Mark it solved and look at the tree
    lifetree tree status \"Sleep by 11\" solved
    lifetree tree show

    # Focus on a goal for one session
    lifetree focus --node Health
")]
struct Cli {
    /// Operate on the values tree instead of the problems tree.
    #[arg(long, global = true)]
    values: bool,

    #[command(subcommand)]
    command: Command,
}

/// CLI subcommands.
#[derive(Subcommand, Debug)]
enum Command {
    /// Show or edit a goal tree.
    Tree {
        #[command(subcommand)]
        op: TreeOp,
    },

    /// Read tree operations from stdin, one per line.
    ///
    /// Undo and redo work across the lines of one session.
    Shell,

    /// Run one focus session on a 1 Hz heartbeat.
    ///
    /// Stops when the session completes or on Ctrl+C.
    Focus {
        /// Node to credit (uid or label).
        #[arg(short, long)]
        node: Option<String>,

        /// Index of the intention on the node to credit.
        #[arg(short, long, requires = "node")]
        intention: Option<usize>,

        /// Skip the review prompt after the session.
        #[arg(long)]
        no_review: bool,
    },

    /// Print today's productivity summary.
    History,
}

/// Tree operations shared by `tree` and `shell`.
#[derive(Subcommand, Debug)]
enum TreeOp {
    /// Print the tree with completion percentages.
    Show,

    /// Add a node under the root or under `--parent`.
    Add {
        label: String,
        #[arg(short, long)]
        parent: Option<String>,
    },

    /// Rename a node.
    Rename { node: String, label: String },

    /// Set a node's status.
    Status { node: String, status: StatusArg },

    /// Delete nodes with their subtrees.
    Delete {
        #[arg(required = true)]
        nodes: Vec<String>,

        /// Keep children, moving them into the deleted node's place.
        #[arg(long)]
        keep_children: bool,
    },

    /// Move a node under a new parent.
    Move { node: String, parent: String },

    /// Add an intention to a node.
    Intend { node: String, text: String },

    /// Undo the last operation of this session.
    Undo,

    /// Redo the last undone operation of this session.
    Redo,
}

#[derive(ValueEnum, Clone, Copy, Debug)]
enum StatusArg {
    Neutral,
    Solving,
    Solved,
}

impl From<StatusArg> for NodeStatus {
    fn from(arg: StatusArg) -> Self {
        match arg {
            StatusArg::Neutral => NodeStatus::Neutral,
            StatusArg::Solving => NodeStatus::Solving,
            StatusArg::Solved => NodeStatus::Solved,
        }
    }
}

/// One line of `shell` input.
#[derive(Parser, Debug)]
#[command(no_binary_name = true)]
struct ShellLine {
    #[command(subcommand)]
    op: TreeOp,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_logging();

    let config = Config::from_env().context("Failed to load configuration")?;
    let perspective = if cli.values {
        Perspective::Values
    } else {
        Perspective::Problems
    };

    match cli.command {
        Command::Tree { op } => {
            let mut tree = load_tree(&config, perspective);
            run_tree_op(&mut tree, op)
        }
        Command::Shell => run_shell(&config, perspective),
        Command::Focus {
            node,
            intention,
            no_review,
        } => {
            let runtime = tokio::runtime::Builder::new_current_thread()
                .enable_all()
                .build()
                .context("Failed to create tokio runtime")?;

            runtime.block_on(run_focus(config, perspective, node, intention, !no_review))
        }
        Command::History => run_history(config),
    }
}

fn load_tree(config: &Config, perspective: Perspective) -> TreeStateManager {
    TreeStateManager::load(perspective, config.tree_path(perspective), config.undo_limit)
}

/// Resolves a node reference given as a uid or an exact label.
fn resolve(tree: &TreeStateManager, reference: &str) -> Result<NodeId> {
    if let Some(id) = NodeId::parse(reference).filter(|id| tree.node(*id).is_some()) {
        return Ok(id);
    }
    tree.find(reference)
        .ok_or_else(|| anyhow!("no node matches '{reference}'"))
}

fn run_tree_op(tree: &mut TreeStateManager, op: TreeOp) -> Result<()> {
    match op {
        TreeOp::Show => print_tree(tree),
        TreeOp::Add { label, parent } => {
            let id = match parent {
                Some(parent) => {
                    let parent = resolve(tree, &parent)?;
                    tree.add_child(parent, &label)?
                }
                None => tree.add_root(&label, 0.0, 0.0),
            };
            println!("Added '{label}' ({id})");
        }
        TreeOp::Rename { node, label } => {
            let id = resolve(tree, &node)?;
            tree.rename(id, &label)?;
        }
        TreeOp::Status { node, status } => {
            let id = resolve(tree, &node)?;
            tree.set_status(id, status.into())?;
        }
        TreeOp::Delete {
            nodes,
            keep_children,
        } => {
            let ids = nodes
                .iter()
                .map(|n| resolve(tree, n))
                .collect::<Result<Vec<_>>>()?;
            let deleted = if keep_children {
                tree.delete_keep_children(&ids)?
            } else {
                tree.delete_subtree(&ids)?
            };
            println!("Deleted {deleted} node(s)");
        }
        TreeOp::Move { node, parent } => {
            let id = resolve(tree, &node)?;
            let parent = resolve(tree, &parent)?;
            tree.reparent(id, parent)?;
        }
        TreeOp::Intend { node, text } => {
            let id = resolve(tree, &node)?;
            let index = tree.add_intention(id, &text)?;
            println!("Intention {index} added");
        }
        TreeOp::Undo => tree.undo()?,
        TreeOp::Redo => tree.redo()?,
    }
    Ok(())
}

fn print_tree(tree: &TreeStateManager) {
    fn walk(tree: &TreeStateManager, id: NodeId, depth: usize) {
        let Some(node) = tree.node(id) else {
            return;
        };
        let mark = match node.status {
            NodeStatus::Solved => "x",
            NodeStatus::Solving => "~",
            NodeStatus::Neutral => " ",
        };
        let mass = tree.total_mass(id);
        println!(
            "{:indent$}[{mark}] {} {:>5.1}%  {} {}w {}c",
            "",
            node.label,
            percentage(tree.forest(), id),
            format_duration(mass.time),
            mass.words,
            mass.chars,
            indent = depth * 2,
        );
        for child in &node.children {
            walk(tree, *child, depth + 1);
        }
    }

    for root in tree.forest().roots() {
        walk(tree, *root, 0);
    }
}

/// Splits a shell line on whitespace, keeping double-quoted runs together.
fn split_args(line: &str) -> Vec<String> {
    let mut args = Vec::new();
    let mut current = String::new();
    let mut quoted = false;
    for c in line.chars() {
        match c {
            '"' => quoted = !quoted,
            c if c.is_whitespace() && !quoted => {
                if !current.is_empty() {
                    args.push(std::mem::take(&mut current));
                }
            }
            c => current.push(c),
        }
    }
    if !current.is_empty() {
        args.push(current);
    }
    args
}

fn run_shell(config: &Config, perspective: Perspective) -> Result<()> {
    let mut tree = load_tree(config, perspective);
    let stdin = io::stdin();

    prompt()?;
    for line in stdin.lock().lines() {
        let line = line.context("Failed to read stdin")?;
        let args = split_args(&line);
        if matches!(args.first().map(String::as_str), Some("exit" | "quit")) {
            break;
        }
        if !args.is_empty() {
            match ShellLine::try_parse_from(args) {
                Ok(parsed) => {
                    if let Err(e) = run_tree_op(&mut tree, parsed.op) {
                        eprintln!("error: {e:#}");
                    }
                }
                Err(e) => eprintln!("{e}"),
            }
        }
        prompt()?;
    }
    Ok(())
}

fn prompt() -> Result<()> {
    print!("lifetree> ");
    io::stdout().flush().context("Failed to flush stdout")
}

async fn run_focus(
    config: Config,
    perspective: Perspective,
    node: Option<String>,
    intention: Option<usize>,
    review: bool,
) -> Result<()> {
    let mut app = App::open(config).context("Failed to open LifeTree data")?;

    let focus = match node {
        Some(reference) => Some(Focus {
            perspective,
            node: resolve(app.tree(perspective), &reference)?,
            intention,
        }),
        None => None,
    };

    app.start_focus(Local::now());
    info!(
        minutes = app.config().timer.focus_minutes,
        "Focus started, press Ctrl+C to stop"
    );

    let mut interval = tokio::time::interval(Duration::from_secs(1));
    interval.set_missed_tick_behavior(MissedTickBehavior::Skip);
    // The first tick completes immediately.
    interval.tick().await;

    let shutdown = wait_for_shutdown();
    tokio::pin!(shutdown);

    let mut finished = false;
    loop {
        tokio::select! {
            _ = &mut shutdown => {
                info!("Shutdown signal received, stopping focus session");
                app.timer_mut().stop();
                break;
            }
            _ = interval.tick() => {
                // No idle sensor here: the terminal user counts as active.
                let report = app.heartbeat(Local::now(), 0.0, focus);
                let timer = app.timer();
                print!(
                    "\r{} / {:02}:00",
                    timer.time_string(),
                    app.config().timer.focus_minutes
                );
                io::stdout().flush().context("Failed to flush stdout")?;

                if report.completed == Some(PhaseCompletion::Focus) {
                    println!();
                    finished = true;
                    break;
                }
            }
        }
    }

    app.save_all();

    if finished && review {
        if let Some(outcome) = ask_outcome()? {
            app.review_session(outcome, Local::now())
                .context("Failed to save session review")?;
        }
    }
    Ok(())
}

fn ask_outcome() -> Result<Option<SessionOutcome>> {
    print!("How did it go? [s]uccess / [t]ried / [enter] skip: ");
    io::stdout().flush().context("Failed to flush stdout")?;

    let mut answer = String::new();
    io::stdin()
        .read_line(&mut answer)
        .context("Failed to read answer")?;
    match answer.trim().to_lowercase().as_str() {
        "" => Ok(None),
        "s" | "success" => Ok(Some(SessionOutcome::Success)),
        "t" | "tried" => Ok(Some(SessionOutcome::Tried)),
        other => bail!("unknown outcome '{other}'"),
    }
}

fn run_history(config: Config) -> Result<()> {
    let app = App::open(config).context("Failed to open LifeTree data")?;
    let now = Local::now();
    let summary = app.daily_summary(now);
    let today = now.date_naive();

    let sessions = app
        .session_log()
        .entries()
        .into_iter()
        .filter(|e| e.timestamp.date() == today)
        .collect::<Vec<_>>();
    let successes = sessions
        .iter()
        .filter(|e| e.outcome == SessionOutcome::Success)
        .count();

    println!("Date:     {}", summary.date);
    println!("Present:  {}", format_duration(summary.total_seconds));
    println!("Active:   {}", format_duration(summary.active_seconds));
    println!("Words:    {}", summary.words);
    println!("Chars:    {}", summary.chars);
    println!("Samples:  {}", app.history().len());
    println!("Sessions: {} ({successes} successful)", sessions.len());
    Ok(())
}

/// Initializes the logging subsystem.
fn init_logging() {
    let filter = EnvFilter::try_from_default_env().unwrap_or_else(|_| EnvFilter::new("info"));

    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_target(true)
        .with_level(true)
        .with_writer(io::stderr)
        .init();
}

/// Waits for a shutdown signal (SIGINT or SIGTERM).
async fn wait_for_shutdown() {
    let ctrl_c = async {
        if let Err(e) = signal::ctrl_c().await {
            error!(error = %e, "Failed to listen for Ctrl+C");
            std::future::pending::<()>().await;
        }
    };

    #[cfg(unix)]
    let terminate = async {
        match signal::unix::signal(signal::unix::SignalKind::terminate()) {
            Ok(mut sigterm) => {
                sigterm.recv().await;
            }
            Err(e) => {
                error!(error = %e, "Failed to install SIGTERM handler");
                std::future::pending::<()>().await;
            }
        }
    };

    #[cfg(not(unix))]
    let terminate = std::future::pending::<()>();

    tokio::select! {
        _ = ctrl_c => {},
        _ = terminate => {},
    }
}
