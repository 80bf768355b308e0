//! Command-line surface of `elyria-cp`.

use std::path::PathBuf;

use clap::{ArgAction, Args, Parser, Subcommand};

/// Elyria coherence control plane: node store, entropy gate, Kₜ/Rₜ layer
/// and the governance tools around them.
#[derive(Debug, Parser)]
#[command(name = "elyria-cp", version, propagate_version = true)]
pub struct Cli {
    /// Config file (default: config/default.toml when present).
    #[arg(short = 'f', long = "config", global = true)]
    pub config: Option<String>,

    /// Verbosity (-v warn, -vv info, -vvv debug, -vvvv trace).
    #[arg(short, long, action = ArgAction::Count, global = true)]
    pub verbose: u8,

    #[command(subcommand)]
    pub command: Command,
}

#[derive(Debug, Subcommand)]
pub enum Command {
    /// Show configuration and store health.
    Config,
    /// Record a new node and run it through the entropy gate.
    New(NewArgs),
    /// Print the last recorded node.
    Last {
        /// Print the full JSON line.
        #[arg(long)]
        raw: bool,
    },
    /// List recent nodes (timestamp + preview).
    List {
        #[arg(short = 'n', long = "limit", default_value_t = 10)]
        limit: usize,
    },
    /// Print the full text of the last N nodes.
    Tail {
        #[arg(short = 'n', long = "lines", default_value_t = 5)]
        lines: usize,
    },
    /// Search node texts, newest first.
    Search(SearchArgs),
    /// Export nodes to .jsonl, .json or .csv.
    Export { out: PathBuf },
    /// Import nodes from .jsonl or a .json array.
    Import {
        src: PathBuf,
        /// Replace the store instead of merging into it.
        #[arg(long)]
        replace: bool,
    },
    /// Validate the store and rewrite it without undecodable lines.
    Doctor {
        #[arg(long = "no-repair")]
        no_repair: bool,
    },
    /// Delete every node in the store.
    Clear {
        /// Skip the confirmation prompt.
        #[arg(long)]
        yes: bool,
    },
    /// Totals, recent activity and recurring themes.
    Stats(StatsArgs),
    /// Run the gate and layer by hand.
    Lair {
        #[command(subcommand)]
        action: LairCommand,
    },
    /// Summarize the instrumentation log.
    Metrics,
    /// Trends over the most recent observations.
    Observe,
    /// Verify the instrumentation log against the gate invariants.
    Invariants,
    /// Advisory recommendations from recorded observations.
    Policy,
    /// Dry-run the actions the policy would take.
    Actuate,
    /// Run the bounded reasoning pipeline on a text.
    Reason(ReasonArgs),
    /// Route a text through the thin orchestrator.
    Route(RouteArgs),
    /// Append an opt-in snapshot to the capture log.
    Capture { text: Option<String> },
    /// Print the covenant.
    Covenant,
    /// Push the stress cases through the gate and record them.
    Stress,
    /// Sweep entropy thresholds over the stress cases.
    Calibrate,
    /// Compare two Kₜ traces.
    Compare { before: PathBuf, after: PathBuf },
    /// Interactive session: one control step per stdin line.
    Session,
    /// Recursive self-refinement under the control plane.
    Refine(RefineArgs),
}

#[derive(Debug, Args)]
pub struct NewArgs {
    /// Node text; prompts when omitted.
    pub text: Option<String>,
    #[arg(short = 't', long = "tag")]
    pub tags: Vec<String>,
    /// Metadata `key=value`, repeatable.
    #[arg(short = 'm', long = "meta")]
    pub meta: Vec<String>,
    #[arg(long, default_value = "node")]
    pub kind: String,
    /// Print the stored JSON line.
    #[arg(long)]
    pub echo: bool,
}

#[derive(Debug, Args)]
pub struct SearchArgs {
    pub query: String,
    #[arg(long)]
    pub regex: bool,
    /// Case-sensitive matching.
    #[arg(long)]
    pub case: bool,
    #[arg(short = 'n', long = "limit", default_value_t = 20)]
    pub limit: usize,
}

#[derive(Debug, Args)]
pub struct StatsArgs {
    #[arg(long, default_value_t = 8)]
    pub top: usize,
    /// Hide the N most common raw tokens from the filtered view.
    #[arg(long = "hide-top", default_value_t = 5)]
    pub hide_top: usize,
    #[arg(long = "min-len", default_value_t = 3)]
    pub min_len: usize,
    /// Count raw frequency instead of per-node presence.
    #[arg(long)]
    pub frequency: bool,
    #[arg(long, default_value_t = 14)]
    pub days: u32,
}

#[derive(Debug, Subcommand)]
pub enum LairCommand {
    /// What the gate and layer currently hold.
    Status,
    /// Run one text through the entropy gate.
    Gate(LairRunArgs),
    /// Run one text through the Kₜ/Rₜ layer.
    Layer(LairRunArgs),
    /// Replay recent node texts through the gate and/or layer.
    Replay {
        #[arg(short = 'n', default_value_t = 10)]
        n: usize,
        #[arg(long = "no-gate")]
        no_gate: bool,
        #[arg(long)]
        layer: bool,
    },
}

#[derive(Debug, Args)]
pub struct LairRunArgs {
    pub text: Option<String>,
    /// Do not record a result node.
    #[arg(long = "no-record")]
    pub no_record: bool,
}

#[derive(Debug, Args)]
pub struct ReasonArgs {
    pub text: Option<String>,
    /// Request execution instead of a dry run.
    #[arg(long)]
    pub execute: bool,
    /// Operator approval for execution.
    #[arg(long = "operator-ok")]
    pub operator_ok: bool,
}

#[derive(Debug, Args)]
pub struct RouteArgs {
    pub text: Option<String>,
    #[arg(long = "no-summary")]
    pub no_summary: bool,
    #[arg(long = "summary-words", default_value_t = 12)]
    pub summary_words: usize,
}

#[derive(Debug, Args)]
pub struct RefineArgs {
    pub prompt: String,
    #[arg(short = 'n', long = "iterations", default_value_t = 8)]
    pub iterations: usize,
    /// Disable segmentation enforcement (baseline run).
    #[arg(long)]
    pub unchecked: bool,
    /// Write the Kₜ trace here as JSONL.
    #[arg(long)]
    pub out: Option<PathBuf>,
}

#[cfg(test)]
mod tests {
    use super::*;
    use clap::CommandFactory;

    #[test]
    fn definition_is_consistent() {
        Cli::command().debug_assert();
    }

    #[test]
    fn new_collects_repeatable_flags() {
        let cli = Cli::parse_from(["elyria-cp", "-vv", "new", "hello", "-t", "a", "-t", "b", "-m", "k=v", "--kind", "gate"]);
        assert_eq!(cli.verbose, 2);
        let Command::New(args) = cli.command else { panic!("expected new") };
        assert_eq!(args.text.as_deref(), Some("hello"));
        assert_eq!(args.tags, vec!["a", "b"]);
        assert_eq!(args.meta, vec!["k=v"]);
        assert_eq!(args.kind, "gate");
    }

    #[test]
    fn lair_replay_defaults() {
        let cli = Cli::parse_from(["elyria-cp", "lair", "replay", "--layer"]);
        let Command::Lair { action: LairCommand::Replay { n, no_gate, layer } } = cli.command else {
            panic!("expected lair replay")
        };
        assert_eq!((n, no_gate, layer), (10, false, true));
    }

    #[test]
    fn global_config_flag_after_subcommand() {
        let cli = Cli::parse_from(["elyria-cp", "metrics", "-f", "custom.toml"]);
        assert_eq!(cli.config.as_deref(), Some("custom.toml"));
    }
}
