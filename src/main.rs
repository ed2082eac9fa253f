// stackplay: replay call stack and event loop traces from level files

mod output;

use anyhow::{Context, Result};
use clap::{ArgAction, Parser, Subcommand, ValueEnum};
use stackplay::config::ReplayConfig;
use stackplay::level::Level;
use stackplay::mapper::{MappingStrategy, StrategyKind};
use stackplay::replay::{callstack_for_level, replay_callstack_steps, replay_event_loop};
use stackplay::snapshot::Timeline;
use stackplay::validate::{
    check_event_loop_level, check_level, load_callstack_answers, load_event_loop_answers,
    EventLoopCheck,
};
use std::path::{Path, PathBuf};
use tracing_subscriber::EnvFilter;

#[derive(Parser, Debug)]
#[command(
    name = "stackplay",
    version,
    about = "Replay JavaScript call stack and event loop traces",
    subcommand_required = true,
    arg_required_else_help = true
)]
struct Cli {
    /// Increase log verbosity (-v debug, -vv trace)
    #[arg(short, long, global = true, action = ArgAction::Count)]
    verbose: u8,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand, Debug)]
enum Command {
    /// Replay a level and print the snapshot of every step
    Replay(ReplayArgs),
    /// Check an answer file against a level's checkpoints
    Check(CheckArgs),
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum View {
    /// Call stack only, each step replayed from scratch
    Callstack,
    /// Call stack plus microtask and macrotask queues
    EventLoop,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, ValueEnum)]
enum Strategy {
    Strict,
    Flexible,
}

impl From<Strategy> for StrategyKind {
    fn from(strategy: Strategy) -> Self {
        match strategy {
            Strategy::Strict => StrategyKind::Strict,
            Strategy::Flexible => StrategyKind::Flexible,
        }
    }
}

#[derive(Parser, Debug)]
struct ReplayArgs {
    /// Level file (JSON)
    level: PathBuf,

    #[arg(long, value_enum, default_value_t = View::Callstack)]
    mode: View,

    /// Step-to-token strategy (overrides the level's config)
    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Only print this step
    #[arg(long)]
    step: Option<usize>,

    /// Replay config file (JSON); a config embedded in the level wins
    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    /// Emit JSON instead of text
    #[arg(long)]
    json: bool,
}

#[derive(Parser, Debug)]
struct CheckArgs {
    /// Level file (JSON)
    level: PathBuf,

    /// Answers keyed by step index
    #[arg(long, value_name = "PATH")]
    answers: PathBuf,

    #[arg(long, value_enum, default_value_t = View::Callstack)]
    mode: View,

    #[arg(long, value_enum)]
    strategy: Option<Strategy>,

    /// Compare event-loop queues exactly instead of structurally
    #[arg(long)]
    exact: bool,

    #[arg(long, value_name = "PATH")]
    config: Option<PathBuf>,

    #[arg(long)]
    json: bool,
}

fn main() -> Result<()> {
    let cli = Cli::parse();
    init_tracing(cli.verbose);

    match cli.command {
        Command::Replay(args) => run_replay(&args),
        Command::Check(args) => run_check(&args),
    }
}

/// Filter used when `RUST_LOG` is unset
fn default_filter(verbose: u8) -> &'static str {
    match verbose {
        0 => "warn",
        1 => "debug",
        _ => "trace",
    }
}

fn init_tracing(verbose: u8) {
    let filter = EnvFilter::try_from_default_env()
        .unwrap_or_else(|_| EnvFilter::new(default_filter(verbose)));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

fn load(level_path: &Path, config_path: Option<&Path>) -> Result<(Level, ReplayConfig)> {
    let fallback = match config_path {
        Some(path) => ReplayConfig::load(path)
            .with_context(|| format!("loading config {}", path.display()))?,
        None => ReplayConfig::default(),
    };
    let (level, config) = Level::load(level_path, &fallback)
        .with_context(|| format!("loading level {}", level_path.display()))?;

    tracing::info!(
        tokens = level.tokens.len(),
        steps = level.steps.len(),
        checkpoints = level.checkpoints.len(),
        "loaded level"
    );
    Ok((level, config))
}

fn strategy_for(arg: Option<Strategy>, config: &ReplayConfig) -> MappingStrategy<'static> {
    arg.map(StrategyKind::from)
        .unwrap_or(config.strategy)
        .into()
}

fn run_replay(args: &ReplayArgs) -> Result<()> {
    let (level, config) = load(&args.level, args.config.as_deref())?;
    let strategy = strategy_for(args.strategy, &config);

    let steps = match args.mode {
        View::EventLoop => replay_event_loop(&level, &config),
        View::Callstack if level.has_trace() => {
            replay_callstack_steps(&level, strategy, &config, None)
        }
        View::Callstack => {
            // Checkpoint-only level: there are no replay steps, only stacks
            let stacks = callstack_for_level(&level, strategy, &config);
            return output::print_stacks(&level, &stacks, args.step, args.json);
        }
    };

    let queues = args.mode == View::EventLoop;
    let mut timeline = Timeline::from_steps(steps, config.snapshot_memory_limit)?;
    match args.step {
        Some(step) => {
            let step = timeline.seek(step)?;
            output::print_steps(&level, std::slice::from_ref(step), queues, args.json)
        }
        None => output::print_steps(&level, timeline.steps(), queues, args.json),
    }
}

fn run_check(args: &CheckArgs) -> Result<()> {
    let (level, config) = load(&args.level, args.config.as_deref())?;

    let passed = match args.mode {
        View::Callstack => {
            let answers = load_callstack_answers(&args.answers)?;
            let strategy = strategy_for(args.strategy, &config);
            let report = check_level(&level, strategy, &config, &answers);
            output::print_report(&report, args.json)?;
            report.passed()
        }
        View::EventLoop => {
            let answers = load_event_loop_answers(&args.answers)?;
            let check = if args.exact {
                EventLoopCheck::Exact
            } else {
                EventLoopCheck::Structural
            };
            let verdicts = check_event_loop_level(&level, &config, &answers, check);
            output::print_event_loop_verdicts(&verdicts, args.json)?;
            verdicts.iter().all(|v| v.passed)
        }
    };

    if !passed {
        std::process::exit(1);
    }
    Ok(())
}
