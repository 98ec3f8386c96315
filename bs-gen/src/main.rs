#![deny(
    // This is overly strict, of course. The intent is somewhat of a "quality seal," less to fix everything, and more to force us to add inline allows, which are even more needlessly verbose, but give us a mechanism to say "we think this is okay, but you might want to take a second look here."
    clippy::nursery,
    clippy::pedantic,
    missing_docs,
    clippy::missing_docs_in_private_items,
)]
//! browsesim command line interface.
//!
//! `bs-gen simulate` fits a hazard model to a browsing log and writes synthetic sessions;
//! `bs-gen tokenize` renders the log as action tokens.  See `--help` on each subcommand.
use std::fs::File;
use std::io::{
    self,
    BufWriter,
    Write,
};
use std::path::PathBuf;

use anyhow::{
    bail,
    Context,
    Result,
};
use bs_core::domain::Domain;
use bs_gen::{
    BrowsingModel,
    FallbackPolicy,
    GenConfig,
    JsonLinesSink,
    SessionSimulator,
    SimulationSink,
    TextSink,
};
use bs_store::tokenize::write_tokens;
use bs_store::LogLoader;
use clap::{
    Args,
    Parser,
    Subcommand,
    ValueEnum,
};
use indicatif::{
    ProgressBar,
    ProgressFinish,
    ProgressStyle,
};
use rand::rngs::StdRng;
use rand::SeedableRng;
use tracing::{
    error,
    info,
    instrument,
};

/// Fit a browsing hazard model to an access log and generate synthetic sessions
#[derive(Parser)]
#[command(author, version, about, long_about = None)]
struct Cli {
    /// What to do.
    #[command(subcommand)]
    command: Command,

    /// Logging verbosity level (`trace`, `debug`, `info`, `warn`, `error`).
    #[arg(short, long, default_value = "info", global = true)]
    verbosity: String,
}

/// `bs-gen` subcommands
#[derive(Subcommand)]
enum Command {
    /// Fit the model and simulate sessions
    Simulate(SimulateArgs),
    /// Render the log as `t<Δ>` / `<type> : <payload>` action tokens
    Tokenize(TokenizeArgs),
}

/// How simulation records are written to stdout
#[derive(Clone, Copy, ValueEnum)]
enum OutputFormat {
    /// `website: <domain> duration: <secs>` lines
    Text,
    /// One JSON object per record
    Json,
}

/// Arguments for `bs-gen simulate`
#[derive(Args)]
struct SimulateArgs {
    /// Headerless `timestamp,info,type` log file.
    #[arg(short, long)]
    input: PathBuf,

    /// Domain to start each session at (defaults to the first domain in the log).
    #[arg(short, long)]
    start: Option<Domain>,

    /// YAML file with `fit` and `simulation` settings; flags below override it.
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Number of domain visits per session.
    #[arg(short = 'n', long)]
    visits: Option<usize>,

    /// Random seed; runs use `seed`, `seed + 1`, ...
    #[arg(long)]
    seed: Option<u64>,

    /// Route-change draws allowed in a single visit.
    #[arg(long)]
    max_route_events: Option<usize>,

    /// Wall-clock budget per session, in seconds.
    #[arg(long)]
    deadline_secs: Option<f64>,

    /// Minimum usable durations needed to fit a domain.
    #[arg(long)]
    min_samples: Option<usize>,

    /// What to do with domains whose fit fails.
    #[arg(long, value_enum)]
    fallback: Option<FallbackPolicy>,

    /// Number of independent sessions to generate.
    #[arg(short, long, default_value_t = 1)]
    runs: usize,

    /// Record format on stdout.
    #[arg(short, long, value_enum, default_value_t = OutputFormat::Text)]
    format: OutputFormat,

    /// Also write the completed trajectories as JSON to this file.
    #[arg(long)]
    trajectory_out: Option<PathBuf>,
}

/// Arguments for `bs-gen tokenize`
#[derive(Args)]
struct TokenizeArgs {
    /// Headerless `timestamp,info,type` log file.
    #[arg(short, long)]
    input: PathBuf,

    /// Write tokens here instead of stdout.
    #[arg(short, long)]
    output: Option<PathBuf>,
}

impl SimulateArgs {
    /// The config file (or defaults) with command-line overrides applied.
    fn resolve_config(&self) -> Result<GenConfig> {
        let mut config = match &self.config {
            Some(path) => GenConfig::from_file(path)?,
            None => GenConfig::default(),
        };

        if let Some(visits) = self.visits {
            config.simulation.visits = visits;
        }
        if let Some(seed) = self.seed {
            config.simulation.seed = Some(seed);
        }
        if let Some(cap) = self.max_route_events {
            config.simulation.max_route_events_per_visit = cap;
        }
        if let Some(secs) = self.deadline_secs {
            config.simulation.deadline_secs = Some(secs);
        }
        if let Some(min_samples) = self.min_samples {
            config.fit.min_samples = min_samples;
        }
        if let Some(fallback) = self.fallback {
            config.fit.fallback = fallback;
        }
        config.validate()?;
        Ok(config)
    }
}

/// Fit the model to the input log and write `args.runs` sessions.
#[instrument(skip_all, fields(input = %args.input.display()))]
fn simulate(args: &SimulateArgs) -> Result<()> {
    let config = args.resolve_config()?;
    let events = LogLoader::load_path(&args.input)?.access_events();
    let Some(first) = events.first() else {
        bail!("no usable access events in {}", args.input.display());
    };
    let start = args.start.clone().unwrap_or_else(|| first.domain.clone());

    let (model, _failures) = BrowsingModel::fit(&events, &config.fit);
    if model.dwell().get(&start).is_none() {
        bail!("start domain {start} has no fitted dwell model");
    }

    let seed = config.simulation.seed.unwrap_or_else(rand::random);
    info!(seed, runs = args.runs, "simulating sessions");

    let simulator = SessionSimulator::new(&model, &config.simulation);
    let stdout = BufWriter::new(io::stdout().lock());
    let mut sink: Box<dyn SimulationSink> = match args.format {
        OutputFormat::Text => Box::new(TextSink::new(stdout)),
        OutputFormat::Json => Box::new(JsonLinesSink::new(stdout)),
    };

    let pb = progress_bar(args.runs)?;
    let mut trajectories = Vec::with_capacity(args.runs);
    let mut failed = 0;
    for (run, offset) in (0..args.runs).zip(0_u64..) {
        let mut rng = StdRng::seed_from_u64(seed.wrapping_add(offset));
        match simulator.run(&start, &mut rng, &mut sink) {
            Ok(trajectory) => trajectories.push(trajectory),
            Err(err) => {
                error!(run, %err, "session aborted");
                failed += 1;
            },
        }
        pb.inc(1);
    }
    pb.finish_using_style();

    if let Some(path) = &args.trajectory_out {
        let file = File::create(path).with_context(|| format!("creating {}", path.display()))?;
        serde_json::to_writer_pretty(BufWriter::new(file), &trajectories)?;
        info!("trajectories written to: {}", path.display());
    }

    if failed > 0 {
        bail!("{failed} of {} sessions failed", args.runs);
    }
    Ok(())
}

/// A progress bar over runs; hidden for a single run.
fn progress_bar(runs: usize) -> Result<ProgressBar> {
    if runs <= 1 {
        return Ok(ProgressBar::hidden());
    }
    Ok(ProgressBar::new(runs as u64)
        .with_style(ProgressStyle::default_bar().template(
            "{spinner:.green} [{elapsed_precise}] [{bar:40.green/blue}] {pos}/{len} sessions ({percent}%) {msg}",
        )?)
        .with_finish(ProgressFinish::AndLeave))
}

/// Write the input log's action tokens.
#[instrument(skip_all, fields(input = %args.input.display()))]
fn tokenize(args: &TokenizeArgs) -> Result<()> {
    let log = LogLoader::load_path(&args.input)?;
    let out: Box<dyn Write> = match &args.output {
        Some(path) => Box::new(BufWriter::new(
            File::create(path).with_context(|| format!("creating {}", path.display()))?,
        )),
        None => Box::new(BufWriter::new(io::stdout().lock())),
    };

    let n = write_tokens(log.records(), out)?;
    info!(tokens = n, "tokenized log");
    Ok(())
}

fn main() -> Result<()> {
    let args = Cli::parse();
    bs_core::logging::setup(&args.verbosity);

    match &args.command {
        Command::Simulate(sim) => simulate(sim),
        Command::Tokenize(tok) => tokenize(tok),
    }
}
