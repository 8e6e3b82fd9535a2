use anyhow::{bail, Context, Result};
use clap::error::ErrorKind;
use clap::{CommandFactory, Parser, Subcommand};
use std::env;
use std::ffi::OsString;
use std::fs;
use std::io::{self, BufRead, Write};
use std::path::{Path, PathBuf};
use tracing::{debug, info, warn};
use waypoint_nav::api::{format_fix, InstructionFormatter, OutputFormat};
use waypoint_nav::hardware::{GpsdSource, PositioningSource};
use waypoint_nav::navigation::{LinkConfirmed, LinkProbe, NavigationSession, TickOutcome};
use waypoint_nav::processing::{read_waypoints, ConcordeSolver, PositioningAdapter, TourPlanner};
use waypoint_nav::utils::{
    expand_home, init_logging, Clock, ConfigurationManager, InstructionLog, NavigatorConfig,
    SystemClock,
};

#[derive(Debug, Parser, PartialEq)]
#[command(name = "waypoint-nav")]
#[command(about = "Autonomous waypoint navigation for a mobile platform", long_about = None)]
#[command(disable_help_subcommand = true)]
#[command(after_help = "Examples:\n  waypoint-nav run\n  waypoint-nav solve --config navigator.json")]
struct Cli {
    #[command(subcommand)]
    command: Option<Command>,

    /// JSON configuration file
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    /// Instruction output format: json, text or csv
    #[arg(long, global = true, default_value = "json")]
    format: OutputFormat,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Subcommand)]
enum Command {
    /// Poll the GPS receiver until a fix is confirmed
    #[command(name = "gpspoll")]
    GpsPoll,
    /// Guide the platform around a solved waypoint tour and log instructions
    Run,
    /// Solve every CSV waypoint file in a directory with Concorde
    Solve,
    /// Show this help message and exit
    Help,
}

impl Cli {
    fn help() -> Self {
        Self {
            command: Some(Command::Help),
            config: None,
            format: OutputFormat::default(),
        }
    }
}

/// Parse the command line; an unusable one falls back to help
fn parse_args<I, T>(args: I) -> Cli
where
    I: IntoIterator<Item = T>,
    T: Into<OsString> + Clone,
{
    match Cli::try_parse_from(args) {
        Ok(cli) if cli.command.is_some() => cli,
        Ok(_) => Cli::help(),
        Err(e) => {
            if !matches!(e.kind(), ErrorKind::DisplayHelp | ErrorKind::DisplayVersion) {
                eprintln!("{}", e.kind());
            }
            Cli::help()
        }
    }
}

/// Operator prompts on stderr, answers from stdin
struct Console<R: BufRead, W: Write> {
    input: R,
    output: W,
}

impl<R: BufRead, W: Write> Console<R, W> {
    fn new(input: R, output: W) -> Self {
        Self { input, output }
    }

    /// Trimmed answer, or `None` once input is exhausted
    fn prompt(&mut self, message: &str) -> Result<Option<String>> {
        write!(self.output, "{}", message)?;
        self.output.flush()?;

        let mut line = String::new();
        if self.input.read_line(&mut line)? == 0 {
            return Ok(None);
        }
        Ok(Some(line.trim().to_string()))
    }

    /// Wait for Enter; false means input is exhausted and the operator is gone
    fn retry(&mut self, message: &str) -> Result<bool> {
        let answer = self.prompt(&format!("{} Press Enter to retry.", message))?;
        writeln!(self.output)?;
        Ok(answer.is_some())
    }
}

fn open_gpsd(config: &NavigatorConfig) -> PositioningAdapter<GpsdSource> {
    let source = GpsdSource::new(config.gpsd_host.clone(), config.gpsd_port)
        .with_read_timeout(config.poll_timeout());
    PositioningAdapter::new(source)
}

fn confirm_link<S, R, W>(
    adapter: &mut PositioningAdapter<S>,
    config: &NavigatorConfig,
    console: &mut Console<R, W>,
) -> Result<LinkConfirmed>
where
    S: PositioningSource,
    R: BufRead,
    W: Write,
{
    let mut probe = LinkProbe::new(config.probe_attempts, config.poll_timeout());
    let confirmed = probe
        .probe_with_retry(adapter, |_| {
            console.retry("GPS connection failed.").unwrap_or(false)
        })
        .context("GPS connection was not confirmed")?;
    Ok(confirmed)
}

fn gpspoll<R: BufRead, W: Write>(config: &NavigatorConfig, console: &mut Console<R, W>) -> Result<()> {
    let mut adapter = open_gpsd(config);
    let confirmed = confirm_link(&mut adapter, config, console)?;
    println!(
        "GPS connection successful ({}/{} polls): {}",
        confirmed.successes(),
        confirmed.attempts(),
        format_fix(Some(confirmed.final_fix()))
    );
    adapter.close();
    Ok(())
}

fn run<R: BufRead, W: Write>(
    config: &NavigatorConfig,
    format: OutputFormat,
    console: &mut Console<R, W>,
) -> Result<()> {
    let mut adapter = open_gpsd(config);
    let confirmed = confirm_link(&mut adapter, config, console)?;

    let waypoints = loop {
        let Some(answer) = console.prompt("Enter waypoint CSV path: ")? else {
            bail!("no waypoint CSV path given");
        };
        match read_waypoints(&expand_home(&answer)) {
            Ok(waypoints) => break waypoints,
            Err(e) => {
                warn!(error = %e, "Reading CSV failed");
                if !console.retry("Reading CSV failed.")? {
                    bail!("no readable waypoint CSV given");
                }
            }
        }
    };

    let (tsp_dir, solution_dir) = (config.tsp_dir(), config.solution_dir());
    for dir in [&tsp_dir, &solution_dir] {
        fs::create_dir_all(dir).with_context(|| format!("cannot create {}", dir.display()))?;
    }
    let planner = TourPlanner::new(
        tsp_dir,
        solution_dir,
        ConcordeSolver::new(&config.concorde_path),
    );
    let planned = planner
        .plan_waypoints(&waypoints)
        .with_context(|| format!("failed to solve {}", waypoints.source.display()))?;
    info!(
        waypoints = planned.tour.len(),
        micros = planned.solve_time.as_micros() as u64,
        "Tour ready"
    );

    let clock = SystemClock;
    let mut log = InstructionLog::create(&config.log_dir(), clock.now())
        .context("failed to open the instruction log")?;
    info!(path = %log.path().display(), "Logging instructions");

    let mut session = NavigationSession::new(adapter, planned.tour, clock, config.poll_timeout());
    if let Some(start) = config.simulation_start {
        session = session.with_simulation_start(start);
    }
    let radius = session.set_proximity_radius(config.proximity_radius_m);
    let velocity = session.set_simulation_velocity(config.simulation_velocity_mps)?;
    session.attach_link(confirmed);
    info!(radius_m = radius, velocity_mps = velocity, mode = ?session.mode(), "Navigation started");

    let formatter = InstructionFormatter::new(format);
    let stdout = io::stdout();
    let mut out = stdout.lock();
    if let Some(header) = formatter.header() {
        writeln!(out, "{}", header)?;
    }

    loop {
        match session.next_instruction() {
            Ok(TickOutcome::Instruction(instruction)) => {
                writeln!(out, "{}", formatter.format(&instruction)?)?;
                out.flush()?;
                log.append(&instruction)
                    .context("failed to write the instruction log")?;
            }
            Ok(TickOutcome::NoFix) => debug!("No fix this tick"),
            Ok(TickOutcome::Completed) => break,
            Err(e) => warn!(error = %e, "Skipping tick"),
        }
    }

    session.stop();
    info!(instructions = log.records(), "Tour completed");
    Ok(())
}

/// Ask until the operator names an existing directory; empty input takes `default`
fn prompt_directory<R: BufRead, W: Write>(
    console: &mut Console<R, W>,
    message: &str,
    failure: &str,
    default: Option<&Path>,
) -> Result<PathBuf> {
    loop {
        let Some(answer) = console.prompt(message)? else {
            bail!("{}", failure);
        };
        let dir = match (answer.is_empty(), default) {
            (true, Some(default)) => default.to_path_buf(),
            _ => expand_home(&answer),
        };
        if dir.is_dir() {
            let shown = fs::canonicalize(&dir).unwrap_or_else(|_| dir.clone());
            info!(path = %shown.display(), "Directory found");
            return Ok(dir);
        }
        if !console.retry(failure)? {
            bail!("{}", failure);
        }
    }
}

fn solve<R: BufRead, W: Write>(config: &NavigatorConfig, console: &mut Console<R, W>) -> Result<()> {
    let mut adapter = open_gpsd(config);
    confirm_link(&mut adapter, config, console)?;
    adapter.close();

    let (tsp_default, solution_default) = (config.tsp_dir(), config.solution_dir());
    let csv_dir = prompt_directory(
        console,
        "Enter CSV waypoint directory: ",
        "CSV directory not valid.",
        None,
    )?;
    let tsp_dir = prompt_directory(
        console,
        &format!("Enter TSP directory [{}]: ", tsp_default.display()),
        "TSP directory not valid.",
        Some(&tsp_default),
    )?;
    let solution_dir = prompt_directory(
        console,
        &format!("Enter solution directory [{}]: ", solution_default.display()),
        "Solution directory not valid.",
        Some(&solution_default),
    )?;

    let planner = TourPlanner::new(tsp_dir, solution_dir, ConcordeSolver::new(&config.concorde_path));
    let summary = planner
        .solve_directory(&csv_dir)
        .with_context(|| format!("cannot list {}", csv_dir.display()))?;
    if summary.solved == 0 {
        bail!("no solution files were able to be created");
    }
    println!("{}/{} CSV files solved.", summary.solved, summary.visited);
    Ok(())
}

fn main() -> Result<()> {
    let cli = parse_args(env::args_os());
    let command = match cli.command {
        Some(Command::Help) | None => {
            Cli::command().print_help()?;
            println!();
            return Ok(());
        }
        Some(command) => command,
    };

    let manager = match &cli.config {
        Some(path) => ConfigurationManager::from_file(path)
            .with_context(|| format!("failed to load {}", path.display()))?,
        None => ConfigurationManager::new(),
    };
    let config = manager.config();
    init_logging(&config.log_level).context("failed to install the log subscriber")?;

    let stdin = io::stdin();
    let mut console = Console::new(stdin.lock(), io::stderr());
    match command {
        Command::GpsPoll => gpspoll(config, &mut console),
        Command::Run => run(config, cli.format, &mut console),
        Command::Solve => solve(config, &mut console),
        Command::Help => Ok(()),
    }
}
