use std::fs;
use std::path::{Path, PathBuf};
use std::process::ExitCode;
use std::time::Instant;

use anyhow::Context;
use artrec_core::{Config, Control, MergeMode, Mode, Reactor, Session, WorkDir};
use clap::{Args, Parser, Subcommand};
use glob::glob;
use tokio::sync::mpsc;
use tracing::{info, warn};
use tracing_subscriber::EnvFilter;
use tracing_subscriber::filter::LevelFilter;

mod control;

const LONG_VERSION: &str = concat!(
    env!("CARGO_PKG_VERSION"),
    " (commit ",
    env!("ARTREC_BUILD_COMMIT"),
    ", ",
    env!("ARTREC_BUILD_DATE"),
    ")"
);

const CONTROL_QUEUE: usize = 16;

#[derive(Parser, Debug)]
#[command(name = "artrec")]
#[command(version, long_version = LONG_VERSION)]
#[command(
    about = "Record and replay one Art-Net DMX universe.",
    long_about = None,
    after_help = "Examples:\n  artrec run --working-dir shows --mode record\n  artrec run --config artrec.toml --timeline 20240506_070809_artnet.jsonl --mode playback --loop\n  artrec inspect 'shows/*_artnet.jsonl' --pretty"
)]
struct Cli {
    #[command(subcommand)]
    command: Commands,
}

#[derive(Subcommand, Debug)]
enum Commands {
    /// Mirror the configured universe and accept control commands on stdin.
    Run(RunArgs),
    /// Summarise a timeline file as JSON.
    Inspect {
        /// Path to a timeline file, or a glob matching exactly one
        input: PathBuf,

        /// Pretty-print JSON output
        #[arg(long)]
        pretty: bool,
    },
}

#[derive(Args, Debug)]
struct RunArgs {
    /// TOML configuration file
    #[arg(short, long)]
    config: Option<PathBuf>,

    /// Mode to enter once the socket is bound (0/idle, 1/record, 2/playback)
    #[arg(long, default_value = "idle")]
    mode: Mode,

    /// Timeline file (relative to the working directory) for playback
    #[arg(long)]
    timeline: Option<String>,

    /// Merge policy during playback (ltp or htp)
    #[arg(long)]
    merge: Option<MergeMode>,

    /// Restart playback when the timeline ends
    #[arg(long = "loop")]
    loop_playback: bool,

    /// Directory holding timeline files
    #[arg(short = 'd', long)]
    working_dir: Option<PathBuf>,

    /// Art-Net universe (0-15) within the configured net/subnet
    #[arg(long)]
    universe: Option<u8>,

    /// UDP port for both listening and sending
    #[arg(long)]
    port: Option<u16>,

    /// Never record, even when the working directory is writable
    #[arg(long)]
    read_only: bool,

    /// Log at debug level
    #[arg(short, long, conflicts_with = "quiet")]
    verbose: bool,

    /// Log warnings and errors only
    #[arg(short, long)]
    quiet: bool,
}

fn main() -> ExitCode {
    let cli = Cli::parse();

    let result = match cli.command {
        Commands::Run(args) => cmd_run(args),
        Commands::Inspect { input, pretty } => cmd_inspect(input, pretty),
    };

    match result {
        Ok(()) => ExitCode::SUCCESS,
        Err(err) => {
            eprintln!("error: {}", err.message);
            if let Some(hint) = err.hint {
                eprintln!("hint: {}", hint);
            }
            ExitCode::from(2)
        }
    }
}

#[derive(Debug)]
struct CliError {
    message: String,
    hint: Option<String>,
}

impl CliError {
    fn new(message: impl Into<String>, hint: Option<String>) -> Self {
        Self {
            message: message.into(),
            hint,
        }
    }
}

impl std::fmt::Display for CliError {
    fn fmt(&self, f: &mut std::fmt::Formatter<'_>) -> std::fmt::Result {
        write!(f, "{}", self.message)
    }
}

impl std::error::Error for CliError {}

impl From<anyhow::Error> for CliError {
    fn from(err: anyhow::Error) -> Self {
        CliError::new(format!("{err:#}"), None)
    }
}

fn cmd_run(args: RunArgs) -> Result<(), CliError> {
    init_logging(args.verbose, args.quiet);
    let config = load_config(&args)?;

    let workdir = WorkDir::open(&config.working_dir).map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("create the directory or pass --working-dir".to_string()),
        )
    })?;
    let workdir = if config.read_only {
        workdir.with_writable(false)
    } else {
        workdir
    };

    // Built before the runtime starts so the local UTC offset can be read.
    let session = Session::new(config.clone(), workdir).map_err(|err| {
        CliError::new(
            format!("invalid configuration: {err}"),
            Some("check the config file and command-line overrides".to_string()),
        )
    })?;

    let runtime = tokio::runtime::Builder::new_current_thread()
        .enable_all()
        .build()
        .context("failed to start async runtime")?;
    let result = runtime.block_on(serve(config, session, args.mode));
    // The stdin reader may still be blocked on a read.
    runtime.shutdown_background();
    result
}

async fn serve(config: Config, mut session: Session, start: Mode) -> Result<(), CliError> {
    let reactor = Reactor::bind(&config).await.map_err(|err| {
        CliError::new(
            format!("failed to bind {}: {err}", config.bind_addr()),
            Some("check that the port is free and the address is local".to_string()),
        )
    })?;
    info!(
        address = %session.address(),
        channels = session.buffer().len(),
        working_dir = %config.working_dir.display(),
        "artrec ready"
    );
    if start != Mode::Idle && session.set_mode(start, Instant::now()) != start {
        warn!(requested = %start, "starting idle");
    }

    let (tx, rx) = mpsc::channel(CONTROL_QUEUE);
    tokio::spawn(control::read_commands(tx.clone()));
    tokio::spawn(shutdown_on_ctrl_c(tx));

    reactor.run(&mut session, rx).await.map_err(|err| {
        CliError::new(
            err.to_string(),
            Some("check the network interface and restart".to_string()),
        )
    })
}

async fn shutdown_on_ctrl_c(tx: mpsc::Sender<Control>) {
    match tokio::signal::ctrl_c().await {
        Ok(()) => {
            info!("interrupt received, shutting down");
            let _ = tx.send(Control::Shutdown).await;
        }
        Err(err) => warn!(error = %err, "failed to listen for interrupt"),
    }
}

fn init_logging(verbose: bool, quiet: bool) {
    let level = if verbose {
        LevelFilter::DEBUG
    } else if quiet {
        LevelFilter::WARN
    } else {
        LevelFilter::INFO
    };
    let filter = EnvFilter::builder()
        .with_default_directive(level.into())
        .from_env_lossy();
    let _ = tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .with_target(false)
        .try_init();
}

fn load_config(args: &RunArgs) -> Result<Config, CliError> {
    let mut config = match &args.config {
        Some(path) => read_config_file(path)?,
        None => Config::default(),
    };
    if let Some(dir) = &args.working_dir {
        config.working_dir = dir.clone();
    }
    if let Some(name) = &args.timeline {
        config.timeline = Some(name.clone());
    }
    if let Some(merge) = args.merge {
        config.merge_mode = merge;
    }
    if let Some(universe) = args.universe {
        config.universe = universe;
    }
    if let Some(port) = args.port {
        config.port = port;
    }
    config.loop_playback |= args.loop_playback;
    config.read_only |= args.read_only;
    Ok(config)
}

fn read_config_file(path: &Path) -> Result<Config, CliError> {
    let text = fs::read_to_string(path).map_err(|err| {
        CliError::new(
            format!("failed to read config {}: {err}", path.display()),
            Some("pass an existing TOML file to --config".to_string()),
        )
    })?;
    toml::from_str(&text).map_err(|err| {
        CliError::new(
            format!("invalid config {}: {}", path.display(), err.message()),
            Some("keys: bind, port, broadcast, net, subnet, universe, max_dmx_address, packet_delay_ms, working_dir, merge_mode, loop_playback, timeline, read_only".to_string()),
        )
    })
}

fn cmd_inspect(input: PathBuf, pretty: bool) -> Result<(), CliError> {
    let resolved = resolve_input_path(&input)?;
    validate_input_file(&resolved)?;

    let summary = artrec_core::summarize(&resolved).map_err(|err| {
        CliError::new(
            format!("failed to read timeline {}: {err}", resolved.display()),
            Some("timelines hold one JSON object per line: {\"<ms>\":[{\"channel\":n,\"value\":v}]}".to_string()),
        )
    })?;
    let json = if pretty {
        serde_json::to_string_pretty(&summary)
    } else {
        serde_json::to_string(&summary)
    }
    .context("JSON serialization failed")?;
    println!("{json}");
    Ok(())
}

fn validate_input_file(input: &Path) -> Result<(), CliError> {
    if !input.exists() {
        return Err(CliError::new(
            format!("timeline not found: {}", input.display()),
            Some("pass a timeline file such as 20240506_070809_artnet.jsonl".to_string()),
        ));
    }
    if !input.is_file() {
        return Err(CliError::new(
            format!("input is not a file: {}", input.display()),
            Some("pass a single timeline file".to_string()),
        ));
    }
    Ok(())
}

fn resolve_input_path(input: &Path) -> Result<PathBuf, CliError> {
    let pattern = input.to_string_lossy();
    if !is_glob_pattern(&pattern) {
        return Ok(input.to_path_buf());
    }

    let paths = glob(&pattern).map_err(|err| {
        CliError::new(
            format!("invalid input pattern '{}'", pattern),
            Some(format!("pattern error: {}", err.msg)),
        )
    })?;
    let mut matches = Vec::new();
    for entry in paths {
        let path = entry.map_err(|err| {
            CliError::new(
                format!("invalid input pattern '{}'", pattern),
                Some(format!("pattern error: {}", err)),
            )
        })?;
        if path.is_file() {
            matches.push(path);
        }
    }

    match matches.len() {
        0 => Err(CliError::new(
            format!("no files match pattern '{}'", pattern),
            Some("check the path or quote the pattern".to_string()),
        )),
        1 => Ok(matches.remove(0)),
        count => {
            let mut listed = matches
                .iter()
                .take(3)
                .map(|p| p.display().to_string())
                .collect::<Vec<_>>()
                .join(", ");
            if count > 3 {
                listed.push_str(", ...");
            }
            Err(CliError::new(
                format!(
                    "multiple files match pattern '{}' ({} matches); matches: {}",
                    pattern, count, listed
                ),
                Some("pass a single timeline file, or run once per file".to_string()),
            ))
        }
    }
}

fn is_glob_pattern(input: &str) -> bool {
    input.contains('*') || input.contains('?') || input.contains('[')
}
