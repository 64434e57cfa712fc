//! Trade Replay CLI: replay historical bars with peak/valley auto-trading.
//!
//! Commands:
//! - `replay`: run the whole series with auto-trade and export the ledger
//! - `session`: drive a replay from stdin, one operator command per line
//! - `detect`: print the peak/valley signals of a bar window
//! - `features`: write the per-bar feature table as CSV
//! - `config show` / `config init`: inspect or create the config file

use std::io::{BufRead, Write};
use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use clap::{Parser, Subcommand};
use tracing::{info, Level};
use tracing_subscriber::fmt;

use tradereplay_core::detector::{detect, Detection, DetectorParams};
use tradereplay_core::domain::{trailing_window, Signal};
use tradereplay_core::indicators::FeatureTable;
use tradereplay_runner::{
    default_config_path, features_to_csv, load_bars, parse_timestamp, Command, LoadOptions,
    LoadedData, ReplayConfig, ReplaySession, Reply,
};

#[derive(Parser)]
#[command(
    name = "tradereplay",
    version,
    about = "Trade Replay CLI: replay historical bars with peak/valley auto-trading"
)]
struct Cli {
    /// The log verbosity level.
    #[arg(short, long, global = true, default_value_t = Level::INFO)]
    verbosity: Level,

    /// Path to the config file. Defaults to <config dir>/tradereplay/config.toml.
    #[arg(short, long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

/// Options shared by every command that loads bars.
#[derive(clap::Args, Clone)]
struct DataArgs {
    /// Bar file (CSV). Overrides `data_path` from the config.
    #[arg(long)]
    data: Option<PathBuf>,

    /// First bar to load (e.g. "2024-11-12 07:30").
    #[arg(long)]
    start: Option<String>,

    /// Last bar to load; the replay stops when the clock reaches it.
    #[arg(long)]
    end: Option<String>,

    /// Generate synthetic bars instead of reading a file.
    #[arg(long, default_value_t = false)]
    synthetic: bool,
}

#[derive(Subcommand)]
enum Commands {
    /// Replay the series to the end with auto-trade and export the ledger.
    Replay {
        #[command(flatten)]
        data: DataArgs,

        /// Trailing bars fed to the detector.
        #[arg(long)]
        window: Option<usize>,

        /// Disable auto-trade (replay only moves the clock).
        #[arg(long, default_value_t = false)]
        no_auto: bool,

        /// Ledger export path (.csv or .json). Overrides the config.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Read operator commands from stdin (long, short, close, time, step, auto, status, export).
    Session {
        #[command(flatten)]
        data: DataArgs,
    },
    /// Print the peak/valley signals for the last `window` bars.
    Detect {
        #[command(flatten)]
        data: DataArgs,

        /// Window length (defaults to the configured window size).
        #[arg(long)]
        window: Option<usize>,

        /// Minimum spacing between peaks, in bars.
        #[arg(long)]
        min_distance: Option<usize>,

        /// Minimum prominence on the [0, 1] scaled closes.
        #[arg(long)]
        min_prominence: Option<f64>,

        /// Only print the signal of the final bar.
        #[arg(long, default_value_t = false)]
        latest: bool,
    },
    /// Compute the feature table (MA, RSI, MACD, stochastic, signal) as CSV.
    Features {
        #[command(flatten)]
        data: DataArgs,

        /// Output file. Prints to stdout when omitted.
        #[arg(long)]
        output: Option<PathBuf>,
    },
    /// Config file management.
    Config {
        #[command(subcommand)]
        action: ConfigAction,
    },
}

#[derive(Subcommand)]
enum ConfigAction {
    /// Print the effective configuration as TOML.
    Show,
    /// Write a default config file (refuses to overwrite without --force).
    Init {
        #[arg(long, default_value_t = false)]
        force: bool,
    },
}

fn main() -> Result<()> {
    let cli = Cli::parse();

    let subscriber = fmt()
        .with_max_level(cli.verbosity)
        .with_writer(std::io::stderr)
        .finish();
    tracing::subscriber::set_global_default(subscriber)
        .context("failed to install log subscriber")?;

    let config_path = cli.config.clone().or_else(default_config_path);

    match cli.command {
        Commands::Replay {
            data,
            window,
            no_auto,
            output,
        } => {
            let config = replay_config(config_path.as_deref(), &data, window, no_auto, output)?;
            run_replay(&config, data.synthetic)
        }
        Commands::Session { data } => {
            let config = effective_config(config_path.as_deref(), &data)?;
            run_session(&config, data.synthetic)
        }
        Commands::Detect {
            data,
            window,
            min_distance,
            min_prominence,
            latest,
        } => {
            let mut config = effective_config(config_path.as_deref(), &data)?;
            if let Some(w) = window {
                config.window_size = w;
                config.validate()?;
            }
            let defaults = config.trading.detector;
            let params = DetectorParams {
                min_distance: min_distance.unwrap_or(defaults.min_distance),
                min_prominence: min_prominence.unwrap_or(defaults.min_prominence),
            };
            run_detect(&config, data.synthetic, params, latest)
        }
        Commands::Features { data, output } => {
            let config = effective_config(config_path.as_deref(), &data)?;
            run_features(&config, data.synthetic, output.as_deref())
        }
        Commands::Config { action } => match action {
            ConfigAction::Show => {
                let config = config_path
                    .as_deref()
                    .map(ReplayConfig::load_or_default)
                    .unwrap_or_default();
                print!("{}", config.to_toml()?);
                Ok(())
            }
            ConfigAction::Init { force } => {
                let Some(path) = config_path else {
                    bail!("no config directory on this platform; pass --config <path>");
                };
                if path.exists() && !force {
                    bail!("{} already exists (use --force to overwrite)", path.display());
                }
                ReplayConfig::default().save(&path)?;
                println!("Wrote default config to {}", path.display());
                Ok(())
            }
        },
    }
}

/// Config file (or defaults) with command-line overrides applied.
fn effective_config(path: Option<&Path>, data: &DataArgs) -> Result<ReplayConfig> {
    let mut config = path.map(ReplayConfig::load_or_default).unwrap_or_default();
    if let Some(p) = &data.data {
        config.data_path = p.clone();
    }
    if let Some(s) = &data.start {
        config.start = Some(parse_cli_time(s)?);
    }
    if let Some(e) = &data.end {
        config.end = Some(parse_cli_time(e)?);
    }
    config.validate()?;
    Ok(config)
}

/// Effective config for `replay`, with its own flags applied and re-checked.
fn replay_config(
    path: Option<&Path>,
    data: &DataArgs,
    window: Option<usize>,
    no_auto: bool,
    output: Option<PathBuf>,
) -> Result<ReplayConfig> {
    let mut config = effective_config(path, data)?;
    if let Some(w) = window {
        config.window_size = w;
    }
    if no_auto {
        config.auto_trade = false;
    }
    if let Some(path) = output {
        config.export_path = path;
    }
    config.validate()?;
    Ok(config)
}

fn parse_cli_time(value: &str) -> Result<chrono::NaiveDateTime> {
    parse_timestamp(value).with_context(|| format!("cannot parse time '{value}'"))
}

fn load(config: &ReplayConfig, synthetic: bool) -> Result<LoadedData> {
    let opts = LoadOptions {
        start: config.start,
        end: config.end,
    };
    load_bars(
        &config.data_path,
        &config.instrument,
        config.increment_minutes,
        synthetic,
        &opts,
    )
    .with_context(|| format!("failed to load bars from {}", config.data_path.display()))
}

fn run_replay(config: &ReplayConfig, synthetic: bool) -> Result<()> {
    let loaded = load(config, synthetic)?;
    let bar_count = loaded.bars.len();
    let mut session = ReplaySession::from_config(loaded.bars, config)?;

    let ticks = session.run_to_end();
    info!(ticks, bars = bar_count, "replay finished");

    let status = session.status();
    println!("=== Replay Summary ===");
    println!("Bars:          {bar_count}");
    println!("Ticks:         {ticks}");
    println!("Final time:    {}", status.time);
    println!("Closed trades: {}", status.summary.trade_count);
    println!("Winners:       {}", status.summary.winners);
    println!("Losers:        {}", status.summary.losers);
    println!("Win rate:      {:.1}%", status.summary.win_rate * 100.0);
    println!("Total P&L:     {:.5}", status.summary.total_pnl);
    if let Some(live) = &status.live {
        println!(
            "Open position: {} since {} at {}",
            live.side, live.entry_time, live.entry_price
        );
    }

    let outcome = session.export(None)?;
    println!("{outcome}");
    Ok(())
}

fn run_session(config: &ReplayConfig, synthetic: bool) -> Result<()> {
    let loaded = load(config, synthetic)?;
    let mut session = ReplaySession::from_config(loaded.bars, config)?;
    println!("{}", session.status());

    let stdin = std::io::stdin();
    let mut stdout = std::io::stdout();
    for line in stdin.lock().lines() {
        let line = line.context("failed to read stdin")?;
        if line.trim().is_empty() {
            continue;
        }
        if matches!(line.trim(), "quit" | "exit") {
            break;
        }
        match handle_line(&mut session, &line) {
            Ok(reply) => println!("{reply}"),
            Err(e) => eprintln!("error: {e:#}"),
        }
        stdout.flush()?;
    }
    Ok(())
}

/// Parse and run one operator line. Failures are returned, not logged, so the
/// console reports each one once.
fn handle_line(session: &mut ReplaySession, line: &str) -> Result<Reply> {
    let command: Command = line.parse()?;
    Ok(session.execute(command)?)
}

fn run_detect(
    config: &ReplayConfig,
    synthetic: bool,
    params: DetectorParams,
    latest: bool,
) -> Result<()> {
    let loaded = load(config, synthetic)?;
    let bars = &loaded.bars;
    let window = trailing_window(bars, bars.len().saturating_sub(1), config.window_size);

    match detect(window, params.min_distance, params.min_prominence, latest) {
        Detection::Latest(signal) => {
            let time = window.last().map(|b| b.time.to_string()).unwrap_or_default();
            println!("{time} {signal:?}");
        }
        Detection::Series(signals) => {
            for (bar, signal) in window.iter().zip(signals) {
                if signal != Signal::Neutral {
                    println!("{} {:.5} {signal:?}", bar.time, bar.close);
                }
            }
        }
    }
    Ok(())
}

fn run_features(config: &ReplayConfig, synthetic: bool, output: Option<&Path>) -> Result<()> {
    let loaded = load(config, synthetic)?;
    let table = FeatureTable::compute(&loaded.bars, config.trading.detector);
    match output {
        Some(path) => {
            tradereplay_runner::write_features_csv(&table, path)?;
            println!("Wrote {} rows to {}", table.len(), path.display());
        }
        None => print!("{}", features_to_csv(&table)?),
    }
    Ok(())
}
