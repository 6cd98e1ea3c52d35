use std::path::PathBuf;
use std::thread;

use anyhow::Context;
use clap::{Parser, Subcommand};
use sysinfo::System;

use inklog::messaging::{EngineEvent, EventBus};
use inklog::plugins::{ConsolePlugin, EventBusPlugin};
use inklog::scenes::probe_scenes;
use inklog::source::ImageSequenceSource;
use inklog::{AppResult, EngineConfig, FrameEngine, PluginRegistry, RunSummary};

const LOG_TARGET_STARTUP: &str = "inklog::startup";

#[derive(Parser)]
#[command(name = "inklog")]
#[command(version, about = "Detect match lifecycle events in recorded game video")]
struct Cli {
    /// Configuration file (defaults to the platform config directory)
    #[arg(short, long, global = true, env = "INKLOG_CONFIG")]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Command,
}

#[derive(Subcommand)]
enum Command {
    /// Replay a directory of PNG/JPEG frames through the engine
    Run {
        /// Directory of frames, processed in file name order
        dir: PathBuf,

        /// Capture rate of the frames
        #[arg(long)]
        fps: Option<f64>,

        /// Frames read per iteration
        #[arg(long)]
        decimation: Option<u32>,

        /// Write a JSON summary per game; `__INPUT_FILE__` expands to the
        /// directory name
        #[arg(long)]
        summary: Option<String>,
    },

    /// Print the effective configuration
    Config {
        /// Save it to the configuration file
        #[arg(long)]
        write: bool,
    },
}

/// Initialize tracing with file rotation
///
/// Logs are written to `<config dir>/inklog/logs/inklog.YYYY-MM-DD.log`.
/// Debug builds also log to the console. `RUST_LOG` overrides the default
/// `info` filter.
fn initialize_tracing() {
    use tracing_appender::rolling;
    use tracing_subscriber::{fmt, prelude::*, EnvFilter};

    let log_dir = EngineConfig::log_dir();
    if let Err(e) = std::fs::create_dir_all(&log_dir) {
        eprintln!("Warning: Failed to create log directory: {}", e);
    }

    let file_appender = rolling::daily(&log_dir, "inklog.log");

    let filter = EnvFilter::try_from_default_env()
        .or_else(|_| EnvFilter::try_new("info"))
        .unwrap_or_else(|_| EnvFilter::new("warn"));

    let file_layer = fmt::layer()
        .with_writer(file_appender)
        .with_ansi(false)
        .with_target(true)
        .with_line_number(true);

    #[cfg(debug_assertions)]
    {
        let console_layer = fmt::layer()
            .with_writer(std::io::stderr)
            .with_ansi(true)
            .with_target(false);

        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .with(console_layer)
            .init();
    }

    #[cfg(not(debug_assertions))]
    {
        tracing_subscriber::registry()
            .with(filter)
            .with(file_layer)
            .init();
    }

    tracing::info!("Log directory: {}", log_dir.display());
}

fn log_runtime_environment() {
    let version = env!("CARGO_PKG_VERSION");
    let os_name = System::long_os_version()
        .or_else(System::name)
        .unwrap_or_else(|| "Unknown OS".to_string());
    let kernel = System::kernel_version().unwrap_or_else(|| "Unknown Kernel".to_string());

    tracing::info!(target: LOG_TARGET_STARTUP, "Starting inklog v{} on ({})", version, std::env::consts::ARCH);
    tracing::info!(target: LOG_TARGET_STARTUP, "Operating System: {} (kernel {})", os_name, kernel);

    let mut system = System::new();
    system.refresh_cpu();
    system.refresh_memory();
    tracing::debug!(
        target: LOG_TARGET_STARTUP,
        "CPUs: {}, memory: {} MiB",
        system.cpus().len(),
        system.total_memory() / (1024 * 1024)
    );
}

fn config_path(cli_path: Option<PathBuf>) -> AppResult<PathBuf> {
    match cli_path {
        Some(path) => Ok(path),
        None => EngineConfig::default_path().context("No config file given and no platform config directory"),
    }
}

fn run(
    config_file: PathBuf,
    dir: PathBuf,
    fps: Option<f64>,
    decimation: Option<u32>,
    summary: Option<String>,
) -> AppResult<RunSummary> {
    let mut config = EngineConfig::load_or_default(Some(&config_file))
        .with_context(|| format!("Failed to load config {}", config_file.display()))?;
    if let Some(fps) = fps {
        config.replay_fps = fps;
    }
    if let Some(decimation) = decimation {
        config.decimation_factor = decimation;
    }
    config.validate().context("Invalid command line overrides")?;

    let source = ImageSequenceSource::open(&dir, config.replay_fps)
        .with_context(|| format!("Failed to open frame directory {}", dir.display()))?;
    tracing::info!("Replaying {} frames from {}", source.len(), dir.display());

    let bus = EventBus::new();
    let (events, _id) = bus.subscribe();
    let listener = thread::spawn(move || {
        let mut results = 0u32;
        while let Ok(event) = events.recv() {
            match event {
                EngineEvent::StreamEnded => break,
                EngineEvent::ResultReady(snapshot) => {
                    results += 1;
                    tracing::debug!(
                        "Result {} at frame {:?}: won={:?}",
                        results,
                        snapshot.engine.frame_sequence,
                        snapshot.game.won
                    );
                }
                other => tracing::trace!("Event: {:?}", other.hook()),
            }
        }
        results
    });

    let mut console = ConsolePlugin::new();
    if let Some(template) = summary {
        console = console.with_summary_file(template);
    }
    let plugins = PluginRegistry::default()
        .with(Box::new(console))
        .with(Box::new(EventBusPlugin::new(bus.clone())));

    let scenes = probe_scenes(&config.scenes);
    let mut engine = FrameEngine::new(config, Box::new(source), scenes, plugins)
        .context("Failed to build frame engine")?;

    let outcome = engine.run();
    bus.publish(EngineEvent::StreamEnded);
    let published = listener.join().unwrap_or(0);
    tracing::debug!("Listener saw {} result(s)", published);

    outcome.context("Engine run aborted")
}

fn main() -> AppResult<()> {
    let cli = Cli::parse();

    initialize_tracing();
    log_runtime_environment();

    let config_file = config_path(cli.config)?;

    match cli.command {
        Command::Run {
            dir,
            fps,
            decimation,
            summary,
        } => {
            let summary = run(config_file, dir, fps, decimation, summary)?;
            println!("{}", serde_json::to_string_pretty(&summary)?);
        }
        Command::Config { write } => {
            let config = if config_file.exists() {
                EngineConfig::load_from(&config_file)
                    .with_context(|| format!("Failed to load config {}", config_file.display()))?
            } else {
                EngineConfig::default()
            };
            if write {
                config
                    .save_to(&config_file)
                    .with_context(|| format!("Failed to save config {}", config_file.display()))?;
                tracing::info!("Saved config to {}", config_file.display());
            }
            println!("{}", serde_json::to_string_pretty(&config)?);
        }
    }

    Ok(())
}
