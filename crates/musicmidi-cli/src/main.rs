//! musicmidi - song notation to MIDI converter
//!
//! Subcommands:
//! - `musicmidi convert <input>` - Convert one song to a MIDI file
//! - `musicmidi batch <dir>` - Convert every `.txt` song in a directory
//! - `musicmidi inspect <input>` - Print the converted song as JSON
//! - `musicmidi config` - Print the effective configuration

use std::path::PathBuf;
use std::process::ExitCode;

use anyhow::Result;
use clap::{Args, Parser, Subcommand};
use musicmidi::ConvertError;
use musicmidi_conf::{MusicConfig, Overrides};
use tracing_subscriber::EnvFilter;

mod batch;
mod commands;
mod output;

#[derive(Parser)]
#[command(name = "musicmidi")]
#[command(about = "Convert song notation to MIDI with generated accompaniment")]
#[command(version)]
struct Cli {
    /// Config file, used instead of ./musicmidi.toml
    #[arg(long, global = true)]
    config: Option<PathBuf>,

    #[command(subcommand)]
    command: Commands,
}

#[derive(Args, Debug, Clone, Default)]
struct StyleArgs {
    /// Accompaniment style: none, basic, quarter, half, whole, waltz,
    /// alberti, arpeggio, genre, or a genre name
    #[arg(long)]
    style: Option<String>,

    /// Genre for `--style genre`: classical, baroque, romantic, pop, rock,
    /// jazz or swing
    #[arg(long)]
    genre: Option<String>,

    /// Measures of melody, from each measure onward, used to pick its chord
    #[arg(long, value_parser = clap::value_parser!(u16).range(1..))]
    harmony_window: Option<u16>,
}

impl From<StyleArgs> for Overrides {
    fn from(args: StyleArgs) -> Self {
        Overrides {
            style: args.style,
            genre: args.genre,
            harmony_window: args.harmony_window,
        }
    }
}

#[derive(Subcommand)]
enum Commands {
    /// Convert one song to a MIDI file
    Convert {
        /// Song file
        input: PathBuf,

        /// Output path (default: <title>_<key>_v<N>.mid in the output dir)
        #[arg(short, long)]
        output: Option<PathBuf>,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Convert every .txt song in a directory
    Batch {
        /// Directory of song files
        dir: PathBuf,

        /// Directory for the MIDI files (default: output.dir from config)
        #[arg(long)]
        output_dir: Option<PathBuf>,

        /// Songs converted at once
        #[arg(short, long, default_value = "4")]
        jobs: usize,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Print the converted song as JSON
    Inspect {
        /// Song file
        input: PathBuf,

        #[command(flatten)]
        style: StyleArgs,
    },

    /// Print the effective configuration as TOML
    Config,
}

fn init_logging(level: &str) {
    // RUST_LOG is already folded into the configured level
    let filter = EnvFilter::try_new(level).unwrap_or_else(|_| EnvFilter::new("info"));
    tracing_subscriber::fmt()
        .with_env_filter(filter)
        .with_writer(std::io::stderr)
        .init();
}

/// Usage problems exit with 2, everything else with 1
fn exit_code(err: &anyhow::Error) -> u8 {
    match err.downcast_ref::<ConvertError>() {
        Some(ConvertError::NeedsGenre) => 2,
        _ if err.downcast_ref::<musicmidi_conf::ConfigError>().is_some() => 2,
        _ => 1,
    }
}

async fn run(cli: Cli) -> Result<ExitCode> {
    let loaded = MusicConfig::load_with_sources_from(cli.config.as_deref());
    let level = loaded
        .as_ref()
        .map(|(config, _)| config.logging.level.clone())
        .unwrap_or_else(|_| "info".to_string());
    init_logging(&level);
    let (config, sources) = loaded?;

    match cli.command {
        Commands::Convert {
            input,
            output,
            style,
        } => {
            let options = config.convert_options(&style.into())?;
            commands::convert_one(&input, output, &config, &options)?;
        }
        Commands::Batch {
            dir,
            output_dir,
            jobs,
            style,
        } => {
            let options = config.convert_options(&style.into())?;
            let output_dir = output_dir.unwrap_or_else(|| config.output.dir.clone());
            let summary =
                batch::batch(&dir, output_dir, options, config.output.versioned, jobs).await?;
            println!(
                "{} converted, {} failed, {} skipped",
                summary.written, summary.failed, summary.skipped
            );
            if summary.failed > 0 || summary.skipped > 0 {
                return Ok(ExitCode::FAILURE);
            }
        }
        Commands::Inspect { input, style } => {
            let options = config.convert_options(&style.into())?;
            commands::inspect(&input, &options)?;
        }
        Commands::Config => {
            commands::show_config(&config, &sources);
        }
    }

    Ok(ExitCode::SUCCESS)
}

#[tokio::main]
async fn main() -> ExitCode {
    let cli = Cli::parse();

    match run(cli).await {
        Ok(code) => code,
        Err(err) => {
            eprintln!("Error: {:#}", err);
            ExitCode::from(exit_code(&err))
        }
    }
}
