//! CLI command implementations

use std::path::{Path, PathBuf};

use anyhow::{bail, Context, Result};
use musicmidi::{convert, Conversion, ConvertError, ConvertOptions, FeedbackLevel};
use musicmidi_conf::{ConfigSources, MusicConfig};
use tracing::info;

use crate::output;

/// Where a converted song goes
#[derive(Debug, Clone)]
pub enum Target {
    /// Exactly this path (versioned next to it if taken)
    File(PathBuf),
    /// A generated name in this directory
    Dir(PathBuf),
}

/// Read and convert one song, printing its parse errors to stderr
pub fn convert_path(input: &Path, options: &ConvertOptions) -> Result<Conversion> {
    let text = std::fs::read_to_string(input)
        .with_context(|| format!("Failed to read {}", input.display()))?;

    match convert(&text, options) {
        Ok(conversion) => Ok(conversion),
        Err(ConvertError::Parse(feedback)) => {
            let errors: Vec<_> = feedback
                .iter()
                .filter(|f| f.level == FeedbackLevel::Error)
                .collect();
            for f in &errors {
                eprintln!("{}: {}", input.display(), f);
            }
            bail!("{}: {} parse error(s)", input.display(), errors.len());
        }
        Err(err) => Err(anyhow::Error::new(err).context(format!("Failed to convert {}", input.display()))),
    }
}

/// Convert one file and write its MIDI; returns the written path
pub fn convert_file(
    input: &Path,
    target: &Target,
    options: &ConvertOptions,
    versioned: bool,
) -> Result<PathBuf> {
    let conversion = convert_path(input, options)?;

    let written = match target {
        Target::File(path) => output::write_explicit(path, &conversion.midi, versioned),
        Target::Dir(dir) => {
            let stem = input
                .file_stem()
                .map(|s| s.to_string_lossy().into_owned())
                .unwrap_or_default();
            let base = output::base_name(&conversion.song.title, conversion.song.key, &stem);
            if versioned {
                output::write_versioned(dir, &base, &conversion.midi)
            } else {
                output::write_plain(dir, &base, &conversion.midi)
            }
        }
    }
    .with_context(|| format!("Failed to write MIDI for {}", input.display()))?;

    info!(
        input = %input.display(),
        output = %written.display(),
        style = %conversion.style,
        bytes = conversion.midi.len(),
        "wrote midi"
    );
    Ok(written)
}

/// `musicmidi convert`
pub fn convert_one(
    input: &Path,
    output: Option<PathBuf>,
    config: &MusicConfig,
    options: &ConvertOptions,
) -> Result<()> {
    let target = match output {
        Some(path) => Target::File(path),
        None => Target::Dir(config.output.dir.clone()),
    };
    let written = convert_file(input, &target, options, config.output.versioned)?;
    println!("{}", written.display());
    Ok(())
}

/// `musicmidi inspect`: the converted song as JSON on stdout
pub fn inspect(input: &Path, options: &ConvertOptions) -> Result<()> {
    let conversion = convert_path(input, options)?;
    let json = serde_json::to_string_pretty(&conversion).context("Failed to serialize song")?;
    println!("{}", json);
    Ok(())
}

/// `musicmidi config`: the effective configuration as TOML
pub fn show_config(config: &MusicConfig, sources: &ConfigSources) {
    for file in &sources.files {
        println!("# loaded {}", file.display());
    }
    for var in &sources.env_overrides {
        println!("# overridden by {}", var);
    }
    print!("{}", config.to_toml());
}
