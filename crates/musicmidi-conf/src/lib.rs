//! Configuration loading for musicmidi.
//!
//! # Config File Locations
//!
//! Files are loaded in order (later wins, key by key):
//! 1. `/etc/musicmidi/config.toml` (system)
//! 2. `~/.config/musicmidi/config.toml` (user)
//! 3. `--config <path>`, or else `./musicmidi.toml` (local)
//! 4. Environment variables (`MUSICMIDI_*`, `RUST_LOG`)
//!
//! Command-line flags are applied on top by the caller.
//!
//! # Example Config
//!
//! ```toml
//! [convert]
//! style = "genre"
//! genre = "jazz"
//! harmony_window = 2
//!
//! [output]
//! dir = "~/music/midi"
//! versioned = true
//!
//! [velocity]
//! p = 45
//! mf = 85
//!
//! [programs]
//! piano = 4
//!
//! [logging]
//! level = "debug"
//! ```

pub mod loader;
pub mod options;
pub mod settings;

pub use loader::{discover_config_files_with_override, ConfigSources};
pub use options::Overrides;
pub use settings::{ConvertConfig, LoggingConfig, OutputConfig, ProgramsConfig, VelocityConfig};

use serde::{Deserialize, Serialize};
use std::path::{Path, PathBuf};
use thiserror::Error;

/// Configuration loading errors.
#[derive(Debug, Error)]
pub enum ConfigError {
    #[error("Failed to read config file {path}: {source}")]
    FileRead {
        path: PathBuf,
        source: std::io::Error,
    },

    #[error("Failed to parse config file {path}: {message}")]
    Parse { path: PathBuf, message: String },

    #[error("Invalid value for {key}: {message}")]
    Invalid { key: String, message: String },
}

impl ConfigError {
    pub(crate) fn invalid(key: impl Into<String>, message: impl Into<String>) -> Self {
        ConfigError::Invalid {
            key: key.into(),
            message: message.into(),
        }
    }
}

/// Complete musicmidi configuration.
#[derive(Debug, Clone, PartialEq, Eq, Default, Serialize, Deserialize)]
pub struct MusicConfig {
    #[serde(default)]
    pub convert: ConvertConfig,

    #[serde(default)]
    pub output: OutputConfig,

    #[serde(default)]
    pub velocity: VelocityConfig,

    #[serde(default)]
    pub programs: ProgramsConfig,

    #[serde(default)]
    pub logging: LoggingConfig,
}

impl MusicConfig {
    /// Load configuration from all standard sources.
    pub fn load() -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(None)?;
        Ok(config)
    }

    /// Load configuration, with `config_path` replacing `./musicmidi.toml`.
    pub fn load_from(config_path: Option<&Path>) -> Result<Self, ConfigError> {
        let (config, _sources) = Self::load_with_sources_from(config_path)?;
        Ok(config)
    }

    /// Load configuration and report which files and variables were used.
    pub fn load_with_sources_from(
        config_path: Option<&Path>,
    ) -> Result<(Self, ConfigSources), ConfigError> {
        let mut sources = ConfigSources::default();
        let mut config = MusicConfig::default();

        for path in loader::discover_config_files_with_override(config_path) {
            loader::apply_file(&mut config, &path)?;
            sources.files.push(path);
        }

        loader::apply_env_overrides(&mut config, &mut sources)?;

        Ok((config, sources))
    }

    /// Serialize config to TOML string.
    pub fn to_toml(&self) -> String {
        // Built by hand so empty tables and unset genre still show up
        let mut output = String::new();

        output.push_str("# musicmidi configuration\n\n");

        output.push_str("[convert]\n");
        output.push_str(&format!("style = \"{}\"\n", self.convert.style));
        match &self.convert.genre {
            Some(genre) => output.push_str(&format!("genre = \"{}\"\n", genre)),
            None => output.push_str("# genre = \"jazz\"\n"),
        }
        output.push_str(&format!(
            "harmony_window = {}\n",
            self.convert.harmony_window
        ));

        output.push_str("\n[output]\n");
        output.push_str(&format!("dir = \"{}\"\n", self.output.dir.display()));
        output.push_str(&format!("versioned = {}\n", self.output.versioned));

        output.push_str("\n[velocity]\n");
        for (dynamic, velocity) in &self.velocity {
            output.push_str(&format!("{} = {}\n", dynamic, velocity));
        }

        output.push_str("\n[programs]\n");
        for (instrument, program) in &self.programs {
            output.push_str(&format!("{} = {}\n", instrument, program));
        }

        output.push_str("\n[logging]\n");
        output.push_str(&format!("level = \"{}\"\n", self.logging.level));

        output
    }
}
