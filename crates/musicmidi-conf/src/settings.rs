//! Configuration sections.

use serde::{Deserialize, Serialize};
use std::collections::BTreeMap;
use std::path::PathBuf;

/// How songs are converted.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct ConvertConfig {
    /// Accompaniment style word (none, basic, waltz, genre, a genre name...).
    /// Default: basic
    #[serde(default = "ConvertConfig::default_style")]
    pub style: String,

    /// Genre used by style `genre` when neither the command line nor the
    /// song names one.
    #[serde(default)]
    pub genre: Option<String>,

    /// Measures of melody, starting at the current one, used to detect harmony.
    /// Default: 1
    #[serde(default = "ConvertConfig::default_harmony_window")]
    pub harmony_window: u16,
}

impl ConvertConfig {
    fn default_style() -> String {
        "basic".to_string()
    }

    fn default_harmony_window() -> u16 {
        1
    }
}

impl Default for ConvertConfig {
    fn default() -> Self {
        Self {
            style: Self::default_style(),
            genre: None,
            harmony_window: Self::default_harmony_window(),
        }
    }
}

/// Where MIDI files are written.
#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct OutputConfig {
    /// Directory for generated files when no output path is given.
    /// Default: current directory
    #[serde(default = "OutputConfig::default_dir")]
    pub dir: PathBuf,

    /// Never overwrite: add `_v<N>` to file names.
    /// Default: true
    #[serde(default = "OutputConfig::default_versioned")]
    pub versioned: bool,
}

impl OutputConfig {
    fn default_dir() -> PathBuf {
        PathBuf::from(".")
    }

    fn default_versioned() -> bool {
        true
    }
}

impl Default for OutputConfig {
    fn default() -> Self {
        Self {
            dir: Self::default_dir(),
            versioned: Self::default_versioned(),
        }
    }
}

#[derive(Debug, Clone, PartialEq, Eq, Serialize, Deserialize)]
pub struct LoggingConfig {
    /// Filter used when RUST_LOG is unset (trace, debug, info, warn, error).
    /// Default: info
    #[serde(default = "LoggingConfig::default_level")]
    pub level: String,
}

impl LoggingConfig {
    fn default_level() -> String {
        "info".to_string()
    }
}

impl Default for LoggingConfig {
    fn default() -> Self {
        Self {
            level: Self::default_level(),
        }
    }
}

/// Dynamic name to velocity. Empty means the built-in table; a non-empty
/// table replaces it entirely.
pub type VelocityConfig = BTreeMap<String, u8>;

/// Instrument name to General MIDI program, on top of the built-in mapping.
pub type ProgramsConfig = BTreeMap<String, u8>;
