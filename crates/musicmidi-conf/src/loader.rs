//! Finding config files, overlaying them, then applying `MUSICMIDI_*` variables.

use crate::{ConfigError, MusicConfig};
use std::env;
use std::path::{Path, PathBuf};
use tracing::{debug, warn};

/// Provenance of the effective configuration, for `musicmidi config`
#[derive(Debug, Clone, Default)]
pub struct ConfigSources {
    /// Files overlaid, lowest precedence first
    pub files: Vec<PathBuf>,
    /// Variables that replaced a file or default value
    pub env_overrides: Vec<String>,
}

/// Config files to overlay, lowest precedence first.
///
/// System and user files are returned only when they exist. A `cli_path`
/// is always returned (so a missing one fails to load) and replaces the
/// local `./musicmidi.toml`.
pub fn discover_config_files_with_override(cli_path: Option<&Path>) -> Vec<PathBuf> {
    let mut files = Vec::new();

    let system = PathBuf::from("/etc/musicmidi/config.toml");
    if system.exists() {
        files.push(system);
    }

    if let Some(config_dir) = directories::BaseDirs::new().map(|d| d.config_dir().to_path_buf()) {
        let user = config_dir.join("musicmidi/config.toml");
        if user.exists() {
            files.push(user);
        }
    }

    if let Some(path) = cli_path {
        files.push(path.to_path_buf());
        return files;
    }

    let local = PathBuf::from("musicmidi.toml");
    if local.exists() {
        files.push(local);
    }

    files
}

/// Overlay the keys present in a TOML file onto `config`.
pub fn apply_file(config: &mut MusicConfig, path: &Path) -> Result<(), ConfigError> {
    let contents = std::fs::read_to_string(path).map_err(|e| ConfigError::FileRead {
        path: path.to_path_buf(),
        source: e,
    })?;

    apply_toml(config, &contents, path)?;
    debug!(path = %path.display(), "loaded config file");
    Ok(())
}

fn parse_error(path: &Path, message: impl Into<String>) -> ConfigError {
    ConfigError::Parse {
        path: path.to_path_buf(),
        message: message.into(),
    }
}

fn small_int(value: &toml::Value, key: &str, path: &Path) -> Result<u8, ConfigError> {
    value
        .as_integer()
        .and_then(|v| u8::try_from(v).ok())
        .ok_or_else(|| parse_error(path, format!("{key} must be an integer from 0 to 255")))
}

/// Overlay a TOML document onto `config`.
pub(crate) fn apply_toml(
    config: &mut MusicConfig,
    contents: &str,
    path: &Path,
) -> Result<(), ConfigError> {
    let table: toml::Table = contents
        .parse()
        .map_err(|e: toml::de::Error| parse_error(path, e.to_string()))?;

    for (section, value) in &table {
        let Some(values) = value.as_table() else {
            return Err(parse_error(path, format!("{section} must be a table")));
        };
        match section.as_str() {
            "convert" => {
                if let Some(v) = values.get("style") {
                    let style = v
                        .as_str()
                        .ok_or_else(|| parse_error(path, "convert.style must be a string"))?;
                    config.convert.style = style.to_string();
                }
                if let Some(v) = values.get("genre") {
                    let genre = v
                        .as_str()
                        .ok_or_else(|| parse_error(path, "convert.genre must be a string"))?;
                    config.convert.genre = Some(genre.to_string());
                }
                if let Some(v) = values.get("harmony_window") {
                    config.convert.harmony_window = v
                        .as_integer()
                        .and_then(|n| u16::try_from(n).ok())
                        .filter(|n| *n >= 1)
                        .ok_or_else(|| {
                            parse_error(path, "convert.harmony_window must be a positive integer")
                        })?;
                }
            }
            "output" => {
                if let Some(v) = values.get("dir") {
                    let dir = v
                        .as_str()
                        .ok_or_else(|| parse_error(path, "output.dir must be a string"))?;
                    config.output.dir = expand_path(dir);
                }
                if let Some(v) = values.get("versioned") {
                    config.output.versioned = v
                        .as_bool()
                        .ok_or_else(|| parse_error(path, "output.versioned must be true or false"))?;
                }
            }
            "velocity" => {
                for (dynamic, v) in values {
                    let velocity = small_int(v, &format!("velocity.{dynamic}"), path)?;
                    config.velocity.insert(dynamic.clone(), velocity);
                }
            }
            "programs" => {
                for (instrument, v) in values {
                    let program = small_int(v, &format!("programs.{instrument}"), path)?;
                    config.programs.insert(instrument.clone(), program);
                }
            }
            "logging" => {
                if let Some(v) = values.get("level") {
                    let level = v
                        .as_str()
                        .ok_or_else(|| parse_error(path, "logging.level must be a string"))?;
                    config.logging.level = level.to_string();
                }
            }
            other => warn!(path = %path.display(), section = other, "ignoring unknown config section"),
        }
    }

    Ok(())
}

/// Overlay `MUSICMIDI_*` and `RUST_LOG` from the process environment
pub fn apply_env_overrides(
    config: &mut MusicConfig,
    sources: &mut ConfigSources,
) -> Result<(), ConfigError> {
    apply_env_from(config, sources, |key| env::var(key).ok())
}

/// Overlay variables looked up through `var`
pub fn apply_env_from(
    config: &mut MusicConfig,
    sources: &mut ConfigSources,
    var: impl Fn(&str) -> Option<String>,
) -> Result<(), ConfigError> {
    let mut take = |name: &str| {
        let value = var(name)?;
        sources.env_overrides.push(name.to_string());
        Some(value)
    };

    if let Some(style) = take("MUSICMIDI_STYLE") {
        config.convert.style = style;
    }
    if let Some(genre) = take("MUSICMIDI_GENRE") {
        config.convert.genre = Some(genre);
    }
    if let Some(window) = take("MUSICMIDI_HARMONY_WINDOW") {
        config.convert.harmony_window = window
            .parse()
            .ok()
            .filter(|n| *n >= 1)
            .ok_or_else(|| {
                ConfigError::invalid(
                    "MUSICMIDI_HARMONY_WINDOW",
                    format!("'{window}' is not a positive integer"),
                )
            })?;
    }
    if let Some(dir) = take("MUSICMIDI_OUTPUT_DIR") {
        config.output.dir = expand_path(&dir);
    }
    if let Some(level) = take("MUSICMIDI_LOG_LEVEL") {
        config.logging.level = level;
    }
    // wins over MUSICMIDI_LOG_LEVEL
    if let Some(level) = take("RUST_LOG") {
        config.logging.level = level;
    }

    Ok(())
}

/// `~/rest` and `$VAR/rest` are expanded; anything else is taken literally
pub fn expand_path(path: &str) -> PathBuf {
    if let Some(stripped) = path.strip_prefix("~/") {
        if let Some(home) = directories::BaseDirs::new().map(|d| d.home_dir().to_path_buf()) {
            return home.join(stripped);
        }
    } else if let Some(stripped) = path.strip_prefix('$') {
        // $VAR/rest/of/path
        let (var_name, rest) = match stripped.find('/') {
            Some(slash_pos) => (&stripped[..slash_pos], Some(&stripped[slash_pos + 1..])),
            None => (stripped, None),
        };
        if let Ok(var_value) = env::var(var_name) {
            let base = PathBuf::from(var_value);
            return match rest {
                Some(rest) => base.join(rest),
                None => base,
            };
        }
    }
    PathBuf::from(path)
}

#[cfg(test)]
mod tests {
    use super::*;
    use pretty_assertions::assert_eq;
    use std::collections::HashMap;
    use std::io::Write;

    fn overlay(toml: &str) -> Result<MusicConfig, ConfigError> {
        let mut config = MusicConfig::default();
        apply_toml(&mut config, toml, Path::new("test.toml"))?;
        Ok(config)
    }

    #[test]
    fn test_expand_path_tilde() {
        let expanded = expand_path("~/test/path");
        assert!(!expanded.to_string_lossy().starts_with('~'));
        assert!(expanded.to_string_lossy().contains("test/path"));
    }

    #[test]
    fn test_expand_path_absolute() {
        assert_eq!(expand_path("/absolute/path"), PathBuf::from("/absolute/path"));
    }

    #[test]
    fn test_expand_path_unknown_var_is_literal() {
        let path = "$MUSICMIDI_SURELY_UNSET_VAR/out";
        assert_eq!(expand_path(path), PathBuf::from(path));
    }

    #[test]
    fn test_parse_minimal_toml() {
        let config = overlay("[convert]\nstyle = \"waltz\"\n").unwrap();
        assert_eq!(config.convert.style, "waltz");
        assert_eq!(config.convert.harmony_window, 1);
        assert_eq!(config.logging.level, "info");
    }

    #[test]
    fn test_parse_full_toml() {
        let toml = r#"
[convert]
style = "genre"
genre = "jazz"
harmony_window = 2

[output]
dir = "/data/midi"
versioned = false

[velocity]
p = 45
mf = 85

[programs]
piano = 4

[logging]
level = "debug"
"#;
        let config = overlay(toml).unwrap();
        assert_eq!(config.convert.style, "genre");
        assert_eq!(config.convert.genre.as_deref(), Some("jazz"));
        assert_eq!(config.convert.harmony_window, 2);
        assert_eq!(config.output.dir, PathBuf::from("/data/midi"));
        assert!(!config.output.versioned);
        assert_eq!(config.velocity.get("p"), Some(&45));
        assert_eq!(config.velocity.get("mf"), Some(&85));
        assert_eq!(config.programs.get("piano"), Some(&4));
        assert_eq!(config.logging.level, "debug");
    }

    #[test]
    fn test_later_file_wins_key_by_key() {
        let mut config = MusicConfig::default();
        let path = Path::new("test.toml");
        apply_toml(&mut config, "[convert]\nstyle = \"waltz\"\nharmony_window = 3\n", path).unwrap();
        apply_toml(&mut config, "[convert]\nstyle = \"alberti\"\n", path).unwrap();
        assert_eq!(config.convert.style, "alberti");
        assert_eq!(config.convert.harmony_window, 3);
    }

    #[test]
    fn test_wrong_types_are_parse_errors() {
        for toml in [
            "[convert]\nharmony_window = 0\n",
            "[convert]\nstyle = 3\n",
            "[velocity]\nmf = 300\n",
            "[output]\nversioned = \"yes\"\n",
            "convert = 1\n",
            "[convert\n",
        ] {
            let err = overlay(toml).unwrap_err();
            assert!(matches!(err, ConfigError::Parse { .. }), "{toml:?} gave {err}");
        }
    }

    #[test]
    fn test_apply_file_reads_from_disk() {
        let mut file = tempfile::NamedTempFile::new().unwrap();
        writeln!(file, "[output]\ndir = \"/tmp/songs\"").unwrap();

        let mut config = MusicConfig::default();
        apply_file(&mut config, file.path()).unwrap();
        assert_eq!(config.output.dir, PathBuf::from("/tmp/songs"));
    }

    #[test]
    fn test_cli_path_is_returned_even_when_missing() {
        let dir = tempfile::tempdir().unwrap();
        let missing = dir.path().join("nope.toml");
        let files = discover_config_files_with_override(Some(&missing));
        assert_eq!(files.last(), Some(&missing));

        let err = MusicConfig::load_from(Some(&missing)).unwrap_err();
        assert!(matches!(err, ConfigError::FileRead { .. }));
    }

    #[test]
    fn test_env_overrides() {
        let vars: HashMap<&str, &str> = [
            ("MUSICMIDI_STYLE", "genre"),
            ("MUSICMIDI_GENRE", "rock"),
            ("MUSICMIDI_HARMONY_WINDOW", "4"),
            ("MUSICMIDI_LOG_LEVEL", "warn"),
        ]
        .into_iter()
        .collect();

        let mut config = MusicConfig::default();
        let mut sources = ConfigSources::default();
        apply_env_from(&mut config, &mut sources, |k| vars.get(k).map(|v| v.to_string())).unwrap();

        assert_eq!(config.convert.style, "genre");
        assert_eq!(config.convert.genre.as_deref(), Some("rock"));
        assert_eq!(config.convert.harmony_window, 4);
        assert_eq!(config.logging.level, "warn");
        assert_eq!(sources.env_overrides.len(), 4);
    }

    #[test]
    fn test_rust_log_beats_log_level() {
        let mut config = MusicConfig::default();
        let mut sources = ConfigSources::default();
        apply_env_from(&mut config, &mut sources, |k| match k {
            "MUSICMIDI_LOG_LEVEL" => Some("warn".to_string()),
            "RUST_LOG" => Some("musicmidi=trace".to_string()),
            _ => None,
        })
        .unwrap();
        assert_eq!(config.logging.level, "musicmidi=trace");
    }

    #[test]
    fn test_bad_harmony_window_env() {
        let mut config = MusicConfig::default();
        let mut sources = ConfigSources::default();
        let err = apply_env_from(&mut config, &mut sources, |k| {
            (k == "MUSICMIDI_HARMONY_WINDOW").then(|| "zero".to_string())
        })
        .unwrap_err();
        assert!(err.to_string().contains("MUSICMIDI_HARMONY_WINDOW"));
    }
}
