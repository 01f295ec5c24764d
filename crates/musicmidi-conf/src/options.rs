//! Turning configuration into conversion options.

use musicmidi::{
    AccompanimentStyle, ConvertOptions, Dynamic, Genre, Instrument, MidiParams, ProgramTable,
    StyleChoice, StyleLookup, VelocityTable,
};

use crate::{ConfigError, MusicConfig};

/// Command-line values that take precedence over the config file
#[derive(Debug, Clone, Default, PartialEq, Eq)]
pub struct Overrides {
    pub style: Option<String>,
    pub genre: Option<String>,
    pub harmony_window: Option<u16>,
}

fn parse_genre(key: &str, word: &str) -> Result<Genre, ConfigError> {
    Genre::parse(word).ok_or_else(|| {
        ConfigError::invalid(
            key,
            format!(
                "unknown genre '{word}' (genres are {})",
                Genre::ALL.map(|g| g.name()).join(", ")
            ),
        )
    })
}

impl MusicConfig {
    /// How to pick the accompaniment style.
    ///
    /// A style from the command line is used as is. A style from the config
    /// yields to a song's own `Style:` header. `genre` takes its genre from
    /// the command line, then the song, then `convert.genre`.
    pub fn style_choice(&self, overrides: &Overrides) -> Result<StyleChoice, ConfigError> {
        let genre = overrides
            .genre
            .as_deref()
            .map(|g| parse_genre("--genre", g))
            .transpose()?;
        let fallback = self
            .convert
            .genre
            .as_deref()
            .map(|g| parse_genre("convert.genre", g))
            .transpose()?;

        let (key, word, fixed) = match overrides.style.as_deref() {
            Some(word) => ("--style", word, true),
            None => ("convert.style", self.convert.style.as_str(), false),
        };

        match AccompanimentStyle::parse(word, None) {
            Ok(style) if fixed => Ok(StyleChoice::Fixed(style)),
            Ok(style @ AccompanimentStyle::Genre(_)) => Ok(StyleChoice::Fixed(style)),
            Ok(style) => Ok(StyleChoice::Default(style)),
            Err(StyleLookup::NeedsGenre) => Ok(StyleChoice::Genre { genre, fallback }),
            Err(StyleLookup::Unknown) => Err(ConfigError::invalid(
                key,
                format!(
                    "unknown style '{word}' (styles are none, basic, quarter, half, whole, waltz, alberti, arpeggio, genre or a genre name)"
                ),
            )),
        }
    }

    /// Velocity and program tables.
    pub fn midi_params(&self) -> Result<MidiParams, ConfigError> {
        let velocities = if self.velocity.is_empty() {
            VelocityTable::default()
        } else {
            let entries = self
                .velocity
                .iter()
                .map(|(name, velocity)| {
                    Dynamic::parse(name)
                        .map(|dynamic| (dynamic, *velocity))
                        .ok_or_else(|| {
                            ConfigError::invalid(
                                format!("velocity.{name}"),
                                "dynamics are ppp, pp, p, mp, mf, f, ff, fff",
                            )
                        })
                })
                .collect::<Result<Vec<_>, _>>()?;
            VelocityTable::new(entries)
        };

        let mut programs = ProgramTable::default();
        for (name, program) in &self.programs {
            let instrument = Instrument::parse(name).ok_or_else(|| {
                ConfigError::invalid(
                    format!("programs.{name}"),
                    format!(
                        "instruments are {}",
                        Instrument::ALL.map(|i| i.name()).join(", ")
                    ),
                )
            })?;
            programs.set(instrument, *program);
        }

        Ok(MidiParams {
            velocities,
            programs,
        })
    }

    /// Everything [`musicmidi::convert`] needs.
    pub fn convert_options(&self, overrides: &Overrides) -> Result<ConvertOptions, ConfigError> {
        Ok(ConvertOptions {
            style: self.style_choice(overrides)?,
            harmony_window: overrides
                .harmony_window
                .unwrap_or(self.convert.harmony_window)
                .max(1),
            midi: self.midi_params()?,
        })
    }
}
