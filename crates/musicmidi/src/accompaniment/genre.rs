//! Per-genre accompaniment bundles.

use serde::{Deserialize, Serialize};

use crate::ast::{Dynamic, Genre, Instrument, NoteValue};

use super::patterns::Pattern;
use super::{AccompanimentStrategy, Feel, Part, Role};

/// The parts and feel a genre plays
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct GenreProfile {
    pub genre: Genre,
    pub parts: Vec<Part>,
    pub feel: Feel,
}

impl GenreProfile {
    pub fn for_genre(genre: Genre) -> Self {
        let parts = match genre {
            Genre::Classical => vec![Part::chords(Instrument::Piano, Pattern::Alberti)],
            Genre::Baroque => vec![
                Part::bass(Instrument::Harpsichord, Pattern::RootEveryBeat),
                Part::chords(Instrument::Harpsichord, Pattern::Pulse(NoteValue::Quarter)),
            ],
            Genre::Romantic => vec![
                Part::chords(Instrument::Piano, Pattern::Arpeggio),
                Part {
                    role: Role::Pad,
                    instrument: Instrument::Strings,
                    pattern: Pattern::Sustained,
                    dynamic: Dynamic::P,
                    floor: 60,
                },
            ],
            Genre::Pop => vec![
                Part::bass(Instrument::ElectricBass, Pattern::RootFifthEighths),
                Part::drums(Pattern::Backbeat),
            ],
            Genre::Rock => vec![
                Part::bass(Instrument::ElectricBass, Pattern::RootEighths).with_dynamic(Dynamic::F),
                Part::chords(Instrument::OverdrivenGuitar, Pattern::PowerChords)
                    .with_dynamic(Dynamic::Mf),
                Part::drums(Pattern::Backbeat).with_dynamic(Dynamic::F),
            ],
            Genre::Jazz => vec![
                Part::bass(Instrument::AcousticBass, Pattern::WalkingBass),
                Part::chords(Instrument::Piano, Pattern::Comping),
            ],
            Genre::Swing => vec![
                Part::bass(Instrument::AcousticBass, Pattern::WalkingBass),
                Part::chords(Instrument::Piano, Pattern::SwingComping),
                Part::drums(Pattern::Ride).with_dynamic(Dynamic::Mp),
            ],
        };
        let feel = match genre {
            Genre::Swing => Feel::Swing,
            _ => Feel::Straight,
        };
        GenreProfile { genre, parts, feel }
    }
}

impl AccompanimentStrategy for GenreProfile {
    fn parts(&self) -> &[Part] {
        &self.parts
    }

    fn feel(&self) -> Feel {
        self.feel
    }
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_every_genre_has_parts() {
        for genre in Genre::ALL {
            let profile = GenreProfile::for_genre(genre);
            assert!(!profile.parts.is_empty(), "{genre}");
        }
    }

    #[test]
    fn test_only_swing_swings() {
        let swinging: Vec<Genre> = Genre::ALL
            .into_iter()
            .filter(|g| GenreProfile::for_genre(*g).feel == Feel::Swing)
            .collect();
        assert_eq!(swinging, vec![Genre::Swing]);
    }

    #[test]
    fn test_rock_band() {
        let profile = GenreProfile::for_genre(Genre::Rock);
        let instruments: Vec<Instrument> = profile.parts.iter().map(|p| p.instrument).collect();
        assert_eq!(
            instruments,
            vec![
                Instrument::ElectricBass,
                Instrument::OverdrivenGuitar,
                Instrument::Drums
            ]
        );
    }

    #[test]
    fn test_pop_is_bass_and_drums() {
        let profile = GenreProfile::for_genre(Genre::Pop);
        let roles: Vec<Role> = profile.parts.iter().map(|p| p.role).collect();
        assert_eq!(roles, vec![Role::Bass, Role::Drums]);
    }
}
