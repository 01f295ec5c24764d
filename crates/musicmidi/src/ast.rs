//! Song model produced by the parser.
//!
//! Positions are symbolic here (measure number plus a beat offset); the
//! timing module turns them into ticks.

use std::fmt;

use serde::{Deserialize, Serialize};

use crate::fraction::Fraction;

/// Highest measure number a song may reference.
pub const MAX_MEASURE: u16 = 1000;

/// A parsed song
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Song {
    pub header: Header,
    pub voices: Vec<Voice>,
    pub tempo_changes: Vec<TempoChange>,
    pub meter_changes: Vec<MeterChange>,
    pub sections: Vec<Section>,
}

impl Song {
    /// Base tempo, falling back to 120 BPM.
    pub fn tempo(&self) -> Tempo {
        self.header.tempo.unwrap_or_default()
    }

    /// Base time signature, falling back to 4/4.
    pub fn time_signature(&self) -> TimeSignature {
        self.header.time_signature.unwrap_or_default()
    }

    /// Highest measure referenced by any event or change line.
    pub fn last_measure(&self) -> u16 {
        let events = self
            .voices
            .iter()
            .flat_map(|v| v.events.iter())
            .map(|e| e.position.measure);
        let tempos = self.tempo_changes.iter().map(|c| c.measure);
        let meters = self.meter_changes.iter().map(|c| c.measure);
        events.chain(tempos).chain(meters).max().unwrap_or(0)
    }
}

/// Song header (metadata)
#[derive(Debug, Clone, Default, PartialEq, Serialize, Deserialize)]
pub struct Header {
    pub title: String,
    pub key: Option<Key>,
    pub tempo: Option<Tempo>,
    pub time_signature: Option<TimeSignature>,
    pub genre: Option<Genre>,
    pub style: Option<AccompanimentStyle>,
    /// Declared song length in measures (`Measures:`).
    pub measures: Option<u16>,
    pub other_fields: Vec<InfoField>,
}

/// Header line the parser does not interpret
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct InfoField {
    pub name: String,
    pub value: String,
}

/// Note names (without accidentals)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum NoteName {
    C,
    D,
    E,
    F,
    G,
    A,
    B,
}

impl NoteName {
    /// Semitone offset from C (0-11)
    pub fn to_semitone(&self) -> i16 {
        match self {
            NoteName::C => 0,
            NoteName::D => 2,
            NoteName::E => 4,
            NoteName::F => 5,
            NoteName::G => 7,
            NoteName::A => 9,
            NoteName::B => 11,
        }
    }

    /// Parse a single letter (case-insensitive)
    pub fn from_char(c: char) -> Option<NoteName> {
        match c.to_ascii_uppercase() {
            'C' => Some(NoteName::C),
            'D' => Some(NoteName::D),
            'E' => Some(NoteName::E),
            'F' => Some(NoteName::F),
            'G' => Some(NoteName::G),
            'A' => Some(NoteName::A),
            'B' => Some(NoteName::B),
            _ => None,
        }
    }

    /// Position on the circle of fifths for the major key on this letter.
    fn major_fifths(&self) -> i8 {
        match self {
            NoteName::C => 0,
            NoteName::G => 1,
            NoteName::D => 2,
            NoteName::A => 3,
            NoteName::E => 4,
            NoteName::B => 5,
            NoteName::F => -1,
        }
    }
}

impl fmt::Display for NoteName {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let letter = match self {
            NoteName::C => "C",
            NoteName::D => "D",
            NoteName::E => "E",
            NoteName::F => "F",
            NoteName::G => "G",
            NoteName::A => "A",
            NoteName::B => "B",
        };
        f.write_str(letter)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub enum Accidental {
    Sharp,
    Flat,
}

impl Accidental {
    pub fn to_semitone_offset(&self) -> i16 {
        match self {
            Accidental::Sharp => 1,
            Accidental::Flat => -1,
        }
    }

    pub fn from_char(c: char) -> Option<Accidental> {
        match c {
            '#' => Some(Accidental::Sharp),
            'b' => Some(Accidental::Flat),
            _ => None,
        }
    }

    pub fn symbol(&self) -> &'static str {
        match self {
            Accidental::Sharp => "#",
            Accidental::Flat => "b",
        }
    }
}

/// A pitch that maps to a valid MIDI note number.
///
/// Octaves follow scientific pitch notation, so C4 is MIDI 60.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
pub struct Pitch {
    pub name: NoteName,
    pub accidental: Option<Accidental>,
    pub octave: u8,
}

impl Pitch {
    /// Build a pitch, returning `None` when it falls outside 0-127.
    pub fn new(name: NoteName, accidental: Option<Accidental>, octave: u8) -> Option<Pitch> {
        let pitch = Pitch {
            name,
            accidental,
            octave,
        };
        (0..=127).contains(&pitch.raw_number()).then_some(pitch)
    }

    fn raw_number(&self) -> i16 {
        let accidental = self.accidental.map_or(0, |a| a.to_semitone_offset());
        self.name.to_semitone() + accidental + (self.octave as i16 + 1) * 12
    }

    pub fn midi_number(&self) -> u8 {
        self.raw_number().clamp(0, 127) as u8
    }
}

impl fmt::Display for Pitch {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.name)?;
        if let Some(acc) = self.accidental {
            f.write_str(acc.symbol())?;
        }
        write!(f, "{}", self.octave)
    }
}

/// Base note values
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub enum NoteValue {
    Whole,
    Half,
    Quarter,
    Eighth,
    Sixteenth,
    ThirtySecond,
}

impl NoteValue {
    /// Denominator of the value relative to a whole note.
    pub fn divisions(&self) -> u64 {
        match self {
            NoteValue::Whole => 1,
            NoteValue::Half => 2,
            NoteValue::Quarter => 4,
            NoteValue::Eighth => 8,
            NoteValue::Sixteenth => 16,
            NoteValue::ThirtySecond => 32,
        }
    }

    pub fn from_name(name: &str) -> Option<NoteValue> {
        match name.to_ascii_lowercase().as_str() {
            "whole" => Some(NoteValue::Whole),
            "half" => Some(NoteValue::Half),
            "quarter" => Some(NoteValue::Quarter),
            "eighth" => Some(NoteValue::Eighth),
            "sixteenth" => Some(NoteValue::Sixteenth),
            "thirtysecond" => Some(NoteValue::ThirtySecond),
            _ => None,
        }
    }

    /// Single-letter code used by compact bar notation.
    pub fn from_code(code: char) -> Option<NoteValue> {
        match code {
            'w' => Some(NoteValue::Whole),
            'h' => Some(NoteValue::Half),
            'q' => Some(NoteValue::Quarter),
            'e' => Some(NoteValue::Eighth),
            's' => Some(NoteValue::Sixteenth),
            't' => Some(NoteValue::ThirtySecond),
            _ => None,
        }
    }
}

/// A note length as an exact fraction of a whole note
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Duration {
    pub value: NoteValue,
    pub dotted: bool,
}

impl Duration {
    pub fn new(value: NoteValue) -> Self {
        Duration {
            value,
            dotted: false,
        }
    }

    pub fn dotted(value: NoteValue) -> Self {
        Duration {
            value,
            dotted: true,
        }
    }

    /// Length in whole notes (dotted = x3/2)
    pub fn whole_notes(&self) -> Fraction {
        let base = Fraction::new(1, self.value.divisions());
        if self.dotted {
            base * Fraction::new(3, 2)
        } else {
            base
        }
    }
}

/// Loudness markings, softest first
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
pub enum Dynamic {
    Ppp,
    Pp,
    P,
    Mp,
    Mf,
    F,
    Ff,
    Fff,
}

impl Dynamic {
    pub const ALL: [Dynamic; 8] = [
        Dynamic::Ppp,
        Dynamic::Pp,
        Dynamic::P,
        Dynamic::Mp,
        Dynamic::Mf,
        Dynamic::F,
        Dynamic::Ff,
        Dynamic::Fff,
    ];

    pub fn parse(s: &str) -> Option<Dynamic> {
        Dynamic::ALL.into_iter().find(|d| d.name() == s)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Dynamic::Ppp => "ppp",
            Dynamic::Pp => "pp",
            Dynamic::P => "p",
            Dynamic::Mp => "mp",
            Dynamic::Mf => "mf",
            Dynamic::F => "f",
            Dynamic::Ff => "ff",
            Dynamic::Fff => "fff",
        }
    }

    /// Default MIDI velocity for this marking.
    pub fn default_velocity(&self) -> u8 {
        match self {
            Dynamic::Ppp => 10,
            Dynamic::Pp => 20,
            Dynamic::P => 40,
            Dynamic::Mp => 60,
            Dynamic::Mf => 80,
            Dynamic::F => 100,
            Dynamic::Ff => 120,
            Dynamic::Fff => 127,
        }
    }

    /// True for words built only from dynamic letters, like `pppp` or `mff`.
    pub fn looks_like_dynamic(s: &str) -> bool {
        !s.is_empty() && s.chars().all(|c| matches!(c, 'p' | 'm' | 'f'))
    }
}

impl fmt::Display for Dynamic {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TimeSignature {
    pub numerator: u8,
    pub denominator: u8,
}

impl TimeSignature {
    pub const COMMON: TimeSignature = TimeSignature {
        numerator: 4,
        denominator: 4,
    };

    /// Measure length in whole notes.
    pub fn measure_length(&self) -> Fraction {
        Fraction::new(self.numerator as u64, self.denominator as u64)
    }

    /// Length of one beat (the denominator note) in whole notes.
    pub fn beat_length(&self) -> Fraction {
        Fraction::new(1, self.denominator as u64)
    }
}

impl Default for TimeSignature {
    fn default() -> Self {
        TimeSignature::COMMON
    }
}

impl fmt::Display for TimeSignature {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}/{}", self.numerator, self.denominator)
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Tempo {
    pub bpm: u16,
}

impl Default for Tempo {
    fn default() -> Self {
        Tempo { bpm: 120 }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
pub enum Mode {
    #[default]
    Major,
    Minor,
}

impl Mode {
    pub fn parse(s: &str) -> Option<Mode> {
        match s.to_lowercase().as_str() {
            "" | "maj" | "major" => Some(Mode::Major),
            "m" | "min" | "minor" => Some(Mode::Minor),
            _ => None,
        }
    }
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Key {
    pub root: NoteName,
    pub accidental: Option<Accidental>,
    pub mode: Mode,
}

impl Key {
    /// Sharps (positive) or flats (negative), or `None` for theoretical keys
    /// such as D# major that have no standard signature.
    pub fn signature(&self) -> Option<i8> {
        let mut fifths = self.root.major_fifths();
        if self.mode == Mode::Minor {
            fifths -= 3;
        }
        fifths += match self.accidental {
            Some(Accidental::Sharp) => 7,
            Some(Accidental::Flat) => -7,
            None => 0,
        };
        (-7..=7).contains(&fifths).then_some(fifths)
    }
}

impl fmt::Display for Key {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        write!(f, "{}", self.root)?;
        if let Some(acc) = self.accidental {
            f.write_str(acc.symbol())?;
        }
        if self.mode == Mode::Minor {
            f.write_str("m")?;
        }
        Ok(())
    }
}

/// Genre presets for the genre accompaniment style
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Genre {
    Classical,
    Baroque,
    Romantic,
    Pop,
    Rock,
    Jazz,
    Swing,
}

impl Genre {
    pub const ALL: [Genre; 7] = [
        Genre::Classical,
        Genre::Baroque,
        Genre::Romantic,
        Genre::Pop,
        Genre::Rock,
        Genre::Jazz,
        Genre::Swing,
    ];

    pub fn parse(s: &str) -> Option<Genre> {
        let lower = s.trim().to_lowercase();
        Genre::ALL.into_iter().find(|g| g.name() == lower)
    }

    pub fn name(&self) -> &'static str {
        match self {
            Genre::Classical => "classical",
            Genre::Baroque => "baroque",
            Genre::Romantic => "romantic",
            Genre::Pop => "pop",
            Genre::Rock => "rock",
            Genre::Jazz => "jazz",
            Genre::Swing => "swing",
        }
    }
}

impl fmt::Display for Genre {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Accompaniment styles. The genre style carries its genre.
#[derive(Debug, Clone, Copy, PartialEq, Eq, Hash, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum AccompanimentStyle {
    None,
    Basic,
    Quarter,
    Half,
    Whole,
    Waltz,
    Alberti,
    Arpeggio,
    Genre(Genre),
}

/// Why a style word could not be turned into an [`AccompanimentStyle`].
#[derive(Debug, Clone, PartialEq, Eq)]
pub enum StyleLookup {
    Unknown,
    NeedsGenre,
}

impl AccompanimentStyle {
    /// Parse a style word. A genre name selects that genre directly; the word
    /// `genre` uses `genre` and fails when it is absent.
    pub fn parse(s: &str, genre: Option<Genre>) -> Result<AccompanimentStyle, StyleLookup> {
        let lower = s.trim().to_lowercase();
        let style = match lower.as_str() {
            "none" => AccompanimentStyle::None,
            "basic" => AccompanimentStyle::Basic,
            "quarter" => AccompanimentStyle::Quarter,
            "half" => AccompanimentStyle::Half,
            "whole" => AccompanimentStyle::Whole,
            "waltz" => AccompanimentStyle::Waltz,
            "alberti" => AccompanimentStyle::Alberti,
            "arpeggio" => AccompanimentStyle::Arpeggio,
            "genre" => {
                return genre
                    .map(AccompanimentStyle::Genre)
                    .ok_or(StyleLookup::NeedsGenre)
            }
            other => {
                return Genre::parse(other)
                    .map(AccompanimentStyle::Genre)
                    .ok_or(StyleLookup::Unknown)
            }
        };
        Ok(style)
    }
}

impl fmt::Display for AccompanimentStyle {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        let name = match self {
            AccompanimentStyle::None => "none",
            AccompanimentStyle::Basic => "basic",
            AccompanimentStyle::Quarter => "quarter",
            AccompanimentStyle::Half => "half",
            AccompanimentStyle::Whole => "whole",
            AccompanimentStyle::Waltz => "waltz",
            AccompanimentStyle::Alberti => "alberti",
            AccompanimentStyle::Arpeggio => "arpeggio",
            AccompanimentStyle::Genre(genre) => return write!(f, "genre ({genre})"),
        };
        f.write_str(name)
    }
}

/// Instrument timbres a voice can be assigned
#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Hash, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Instrument {
    Piano,
    Harpsichord,
    Organ,
    AcousticGuitar,
    ElectricGuitar,
    OverdrivenGuitar,
    AcousticBass,
    ElectricBass,
    Strings,
    Drums,
}

impl Instrument {
    pub const ALL: [Instrument; 10] = [
        Instrument::Piano,
        Instrument::Harpsichord,
        Instrument::Organ,
        Instrument::AcousticGuitar,
        Instrument::ElectricGuitar,
        Instrument::OverdrivenGuitar,
        Instrument::AcousticBass,
        Instrument::ElectricBass,
        Instrument::Strings,
        Instrument::Drums,
    ];

    pub fn name(&self) -> &'static str {
        match self {
            Instrument::Piano => "piano",
            Instrument::Harpsichord => "harpsichord",
            Instrument::Organ => "organ",
            Instrument::AcousticGuitar => "acoustic-guitar",
            Instrument::ElectricGuitar => "electric-guitar",
            Instrument::OverdrivenGuitar => "overdriven-guitar",
            Instrument::AcousticBass => "acoustic-bass",
            Instrument::ElectricBass => "electric-bass",
            Instrument::Strings => "strings",
            Instrument::Drums => "drums",
        }
    }

    /// Accepts the canonical names plus a few short aliases.
    pub fn parse(s: &str) -> Option<Instrument> {
        let lower = s.trim().to_lowercase().replace(' ', "-");
        match lower.as_str() {
            "guitar" => Some(Instrument::AcousticGuitar),
            "bass" => Some(Instrument::AcousticBass),
            "drum" | "drum-kit" | "percussion" => Some(Instrument::Drums),
            _ => Instrument::ALL.into_iter().find(|i| i.name() == lower),
        }
    }

    /// Played on the General MIDI percussion channel.
    pub fn is_percussion(&self) -> bool {
        matches!(self, Instrument::Drums)
    }
}

impl fmt::Display for Instrument {
    fn fmt(&self, f: &mut fmt::Formatter<'_>) -> fmt::Result {
        f.write_str(self.name())
    }
}

/// Measure number plus zero-based beat offset (in beats of the active meter)
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Position {
    pub measure: u16,
    pub offset: Fraction,
}

impl Position {
    pub fn new(measure: u16, offset: Fraction) -> Self {
        Position { measure, offset }
    }

    /// The one-based beat number as written in the source (`offset + 1`).
    pub fn beat(&self) -> Fraction {
        self.offset + Fraction::ONE
    }
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub enum EventKind {
    Note(Pitch),
    Chord(Vec<Pitch>),
    Rest,
}

/// A note, chord or rest at a symbolic position
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Event {
    /// Source line, one-based
    pub line: usize,
    pub position: Position,
    pub kind: EventKind,
    pub duration: Duration,
    pub dynamic: Dynamic,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Voice {
    pub name: String,
    pub instrument: Instrument,
    pub events: Vec<Event>,
}

impl Voice {
    pub fn new(name: impl Into<String>, instrument: Instrument) -> Self {
        Voice {
            name: name.into(),
            instrument,
            events: Vec::new(),
        }
    }
}

/// Name assigned to events that precede any `Voice:` line.
pub const DEFAULT_VOICE: &str = "Melody";

impl Default for Voice {
    fn default() -> Self {
        Voice::new(DEFAULT_VOICE, Instrument::Piano)
    }
}

/// Tempo taking effect at the start of a measure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct TempoChange {
    pub line: usize,
    pub measure: u16,
    pub tempo: Tempo,
}

/// Time signature taking effect at the start of a measure
#[derive(Debug, Clone, Copy, PartialEq, Serialize, Deserialize)]
pub struct MeterChange {
    pub line: usize,
    pub measure: u16,
    pub time_signature: TimeSignature,
}

/// A named span of the song, optionally with its own accompaniment style
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct Section {
    pub line: usize,
    pub name: String,
    pub style: Option<AccompanimentStyle>,
    /// First measure of the section
    pub measure: u16,
}

#[cfg(test)]
mod tests {
    use super::*;

    #[test]
    fn test_pitch_midi_number() {
        let c4 = Pitch::new(NoteName::C, None, 4).unwrap();
        assert_eq!(c4.midi_number(), 60);

        let a4 = Pitch::new(NoteName::A, None, 4).unwrap();
        assert_eq!(a4.midi_number(), 69);

        let f_sharp = Pitch::new(NoteName::F, Some(Accidental::Sharp), 4).unwrap();
        assert_eq!(f_sharp.midi_number(), 66);

        let b_flat = Pitch::new(NoteName::B, Some(Accidental::Flat), 3).unwrap();
        assert_eq!(b_flat.midi_number(), 58);
    }

    #[test]
    fn test_pitch_range() {
        assert!(Pitch::new(NoteName::C, None, 0).is_some());
        assert!(Pitch::new(NoteName::G, None, 9).is_some());
        assert!(Pitch::new(NoteName::G, Some(Accidental::Sharp), 9).is_none());
        assert!(Pitch::new(NoteName::C, Some(Accidental::Flat), 0).is_some());
        assert_eq!(
            Pitch::new(NoteName::C, Some(Accidental::Flat), 0).map(|p| p.midi_number()),
            Some(11)
        );
    }

    #[test]
    fn test_duration_fractions() {
        assert_eq!(Duration::new(NoteValue::Quarter).whole_notes(), Fraction::new(1, 4));
        assert_eq!(Duration::dotted(NoteValue::Quarter).whole_notes(), Fraction::new(3, 8));
        assert_eq!(
            Duration::new(NoteValue::ThirtySecond).whole_notes(),
            Fraction::new(1, 32)
        );
    }

    #[test]
    fn test_dynamic_parse() {
        assert_eq!(Dynamic::parse("mf"), Some(Dynamic::Mf));
        assert_eq!(Dynamic::parse("pppp"), None);
        assert!(Dynamic::looks_like_dynamic("pppp"));
        assert!(!Dynamic::looks_like_dynamic("loud"));
        assert_eq!(Dynamic::P.default_velocity(), 40);
        assert_eq!(Dynamic::Mf.default_velocity(), 80);
    }

    #[test]
    fn test_key_signature() {
        let key = |root, accidental, mode| Key {
            root,
            accidental,
            mode,
        };
        assert_eq!(key(NoteName::C, None, Mode::Major).signature(), Some(0));
        assert_eq!(key(NoteName::E, None, Mode::Minor).signature(), Some(1));
        assert_eq!(
            key(NoteName::B, Some(Accidental::Flat), Mode::Major).signature(),
            Some(-2)
        );
        assert_eq!(
            key(NoteName::F, Some(Accidental::Sharp), Mode::Minor).signature(),
            Some(3)
        );
        assert_eq!(
            key(NoteName::D, Some(Accidental::Sharp), Mode::Major).signature(),
            None
        );
    }

    #[test]
    fn test_style_parse() {
        assert_eq!(
            AccompanimentStyle::parse("Waltz", None),
            Ok(AccompanimentStyle::Waltz)
        );
        assert_eq!(
            AccompanimentStyle::parse("jazz", None),
            Ok(AccompanimentStyle::Genre(Genre::Jazz))
        );
        assert_eq!(
            AccompanimentStyle::parse("genre", Some(Genre::Rock)),
            Ok(AccompanimentStyle::Genre(Genre::Rock))
        );
        assert_eq!(
            AccompanimentStyle::parse("genre", None),
            Err(StyleLookup::NeedsGenre)
        );
        assert_eq!(
            AccompanimentStyle::parse("polka", None),
            Err(StyleLookup::Unknown)
        );
    }

    #[test]
    fn test_instrument_aliases() {
        assert_eq!(Instrument::parse("bass"), Some(Instrument::AcousticBass));
        assert_eq!(
            Instrument::parse("Electric Guitar"),
            Some(Instrument::ElectricGuitar)
        );
        assert_eq!(Instrument::parse("kazoo"), None);
    }
}
