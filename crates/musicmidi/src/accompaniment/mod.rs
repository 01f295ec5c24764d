//! Accompaniment generation.
//!
//! Each [`AccompanimentStyle`] maps to an [`AccompanimentStrategy`]: a list of
//! parts, each playing a [`Pattern`] over the harmony detected in the melody.
//! The melody (the song's first voice) is only read; new voices are returned.

pub mod genre;
pub mod harmony;
pub mod patterns;

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{AccompanimentStyle, Dynamic, Instrument, NoteValue};
use crate::timing::{MeasureFrame, ResolvedNote, ResolvedSong, ResolvedVoice};

pub use genre::GenreProfile;
pub use harmony::{ChordQuality, Harmony, HarmonyAnalyzer, TemplateAnalyzer};
pub use patterns::Pattern;

use patterns::{swing, MeasureContext};

/// Rhythmic feel applied to every part of a strategy
#[derive(Debug, Clone, Copy, PartialEq, Eq, Default, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Feel {
    #[default]
    Straight,
    /// Off-beat eighths land on the last third of the beat
    Swing,
}

#[derive(Debug, Clone, Copy, PartialEq, Eq, PartialOrd, Ord, Serialize, Deserialize)]
#[serde(rename_all = "lowercase")]
pub enum Role {
    Bass,
    Chords,
    Pad,
    Drums,
}

impl Role {
    pub fn label(&self) -> &'static str {
        match self {
            Role::Bass => "Bass",
            Role::Chords => "Chords",
            Role::Pad => "Pad",
            Role::Drums => "Drums",
        }
    }
}

/// One accompanying line
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct Part {
    pub role: Role,
    pub instrument: Instrument,
    pub pattern: Pattern,
    pub dynamic: Dynamic,
    /// Lowest pitch the root is voiced at
    pub floor: u8,
}

impl Part {
    pub fn bass(instrument: Instrument, pattern: Pattern) -> Self {
        Part {
            role: Role::Bass,
            instrument,
            pattern,
            dynamic: Dynamic::Mf,
            floor: 36,
        }
    }

    pub fn chords(instrument: Instrument, pattern: Pattern) -> Self {
        Part {
            role: Role::Chords,
            instrument,
            pattern,
            dynamic: Dynamic::Mp,
            floor: 48,
        }
    }

    pub fn drums(pattern: Pattern) -> Self {
        Part {
            role: Role::Drums,
            instrument: Instrument::Drums,
            pattern,
            dynamic: Dynamic::Mf,
            floor: 0,
        }
    }

    pub fn with_dynamic(mut self, dynamic: Dynamic) -> Self {
        self.dynamic = dynamic;
        self
    }

    fn voice_name(&self) -> String {
        format!("{} ({})", self.role.label(), self.instrument)
    }
}

/// What a style plays
pub trait AccompanimentStrategy: Send + Sync {
    fn parts(&self) -> &[Part];

    fn feel(&self) -> Feel {
        Feel::Straight
    }
}

/// A fixed set of straight parts
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct PatternStyle {
    parts: Vec<Part>,
}

impl PatternStyle {
    pub fn new(parts: Vec<Part>) -> Self {
        PatternStyle { parts }
    }
}

impl AccompanimentStrategy for PatternStyle {
    fn parts(&self) -> &[Part] {
        &self.parts
    }
}

/// The strategy for a style; `None` plays nothing.
pub fn strategy(style: AccompanimentStyle) -> Option<Box<dyn AccompanimentStrategy>> {
    let single = |part: Part| -> Option<Box<dyn AccompanimentStrategy>> {
        Some(Box::new(PatternStyle::new(vec![part])))
    };
    match style {
        AccompanimentStyle::None => None,
        AccompanimentStyle::Basic => {
            single(Part::bass(Instrument::AcousticBass, Pattern::RootOnOddBeats))
        }
        AccompanimentStyle::Quarter => {
            single(Part::chords(Instrument::Piano, Pattern::Pulse(NoteValue::Quarter)))
        }
        AccompanimentStyle::Half => {
            single(Part::chords(Instrument::Piano, Pattern::Pulse(NoteValue::Half)))
        }
        AccompanimentStyle::Whole => {
            single(Part::chords(Instrument::Piano, Pattern::Pulse(NoteValue::Whole)))
        }
        AccompanimentStyle::Waltz => single(Part::chords(Instrument::Piano, Pattern::Waltz)),
        AccompanimentStyle::Alberti => single(Part::chords(Instrument::Piano, Pattern::Alberti)),
        AccompanimentStyle::Arpeggio => {
            single(Part::chords(Instrument::Piano, Pattern::Arpeggio))
        }
        AccompanimentStyle::Genre(genre) => Some(Box::new(GenreProfile::for_genre(genre))),
    }
}

/// Generates accompaniment voices for resolved songs
#[derive(Debug, Clone)]
pub struct Accompanist<A = TemplateAnalyzer> {
    analyzer: A,
    window: u16,
}

impl Accompanist<TemplateAnalyzer> {
    /// `window` is the number of measures (starting at the current one) whose
    /// melody notes feed harmony detection.
    pub fn new(window: u16) -> Self {
        Accompanist::with_analyzer(TemplateAnalyzer, window)
    }
}

impl Default for Accompanist<TemplateAnalyzer> {
    fn default() -> Self {
        Accompanist::new(1)
    }
}

struct VoiceBuilder {
    role: Role,
    instrument: Instrument,
    name: String,
    notes: Vec<ResolvedNote>,
    groups: usize,
}

impl<A: HarmonyAnalyzer> Accompanist<A> {
    pub fn with_analyzer(analyzer: A, window: u16) -> Self {
        Accompanist {
            analyzer,
            window: window.max(1),
        }
    }

    /// Harmony per measure; a measure without melody keeps the previous one.
    pub fn harmonies(&self, melody: &[ResolvedNote], measures: &[MeasureFrame]) -> Vec<Option<Harmony>> {
        let mut current = None;
        let mut harmonies = Vec::with_capacity(measures.len());
        for (index, frame) in measures.iter().enumerate() {
            let last = (index + self.window as usize - 1).min(measures.len() - 1);
            let window_start = frame.start;
            let window_end = measures[last].end();
            let sounding: Vec<ResolvedNote> = melody
                .iter()
                .filter(|n| n.start < window_end && n.end > window_start)
                .copied()
                .collect();
            if let Some(harmony) = self.analyzer.analyze(&sounding, frame.start) {
                current = Some(harmony);
            }
            harmonies.push(current);
        }
        harmonies
    }

    /// Accompaniment voices for `song` in `style`, honoring section overrides.
    pub fn accompany(&self, song: &ResolvedSong, style: AccompanimentStyle) -> Vec<ResolvedVoice> {
        if style == AccompanimentStyle::None {
            return Vec::new();
        }
        let Some(melody) = song.voices.first() else {
            return Vec::new();
        };

        let harmonies = self.harmonies(&melody.notes, &song.measures);
        let mut builders: Vec<VoiceBuilder> = Vec::new();

        for (index, frame) in song.measures.iter().enumerate() {
            let Some(harmony) = harmonies[index] else {
                continue;
            };
            let Some(plan) = strategy(style_at(song, style, frame.number)) else {
                continue;
            };
            let next = harmonies.get(index + 1).copied().flatten();
            let feel = plan.feel();

            for part in plan.parts() {
                let ctx = MeasureContext {
                    frame,
                    harmony,
                    next,
                    floor: part.floor,
                };
                let position = builders
                    .iter()
                    .position(|b| b.role == part.role && b.instrument == part.instrument);
                let builder = match position {
                    Some(position) => &mut builders[position],
                    None => {
                        builders.push(VoiceBuilder {
                            role: part.role,
                            instrument: part.instrument,
                            name: part.voice_name(),
                            notes: Vec::new(),
                            groups: 0,
                        });
                        let last = builders.len() - 1;
                        &mut builders[last]
                    }
                };

                for hit in part.pattern.render(&ctx) {
                    let (start, end) = match feel {
                        Feel::Straight => (hit.start, hit.end),
                        Feel::Swing => (swing(hit.start, frame), swing(hit.end, frame)),
                    };
                    let start = frame.tick_at(start);
                    let end = frame.tick_at(end).max(start + 1);
                    let group = builder.groups;
                    builder.groups += 1;
                    builder.notes.extend(hit.pitches.into_iter().map(|pitch| ResolvedNote {
                        pitch,
                        start,
                        end,
                        dynamic: part.dynamic,
                        group,
                        line: 0,
                    }));
                }
            }
        }

        let voices: Vec<ResolvedVoice> = builders
            .into_iter()
            .map(|b| ResolvedVoice::new(b.name, b.instrument, b.notes))
            .collect();
        debug!(style = %style, voices = voices.len(), "generated accompaniment");
        voices
    }
}

/// Style in force at a measure: the latest section override, unless the
/// requested style is `none`.
fn style_at(song: &ResolvedSong, requested: AccompanimentStyle, measure: u16) -> AccompanimentStyle {
    if requested == AccompanimentStyle::None {
        return requested;
    }
    song.sections
        .iter()
        .rev()
        .find(|s| s.measure <= measure)
        .and_then(|s| s.style)
        .unwrap_or(requested)
}
