//! Turns symbolic positions into absolute ticks.
//!
//! Every measure is laid out as a 4/4 measure of [`TICKS_PER_MEASURE`] ticks,
//! whatever its written time signature. Positions keep their proportion of
//! the measure, and the tempo of a non-4/4 measure is rescaled so the measure
//! still lasts as long as it would at the written tempo:
//!
//! ```text
//! us_per_quarter = round(60_000_000 * numerator / (bpm * denominator))
//! ```
//!
//! Positions are exact fractions until the final tick, which is rounded half
//! up once. Two notes that meet exactly in fractions meet exactly in ticks.

use serde::{Deserialize, Serialize};
use tracing::debug;

use crate::ast::{
    AccompanimentStyle, Dynamic, EventKind, Genre, Instrument, Key, Position, Section, Song, Tempo,
    TimeSignature, MAX_MEASURE,
};
use crate::error::TimingError;
use crate::fraction::Fraction;

pub const TICKS_PER_QUARTER: u32 = 480;
pub const TICKS_PER_MEASURE: u32 = 4 * TICKS_PER_QUARTER;

/// The resolved layout of one measure
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct MeasureFrame {
    pub number: u16,
    pub start: u32,
    /// The time signature as written
    pub time_signature: TimeSignature,
    pub tempo: Tempo,
    /// Tempo of the internal 4/4 grid
    pub us_per_quarter: u64,
}

impl MeasureFrame {
    pub fn end(&self) -> u32 {
        self.start + TICKS_PER_MEASURE
    }

    pub fn beats(&self) -> u8 {
        self.time_signature.numerator
    }

    /// Tick of a point given as a fraction of this measure.
    pub fn tick_at(&self, fraction: Fraction) -> u32 {
        let measures = Fraction::from_integer(self.number as u64 - 1) + fraction;
        measure_ticks(measures)
    }

    /// Fraction of the measure covered by one beat
    pub fn beat_fraction(&self) -> Fraction {
        Fraction::new(1, self.beats() as u64)
    }

    /// Fraction of the measure covered by a note value (whole notes)
    pub fn span_of(&self, whole_notes: Fraction) -> Fraction {
        whole_notes / self.time_signature.measure_length()
    }
}

/// A note with absolute ticks
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct ResolvedNote {
    pub pitch: u8,
    pub start: u32,
    pub end: u32,
    pub dynamic: Dynamic,
    /// Notes of one chord share a group
    pub group: usize,
    /// Source line, zero for generated notes
    pub line: usize,
}

#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedVoice {
    pub name: String,
    pub instrument: Instrument,
    /// Sorted by start tick, ties in declaration order
    pub notes: Vec<ResolvedNote>,
}

impl ResolvedVoice {
    pub fn new(name: impl Into<String>, instrument: Instrument, mut notes: Vec<ResolvedNote>) -> Self {
        notes.sort_by_key(|n| n.start);
        ResolvedVoice {
            name: name.into(),
            instrument,
            notes,
        }
    }
}

/// A point where the tempo or time signature of the grid changes
#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
pub struct TempoPoint {
    pub tick: u32,
    pub measure: u16,
    pub us_per_quarter: u64,
    pub tempo: Tempo,
    /// The written time signature from here on
    pub time_signature: TimeSignature,
}

/// A song with every event on the tick grid
#[derive(Debug, Clone, PartialEq, Serialize, Deserialize)]
pub struct ResolvedSong {
    pub title: String,
    pub key: Option<Key>,
    pub genre: Option<Genre>,
    pub style: Option<AccompanimentStyle>,
    pub voices: Vec<ResolvedVoice>,
    pub measures: Vec<MeasureFrame>,
    pub tempo_map: Vec<TempoPoint>,
    pub sections: Vec<Section>,
    /// Last tick of the song
    pub end: u32,
}

impl ResolvedSong {
    pub fn frame(&self, measure: u16) -> Option<&MeasureFrame> {
        self.measures.get((measure as usize).checked_sub(1)?)
    }

    /// Map a tick back to a measure and beat offset
    pub fn remeasure(&self, tick: u32) -> Position {
        let measure = (tick / TICKS_PER_MEASURE + 1).min(u16::MAX as u32) as u16;
        let within = Fraction::new((tick % TICKS_PER_MEASURE) as u64, TICKS_PER_MEASURE as u64);
        let beats = self
            .frame(measure)
            .map_or(4, |frame| frame.beats() as u64);
        Position::new(measure, within * Fraction::from_integer(beats))
    }

    /// Real time in seconds at a tick
    pub fn seconds_at(&self, tick: u32) -> f64 {
        let mut seconds = 0.0;
        for (index, point) in self.tempo_map.iter().enumerate() {
            if tick <= point.tick {
                break;
            }
            let until = self
                .tempo_map
                .get(index + 1)
                .map_or(tick, |next| next.tick.min(tick));
            let ticks = (until - point.tick) as f64;
            seconds += ticks * point.us_per_quarter as f64 / TICKS_PER_QUARTER as f64 / 1e6;
        }
        seconds
    }
}

fn measure_ticks(measures: Fraction) -> u32 {
    (measures * Fraction::from_integer(TICKS_PER_MEASURE as u64)).round() as u32
}

/// Microseconds per internal quarter for a written tempo and meter
pub fn grid_tempo(tempo: Tempo, time_signature: TimeSignature) -> u64 {
    Fraction::new(
        60_000_000 * time_signature.numerator as u64,
        tempo.bpm.max(1) as u64 * time_signature.denominator as u64,
    )
    .round()
}

/// Time signature and tempo in force at a measure
struct Grid<'a> {
    song: &'a Song,
}

impl Grid<'_> {
    fn time_signature(&self, measure: u16) -> TimeSignature {
        self.song
            .meter_changes
            .iter()
            .rev()
            .find(|c| c.measure <= measure)
            .map_or_else(|| self.song.time_signature(), |c| c.time_signature)
    }

    fn tempo(&self, measure: u16) -> Tempo {
        self.song
            .tempo_changes
            .iter()
            .rev()
            .find(|c| c.measure <= measure)
            .map_or_else(|| self.song.tempo(), |c| c.tempo)
    }

    fn frame(&self, number: u16) -> MeasureFrame {
        let time_signature = self.time_signature(number);
        let tempo = self.tempo(number);
        MeasureFrame {
            number,
            start: (number as u32 - 1) * TICKS_PER_MEASURE,
            time_signature,
            tempo,
            us_per_quarter: grid_tempo(tempo, time_signature),
        }
    }

    /// Tick where a note ends. The length is spent measure by measure, each
    /// measure in its own meter.
    fn end_tick(&self, measure: u16, within: Fraction, whole_notes: Fraction) -> u32 {
        let mut number = measure;
        let mut within = within;
        let mut left = whole_notes;
        loop {
            let length = self.time_signature(number).measure_length();
            let room = Fraction::ONE.checked_sub(within).unwrap_or_default() * length;
            if left <= room {
                let measures = Fraction::from_integer(number as u64 - 1) + within + left / length;
                return measure_ticks(measures);
            }
            left = left.checked_sub(room).unwrap_or_default();
            number += 1;
            within = Fraction::ZERO;
        }
    }

    /// First tempo or meter change past the declared song length
    fn change_past(&self, last_measure: u16) -> Option<TimingError> {
        let tempos = self
            .song
            .tempo_changes
            .iter()
            .map(|c| (c.line, "tempo", c.measure));
        let meters = self
            .song
            .meter_changes
            .iter()
            .map(|c| (c.line, "time signature", c.measure));
        tempos
            .chain(meters)
            .filter(|(_, _, measure)| *measure > last_measure)
            .min_by_key(|(line, _, _)| *line)
            .map(|(line, what, measure)| TimingError::ChangePastSongEnd {
                line,
                what,
                measure,
                last_measure,
            })
    }

    fn is_change_point(&self, measure: u16) -> bool {
        self.song.tempo_changes.iter().any(|c| c.measure == measure)
            || self.song.meter_changes.iter().any(|c| c.measure == measure)
    }
}

/// Resolve every event of a song to ticks.
pub fn resolve(song: &Song) -> Result<ResolvedSong, TimingError> {
    let grid = Grid { song };
    let limit_measure = song.header.measures.unwrap_or(MAX_MEASURE);
    let limit = limit_measure as u32 * TICKS_PER_MEASURE;
    if let Some(declared) = song.header.measures {
        if let Some(err) = grid.change_past(declared) {
            return Err(err);
        }
    }

    let mut voices = Vec::with_capacity(song.voices.len());
    let mut last_end = 0u32;

    for voice in &song.voices {
        let mut notes = Vec::new();
        for (group, event) in voice.events.iter().enumerate() {
            let Position { measure, offset } = event.position;
            let frame = grid.frame(measure);
            let capacity = Fraction::from_integer(frame.beats() as u64);
            if offset >= capacity {
                return Err(TimingError::BeatOverflow {
                    line: event.line,
                    measure,
                    beat: event.position.beat(),
                    time_signature: frame.time_signature,
                    capacity: frame.beats(),
                });
            }

            let start_fraction = offset / capacity;
            let start = frame.tick_at(start_fraction);
            let end = grid
                .end_tick(measure, start_fraction, event.duration.whole_notes())
                .max(start + 1);
            if end > limit {
                return Err(TimingError::PastSongEnd {
                    line: event.line,
                    measure,
                    beat: event.position.beat(),
                    last_measure: limit_measure,
                });
            }
            last_end = last_end.max(end);

            let pitches = match &event.kind {
                EventKind::Note(pitch) => vec![*pitch],
                EventKind::Chord(pitches) => pitches.clone(),
                EventKind::Rest => Vec::new(),
            };
            notes.extend(pitches.into_iter().map(|pitch| ResolvedNote {
                pitch: pitch.midi_number(),
                start,
                end,
                dynamic: event.dynamic,
                group,
                line: event.line,
            }));
        }
        voices.push(ResolvedVoice::new(voice.name.clone(), voice.instrument, notes));
    }

    let ending_measure = last_end.div_ceil(TICKS_PER_MEASURE).min(MAX_MEASURE as u32) as u16;
    let extent = match song.header.measures {
        Some(declared) => declared,
        None => song.last_measure().max(ending_measure),
    };

    let measures: Vec<MeasureFrame> = (1..=extent).map(|m| grid.frame(m)).collect();

    let mut tempo_map: Vec<TempoPoint> = Vec::new();
    for frame in &measures {
        let changed = tempo_map.last().map_or(true, |last| {
            last.us_per_quarter != frame.us_per_quarter
                || last.time_signature != frame.time_signature
        });
        if changed || grid.is_change_point(frame.number) {
            tempo_map.push(TempoPoint {
                tick: frame.start,
                measure: frame.number,
                us_per_quarter: frame.us_per_quarter,
                tempo: frame.tempo,
                time_signature: frame.time_signature,
            });
        }
    }
    if tempo_map.is_empty() {
        let frame = grid.frame(1);
        tempo_map.push(TempoPoint {
            tick: 0,
            measure: 1,
            us_per_quarter: frame.us_per_quarter,
            tempo: frame.tempo,
            time_signature: frame.time_signature,
        });
    }

    let end = match song.header.measures {
        Some(declared) => declared as u32 * TICKS_PER_MEASURE,
        None => last_end,
    };

    debug!(
        measures = measures.len(),
        tempo_points = tempo_map.len(),
        end,
        "resolved song timing"
    );

    Ok(ResolvedSong {
        title: song.header.title.clone(),
        key: song.header.key,
        genre: song.header.genre,
        style: song.header.style,
        voices,
        measures,
        tempo_map,
        sections: song.sections.clone(),
        end,
    })
}

#[cfg(test)]
mod tests {
    use super::*;
    use crate::ast::{Duration, Event, MeterChange, NoteValue, Pitch, NoteName, Voice};
    use crate::parse;
    use pretty_assertions::assert_eq;

    fn resolve_text(input: &str) -> Result<ResolvedSong, TimingError> {
        let result = parse(input);
        assert!(!result.has_errors(), "{:?}", result.feedback);
        resolve(&result.value)
    }

    fn starts_and_ends(song: &ResolvedSong) -> Vec<(u8, u32, u32)> {
        song.voices[0]
            .notes
            .iter()
            .map(|n| (n.pitch, n.start, n.end))
            .collect()
    }

    #[test]
    fn test_two_quarters_at_120() {
        let song = resolve_text(
            "Time Signature: 4/4\nTempo: 120\nMeasure 1 1.0 C5 p quarter\nMeasure 1 2.0 D5 mf quarter\n",
        )
        .unwrap();
        assert_eq!(starts_and_ends(&song), vec![(72, 0, 480), (74, 480, 960)]);
        assert_eq!(song.voices[0].notes[0].dynamic, Dynamic::P);
        assert_eq!(song.voices[0].notes[1].dynamic, Dynamic::Mf);
        assert_eq!(song.tempo_map[0].us_per_quarter, 500_000);
    }

    #[test]
    fn test_chord_shares_start_and_end() {
        let song = resolve_text("Measure 1 1.0 [C4, E4, G4] p half\n").unwrap();
        assert_eq!(
            starts_and_ends(&song),
            vec![(60, 0, 960), (64, 0, 960), (67, 0, 960)]
        );
        let groups: Vec<usize> = song.voices[0].notes.iter().map(|n| n.group).collect();
        assert_eq!(groups, vec![0, 0, 0]);
    }

    #[test]
    fn test_contiguous_notes_have_no_gaps() {
        let meters = ["4/4", "3/4", "6/8", "5/4", "7/8"];
        let values = [
            NoteValue::Whole,
            NoteValue::Half,
            NoteValue::Quarter,
            NoteValue::Eighth,
            NoteValue::Sixteenth,
            NoteValue::ThirtySecond,
        ];
        for meter in meters {
            for value in values {
                for dotted in [false, true] {
                    let mut song = parse(&format!("Time Signature: {meter}\n")).value;
                    let duration = Duration { value, dotted };
                    let ts = song.time_signature();
                    // second note starts exactly where the first ends (in beats)
                    let offset = duration.whole_notes() / ts.beat_length();
                    let pitch = Pitch::new(NoteName::C, None, 4).unwrap();
                    let mut voice = Voice::default();
                    for (index, offset) in [Fraction::ZERO, offset].into_iter().enumerate() {
                        voice.events.push(Event {
                            line: index + 1,
                            position: Position::new(10, offset),
                            kind: EventKind::Note(pitch),
                            duration,
                            dynamic: Dynamic::Mf,
                        });
                    }
                    song.voices.push(voice);

                    if offset >= Fraction::from_integer(ts.numerator as u64) {
                        continue;
                    }
                    let resolved = resolve(&song).unwrap();
                    let notes = &resolved.voices[0].notes;
                    assert_eq!(notes[0].end, notes[1].start, "{meter} {value:?} dotted={dotted}");
                }
            }
        }
    }

    #[test]
    fn test_four_four_remeasure_roundtrip() {
        let input = "\
Measure 1 1.0 C4 p eighth
Measure 1 1.5 D4 p sixteenth
Measure 1 1.75 E4 p sixteenth
Measure 2 3.25 F4 p quarter
Measure 7 4.5 G4 p eighth
";
        let parsed = parse(input).value;
        let song = resolve(&parsed).unwrap();
        for (event, note) in parsed.voices[0].events.iter().zip(&song.voices[0].notes) {
            assert_eq!(song.remeasure(note.start), event.position);
        }
    }

    #[test]
    fn test_three_four_feel_is_preserved() {
        let song = resolve_text("Time Signature: 3/4\nTempo: 120\nMeasure 1 1.0 C4 p quarter\nMeasure 2 1.0 C4 p quarter\n")
            .unwrap();
        let frame = song.frame(1).unwrap();
        assert_eq!(frame.us_per_quarter, 375_000);

        let measure_seconds = song.seconds_at(frame.end()) - song.seconds_at(frame.start);
        let written_seconds = 3.0 * 60.0 / 120.0;
        assert!((measure_seconds - written_seconds).abs() < 1e-9);

        // beat 2 of 3/4 sits a third of the way through the 4/4 grid measure
        let song = resolve_text("Time Signature: 3/4\nMeasure 1 2.0 C4 p quarter\n").unwrap();
        assert_eq!(starts_and_ends(&song), vec![(60, 640, 1280)]);
    }

    #[test]
    fn test_beat_past_measure_is_timing_error() {
        let err = resolve_text("Time Signature: 4/4\nMeasure 1 6.0 C5 p quarter\n").unwrap_err();
        assert_eq!(
            err,
            TimingError::BeatOverflow {
                line: 2,
                measure: 1,
                beat: Fraction::from_integer(6),
                time_signature: TimeSignature::COMMON,
                capacity: 4,
            }
        );

        let err = resolve_text("Measure 1 5.0 C5 p quarter\n").unwrap_err();
        assert!(matches!(err, TimingError::BeatOverflow { .. }));
    }

    #[test]
    fn test_past_declared_length() {
        let err = resolve_text("Measures: 2\nMeasure 2 4.0 C4 p half\n").unwrap_err();
        assert!(matches!(
            err,
            TimingError::PastSongEnd {
                line: 2,
                measure: 2,
                last_measure: 2,
                ..
            }
        ));

        let song = resolve_text("Measures: 2\nMeasure 2 3.0 C4 p half\n").unwrap();
        assert_eq!(song.end, 2 * TICKS_PER_MEASURE);
        assert_eq!(song.measures.len(), 2);
    }

    #[test]
    fn test_tempo_map_marks_changes() {
        let song = resolve_text(
            "Tempo: 100\nMeasure 1 1.0 C4 p whole\nMeasure 3 Tempo 100\nMeasure 4 Time Signature 6/8\nMeasure 4 1.0 C4 p eighth\n",
        )
        .unwrap();
        let points: Vec<(u16, u64)> = song
            .tempo_map
            .iter()
            .map(|p| (p.measure, p.us_per_quarter))
            .collect();
        assert_eq!(points, vec![(1, 600_000), (3, 600_000), (4, 450_000)]);
    }

    #[test]
    fn test_note_across_meter_change_meets_next_note() {
        let song = resolve_text(
            "Time Signature: 3/4\nMeasure 2 Time Signature 4/4\nMeasure 1 3.0 C4 p half\nMeasure 2 2.0 D4 p quarter\n",
        )
        .unwrap();
        // one beat of 3/4 then one beat of 4/4
        assert_eq!(starts_and_ends(&song), vec![(60, 1280, 2400), (62, 2400, 2880)]);

        let song = resolve_text(
            "Measure 2 Time Signature 6/8\nMeasure 1 4.0 C4 p half\nMeasure 2 3.0 D4 p eighth\n",
        )
        .unwrap();
        // a quarter in 4/4, then a quarter is two of six eighths
        assert_eq!(starts_and_ends(&song), vec![(60, 1440, 2560), (62, 2560, 2880)]);
    }

    #[test]
    fn test_change_past_declared_length() {
        let err = resolve_text("Measures: 2\nMeasure 1 1.0 C4 p whole\nMeasure 3 Tempo 90\n").unwrap_err();
        assert_eq!(
            err,
            TimingError::ChangePastSongEnd {
                line: 3,
                what: "tempo",
                measure: 3,
                last_measure: 2,
            }
        );
        assert_eq!(err.line(), 3);

        let err = resolve_text("Measures: 1\nMeasure 1 1.0 C4 p whole\nMeasure 2 Time Signature 3/4\n").unwrap_err();
        assert!(matches!(
            err,
            TimingError::ChangePastSongEnd { what: "time signature", measure: 2, .. }
        ));
    }

    #[test]
    fn test_meter_change_uses_new_capacity() {
        let mut song = parse("Measure 1 1.0 C4 p whole\nMeasure 2 4.0 C4 p quarter\n").value;
        song.meter_changes.push(MeterChange {
            line: 3,
            measure: 2,
            time_signature: TimeSignature {
                numerator: 3,
                denominator: 4,
            },
        });
        assert!(matches!(
            resolve(&song),
            Err(TimingError::BeatOverflow { measure: 2, capacity: 3, .. })
        ));
    }
}
