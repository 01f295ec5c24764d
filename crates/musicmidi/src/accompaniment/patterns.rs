//! Rhythmic patterns for one measure of accompaniment.
//!
//! Patterns work in fractions of a measure (0 is the downbeat, 1 the next
//! barline) so they fit any time signature. The generator maps hits to ticks.

use serde::{Deserialize, Serialize};

use crate::ast::{Duration, NoteValue};
use crate::fraction::Fraction;
use crate::timing::MeasureFrame;

use super::harmony::Harmony;

pub const KICK: u8 = 36;
pub const SNARE: u8 = 38;
pub const CLOSED_HI_HAT: u8 = 42;
pub const RIDE: u8 = 51;

#[derive(Debug, Clone, Copy, PartialEq, Eq, Serialize, Deserialize)]
#[serde(rename_all = "kebab-case")]
pub enum Pattern {
    /// Root on beats 1, 3, 5...
    RootOnOddBeats,
    /// Block chord repeated at a note value
    Pulse(NoteValue),
    /// Bass root on beat 1, chords on the rest
    Waltz,
    /// Eighths: root, fifth, third, fifth
    Alberti,
    /// Eighths climbing the chord plus octave
    Arpeggio,
    RootEveryBeat,
    RootFifthEighths,
    RootEighths,
    /// Root, fifth and octave on every beat
    PowerChords,
    /// Quarter-note line with a chromatic approach to the next root
    WalkingBass,
    /// Chords on beats 2 and 4
    Comping,
    /// Comping plus an off-beat stab
    SwingComping,
    /// One chord held for the measure
    Sustained,
    /// Kick, snare and hi-hat
    Backbeat,
    /// Ride cymbal with skip notes
    Ride,
}

/// One strike of a pattern
#[derive(Debug, Clone, PartialEq, Eq)]
pub struct Hit {
    pub start: Fraction,
    pub end: Fraction,
    pub pitches: Vec<u8>,
}

impl Hit {
    fn new(start: Fraction, end: Fraction, pitches: Vec<u8>) -> Self {
        Hit {
            start,
            end,
            pitches,
        }
    }
}

/// What a pattern needs to know about the measure it fills
#[derive(Debug, Clone, Copy)]
pub struct MeasureContext<'a> {
    pub frame: &'a MeasureFrame,
    pub harmony: Harmony,
    /// Harmony of the following measure, if any
    pub next: Option<Harmony>,
    /// Lowest pitch the part plays its root at
    pub floor: u8,
}

/// Consecutive spans of `whole_notes` each, the last clipped to the barline
pub fn steps(frame: &MeasureFrame, whole_notes: Fraction) -> Vec<(Fraction, Fraction)> {
    let span = frame.span_of(whole_notes);
    let mut spans = Vec::new();
    if span.is_zero() {
        return spans;
    }
    let mut start = Fraction::ZERO;
    while start < Fraction::ONE {
        let end = (start + span).min(Fraction::ONE);
        spans.push((start, end));
        start = start + span;
    }
    spans
}

fn beats(frame: &MeasureFrame) -> Vec<(Fraction, Fraction)> {
    steps(frame, frame.time_signature.beat_length())
}

fn eighths(frame: &MeasureFrame) -> Vec<(Fraction, Fraction)> {
    steps(frame, Duration::new(NoteValue::Eighth).whole_notes())
}

fn half(fraction: Fraction) -> Fraction {
    fraction / Fraction::from_integer(2)
}

impl Pattern {
    pub fn render(&self, ctx: &MeasureContext<'_>) -> Vec<Hit> {
        let frame = ctx.frame;
        let harmony = ctx.harmony;
        let root = harmony.root_from(ctx.floor);
        let chord = harmony.tones_from(ctx.floor);
        let up = |interval: u8| root.saturating_add(interval).min(127);

        match self {
            Pattern::RootOnOddBeats => beats(frame)
                .into_iter()
                .step_by(2)
                .map(|(start, end)| Hit::new(start, end, vec![root]))
                .collect(),

            Pattern::Pulse(value) => steps(frame, Duration::new(*value).whole_notes())
                .into_iter()
                .map(|(start, end)| Hit::new(start, end, chord.clone()))
                .collect(),

            Pattern::Waltz => {
                let bass = harmony.root_from(ctx.floor.saturating_sub(12));
                beats(frame)
                    .into_iter()
                    .enumerate()
                    .map(|(index, (start, end))| {
                        let pitches = if index == 0 { vec![bass] } else { chord.clone() };
                        Hit::new(start, end, pitches)
                    })
                    .collect()
            }

            Pattern::Alberti => {
                let figure = [0, harmony.fifth(), harmony.third(), harmony.fifth()];
                eighths(frame)
                    .into_iter()
                    .zip(figure.into_iter().cycle())
                    .map(|((start, end), interval)| Hit::new(start, end, vec![up(interval)]))
                    .collect()
            }

            Pattern::Arpeggio => {
                let mut figure = chord.clone();
                figure.push(up(12));
                eighths(frame)
                    .into_iter()
                    .zip(figure.into_iter().cycle())
                    .map(|((start, end), pitch)| Hit::new(start, end, vec![pitch]))
                    .collect()
            }

            Pattern::RootEveryBeat => beats(frame)
                .into_iter()
                .map(|(start, end)| Hit::new(start, end, vec![root]))
                .collect(),

            Pattern::RootFifthEighths => eighths(frame)
                .into_iter()
                .zip([0, harmony.fifth()].into_iter().cycle())
                .map(|((start, end), interval)| Hit::new(start, end, vec![up(interval)]))
                .collect(),

            Pattern::RootEighths => eighths(frame)
                .into_iter()
                .map(|(start, end)| Hit::new(start, end, vec![root]))
                .collect(),

            Pattern::PowerChords => beats(frame)
                .into_iter()
                .map(|(start, end)| Hit::new(start, end, vec![root, up(7), up(12)]))
                .collect(),

            Pattern::WalkingBass => {
                let line = [0, harmony.third(), harmony.fifth(), 12];
                let spans = beats(frame);
                let last = spans.len().saturating_sub(1);
                spans
                    .into_iter()
                    .enumerate()
                    .map(|(index, (start, end))| {
                        let pitch = if index == last && last >= 3 {
                            let target = ctx.next.unwrap_or(harmony).root_from(ctx.floor);
                            target.saturating_sub(1)
                        } else {
                            up(line[index % line.len()])
                        };
                        Hit::new(start, end, vec![pitch])
                    })
                    .collect()
            }

            Pattern::Comping => beats(frame)
                .into_iter()
                .skip(1)
                .step_by(2)
                .map(|(start, end)| Hit::new(start, end, chord.clone()))
                .collect(),

            Pattern::SwingComping => {
                let mut hits = Pattern::Comping.render(ctx);
                for (start, end) in beats(frame).into_iter().skip(2).step_by(2) {
                    let offbeat = start + half(end.checked_sub(start).unwrap_or_default());
                    hits.push(Hit::new(offbeat, end, chord.clone()));
                }
                hits
            }

            Pattern::Sustained => vec![Hit::new(Fraction::ZERO, Fraction::ONE, chord)],

            Pattern::Backbeat => {
                let mut hits = Vec::new();
                for (index, (start, end)) in beats(frame).into_iter().enumerate() {
                    let drum = if index % 2 == 0 { KICK } else { SNARE };
                    hits.push(Hit::new(start, end, vec![drum]));
                }
                for (start, end) in eighths(frame) {
                    hits.push(Hit::new(start, end, vec![CLOSED_HI_HAT]));
                }
                hits
            }

            Pattern::Ride => {
                let mut hits = Vec::new();
                for (index, (start, end)) in beats(frame).into_iter().enumerate() {
                    let offbeat = start + half(end.checked_sub(start).unwrap_or_default());
                    if index % 2 == 1 {
                        hits.push(Hit::new(start, offbeat, vec![RIDE]));
                        hits.push(Hit::new(offbeat, end, vec![RIDE]));
                    } else {
                        hits.push(Hit::new(start, end, vec![RIDE]));
                    }
                }
                hits
            }
        }
    }
}

/// Move every off-beat eighth to two thirds of its beat.
pub fn swing(point: Fraction, frame: &MeasureFrame) -> Fraction {
    let beat = frame.beat_fraction();
    let index = Fraction::from_integer((point / beat).floor());
    let beat_start = index * beat;
    let within = point.checked_sub(beat_start).unwrap_or_default();
    if within == half(beat) {
        beat_start + beat * Fraction::new(2, 3)
    } else {
        point
    }
}
